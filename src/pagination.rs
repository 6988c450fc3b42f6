use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=` is 1-based; `?limit=` caps the page size.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1) * self.limit()
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub count: i64,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let q = PageQuery::default();
        assert_eq!(q.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn limit_is_clamped() {
        let q = PageQuery {
            page: None,
            limit: Some(10_000),
        };
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
    }
}
