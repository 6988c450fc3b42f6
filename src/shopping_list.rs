use sqlx::Row;

use crate::{database::Database, error::AppResult};

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

/// One aggregation group of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Consolidates every ingredient across the recipes currently in the user's
/// cart. Groups by (name, measurement unit) — the same name under two units
/// stays two groups — and sums amounts within each group. Read-only.
pub async fn compute_shopping_list(
    db: &Database,
    user_id: i64,
) -> AppResult<Vec<ShoppingListItem>> {
    let rows = sqlx::query(
        "SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total_amount
         FROM shopping_cart sc
         JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE sc.user_id = ?
         GROUP BY i.name, i.measurement_unit
         ORDER BY i.name, i.measurement_unit",
    )
    .bind(user_id)
    .fetch_all(&db.pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ShoppingListItem {
            name: row.get("name"),
            measurement_unit: row.get("measurement_unit"),
            total_amount: row.get("total_amount"),
        })
        .collect())
}

/// Plain-text export: header, blank line, one `name (unit) — amount` line
/// per group. An empty cart yields just the header.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut out = format!("{}\n\n", SHOPPING_LIST_HEADER);
    for item in items {
        out.push_str(&format!(
            "{} ({}) — {}\n",
            item.name, item.measurement_unit, item.total_amount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, amount: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: amount,
        }
    }

    #[test]
    fn empty_cart_renders_header_only() {
        let report = render_shopping_list(&[]);
        assert_eq!(report, "Shopping list:\n\n");
    }

    #[test]
    fn each_group_gets_one_line_with_em_dash() {
        let report = render_shopping_list(&[item("Beet", "g", 10), item("Carrot", "g", 30)]);
        assert_eq!(report, "Shopping list:\n\nBeet (g) — 10\nCarrot (g) — 30\n");
    }
}
