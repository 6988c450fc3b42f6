use crate::{config::Config, database::Database};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let db = Database::new(&config.database.url).await?;
        db.init().await?;

        Ok(Self { db, config })
    }
}
