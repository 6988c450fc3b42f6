// Recipebox - recipe sharing backend

// HTTP surface
pub mod routes;

// Application state and configuration
pub mod app_state;
pub mod config;

// Persistence: schema, stores, cart aggregation
pub mod database;
pub mod models;
pub mod shopping_list;
pub mod store;

// Cross-cutting concerns
pub mod auth;
pub mod error;
pub mod media;
pub mod pagination;

// Re-exports for convenience
pub use error::{AppError, AppResult};
