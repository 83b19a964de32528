pub mod auth;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;

// Define PgPool type alias here for library-wide use
pub type PgPool = deadpool_diesel::postgres::Pool;

// Re-export AppState for convenience
pub use state::AppState;
