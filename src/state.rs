use std::sync::Arc;

use crate::config::Config;

// --- DB Connection Pool Type ---
pub type DbPool = deadpool_diesel::postgres::Pool;

// --- Shared application state ---
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}
