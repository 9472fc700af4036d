pub mod access;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod extract;
pub mod handler;
pub mod inquiry;
pub mod middleware;
pub mod models;
pub mod moderation;
pub mod payloads;
pub mod routes;
pub mod tracing_config;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::DBClient;
use moderation::{ApprovalPolicies, ContentEngine};

/// Shared per-process state. Cloned into every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: DBClient,
    pub engine: ContentEngine,
}

impl AppState {
    pub fn new(config: Config, db_client: DBClient) -> Self {
        let policies = ApprovalPolicies::new(config.reapprove_restamps.clone());
        AppState {
            env: Arc::new(config),
            engine: ContentEngine::new(db_client.clone(), policies),
            db_client,
        }
    }
}
