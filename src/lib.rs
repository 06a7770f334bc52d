use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod core;
pub mod follow;
pub mod models;
pub mod routes;
pub mod users;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::core::store::AccountStore;
use crate::follow::FollowGraph;

/// Everything a handler needs, handed to actix as `web::Data<AppState>`.
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub graph: FollowGraph,
    pub verifier: Arc<dyn TokenVerifier>,
    pub config: Config,
}

impl AppState {
    pub fn new(accounts: Arc<dyn AccountStore>, verifier: Arc<dyn TokenVerifier>, config: Config) -> Self {
        let graph = FollowGraph::new(accounts.clone());
        AppState {
            accounts,
            graph,
            verifier,
            config,
        }
    }
}
