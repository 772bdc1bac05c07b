pub mod appresult;
pub mod clock;
pub mod config;
pub mod extract;
pub mod messages;
pub mod models;
pub mod participants;
pub mod store;
pub mod validate;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};

use crate::{clock::Clock, store::Store};

/// Shared by every handler; services are built from it per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: impl Store + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(clock),
        }
    }
}

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(participants::router())
        .merge(messages::router())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
