use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};

use askbridge_core::config::BridgeConfig;
use askbridge_whatsapp::BridgeContext;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: BridgeConfig,
    pub ctx: Arc<BridgeContext>,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/webhook",
            get(crate::http::webhook::verify_handler).post(crate::http::webhook::notify_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
