//! Axum router configuration with middleware.
//!
//! API routes are under `/api/v1/`. The web front-end's unwrapped routes
//! (`/chat`, `/new_chat`, `/get_chat_history`, `/get_sidebar_data`) sit at
//! the root.
//! Middleware: CORS, tracing.
//!
//! When `web_dir` is configured and exists, the built front-end is served
//! from it. API routes take priority; unknown paths fall through to the
//! front-end's `index.html` for client-side routing.

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let web_dir = state.config.web_dir.clone();

    let api_routes = Router::new()
        // Chat
        .route("/chat", post(handlers::chat::chat))
        // Sessions
        .route("/sessions", post(handlers::session::create_session))
        .route("/sessions/{id}", delete(handlers::session::delete_session))
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route("/sessions/{id}/pin", post(handlers::session::toggle_pin))
        .route(
            "/sessions/{id}/archive",
            post(handlers::session::toggle_archive),
        )
        // Sidebar
        .route("/sidebar", get(handlers::session::sidebar));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/chat", post(handlers::compat::chat))
        .route("/new_chat", post(handlers::compat::new_chat))
        .route("/get_chat_history", get(handlers::compat::chat_history))
        .route("/get_sidebar_data", get(handlers::compat::sidebar_data))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| std::path::Path::new(dir).exists()) {
        let index_path = format!("{web_dir}/index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "Static front-end serving enabled");
    }

    router
}

/// GET /health - Liveness plus which session store is in use.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store_backend(),
    }))
}
