use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::ServerConfig, infrastructure::shutdown::ShutdownListener};

use super::{
    routes::{auth, bookmarks, categories, health, users},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route(
            "/users/me",
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_account),
        )
        .route(
            "/users/me/api-keys",
            get(users::list_api_keys).post(users::create_api_key),
        )
        .route("/users/me/api-keys/:id", delete(users::revoke_api_key))
        .route(
            "/categories",
            get(categories::get_categories).put(categories::update_categories),
        )
        .route("/bookmarks/analyze", post(bookmarks::analyze_bookmark));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors_allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "api", origin = %origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Serves until `shutdown` fires, then drains in-flight requests.
pub async fn serve(listener: TcpListener, router: Router, mut shutdown: ShutdownListener) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(target: "api", %addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
        .context("HTTP server terminated with an error")
}
