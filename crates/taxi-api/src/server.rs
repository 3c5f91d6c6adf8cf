//! HTTP API Server
//!
//! Builds the axum application and serves it until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use taxi_support::SupportAgent;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<SupportAgent>,
    /// Bearer key required on `/chat` and `/history` when set
    pub api_key: Option<String>,
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins.filter(|origins| !origins.is_empty()) else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assemble the full application, with `extra` routes (e.g. the webhook) merged in
pub fn build_app(
    state: AppState,
    extra: Option<Router>,
    allowed_origins: Option<&[String]>,
) -> Router {
    let mut app = routes(state);
    if let Some(extra) = extra {
        app = app.merge(extra);
    }
    app.layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` on all interfaces until `shutdown` resolves
pub async fn start_server(
    port: u16,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP API stopped");
    Ok(())
}
