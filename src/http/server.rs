//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (request ID, tracing, timeout, ban filter)
//! - Bind server to listener
//! - Forward accepted requests to the upstream
//! - Run the ban sweeper alongside the server

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::ban::{BanTable, Sweeper};
use crate::config::GateConfig;
use crate::http::middleware::{BanFilter, BanFilterLayer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<str>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the ban gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    filter: Arc<BanFilter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        let filter = Arc::new(BanFilter::new(&config.ban_filter));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            upstream: Arc::from(config.upstream.address.trim()),
            client,
        };

        tracing::info!(
            filter = %filter.name(),
            enabled = config.ban_filter.enabled,
            bans = filter.table().len(),
            upstream = %state.upstream,
            "Ban filter configured"
        );

        let router = Self::build_router(&config, state, BanFilterLayer::from_filter(filter.clone()));
        Self {
            router,
            config,
            filter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, state: AppState, ban_filter: BanFilterLayer) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state)
            .layer(ban_filter)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.sweep.enabled {
            let sweeper = Sweeper::new(self.filter.table().clone(), self.config.sweep.clone());
            let sweeper_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                sweeper.run(sweeper_shutdown).await;
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Handle to the live ban table.
    pub fn ban_table(&self) -> BanTable {
        self.filter.table().clone()
    }
}

/// Forward an accepted request to the upstream and relay its response.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let uri: Uri = match format!("http://{}{}", state.upstream, path_and_query).parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %state.upstream, error = %e, "Invalid upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream").into_response();
        }
    };

    tracing::debug!(method = %parts.method, uri = %uri, "Forwarding request");

    parts.uri = uri;
    parts.version = Version::HTTP_11;

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(upstream = %state.upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
