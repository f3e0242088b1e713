//! IdeaHub API Gateway
//!
//! The entry point for all external API requests.
//! Handles:
//! - Accounts and authentication
//! - Idea submission through the admission pipeline
//! - Administration
//! - AI assistant proxy
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod extractors;
mod handlers;
mod middleware;

#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use ideahub_common::{
    accounts::AccountService,
    admission::{AdmissionPipeline, DuplicateGuard},
    assistant::{self, CompletionClient},
    auth::JwtManager,
    config::AppConfig,
    db::{DbPool, Repository},
    errors::Result,
    metrics,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use middleware::rate_limit::{rate_limit_middleware, RateLimitState};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub accounts: AccountService,
    pub admission: Arc<AdmissionPipeline<Repository>>,
    pub assistant: Option<Arc<dyn CompletionClient>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire services over an open database pool.
    ///
    /// Fails if no JWT secret is configured.
    pub fn new(
        config: Arc<AppConfig>,
        db: DbPool,
        assistant: Option<Arc<dyn CompletionClient>>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret()?,
            config.auth.jwt_expiration_secs,
        ));

        let repo = Repository::new(db);
        let accounts = AccountService::new(repo.clone(), jwt, config.auth.allow_admin_signup);
        let admission = Arc::new(AdmissionPipeline::with_guard(
            repo.clone(),
            DuplicateGuard::new(config.admission.similarity_threshold),
        ));

        Ok(Self {
            config,
            repo,
            accounts,
            admission,
            assistant,
            metrics,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting IdeaHub API Gateway v{}",
        ideahub_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = install_metrics_recorder()?;
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.sync_schema {
        db.sync_schema().await?;
    }

    let assistant = assistant::create_client(&config.assistant)?;

    // Create app state
    let state = AppState::new(config.clone(), db, assistant, Some(metrics_handle)).map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    // Build the router
    let app = create_router(state);

    // Start the server
    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (draining_tx, draining_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = draining_tx.send(true);
        })
        .into_future();

    match with_shutdown_deadline(server, draining_rx, config.shutdown_timeout()).await {
        Some(result) => {
            result?;
            info!("Server shutdown complete");
        }
        None => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Open connections did not drain in time, shutting down anyway"
        ),
    }

    Ok(())
}

/// Drive `server` to completion, giving up `timeout` after draining starts
async fn with_shutdown_deadline<F>(
    server: F,
    mut draining: watch::Receiver<bool>,
    timeout: Duration,
) -> Option<F::Output>
where
    F: Future,
{
    let deadline = async move {
        if draining.wait_for(|started| *started).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(timeout).await;
    };

    tokio::select! {
        output = server => Some(output),
        _ = deadline => None,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.observability.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("assistant_duration_seconds".to_string()),
            metrics::COMPLETION_BUCKETS,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let idea_routes = Router::new()
        .route(
            "/",
            get(handlers::ideas::list_my_ideas).post(handlers::ideas::create_idea),
        )
        .route("/approved", get(handlers::ideas::list_approved))
        .route("/search", get(handlers::ideas::search))
        .route(
            "/{id}",
            put(handlers::ideas::update_idea).delete(handlers::ideas::delete_idea),
        );

    let admin_routes = Router::new()
        .route("/ideas", get(handlers::admin::list_ideas))
        .route("/ideas/{id}/status", put(handlers::admin::update_idea_status))
        .route("/ideas/{id}", delete(handlers::admin::delete_idea))
        .route("/users", get(handlers::admin::list_users))
        .route("/users/bulk-delete", post(handlers::admin::bulk_delete_users))
        .route("/users/{id}", delete(handlers::admin::delete_user))
        .route("/stats/users", get(handlers::admin::user_stats))
        .route("/stats/ideas", get(handlers::admin::idea_stats))
        .route("/stats/ideas-status", get(handlers::admin::idea_status_stats));

    let api_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/validate-token", get(handlers::auth::validate_token))
        .route("/assistant", post(handlers::assistant::ask))
        .route("/groq", post(handlers::assistant::ask))
        .nest("/ideas", idea_routes)
        .nest("/admin", admin_routes);

    let mut router = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api", api_routes)
        .route_layer(from_fn(middleware::metrics::track_requests));

    if config.rate_limit.enabled {
        router = router.layer(from_fn_with_state(
            RateLimitState::new(&config.rate_limit),
            rate_limit_middleware,
        ));
    }

    router
        .layer(from_fn(middleware::request_id::attach_request_id))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
