//! TopVibes Backend - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod publish;
pub mod render;
pub mod routes;
pub mod seed;
pub mod service;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, BODY_LIMIT_BYTES};
use crate::db::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::logging::LogConfig;
use crate::publish::{DisabledPublisher, GitHubPublisher, Publisher};
use crate::render::TemplateSource;
use crate::service::SiteService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(site: SiteService) -> Self {
        Self {
            site: Arc::new(site),
            started_at: Instant::now(),
        }
    }
}

/// CORS for the admin panel. An empty list allows any origin.
pub fn configure_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

/// Create and configure the application router.
pub fn create_app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/data", get(routes::site::get_data))
        .route("/api/update-hero", post(routes::site::update_hero))
        .route("/api/update-about", post(routes::site::update_about))
        .route("/api/update-telegram", post(routes::site::update_telegram))
        .route("/api/update-shirts", post(routes::site::update_shirts))
        .route("/api/update-discounts", post(routes::site::update_discounts))
        .route("/api/update-footer", post(routes::site::update_footer))
        .route("/api/update-all", post(routes::site::update_all))
        .route("/api/republish", post(routes::site::republish))
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Shirt payloads can embed images
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init(&LogConfig::from_lookup(config::env_var));

    if let Err(e) = start().await {
        tracing::error!("server failed to start: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn start() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("reading configuration")?;

    let template = TemplateSource::new(config.template_path.clone());
    template
        .ensure_readable()
        .await
        .context("checking page template")?;

    let store: Arc<dyn DocumentStore> = match &config.database {
        Some(db_config) => {
            let pool = db::init_pool(db_config)
                .await
                .context("connecting to database")?;
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; edits are lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let publisher: Arc<dyn Publisher> = match config.github.clone() {
        Some(github) => {
            tracing::info!(
                repo = %format!("{}/{}", github.owner, github.repo),
                branch = %github.branch,
                pages_url = %github.pages_url(),
                "publishing to GitHub Pages"
            );
            Arc::new(GitHubPublisher::new(github).context("building GitHub client")?)
        }
        None => {
            tracing::warn!("GitHub settings missing, page publishing disabled");
            Arc::new(DisabledPublisher)
        }
    };

    let site = SiteService::new(store, template, publisher);
    let seed = seed::default_document().context("parsing bundled default document")?;
    if let Some(outcome) = site
        .bootstrap(&seed)
        .await
        .context("preparing document store")?
    {
        tracing::info!(?outcome, "initial page publish");
    }

    let app = create_app(AppState::new(site), configure_cors(&config.allowed_origins));

    let listener = config
        .bind()
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    let addr = listener.local_addr().context("reading bound address")?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
