mod config;
mod dialogue;
mod errors;
mod llm_client;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dialogue::registry::SessionRegistry;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::services::assistant::LlmAssistant;
use crate::services::auth::GoTrueAuth;
use crate::services::object_store::S3ObjectStore;
use crate::services::profile_store::PgProfileStore;
use crate::services::Services;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting recruiter API v{}", env!("CARGO_PKG_VERSION"));

    let profiles = PgProfileStore::connect(&config.database_url).await?;

    let s3 = build_s3_client(&config).await;
    let objects = S3ObjectStore::new(s3, config.s3_bucket.clone(), config.s3_public_url.clone());
    info!("Object store ready (bucket: {})", config.s3_bucket);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let auth = GoTrueAuth::new(config.auth_url.clone(), config.auth_anon_key.clone())?;

    let services = Services {
        assistant: Arc::new(LlmAssistant::new(llm)),
        profiles: Arc::new(profiles),
        objects: Arc::new(objects),
        auth: Arc::new(auth),
        request_timeout: config.request_timeout,
    };

    let sessions = SessionRegistry::default();
    sessions.spawn_sweeper(config.session_idle_ttl, SESSION_SWEEP_INTERVAL);

    let state = AppState { sessions, services };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client for MinIO or any S3-compatible gateway. Path-style addressing
/// keeps the bucket in the URL path, which those gateways expect.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "recruiter-static",
    );

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
