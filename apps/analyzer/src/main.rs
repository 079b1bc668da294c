mod analysis;
mod config;
mod documents;
mod errors;
mod extraction;
mod job_description;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::invoker::AnalysisInvoker;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::{Config, StorageConfig};
use crate::documents::{DocumentStore, LocalDocumentStore, S3DocumentStore};
use crate::extraction::PdfTextExtractor;
use crate::job_description::PlaceholderResolver;
use crate::llm_client::{GeminiClient, GenerationConfig};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing required env vars
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer v{}", env!("CARGO_PKG_VERSION"));

    let store = build_document_store(&config.storage).await?;

    let model = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let pipeline = AnalysisPipeline::new(
        store,
        Arc::new(PdfTextExtractor::new()),
        Arc::new(PlaceholderResolver),
        AnalysisInvoker::new(model, GenerationConfig::default(), config.llm_timeout),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_document_store(storage: &StorageConfig) -> Result<Arc<dyn DocumentStore>> {
    match storage {
        StorageConfig::Local { upload_dir } => {
            let store = LocalDocumentStore::new(upload_dir.clone()).await?;
            info!("Storing uploads under {}", upload_dir.display());
            Ok(Arc::new(store))
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let client =
                build_s3_client(endpoint, region, access_key_id, secret_access_key).await;
            info!("Storing uploads in S3 bucket {bucket}");
            Ok(Arc::new(S3DocumentStore::new(client, bucket.clone())))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    region: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "analyzer-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
