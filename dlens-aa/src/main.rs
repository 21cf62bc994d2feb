//! dlens-aa - Acne Analysis Microservice
//!
//! Ingests three facial-region photos per user, counts and classifies acne
//! lesions with an ONNX detection model, grades severity per region, persists
//! results, and serves cached care advice.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dlens_aa::advice::WebhookAdviceClient;
use dlens_aa::config::ServiceConfig;
use dlens_aa::detector::{DetectorHandle, OnnxLesionDetector};
use dlens_aa::AppState;

/// DermaLens acne analysis microservice
#[derive(Debug, Parser)]
#[command(name = "dlens-aa", version)]
struct Args {
    /// Root folder for uploads, snapshots, and the database
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// ONNX detection model path
    #[arg(long)]
    model: Option<PathBuf>,

    /// HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting dlens-aa (Acne Analysis) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve and bootstrap the root folder
    let root_folder = dlens_common::config::resolve_root_folder(args.root_folder.as_deref());
    let uploads_root = dlens_common::config::ensure_root_folder(&root_folder)
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", root_folder.display());

    // Open or create the database
    let db_path = dlens_common::config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let db_pool = dlens_aa::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let config = ServiceConfig::resolve(&root_folder, args.model.as_deref(), args.port);

    // Load the detection model; the service starts either way and serves
    // degraded analyses until a model is available.
    let detector = match OnnxLesionDetector::load(&config.model_path) {
        Ok(detector) => {
            info!("Detection model loaded: {}", config.model_path.display());
            DetectorHandle::ready(detector)
        }
        Err(e) => {
            warn!("Detection model unavailable, serving degraded results: {e}");
            DetectorHandle::unavailable(e.to_string())
        }
    };

    let generator = Arc::new(WebhookAdviceClient::new(config.advice_webhook_url.clone()));

    // Create application state and router
    let state = AppState::new(db_pool, detector, generator, uploads_root);
    let app = dlens_aa::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on http://0.0.0.0:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
