//! dlens-aa library interface
//!
//! Exposes the application state, router, and analysis components for the
//! binary and for integration tests.

pub mod advice;
pub mod analysis;
pub mod api;
pub mod config;
pub mod db;
pub mod detector;
pub mod error;
pub mod models;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use crate::advice::{AdviceCache, AdviceGenerator};
use crate::analysis::{BatchCoordinator, RegionPipeline};
use crate::detector::DetectorHandle;
use crate::storage::SnapshotStore;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Injected detection capability (possibly unavailable)
    pub detector: DetectorHandle,
    /// Upload batch coordinator
    pub coordinator: BatchCoordinator,
    /// Advice document cache
    pub advice: AdviceCache,
    /// Uploads root directory, also served statically
    pub uploads_root: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        detector: DetectorHandle,
        generator: Arc<dyn AdviceGenerator>,
        uploads_root: PathBuf,
    ) -> Self {
        let store = SnapshotStore::new(&uploads_root);
        let pipeline = RegionPipeline::new(detector.clone());
        let coordinator = BatchCoordinator::new(db.clone(), pipeline, store.clone());
        let advice = AdviceCache::new(store, generator);
        Self {
            db,
            detector,
            coordinator,
            advice,
            uploads_root,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::upload_routes())
        .merge(api::result_routes())
        .merge(api::advice_routes())
        .merge(api::user_routes())
        .merge(api::health_routes())
        .nest_service("/uploads", ServeDir::new(&state.uploads_root))
        .layer(cors)
        .with_state(state)
}
