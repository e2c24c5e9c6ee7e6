//! Application state and service initialization
//!
//! Centralizes service construction and dependency injection so the binary
//! entrypoint stays a thin wiring layer.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repository::IntakeRepository;
use crate::service::{IntakeService, LlmClient, TranscriptExtractor};

/// Application state containing all services and shared resources
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Repository over the intake schema
    pub repository: IntakeRepository,
    /// Intake pipeline service
    pub intake_service: IntakeService,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. LLM client initialization (requires OPENAI_API_KEY)
    /// 3. Service dependency graph construction
    pub async fn new() -> Result<Self, AppError> {
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // The extraction credential is required; a missing key must never
        // degrade into empty extraction results.
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AppError::MissingConfig("OPENAI_API_KEY"))?;

        let llm_client =
            LlmClient::new(&api_key).map_err(|_| AppError::InvalidConfig("Invalid OPENAI_API_KEY"))?;

        let repository = IntakeRepository::new(db_pool.clone());
        let extractor = Arc::new(TranscriptExtractor::new(llm_client));
        let intake_service = IntakeService::new(repository.clone(), extractor);

        Ok(Self {
            db_pool,
            repository,
            intake_service,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
