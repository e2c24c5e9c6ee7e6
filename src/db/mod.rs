//! Database module for PostgreSQL persistence

pub mod models;
pub mod repository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "INTAKE_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "INTAKE_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "INTAKE_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "INTAKE_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "INTAKE_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "intake";
const DEFAULT_POSTGRES_PASSWORD: &str = "intake";
const DEFAULT_POSTGRES_DB: &str = "intake";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS law_firms (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id UUID PRIMARY KEY,
            law_firm_id UUID NOT NULL REFERENCES law_firms(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id UUID PRIMARY KEY,
            client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            case_number TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'open',
            incident_type TEXT NOT NULL DEFAULT '',
            incident_date DATE,
            incident_location TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS other_parties (
            id UUID PRIMARY KEY,
            case_id UUID NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            company_name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medical_facilities (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medical_providers (
            id UUID PRIMARY KEY,
            facility_id UUID REFERENCES medical_facilities(id) ON DELETE SET NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            specialty TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS treatments (
            id UUID PRIMARY KEY,
            case_id UUID NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
            provider_id UUID REFERENCES medical_providers(id) ON DELETE SET NULL,
            treatment_type TEXT NOT NULL DEFAULT '',
            diagnosis TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS damages (
            id UUID PRIMARY KEY,
            case_id UUID NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
            category TEXT NOT NULL DEFAULT 'other',
            description TEXT NOT NULL DEFAULT '',
            estimated_amount DOUBLE PRECISION,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insurance_carriers (
            id UUID PRIMARY KEY,
            case_id UUID NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
            company_name TEXT NOT NULL,
            policy_number TEXT NOT NULL DEFAULT '',
            claim_number TEXT NOT NULL DEFAULT '',
            coverage_type TEXT NOT NULL DEFAULT 'liability',
            adjuster_name TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS communications (
            id UUID PRIMARY KEY,
            client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            case_id UUID REFERENCES cases(id) ON DELETE SET NULL,
            channel TEXT NOT NULL DEFAULT 'phone',
            raw_transcript JSONB NOT NULL DEFAULT '[]',
            parse_status TEXT NOT NULL DEFAULT 'pending',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS citations (
            id UUID PRIMARY KEY,
            communication_id UUID NOT NULL REFERENCES communications(id) ON DELETE CASCADE,
            citation_key TEXT NOT NULL,
            cited_text TEXT NOT NULL,
            turn_index INTEGER,
            confidence_score DOUBLE PRECISION NOT NULL DEFAULT 1.0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS citation_references (
            id UUID PRIMARY KEY,
            citation_id UUID NOT NULL REFERENCES citations(id) ON DELETE CASCADE,
            target_kind TEXT NOT NULL,
            target_id UUID NOT NULL,
            relationship_label TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes separately
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_law_firms_name ON law_firms(name)",
        "CREATE INDEX IF NOT EXISTS idx_clients_law_firm ON clients(law_firm_id)",
        "CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(last_name, first_name)",
        "CREATE INDEX IF NOT EXISTS idx_cases_client ON cases(client_id)",
        "CREATE INDEX IF NOT EXISTS idx_cases_incident_date ON cases(incident_date)",
        "CREATE INDEX IF NOT EXISTS idx_other_parties_case ON other_parties(case_id)",
        "CREATE INDEX IF NOT EXISTS idx_medical_facilities_name ON medical_facilities(name)",
        "CREATE INDEX IF NOT EXISTS idx_medical_providers_name ON medical_providers(last_name, first_name)",
        "CREATE INDEX IF NOT EXISTS idx_treatments_case ON treatments(case_id)",
        "CREATE INDEX IF NOT EXISTS idx_damages_case_category ON damages(case_id, category)",
        "CREATE INDEX IF NOT EXISTS idx_insurance_carriers_case ON insurance_carriers(case_id)",
        "CREATE INDEX IF NOT EXISTS idx_communications_client ON communications(client_id)",
        "CREATE INDEX IF NOT EXISTS idx_communications_case ON communications(case_id)",
        "CREATE INDEX IF NOT EXISTS idx_citations_communication ON citations(communication_id)",
        "CREATE INDEX IF NOT EXISTS idx_citations_key_confidence ON citations(citation_key, confidence_score)",
        "CREATE INDEX IF NOT EXISTS idx_citation_references_citation ON citation_references(citation_id)",
        "CREATE INDEX IF NOT EXISTS idx_citation_references_target ON citation_references(target_kind, target_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema initialized");

    Ok(())
}
