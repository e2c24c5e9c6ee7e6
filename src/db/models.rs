//! Row types for the intake schema

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::model::TranscriptTurn;

#[derive(Debug, Clone, FromRow)]
pub struct LawFirmRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub law_firm_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub case_number: String,
    pub status: String,
    pub incident_type: String,
    pub incident_date: Option<NaiveDate>,
    pub incident_location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OtherPartyRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MedicalFacilityRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MedicalProviderRow {
    pub id: Uuid,
    pub facility_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TreatmentRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub treatment_type: String,
    pub diagnosis: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DamageRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub category: String,
    pub description: String,
    pub estimated_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InsuranceCarrierRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub company_name: String,
    pub policy_number: String,
    pub claim_number: String,
    pub coverage_type: String,
    pub adjuster_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommunicationRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub case_id: Option<Uuid>,
    pub channel: String,
    pub raw_transcript: serde_json::Value,
    pub parse_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunicationRow {
    /// Decode the stored transcript. A malformed payload yields an empty
    /// transcript rather than an error; the extraction stage then treats it
    /// like any empty input.
    pub fn turns(&self) -> Vec<TranscriptTurn> {
        match serde_json::from_value(self.raw_transcript.clone()) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(
                    communication_id = %self.id,
                    error = %e,
                    "Stored transcript is not a valid turn array"
                );
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize, utoipa::ToSchema)]
pub struct CitationRow {
    pub id: Uuid,
    pub communication_id: Uuid,
    pub citation_key: String,
    pub cited_text: String,
    pub turn_index: Option<i32>,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}
