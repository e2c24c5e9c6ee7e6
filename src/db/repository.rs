//! Repository for intake database operations
//!
//! Every `get_or_create_*` method implements natural-key idempotence:
//! select on the entity's natural key first, insert only on a miss, and
//! report whether a row was created so the caller can decide on citations.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::DbError;
use super::models::{
    CaseRow, CitationRow, ClientRow, CommunicationRow, DamageRow, InsuranceCarrierRow, LawFirmRow,
    MedicalFacilityRow, MedicalProviderRow, OtherPartyRow, TreatmentRow,
};
use crate::model::{Channel, ParseStatus};

/// Repository over the intake schema
#[derive(Clone)]
pub struct IntakeRepository {
    pool: PgPool,
}

impl IntakeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Law firms
    // ------------------------------------------------------------------

    pub async fn get_law_firm(&self, id: Uuid) -> Result<LawFirmRow, DbError> {
        sqlx::query_as("SELECT * FROM law_firms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("law firm {id}")))
    }

    pub async fn get_or_create_law_firm(&self, name: &str) -> Result<LawFirmRow, DbError> {
        if let Some(row) = sqlx::query_as::<_, LawFirmRow>(
            "SELECT * FROM law_firms WHERE name = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok(row);
        }

        let row: LawFirmRow =
            sqlx::query_as("INSERT INTO law_firms (id, name) VALUES ($1, $2) RETURNING *")
                .bind(Uuid::new_v4())
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        tracing::debug!(id = %row.id, name = %name, "Created law firm");
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Clients and cases
    // ------------------------------------------------------------------

    /// All clients of a firm, most recently created first. Name matching
    /// happens in the matcher so its case-insensitivity stays unit-testable.
    pub async fn clients_for_firm(&self, law_firm_id: Uuid) -> Result<Vec<ClientRow>, DbError> {
        let rows = sqlx::query_as(
            "SELECT * FROM clients WHERE law_firm_id = $1 ORDER BY created_at DESC",
        )
        .bind(law_firm_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_or_create_client(
        &self,
        law_firm_id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<(ClientRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT * FROM clients
            WHERE law_firm_id = $1 AND first_name = $2 AND last_name = $3
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(law_firm_id)
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: ClientRow = sqlx::query_as(
            r#"
            INSERT INTO clients (id, law_firm_id, first_name, last_name)
            VALUES ($1, $2, $3, $4) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(law_firm_id)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, "Created client");
        Ok((row, true))
    }

    pub async fn get_case(&self, id: Uuid) -> Result<CaseRow, DbError> {
        sqlx::query_as("SELECT * FROM cases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("case {id}")))
    }

    /// A client's cases in creation order (the matcher's tie-break order)
    pub async fn cases_for_client(&self, client_id: Uuid) -> Result<Vec<CaseRow>, DbError> {
        let rows = sqlx::query_as("SELECT * FROM cases WHERE client_id = $1 ORDER BY created_at")
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_case(
        &self,
        client_id: Uuid,
        case_number: &str,
        incident_type: &str,
        incident_date: Option<NaiveDate>,
        incident_location: &str,
    ) -> Result<CaseRow, DbError> {
        let row: CaseRow = sqlx::query_as(
            r#"
            INSERT INTO cases (id, client_id, case_number, status, incident_type, incident_date, incident_location)
            VALUES ($1, $2, $3, 'open', $4, $5, $6) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(case_number)
        .bind(incident_type)
        .bind(incident_date)
        .bind(incident_location)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, case_number = %case_number, "Created case");
        Ok(row)
    }

    /// Fill incident fields that are still unset. `None` / empty columns are
    /// the only ones touched.
    pub async fn update_case_incident(
        &self,
        case_id: Uuid,
        incident_date: Option<NaiveDate>,
        incident_type: Option<&str>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            UPDATE cases SET
                incident_date = COALESCE(incident_date, $2),
                incident_type = CASE WHEN incident_type = '' THEN COALESCE($3, incident_type)
                                     ELSE incident_type END
            WHERE id = $1
            "#,
        )
        .bind(case_id)
        .bind(incident_date)
        .bind(incident_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Classified entities
    // ------------------------------------------------------------------

    pub async fn get_or_create_other_party(
        &self,
        case_id: Uuid,
        first_name: &str,
        last_name: &str,
        company_name: &str,
        role: &str,
    ) -> Result<(OtherPartyRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, OtherPartyRow>(
            r#"
            SELECT * FROM other_parties
            WHERE case_id = $1 AND first_name = $2 AND last_name = $3 AND company_name = $4
            LIMIT 1
            "#,
        )
        .bind(case_id)
        .bind(first_name)
        .bind(last_name)
        .bind(company_name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: OtherPartyRow = sqlx::query_as(
            r#"
            INSERT INTO other_parties (id, case_id, first_name, last_name, company_name, role)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(first_name)
        .bind(last_name)
        .bind(company_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, case_id = %case_id, "Created other party");
        Ok((row, true))
    }

    pub async fn get_or_create_facility(
        &self,
        name: &str,
    ) -> Result<(MedicalFacilityRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, MedicalFacilityRow>(
            "SELECT * FROM medical_facilities WHERE name = $1 LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: MedicalFacilityRow = sqlx::query_as(
            "INSERT INTO medical_facilities (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, name = %name, "Created medical facility");
        Ok((row, true))
    }

    pub async fn get_or_create_provider(
        &self,
        first_name: &str,
        last_name: &str,
        facility_id: Option<Uuid>,
        specialty: &str,
    ) -> Result<(MedicalProviderRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, MedicalProviderRow>(
            "SELECT * FROM medical_providers WHERE first_name = $1 AND last_name = $2 LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: MedicalProviderRow = sqlx::query_as(
            r#"
            INSERT INTO medical_providers (id, facility_id, first_name, last_name, specialty)
            VALUES ($1, $2, $3, $4, $5) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(facility_id)
        .bind(first_name)
        .bind(last_name)
        .bind(specialty)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, "Created medical provider");
        Ok((row, true))
    }

    pub async fn get_or_create_treatment(
        &self,
        case_id: Uuid,
        provider_id: Option<Uuid>,
        treatment_type: &str,
        diagnosis: &str,
    ) -> Result<TreatmentRow, DbError> {
        if let Some(row) = sqlx::query_as::<_, TreatmentRow>(
            "SELECT * FROM treatments WHERE case_id = $1 AND provider_id IS NOT DISTINCT FROM $2 LIMIT 1",
        )
        .bind(case_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok(row);
        }

        let row: TreatmentRow = sqlx::query_as(
            r#"
            INSERT INTO treatments (id, case_id, provider_id, treatment_type, diagnosis)
            VALUES ($1, $2, $3, $4, $5) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(provider_id)
        .bind(treatment_type)
        .bind(diagnosis)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, case_id = %case_id, "Created treatment");
        Ok(row)
    }

    pub async fn get_or_create_damage(
        &self,
        case_id: Uuid,
        category: &str,
        description: &str,
        estimated_amount: Option<f64>,
    ) -> Result<(DamageRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, DamageRow>(
            "SELECT * FROM damages WHERE case_id = $1 AND category = $2 LIMIT 1",
        )
        .bind(case_id)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: DamageRow = sqlx::query_as(
            r#"
            INSERT INTO damages (id, case_id, category, description, estimated_amount)
            VALUES ($1, $2, $3, $4, $5) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(category)
        .bind(description)
        .bind(estimated_amount)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, case_id = %case_id, category = %category, "Created damage");
        Ok((row, true))
    }

    pub async fn get_or_create_carrier(
        &self,
        case_id: Uuid,
        company_name: &str,
        coverage_type: &str,
        policy_number: &str,
        claim_number: &str,
        adjuster_name: &str,
    ) -> Result<(InsuranceCarrierRow, bool), DbError> {
        if let Some(row) = sqlx::query_as::<_, InsuranceCarrierRow>(
            "SELECT * FROM insurance_carriers WHERE case_id = $1 AND company_name = $2 LIMIT 1",
        )
        .bind(case_id)
        .bind(company_name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((row, false));
        }

        let row: InsuranceCarrierRow = sqlx::query_as(
            r#"
            INSERT INTO insurance_carriers
                (id, case_id, company_name, policy_number, claim_number, coverage_type, adjuster_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(company_name)
        .bind(policy_number)
        .bind(claim_number)
        .bind(coverage_type)
        .bind(adjuster_name)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, case_id = %case_id, "Created insurance carrier");
        Ok((row, true))
    }

    // ------------------------------------------------------------------
    // Communications
    // ------------------------------------------------------------------

    pub async fn create_communication(
        &self,
        client_id: Uuid,
        case_id: Option<Uuid>,
        channel: Channel,
        raw_transcript: &serde_json::Value,
        parse_status: ParseStatus,
    ) -> Result<CommunicationRow, DbError> {
        let row: CommunicationRow = sqlx::query_as(
            r#"
            INSERT INTO communications (id, client_id, case_id, channel, raw_transcript, parse_status)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(case_id)
        .bind(channel.as_str())
        .bind(raw_transcript)
        .bind(parse_status.as_str())
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = %row.id, client_id = %client_id, "Created communication");
        Ok(row)
    }

    pub async fn get_communication(&self, id: Uuid) -> Result<CommunicationRow, DbError> {
        sqlx::query_as("SELECT * FROM communications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("communication {id}")))
    }

    pub async fn set_parse_status(
        &self,
        communication_id: Uuid,
        status: ParseStatus,
    ) -> Result<(), DbError> {
        sqlx::query("UPDATE communications SET parse_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(communication_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Citations
    // ------------------------------------------------------------------

    pub async fn insert_citation(
        &self,
        communication_id: Uuid,
        citation_key: &str,
        cited_text: &str,
        turn_index: Option<i32>,
        confidence_score: f64,
    ) -> Result<CitationRow, DbError> {
        let row: CitationRow = sqlx::query_as(
            r#"
            INSERT INTO citations (id, communication_id, citation_key, cited_text, turn_index, confidence_score)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(communication_id)
        .bind(citation_key)
        .bind(cited_text)
        .bind(turn_index)
        .bind(confidence_score)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert_citation_reference(
        &self,
        citation_id: Uuid,
        target_kind: &str,
        target_id: Uuid,
        relationship_label: &str,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO citation_references (id, citation_id, target_kind, target_id, relationship_label)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(citation_id)
        .bind(target_kind)
        .bind(target_id)
        .bind(relationship_label)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn citations_for_communication(
        &self,
        communication_id: Uuid,
    ) -> Result<Vec<CitationRow>, DbError> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM citations WHERE communication_id = $1
            ORDER BY citation_key, confidence_score DESC
            "#,
        )
        .bind(communication_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
