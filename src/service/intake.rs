//! Intake pipeline orchestration
//!
//! Two entry points share the extraction, classification, matching,
//! citation, and risk stages: `parse_communication` re-parses a stored
//! communication, `ingest` bootstraps law firm, client, case, and
//! communication records from raw transcript turns.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DbError;
use crate::db::models::CaseRow;
use crate::db::repository::IntakeRepository;
use crate::model::{
    Channel, Finding, FindingField, IntakeExtractionResult, ParseStatus, ReferenceTarget,
    TranscriptTurn,
};
use crate::service::citations::{NewCitation, write_citation};
use crate::service::extraction::{ExtractionError, ExtractionRun, FindingExtraction};
use crate::service::matcher::{CaseMatcher, MatchCriteria};
use crate::service::{classify, risk};

/// Error type for the intake pipeline. Lookup misses stay distinct from
/// extraction failures so the API layer can map them to client errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("Law firm not found: {0}")]
    LawFirmNotFound(Uuid),

    #[error("Communication not found: {0}")]
    CommunicationNotFound(Uuid),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Result envelope of a bootstrap ingest
#[derive(Debug)]
pub struct IngestOutcome {
    /// Whether an existing client + case were reused
    pub matched: bool,
    pub law_firm_id: Uuid,
    pub client_id: Uuid,
    pub case_id: Uuid,
    pub communication_id: Uuid,
    pub result: IntakeExtractionResult,
}

/// Service orchestrating the intake pipeline
#[derive(Clone)]
pub struct IntakeService {
    repo: IntakeRepository,
    extractor: Arc<dyn FindingExtraction>,
}

impl IntakeService {
    pub fn new(repo: IntakeRepository, extractor: Arc<dyn FindingExtraction>) -> Self {
        Self { repo, extractor }
    }

    /// Re-parse a stored communication's transcript and persist the
    /// classified entities onto its case (when it has one). The parse
    /// status moves processing → done, or → failed on extraction error.
    pub async fn parse_communication(
        &self,
        communication_id: Uuid,
    ) -> Result<IntakeExtractionResult, IntakeError> {
        let communication =
            self.repo
                .get_communication(communication_id)
                .await
                .map_err(|e| match e {
                    DbError::NotFound(_) => IntakeError::CommunicationNotFound(communication_id),
                    other => IntakeError::Db(other),
                })?;

        self.repo
            .set_parse_status(communication.id, ParseStatus::Processing)
            .await?;

        let turns = communication.turns();
        let run = ExtractionRun::new(Arc::clone(&self.extractor));
        let findings = match run.findings(&turns).await {
            Ok(findings) => findings,
            Err(e) => {
                if let Err(status_err) = self
                    .repo
                    .set_parse_status(communication.id, ParseStatus::Failed)
                    .await
                {
                    tracing::warn!(
                        communication_id = %communication.id,
                        error = %status_err,
                        "Could not mark communication as failed"
                    );
                }
                return Err(e.into());
            }
        };

        let mut result = classify::build_result(&findings);
        result.raw_flags = risk::flag_risks(&result, &findings, Utc::now().date_naive());

        if let Some(case_id) = communication.case_id {
            let case = self.repo.get_case(case_id).await?;
            self.persist(&case, &result, communication.id).await?;
        }

        self.repo
            .set_parse_status(communication.id, ParseStatus::Done)
            .await?;

        tracing::info!(
            communication_id = %communication.id,
            finding_count = findings.len(),
            flag_count = result.raw_flags.len(),
            "Communication parsed"
        );

        Ok(result)
    }

    /// Bootstrap ingest: resolve or create law firm → client → case →
    /// communication from raw turns, persist classified entities, and
    /// return the outcome envelope. `matched = true` means an existing
    /// client + case were found and reused.
    pub async fn ingest(
        &self,
        turns: Vec<TranscriptTurn>,
        law_firm_id: Option<Uuid>,
    ) -> Result<IngestOutcome, IntakeError> {
        // One extraction call; every stage below consumes this finding set.
        let run = ExtractionRun::new(Arc::clone(&self.extractor));
        let findings = run.findings(&turns).await?;
        let meta = classify::metadata_index(&findings);

        let law_firm = match law_firm_id {
            Some(id) => self.repo.get_law_firm(id).await.map_err(|e| match e {
                DbError::NotFound(_) => IntakeError::LawFirmNotFound(id),
                other => IntakeError::Db(other),
            })?,
            None => {
                let name = meta
                    .get(&FindingField::LawFirmName)
                    .map(|f| f.value.as_str())
                    .unwrap_or("Unknown Law Firm");
                self.repo.get_or_create_law_firm(name).await?
            }
        };

        let caller_name = meta
            .get(&FindingField::CallerName)
            .map(|f| f.value.clone())
            .unwrap_or_default();
        let (first_name, last_name) = classify::split_name(&caller_name);

        let info = classify::incident_info(&findings);
        let criteria = MatchCriteria {
            incident_type: info.incident_type,
            incident_date: info.incident_date,
            incident_location: info.incident_location.clone(),
        };

        // Try to match an existing client + case before creating anything
        let existing = CaseMatcher::new(&self.repo)
            .find_existing_case(law_firm.id, &first_name, &last_name, &criteria)
            .await?;
        let matched = existing.is_some();

        let (client, case) = match existing {
            Some(pair) => pair,
            None => {
                let (client, _) = self
                    .repo
                    .get_or_create_client(law_firm.id, &first_name, &last_name)
                    .await?;
                let case = self
                    .repo
                    .create_case(
                        client.id,
                        &new_case_number(),
                        info.incident_type.map(|t| t.as_str()).unwrap_or(""),
                        info.incident_date,
                        info.incident_location.as_deref().unwrap_or(""),
                    )
                    .await?;
                (client, case)
            }
        };

        let transcript_json =
            serde_json::to_value(&turns).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
        let communication = self
            .repo
            .create_communication(
                client.id,
                Some(case.id),
                Channel::Phone,
                &transcript_json,
                ParseStatus::Processing,
            )
            .await?;

        // Identity citations only when this call created the records; a
        // matched case already has them on record.
        if !matched {
            self.write_metadata_citations(communication.id, &meta, client.id)
                .await;
        }

        let mut result = classify::build_result(&findings);
        result.raw_flags = risk::flag_risks(&result, &findings, Utc::now().date_naive());

        self.persist(&case, &result, communication.id).await?;

        self.repo
            .set_parse_status(communication.id, ParseStatus::Done)
            .await?;

        tracing::info!(
            matched,
            law_firm_id = %law_firm.id,
            client_id = %client.id,
            case_id = %case.id,
            communication_id = %communication.id,
            "Bootstrap ingest complete"
        );

        Ok(IngestOutcome {
            matched,
            law_firm_id: law_firm.id,
            client_id: client.id,
            case_id: case.id,
            communication_id: communication.id,
            result,
        })
    }

    /// Citations for the metadata findings that drove client and case
    /// creation. The caller-name citation references the client; the
    /// incident-field citations point at the case implicitly through the
    /// owning communication.
    async fn write_metadata_citations(
        &self,
        communication_id: Uuid,
        meta: &HashMap<FindingField, &Finding>,
        client_id: Uuid,
    ) {
        if let Some(finding) = meta.get(&FindingField::CallerName) {
            write_citation(
                &self.repo,
                communication_id,
                citation_from_finding("caller_name", finding),
                Some((ReferenceTarget::Client(client_id), "identified caller")),
            )
            .await;
        }

        for (key, field) in [
            ("accident_date", FindingField::AccidentDate),
            ("case_type", FindingField::CaseType),
            ("incident_location", FindingField::IncidentLocation),
        ] {
            if let Some(finding) = meta.get(&field) {
                write_citation(
                    &self.repo,
                    communication_id,
                    citation_from_finding(key, finding),
                    None,
                )
                .await;
            }
        }
    }

    /// Persist a classified result onto a case via natural-key upserts,
    /// writing one citation per created fact.
    async fn persist(
        &self,
        case: &CaseRow,
        result: &IntakeExtractionResult,
        communication_id: Uuid,
    ) -> Result<(), DbError> {
        // Fill incident fields that are still unset on the case
        let new_date = result.incident_date.filter(|_| case.incident_date.is_none());
        let new_type = result
            .incident_type
            .filter(|_| case.incident_type.is_empty())
            .map(|t| t.as_str());
        if new_date.is_some() || new_type.is_some() {
            self.repo
                .update_case_incident(case.id, new_date, new_type)
                .await?;
        }

        for party in &result.other_parties {
            let (row, created) = self
                .repo
                .get_or_create_other_party(
                    case.id,
                    &party.first_name,
                    &party.last_name,
                    &party.company_name,
                    &party.role,
                )
                .await?;
            if created {
                write_citation(
                    &self.repo,
                    communication_id,
                    NewCitation::from_provenance("other_party", &party.provenance),
                    Some((ReferenceTarget::OtherParty(row.id), "at-fault party")),
                )
                .await;
            }
        }

        for provider in &result.medical_providers {
            if provider.facility_name.is_empty() {
                let (row, created) = self
                    .repo
                    .get_or_create_provider(
                        &provider.first_name,
                        &provider.last_name,
                        None,
                        &provider.specialty,
                    )
                    .await?;
                if created {
                    write_citation(
                        &self.repo,
                        communication_id,
                        NewCitation::from_provenance("medical_provider", &provider.provenance),
                        Some((ReferenceTarget::MedicalProvider(row.id), "treating provider")),
                    )
                    .await;
                }
                self.repo
                    .get_or_create_treatment(
                        case.id,
                        Some(row.id),
                        &provider.treatment_type,
                        &provider.diagnosis,
                    )
                    .await?;
            } else {
                // Facilities are outside the referenceable set: citation
                // without a reference.
                let (_, created) = self
                    .repo
                    .get_or_create_facility(&provider.facility_name)
                    .await?;
                if created {
                    write_citation(
                        &self.repo,
                        communication_id,
                        NewCitation::from_provenance("medical_provider", &provider.provenance),
                        None,
                    )
                    .await;
                }
                self.repo
                    .get_or_create_treatment(
                        case.id,
                        None,
                        &provider.treatment_type,
                        &provider.diagnosis,
                    )
                    .await?;
            }
        }

        for damage in &result.damages {
            let (_, created) = self
                .repo
                .get_or_create_damage(
                    case.id,
                    damage.category.as_str(),
                    &damage.description,
                    damage.estimated_amount,
                )
                .await?;
            if created {
                write_citation(
                    &self.repo,
                    communication_id,
                    NewCitation::from_provenance("financial_expense", &damage.provenance),
                    None,
                )
                .await;
            }
        }

        for carrier in &result.insurance_carriers {
            let (row, created) = self
                .repo
                .get_or_create_carrier(
                    case.id,
                    &carrier.company_name,
                    carrier.coverage_type.as_str(),
                    &carrier.policy_number,
                    &carrier.claim_number,
                    &carrier.adjuster_name,
                )
                .await?;
            if created {
                write_citation(
                    &self.repo,
                    communication_id,
                    NewCitation::from_provenance("insurance_provider", &carrier.provenance),
                    Some((ReferenceTarget::InsuranceCarrier(row.id), "insurance carrier")),
                )
                .await;
            }
        }

        Ok(())
    }
}

fn citation_from_finding<'a>(key: &'a str, finding: &'a Finding) -> NewCitation<'a> {
    NewCitation {
        key,
        cited_text: finding.quote_or_value(),
        turn_index: finding.first_turn_index,
        confidence: finding.confidence,
    }
}

fn new_case_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("INTAKE-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::db::models::{CaseRow, ClientRow};
    use crate::model::{DamageCategory, IncidentType, RiskFlag};
    use crate::service::extraction::parse_findings;
    use crate::service::matcher::{MatchTier, match_case};

    #[test]
    fn case_numbers_have_the_intake_prefix_and_short_id() {
        let number = new_case_number();
        assert!(number.starts_with("INTAKE-"));
        let suffix = &number["INTAKE-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    /// The full first-contact scenario, from raw model output through
    /// classification and risk flagging.
    #[test]
    fn first_contact_scenario_classifies_end_to_end() {
        let raw = r#"{"findings": [
            {"finding_type": "metadata", "field": "caller_name", "value": "Jane Smith",
             "transcript_index": 1, "transcript_indices": [1, 4],
             "quote": "My name is Jane Smith.", "confidence": "high"},
            {"finding_type": "metadata", "field": "case_type", "value": "auto_accident",
             "transcript_index": 2, "transcript_indices": [2],
             "quote": "I was in a car accident.", "confidence": "high"},
            {"finding_type": "metadata", "field": "accident_date", "value": "2024-03-03",
             "transcript_index": 3, "transcript_indices": [3],
             "quote": "It happened on March 3rd.", "confidence": "high"},
            {"finding_type": "metadata", "field": "incident_location",
             "value": "123 Main St, Springfield",
             "transcript_index": 3, "transcript_indices": [3],
             "quote": "At 123 Main St in Springfield.", "confidence": "high"},
            {"finding_type": "individual", "field": "other_party",
             "value": "Acme Trucking LLC",
             "transcript_index": 5, "transcript_indices": [5],
             "quote": "The Acme Trucking truck ran the light.", "confidence": "high"},
            {"finding_type": "individual", "field": "medical_provider",
             "value": "Dr. John Lee",
             "transcript_index": 7, "transcript_indices": [7],
             "quote": "I saw Dr. John Lee.", "confidence": "high"},
            {"finding_type": "individual", "field": "medical_provider",
             "value": "St. Mary's Hospital",
             "transcript_index": 7, "transcript_indices": [7, 9],
             "quote": "He works at St. Mary's Hospital.", "confidence": "high"},
            {"finding_type": "individual", "field": "financial_expense",
             "value": "my medical bills are piling up",
             "transcript_index": 10, "transcript_indices": [10],
             "quote": "My medical bills are piling up.", "confidence": "medium"}
        ]}"#;

        let findings = parse_findings(raw).unwrap();
        let mut result = classify::build_result(&findings);
        result.raw_flags = risk::flag_risks(
            &result,
            &findings,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );

        assert_eq!(result.incident_type, Some(IncidentType::Auto));
        assert_eq!(
            result.incident_date,
            NaiveDate::from_ymd_opt(2024, 3, 3)
        );
        assert_eq!(
            result.incident_location.as_deref(),
            Some("123 Main St, Springfield")
        );

        // One company-classified party, no person names
        assert_eq!(result.other_parties.len(), 1);
        assert_eq!(result.other_parties[0].company_name, "Acme Trucking LLC");
        assert_eq!(result.other_parties[0].first_name, "");

        // One individual provider and one facility
        let individuals: Vec<_> = result
            .medical_providers
            .iter()
            .filter(|p| p.facility_name.is_empty())
            .collect();
        let facilities: Vec<_> = result
            .medical_providers
            .iter()
            .filter(|p| !p.facility_name.is_empty())
            .collect();
        assert_eq!(individuals.len(), 1);
        assert_eq!(individuals[0].first_name, "John");
        assert_eq!(individuals[0].last_name, "Lee");
        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].facility_name, "St. Mary's Hospital");

        // One medical damage with no amount, and no carriers at all
        assert_eq!(result.damages.len(), 1);
        assert_eq!(result.damages[0].category, DamageCategory::Medical);
        assert_eq!(result.damages[0].estimated_amount, None);
        assert!(result.insurance_carriers.is_empty());

        assert!(result.raw_flags.contains(&RiskFlag::UninsuredMotorist));
        assert!(!result.raw_flags.contains(&RiskFlag::MultipleDefendants));
    }

    /// A second call about the same incident must land on the first call's
    /// case: the criteria the classifier derives match the case the first
    /// ingest would have created.
    #[test]
    fn reingest_criteria_match_the_originally_created_case() {
        let incident_date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let client = ClientRow {
            id: Uuid::new_v4(),
            law_firm_id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            created_at: Utc::now(),
        };
        let case = CaseRow {
            id: Uuid::new_v4(),
            client_id: client.id,
            case_number: new_case_number(),
            status: "open".to_string(),
            incident_type: IncidentType::Auto.as_str().to_string(),
            incident_date: Some(incident_date),
            incident_location: "123 Main St, Springfield".to_string(),
            created_at: Utc::now(),
        };

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: Some(incident_date),
            incident_location: Some("123 Main Street in Springfield".to_string()),
        };

        let cases = vec![case.clone()];
        let (matched, tier) = match_case(&cases, &criteria).unwrap();
        assert_eq!(matched.id, case.id);
        assert_eq!(tier, MatchTier::IncidentDate);
    }
}
