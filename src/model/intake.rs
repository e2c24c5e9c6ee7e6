//! Domain enums, classified entity records, and the pipeline result type

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::findings::Confidence;

/// Incident type a case is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Auto,
    SlipFall,
    MedicalMalpractice,
    ProductLiability,
    Workplace,
    Other,
}

impl IncidentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::Auto => "auto",
            IncidentType::SlipFall => "slip_fall",
            IncidentType::MedicalMalpractice => "medical_malpractice",
            IncidentType::ProductLiability => "product_liability",
            IncidentType::Workplace => "workplace",
            IncidentType::Other => "other",
        }
    }

    /// Map a raw case-type label from the extraction model onto a case
    /// incident type. Unrecognized labels land on `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "auto" | "auto_accident" | "auto accident" => IncidentType::Auto,
            "slip_fall" | "slip and fall" => IncidentType::SlipFall,
            "medical_malpractice" | "medical malpractice" => IncidentType::MedicalMalpractice,
            "product_liability" | "product liability" => IncidentType::ProductLiability,
            "workers_comp" | "workers compensation" | "workplace" => IncidentType::Workplace,
            _ => IncidentType::Other,
        }
    }
}

/// Damage category for persisted damage records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DamageCategory {
    Medical,
    LostWages,
    PainSuffering,
    Property,
    FutureMedical,
    FutureLostWages,
    Other,
}

impl DamageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageCategory::Medical => "medical",
            DamageCategory::LostWages => "lost_wages",
            DamageCategory::PainSuffering => "pain_suffering",
            DamageCategory::Property => "property",
            DamageCategory::FutureMedical => "future_medical",
            DamageCategory::FutureLostWages => "future_lost_wages",
            DamageCategory::Other => "other",
        }
    }
}

/// Parse lifecycle of a stored communication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Pending => "pending",
            ParseStatus::Processing => "processing",
            ParseStatus::Done => "done",
            ParseStatus::Failed => "failed",
        }
    }
}

/// Communication channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Phone,
    InPerson,
    Email,
    Text,
    Portal,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Phone => "phone",
            Channel::InPerson => "in_person",
            Channel::Email => "email",
            Channel::Text => "text",
            Channel::Portal => "portal",
        }
    }
}

/// Insurance coverage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    Liability,
    UninsuredMotorist,
    MedicalPayments,
    Health,
    WorkersComp,
    Other,
}

impl CoverageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageType::Liability => "liability",
            CoverageType::UninsuredMotorist => "uninsured_motorist",
            CoverageType::MedicalPayments => "medical_payments",
            CoverageType::Health => "health",
            CoverageType::WorkersComp => "workers_comp",
            CoverageType::Other => "other",
        }
    }
}

/// Categorical risk signals derived from an extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    StatuteOfLimitationsRisk,
    UninsuredMotorist,
    MultipleDefendants,
    PreExistingCondition,
    LiabilityDisputed,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::StatuteOfLimitationsRisk => "statute_of_limitations_risk",
            RiskFlag::UninsuredMotorist => "uninsured_motorist",
            RiskFlag::MultipleDefendants => "multiple_defendants",
            RiskFlag::PreExistingCondition => "pre_existing_condition",
            RiskFlag::LiabilityDisputed => "liability_disputed",
        }
    }
}

/// Provenance carried by every classified entity record so citation writing
/// needs no re-derivation. Never serialized into API payloads.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub cited_text: String,
    pub turn_index: Option<u32>,
    pub confidence: Confidence,
}

/// An adverse party classified from an `other_party` finding. Companies
/// carry `company_name` with empty person names; individuals the reverse.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartyRecord {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub role: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub provenance: Provenance,
}

/// A medical provider or facility classified from a `medical_provider`
/// finding. Facilities carry `facility_name` with empty person names.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProviderRecord {
    pub first_name: String,
    pub last_name: String,
    pub facility_name: String,
    pub specialty: String,
    pub treatment_type: String,
    pub diagnosis: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub provenance: Provenance,
}

/// An insurance carrier from an `insurance_provider` finding
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarrierRecord {
    pub company_name: String,
    pub policy_number: String,
    pub claim_number: String,
    pub coverage_type: CoverageType,
    pub adjuster_name: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub provenance: Provenance,
}

/// A damage claim from a `financial_expense` finding. A missing dollar
/// amount stays `None`, never zero.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DamageRecord {
    pub category: DamageCategory,
    pub description: String,
    pub estimated_amount: Option<f64>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub provenance: Provenance,
}

/// The classified, pipeline-facing output of one extraction run.
/// Constructed once per invocation; only `raw_flags` is appended afterward.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct IntakeExtractionResult {
    pub incident_date: Option<NaiveDate>,
    pub incident_type: Option<IncidentType>,
    pub incident_location: Option<String>,
    pub injuries: Vec<String>,
    pub medical_providers: Vec<ProviderRecord>,
    pub insurance_carriers: Vec<CarrierRecord>,
    pub other_parties: Vec<PartyRecord>,
    pub damages: Vec<DamageRecord>,
    pub confidence_scores: BTreeMap<String, f64>,
    pub raw_flags: Vec<RiskFlag>,
}

/// The closed set of entity kinds a citation reference may point at,
/// enforced at the type level. A fact backed by any other kind (the case
/// itself, a facility) gets a citation with no reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget {
    Client(Uuid),
    OtherParty(Uuid),
    MedicalProvider(Uuid),
    InsuranceCarrier(Uuid),
}

impl ReferenceTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            ReferenceTarget::Client(_) => "client",
            ReferenceTarget::OtherParty(_) => "other_party",
            ReferenceTarget::MedicalProvider(_) => "medical_provider",
            ReferenceTarget::InsuranceCarrier(_) => "insurance_provider",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ReferenceTarget::Client(id)
            | ReferenceTarget::OtherParty(id)
            | ReferenceTarget::MedicalProvider(id)
            | ReferenceTarget::InsuranceCarrier(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_type_mapping_covers_spoken_and_snake_labels() {
        assert_eq!(IncidentType::from_raw("auto_accident"), IncidentType::Auto);
        assert_eq!(IncidentType::from_raw("Auto Accident"), IncidentType::Auto);
        assert_eq!(IncidentType::from_raw("slip and fall"), IncidentType::SlipFall);
        assert_eq!(IncidentType::from_raw("workers_comp"), IncidentType::Workplace);
        assert_eq!(IncidentType::from_raw("wrongful_death"), IncidentType::Other);
        assert_eq!(IncidentType::from_raw("something new"), IncidentType::Other);
    }

    #[test]
    fn reference_target_kind_labels() {
        let id = Uuid::new_v4();
        assert_eq!(ReferenceTarget::Client(id).kind(), "client");
        assert_eq!(ReferenceTarget::InsuranceCarrier(id).kind(), "insurance_provider");
        assert_eq!(ReferenceTarget::OtherParty(id).id(), id);
    }
}
