//! Transcript turns and extraction findings
//!
//! Two shapes live here: the wire types the extraction model returns
//! (`ExtractedFindings` / `ExtractedFinding`, tolerant of nulls and unknown
//! field labels) and the validated `Finding` the rest of the pipeline
//! consumes (non-empty value, turn-index invariants enforced).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One utterance of a call transcript. The turn's index is always derived
/// from its position in the transcript, never stored separately.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranscriptTurn {
    pub speaker: String,
    pub text: String,
}

/// Categorical confidence attached to a finding by the extraction model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Numeric score used for persisted citations
    pub fn score(&self) -> f64 {
        match self {
            Confidence::High => 1.0,
            Confidence::Medium => 0.7,
            Confidence::Low => 0.4,
        }
    }
}

/// Prefix the extraction model uses on `related_to` values when a link is
/// possible but not confirmed by the transcript.
pub const POSSIBLE_PREFIX: &str = "possible: ";

/// Cross-references from a finding to other named entities in the same
/// transcript. Values may carry the [`POSSIBLE_PREFIX`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RelatedEntities {
    #[serde(default)]
    pub caller: Option<String>,
    #[serde(default)]
    pub other_party: Option<String>,
    #[serde(default)]
    pub insurance_provider: Option<String>,
    #[serde(default)]
    pub medical_provider: Option<String>,
}

/// Whether a related-entity value is an unconfirmed link
pub fn is_unconfirmed_link(value: &str) -> bool {
    value.starts_with(POSSIBLE_PREFIX)
}

/// Envelope the extraction model must return: a single object holding a
/// `findings` array.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFindings {
    pub findings: Vec<ExtractedFinding>,
}

/// One finding as returned on the wire. `value: null` is the model's
/// explicit "not confident" signal; such findings are dropped at the
/// extraction boundary and never reach the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFinding {
    /// "metadata" or "individual"
    pub finding_type: String,
    /// One of the fixed field vocabulary (caller_name, other_party, ...)
    pub field: String,
    pub value: Option<String>,
    /// 0-based turn index of the first mention
    #[serde(default)]
    pub transcript_index: Option<u32>,
    /// All 0-based turn indices where the entity is mentioned
    #[serde(default)]
    pub transcript_indices: Vec<u32>,
    /// Verbatim excerpt (at most two sentences) from the cited turn
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub related_to: Option<RelatedEntities>,
}

/// Finding kind: metadata fields are unique per extraction, individual
/// findings repeat per discovered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    Metadata,
    Individual,
}

impl FindingKind {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "metadata" => Some(FindingKind::Metadata),
            "individual" => Some(FindingKind::Individual),
            _ => None,
        }
    }
}

/// The fixed finding-field vocabulary. Labels outside the vocabulary map to
/// `Unknown`: such findings stay available to the raw-text risk scan but are
/// ignored by every classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingField {
    CallerName,
    LawFirmName,
    CaseType,
    AccidentDate,
    IncidentLocation,
    Injuries,
    OtherParty,
    InsuranceProvider,
    MedicalProvider,
    FinancialExpense,
    Treatment,
    Unknown,
}

impl FindingField {
    pub fn as_label(&self) -> &'static str {
        match self {
            FindingField::CallerName => "caller_name",
            FindingField::LawFirmName => "law_firm_name",
            FindingField::CaseType => "case_type",
            FindingField::AccidentDate => "accident_date",
            FindingField::IncidentLocation => "incident_location",
            FindingField::Injuries => "injuries",
            FindingField::OtherParty => "other_party",
            FindingField::InsuranceProvider => "insurance_provider",
            FindingField::MedicalProvider => "medical_provider",
            FindingField::FinancialExpense => "financial_expense",
            FindingField::Treatment => "treatment",
            FindingField::Unknown => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "caller_name" => FindingField::CallerName,
            "law_firm_name" => FindingField::LawFirmName,
            "case_type" => FindingField::CaseType,
            "accident_date" => FindingField::AccidentDate,
            "incident_location" => FindingField::IncidentLocation,
            "injuries" => FindingField::Injuries,
            "other_party" => FindingField::OtherParty,
            "insurance_provider" => FindingField::InsuranceProvider,
            "medical_provider" => FindingField::MedicalProvider,
            "financial_expense" => FindingField::FinancialExpense,
            "treatment" => FindingField::Treatment,
            _ => FindingField::Unknown,
        }
    }
}

/// A validated finding: the atomic unit every downstream stage consumes.
/// Invariants: `value` is non-empty and `all_turn_indices` contains
/// `first_turn_index` when one is set.
#[derive(Debug, Clone)]
pub struct Finding {
    pub kind: FindingKind,
    pub field: FindingField,
    pub value: String,
    pub first_turn_index: Option<u32>,
    pub all_turn_indices: Vec<u32>,
    pub quote: Option<String>,
    pub confidence: Confidence,
    pub related_to: Option<RelatedEntities>,
}

impl Finding {
    /// The text a citation should carry: the verbatim quote when present,
    /// the raw value otherwise.
    pub fn quote_or_value(&self) -> &str {
        self.quote.as_deref().unwrap_or(&self.value)
    }
}

impl ExtractedFinding {
    /// Convert a wire finding into a validated one. Returns `None` for
    /// null/empty values and unrecognized finding kinds.
    pub fn into_finding(self) -> Option<Finding> {
        let kind = FindingKind::from_label(self.finding_type.trim())?;
        let value = self.value?.trim().to_string();
        if value.is_empty() {
            return None;
        }

        let mut all_turn_indices = self.transcript_indices;
        if let Some(first) = self.transcript_index
            && !all_turn_indices.contains(&first)
        {
            all_turn_indices.insert(0, first);
        }

        Some(Finding {
            kind,
            field: FindingField::from_label(self.field.trim()),
            value,
            first_turn_index: self.transcript_index,
            all_turn_indices,
            quote: self.quote.filter(|q| !q.trim().is_empty()),
            confidence: self.confidence,
            related_to: self.related_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(value: Option<&str>) -> ExtractedFinding {
        ExtractedFinding {
            finding_type: "individual".to_string(),
            field: "other_party".to_string(),
            value: value.map(str::to_string),
            transcript_index: Some(3),
            transcript_indices: vec![5, 7],
            quote: Some("He said the truck ran the light.".to_string()),
            confidence: Confidence::Medium,
            related_to: None,
        }
    }

    #[test]
    fn null_value_is_dropped() {
        assert!(wire(None).into_finding().is_none());
        assert!(wire(Some("  ")).into_finding().is_none());
    }

    #[test]
    fn first_index_joins_index_set() {
        let finding = wire(Some("Acme Trucking LLC")).into_finding().unwrap();
        assert_eq!(finding.first_turn_index, Some(3));
        assert_eq!(finding.all_turn_indices, vec![3, 5, 7]);
    }

    #[test]
    fn unknown_kind_is_dropped_but_unknown_field_survives() {
        let mut bad_kind = wire(Some("x"));
        bad_kind.finding_type = "speculation".to_string();
        assert!(bad_kind.into_finding().is_none());

        let mut odd_field = wire(Some("x"));
        odd_field.field = "witness".to_string();
        let finding = odd_field.into_finding().unwrap();
        assert_eq!(finding.field, FindingField::Unknown);
    }

    #[test]
    fn confidence_score_mapping() {
        assert_eq!(Confidence::High.score(), 1.0);
        assert_eq!(Confidence::Medium.score(), 0.7);
        assert_eq!(Confidence::Low.score(), 0.4);
    }

    #[test]
    fn possible_prefix_marks_unconfirmed_links() {
        assert!(is_unconfirmed_link("possible: State Farm"));
        assert!(!is_unconfirmed_link("State Farm"));
    }
}
