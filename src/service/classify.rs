//! Entity classification over cached findings
//!
//! Pure, deterministic, call-free: every function here takes the extracted
//! finding list as an explicit parameter and produces classified entity
//! records carrying their own provenance. All fallibility lives at the
//! extraction and storage seams, never here.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use regex::Regex;

use crate::model::{
    CarrierRecord, Confidence, CoverageType, DamageCategory, DamageRecord, Finding, FindingField,
    FindingKind, IncidentType, IntakeExtractionResult, PartyRecord, Provenance, ProviderRecord,
};

/// Keywords marking an `other_party` value as a company rather than a person
pub const COMPANY_KEYWORDS: &[&str] = &[
    "inc",
    "llc",
    "corp",
    "co.",
    "company",
    "ltd",
    "group",
    "trucking",
    "transport",
    "logistics",
    "construction",
    "properties",
    "management",
];

/// Keywords marking a `medical_provider` value as a facility rather than an
/// individual practitioner
pub const FACILITY_KEYWORDS: &[&str] = &[
    "hospital",
    "clinic",
    "center",
    "centre",
    "medical",
    "health",
    "urgent care",
    "orthopedic",
    "chiropractic",
    "chiropractor",
    "rehab",
    "rehabilitation",
    "imaging",
    "radiology",
    "pharmacy",
    "er ",
    "emergency room",
];

/// Role attached to every classified adverse party
const OTHER_PARTY_ROLE: &str = "at-fault party";

/// Incident metadata mapped from the extraction's metadata findings
#[derive(Debug, Clone, Default)]
pub struct IncidentInfo {
    pub incident_date: Option<NaiveDate>,
    pub incident_type: Option<IncidentType>,
    pub incident_location: Option<String>,
    pub injuries: Vec<String>,
    pub confidence_scores: BTreeMap<String, f64>,
}

/// Index metadata findings by field. Metadata findings are unique per field
/// within one extraction; duplicated fields are not expected in source data.
pub fn metadata_index(findings: &[Finding]) -> HashMap<FindingField, &Finding> {
    findings
        .iter()
        .filter(|f| f.kind == FindingKind::Metadata)
        .map(|f| (f.field, f))
        .collect()
}

/// Map metadata findings to incident date, type, location, and injuries
pub fn incident_info(findings: &[Finding]) -> IncidentInfo {
    let meta = metadata_index(findings);

    let incident_date = meta.get(&FindingField::AccidentDate).and_then(|f| {
        match NaiveDate::parse_from_str(&f.value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!(value = %f.value, error = %e, "Could not parse accident date");
                None
            }
        }
    });

    let incident_type = meta
        .get(&FindingField::CaseType)
        .map(|f| IncidentType::from_raw(&f.value));

    let injuries = meta
        .get(&FindingField::Injuries)
        .map(|f| {
            f.value
                .split(',')
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let confidence_scores = meta
        .values()
        .map(|f| (f.field.as_label().to_string(), f.confidence.score()))
        .collect();

    IncidentInfo {
        incident_date,
        incident_type,
        incident_location: meta
            .get(&FindingField::IncidentLocation)
            .map(|f| f.value.clone()),
        injuries,
        confidence_scores,
    }
}

/// Classify `other_party` findings into adverse-party records
pub fn classify_parties(findings: &[Finding]) -> Vec<PartyRecord> {
    individual_findings(findings, FindingField::OtherParty)
        .map(|f| {
            let provenance = provenance_of(f);
            if contains_any(&f.value, COMPANY_KEYWORDS) {
                PartyRecord {
                    first_name: String::new(),
                    last_name: String::new(),
                    company_name: f.value.clone(),
                    role: OTHER_PARTY_ROLE.to_string(),
                    provenance,
                }
            } else {
                let (first_name, last_name) = split_name(&f.value);
                PartyRecord {
                    first_name,
                    last_name,
                    company_name: String::new(),
                    role: OTHER_PARTY_ROLE.to_string(),
                    provenance,
                }
            }
        })
        .collect()
}

/// Classify `medical_provider` findings into facility or individual records
pub fn classify_medical(findings: &[Finding]) -> Vec<ProviderRecord> {
    individual_findings(findings, FindingField::MedicalProvider)
        .map(|f| {
            let provenance = provenance_of(f);
            if contains_any(&f.value, FACILITY_KEYWORDS) {
                ProviderRecord {
                    first_name: String::new(),
                    last_name: String::new(),
                    facility_name: f.value.clone(),
                    specialty: String::new(),
                    treatment_type: String::new(),
                    diagnosis: String::new(),
                    provenance,
                }
            } else {
                let (first_name, last_name) = split_name(&strip_honorific(&f.value));
                ProviderRecord {
                    first_name,
                    last_name,
                    facility_name: String::new(),
                    specialty: String::new(),
                    treatment_type: String::new(),
                    diagnosis: String::new(),
                    provenance,
                }
            }
        })
        .collect()
}

/// Classify `insurance_provider` findings into carrier records. This finding
/// family needs no sub-classification: the value passes through with a
/// liability default.
pub fn classify_insurance(findings: &[Finding]) -> Vec<CarrierRecord> {
    individual_findings(findings, FindingField::InsuranceProvider)
        .map(|f| CarrierRecord {
            company_name: f.value.clone(),
            policy_number: String::new(),
            claim_number: String::new(),
            coverage_type: CoverageType::Liability,
            adjuster_name: String::new(),
            provenance: provenance_of(f),
        })
        .collect()
}

/// Classify `financial_expense` findings into damage records
pub fn classify_damages(findings: &[Finding]) -> Vec<DamageRecord> {
    individual_findings(findings, FindingField::FinancialExpense)
        .map(|f| DamageRecord {
            category: damage_category(&f.value),
            description: f.value.clone(),
            estimated_amount: parse_amount(&f.value),
            provenance: provenance_of(f),
        })
        .collect()
}

/// Build the classified result for one finding set. Risk flags are appended
/// separately by the risk flagger.
pub fn build_result(findings: &[Finding]) -> IntakeExtractionResult {
    let info = incident_info(findings);
    IntakeExtractionResult {
        incident_date: info.incident_date,
        incident_type: info.incident_type,
        incident_location: info.incident_location,
        injuries: info.injuries,
        medical_providers: classify_medical(findings),
        insurance_carriers: classify_insurance(findings),
        other_parties: classify_parties(findings),
        damages: classify_damages(findings),
        confidence_scores: info.confidence_scores,
        raw_flags: Vec::new(),
    }
}

fn individual_findings(
    findings: &[Finding],
    field: FindingField,
) -> impl Iterator<Item = &Finding> {
    findings
        .iter()
        .filter(move |f| f.kind == FindingKind::Individual && f.field == field)
}

fn provenance_of(finding: &Finding) -> Provenance {
    Provenance {
        cited_text: finding.quote_or_value().to_string(),
        turn_index: finding.first_turn_index,
        confidence: finding.confidence,
    }
}

fn contains_any(value: &str, keywords: &[&str]) -> bool {
    let value_lower = value.to_lowercase();
    keywords.iter().any(|kw| value_lower.contains(kw))
}

/// Split "First Last" on the first space. A single-token name collapses
/// into the last-name slot. The bootstrap path uses the same rule for the
/// caller's name.
pub fn split_name(value: &str) -> (String, String) {
    match value.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (String::new(), value.trim().to_string()),
    }
}

/// Strip a leading "Dr." / "Doctor" honorific
fn strip_honorific(value: &str) -> String {
    let honorific = Regex::new(r"(?i)^(Dr\.?\s+|Doctor\s+)").unwrap();
    honorific.replace(value, "").trim().to_string()
}

/// First currency-like numeric substring, or `None`, never zero
fn parse_amount(value: &str) -> Option<f64> {
    let amount = Regex::new(r"\$?([\d,]+(?:\.\d+)?)").unwrap();
    let captures = amount.captures(value)?;
    captures.get(1)?.as_str().replace(',', "").parse().ok()
}

/// Categorize a damage description by keyword precedence, first match wins
fn damage_category(value: &str) -> DamageCategory {
    let value_lower = value.to_lowercase();
    let has = |kws: &[&str]| kws.iter().any(|kw| value_lower.contains(kw));

    if has(&["wage", "lost income", "lost earnings"]) {
        DamageCategory::LostWages
    } else if value_lower.contains("future") && value_lower.contains("medical") {
        DamageCategory::FutureMedical
    } else if has(&["medical", "hospital", "doctor", "bill", "treatment"]) {
        DamageCategory::Medical
    } else if has(&["property", "vehicle", "car", "truck", "repair"]) {
        DamageCategory::Property
    } else {
        DamageCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(kind: FindingKind, field: FindingField, value: &str) -> Finding {
        Finding {
            kind,
            field,
            value: value.to_string(),
            first_turn_index: Some(4),
            all_turn_indices: vec![4, 9],
            quote: Some(format!("They mentioned {value}.")),
            confidence: Confidence::Medium,
            related_to: None,
        }
    }

    fn individual(field: FindingField, value: &str) -> Finding {
        finding(FindingKind::Individual, field, value)
    }

    fn metadata(field: FindingField, value: &str) -> Finding {
        finding(FindingKind::Metadata, field, value)
    }

    #[test]
    fn company_keywords_classify_a_party_as_company() {
        let findings = vec![individual(FindingField::OtherParty, "Acme Trucking LLC")];
        let parties = classify_parties(&findings);

        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].company_name, "Acme Trucking LLC");
        assert_eq!(parties[0].first_name, "");
        assert_eq!(parties[0].last_name, "");
        assert_eq!(parties[0].role, "at-fault party");
    }

    #[test]
    fn person_party_splits_on_first_space() {
        let findings = vec![
            individual(FindingField::OtherParty, "John Doe"),
            individual(FindingField::OtherParty, "Madonna"),
        ];
        let parties = classify_parties(&findings);

        assert_eq!(parties[0].first_name, "John");
        assert_eq!(parties[0].last_name, "Doe");
        // Single-token names collapse into the last-name slot
        assert_eq!(parties[1].first_name, "");
        assert_eq!(parties[1].last_name, "Madonna");
    }

    #[test]
    fn facility_keywords_classify_a_provider_as_facility() {
        let findings = vec![individual(FindingField::MedicalProvider, "St. Mary's Hospital")];
        let medical = classify_medical(&findings);

        assert_eq!(medical[0].facility_name, "St. Mary's Hospital");
        assert_eq!(medical[0].first_name, "");
        assert_eq!(medical[0].last_name, "");
    }

    #[test]
    fn honorific_is_stripped_from_individual_providers() {
        let findings = vec![
            individual(FindingField::MedicalProvider, "Dr. John Lee"),
            individual(FindingField::MedicalProvider, "Doctor Alice Wu"),
            individual(FindingField::MedicalProvider, "Dr Patel"),
        ];
        let medical = classify_medical(&findings);

        assert_eq!(
            (medical[0].first_name.as_str(), medical[0].last_name.as_str()),
            ("John", "Lee")
        );
        assert_eq!(
            (medical[1].first_name.as_str(), medical[1].last_name.as_str()),
            ("Alice", "Wu")
        );
        assert_eq!(
            (medical[2].first_name.as_str(), medical[2].last_name.as_str()),
            ("", "Patel")
        );
    }

    #[test]
    fn damage_amount_is_none_when_no_number_present() {
        let findings = vec![individual(
            FindingField::FinancialExpense,
            "my medical bills are piling up",
        )];
        let damages = classify_damages(&findings);

        assert_eq!(damages[0].category, DamageCategory::Medical);
        assert_eq!(damages[0].estimated_amount, None);
    }

    #[test]
    fn damage_amount_parses_currency_substrings() {
        let cases = [
            ("$3,200 in hospital bills", Some(3200.0)),
            ("about 450.75 for the ER visit to the doctor", Some(450.75)),
            ("repair estimate of $1,234.56", Some(1234.56)),
        ];
        for (value, expected) in cases {
            let damages = classify_damages(&[individual(FindingField::FinancialExpense, value)]);
            assert_eq!(damages[0].estimated_amount, expected, "value: {value}");
        }
    }

    #[test]
    fn damage_category_precedence_first_match_wins() {
        let cases = [
            ("lost wages from missed work", DamageCategory::LostWages),
            // wage keywords outrank the medical ones even when both occur
            ("lost wages and medical bills", DamageCategory::LostWages),
            ("future medical treatment costs", DamageCategory::FutureMedical),
            ("hospital bill from the ER", DamageCategory::Medical),
            ("truck repair estimate", DamageCategory::Property),
            ("out-of-pocket expenses", DamageCategory::Other),
        ];
        for (value, expected) in cases {
            let damages = classify_damages(&[individual(FindingField::FinancialExpense, value)]);
            assert_eq!(damages[0].category, expected, "value: {value}");
        }
    }

    #[test]
    fn insurance_passes_through_with_liability_default() {
        let findings = vec![individual(FindingField::InsuranceProvider, "State Farm")];
        let carriers = classify_insurance(&findings);

        assert_eq!(carriers[0].company_name, "State Farm");
        assert_eq!(carriers[0].coverage_type, CoverageType::Liability);
        assert_eq!(carriers[0].policy_number, "");
        assert_eq!(carriers[0].adjuster_name, "");
    }

    #[test]
    fn incident_info_maps_metadata_fields() {
        let findings = vec![
            metadata(FindingField::AccidentDate, "2024-03-03"),
            metadata(FindingField::CaseType, "auto_accident"),
            metadata(FindingField::IncidentLocation, "123 Main St, Springfield"),
            metadata(FindingField::Injuries, "whiplash, back pain , "),
        ];
        let info = incident_info(&findings);

        assert_eq!(info.incident_date, NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(info.incident_type, Some(IncidentType::Auto));
        assert_eq!(info.incident_location.as_deref(), Some("123 Main St, Springfield"));
        assert_eq!(info.injuries, vec!["whiplash", "back pain"]);
        assert_eq!(info.confidence_scores.get("accident_date"), Some(&0.7));
    }

    #[test]
    fn unparseable_date_maps_to_none() {
        let findings = vec![metadata(FindingField::AccidentDate, "last Tuesday")];
        assert_eq!(incident_info(&findings).incident_date, None);
    }

    #[test]
    fn provenance_rides_along_on_every_classified_record() {
        let findings = vec![individual(FindingField::OtherParty, "John Doe")];
        let parties = classify_parties(&findings);

        assert_eq!(parties[0].provenance.cited_text, "They mentioned John Doe.");
        assert_eq!(parties[0].provenance.turn_index, Some(4));
        assert_eq!(parties[0].provenance.confidence, Confidence::Medium);
    }

    #[test]
    fn classification_is_idempotent() {
        let findings = vec![
            metadata(FindingField::CaseType, "slip_fall"),
            individual(FindingField::OtherParty, "Acme Properties Group"),
            individual(FindingField::MedicalProvider, "Dr. John Lee"),
            individual(FindingField::FinancialExpense, "$500 copay bill"),
        ];

        let first = build_result(&findings);
        let second = build_result(&findings);

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn metadata_findings_never_reach_entity_classifiers() {
        // A metadata finding with an entity field label must not classify
        let findings = vec![metadata(FindingField::OtherParty, "Acme Trucking LLC")];
        assert!(classify_parties(&findings).is_empty());
    }
}
