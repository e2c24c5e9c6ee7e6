//! Risk flag derivation over a classified extraction result
//!
//! Pure over the result plus the full cached finding set; the evaluation
//! date is an explicit parameter. Flags are additive and order-stable, with
//! no "no risk" sentinel.

use chrono::NaiveDate;

use crate::model::{Finding, IncidentType, IntakeExtractionResult, RiskFlag};

/// Typical personal-injury statute of limitations is two years; flag once
/// the incident is more than ~20 months old.
const STATUTE_OF_LIMITATIONS_DAYS: i64 = 600;

/// Phrases indicating a prior or pre-existing condition
const PRE_EXISTING_PHRASES: &[&str] = &[
    "pre-existing",
    "prior injury",
    "previous condition",
    "prior condition",
];

/// Phrases indicating disputed or denied fault
const LIABILITY_PHRASES: &[&str] = &[
    "disputed",
    "dispute",
    "denied liability",
    "deny liability",
    "not at fault",
];

/// Derive risk flags from a classified result and the raw finding values,
/// in fixed evaluation order.
pub fn flag_risks(
    result: &IntakeExtractionResult,
    findings: &[Finding],
    evaluation_date: NaiveDate,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    if let Some(incident_date) = result.incident_date {
        let days_since = (evaluation_date - incident_date).num_days();
        if days_since > STATUTE_OF_LIMITATIONS_DAYS {
            flags.push(RiskFlag::StatuteOfLimitationsRisk);
        }
    }

    if result.incident_type == Some(IncidentType::Auto) && result.insurance_carriers.is_empty() {
        flags.push(RiskFlag::UninsuredMotorist);
    }

    if result.other_parties.len() > 1 {
        flags.push(RiskFlag::MultipleDefendants);
    }

    // Keyword scan over all raw finding values for the nuanced signals
    let all_text = findings
        .iter()
        .map(|f| f.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if PRE_EXISTING_PHRASES.iter().any(|p| all_text.contains(p)) {
        flags.push(RiskFlag::PreExistingCondition);
    }

    if LIABILITY_PHRASES.iter().any(|p| all_text.contains(p)) {
        flags.push(RiskFlag::LiabilityDisputed);
    }

    flags
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{
        CarrierRecord, Confidence, CoverageType, FindingField, FindingKind, PartyRecord,
        Provenance,
    };

    fn eval_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    fn provenance() -> Provenance {
        Provenance {
            cited_text: "quoted".to_string(),
            turn_index: Some(0),
            confidence: Confidence::High,
        }
    }

    fn party(company: &str) -> PartyRecord {
        PartyRecord {
            first_name: String::new(),
            last_name: String::new(),
            company_name: company.to_string(),
            role: "at-fault party".to_string(),
            provenance: provenance(),
        }
    }

    fn carrier(name: &str) -> CarrierRecord {
        CarrierRecord {
            company_name: name.to_string(),
            policy_number: String::new(),
            claim_number: String::new(),
            coverage_type: CoverageType::Liability,
            adjuster_name: String::new(),
            provenance: provenance(),
        }
    }

    fn finding(value: &str) -> Finding {
        Finding {
            kind: FindingKind::Individual,
            field: FindingField::Treatment,
            value: value.to_string(),
            first_turn_index: None,
            all_turn_indices: Vec::new(),
            quote: None,
            confidence: Confidence::High,
            related_to: None,
        }
    }

    #[test]
    fn statute_flag_boundary_is_exclusive_at_600_days() {
        let at_boundary = IntakeExtractionResult {
            incident_date: Some(eval_date() - Duration::days(600)),
            ..Default::default()
        };
        assert!(flag_risks(&at_boundary, &[], eval_date()).is_empty());

        let past_boundary = IntakeExtractionResult {
            incident_date: Some(eval_date() - Duration::days(601)),
            ..Default::default()
        };
        assert_eq!(
            flag_risks(&past_boundary, &[], eval_date()),
            vec![RiskFlag::StatuteOfLimitationsRisk]
        );
    }

    #[test]
    fn uninsured_motorist_fires_only_for_auto_without_carriers() {
        let auto_no_carrier = IntakeExtractionResult {
            incident_type: Some(IncidentType::Auto),
            ..Default::default()
        };
        assert_eq!(
            flag_risks(&auto_no_carrier, &[], eval_date()),
            vec![RiskFlag::UninsuredMotorist]
        );

        let auto_with_carrier = IntakeExtractionResult {
            incident_type: Some(IncidentType::Auto),
            insurance_carriers: vec![carrier("State Farm")],
            ..Default::default()
        };
        assert!(flag_risks(&auto_with_carrier, &[], eval_date()).is_empty());

        // Any other incident type never fires it, insured or not
        let slip_fall = IntakeExtractionResult {
            incident_type: Some(IncidentType::SlipFall),
            ..Default::default()
        };
        assert!(flag_risks(&slip_fall, &[], eval_date()).is_empty());
    }

    #[test]
    fn multiple_defendants_needs_more_than_one_party() {
        let one = IntakeExtractionResult {
            other_parties: vec![party("Acme Trucking LLC")],
            ..Default::default()
        };
        assert!(flag_risks(&one, &[], eval_date()).is_empty());

        let two = IntakeExtractionResult {
            other_parties: vec![party("Acme Trucking LLC"), party("Springfield Properties")],
            ..Default::default()
        };
        assert_eq!(
            flag_risks(&two, &[], eval_date()),
            vec![RiskFlag::MultipleDefendants]
        );
    }

    #[test]
    fn phrase_scans_cover_every_finding_value() {
        let findings = vec![
            finding("physical therapy"),
            finding("caller mentioned a pre-existing back condition"),
        ];
        let flags = flag_risks(&IntakeExtractionResult::default(), &findings, eval_date());
        assert_eq!(flags, vec![RiskFlag::PreExistingCondition]);

        let findings = vec![finding("the other driver says he is not at fault")];
        let flags = flag_risks(&IntakeExtractionResult::default(), &findings, eval_date());
        assert_eq!(flags, vec![RiskFlag::LiabilityDisputed]);
    }

    #[test]
    fn flags_keep_the_fixed_evaluation_order() {
        let result = IntakeExtractionResult {
            incident_date: Some(eval_date() - Duration::days(700)),
            incident_type: Some(IncidentType::Auto),
            other_parties: vec![party("Acme Trucking LLC"), party("Springfield Properties")],
            ..Default::default()
        };
        let findings = vec![
            finding("liability is disputed by their insurer"),
            finding("prior injury to the same shoulder"),
        ];

        assert_eq!(
            flag_risks(&result, &findings, eval_date()),
            vec![
                RiskFlag::StatuteOfLimitationsRisk,
                RiskFlag::UninsuredMotorist,
                RiskFlag::MultipleDefendants,
                RiskFlag::PreExistingCondition,
                RiskFlag::LiabilityDisputed,
            ]
        );
    }
}
