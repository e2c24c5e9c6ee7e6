//! Client and case matching for bootstrap ingest
//!
//! Callers re-contact about the same incident with re-phrased details;
//! duplicate client/case creation would fragment one matter across records
//! and corrupt downstream damage and treatment aggregation. Matching is a
//! strict priority cascade of hard gates, no fuzzy scoring. The cascade is
//! pure over fetched rows; [`CaseMatcher`] adds the two repository reads.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::DbError;
use crate::db::models::{CaseRow, ClientRow};
use crate::db::repository::IntakeRepository;
use crate::model::IncidentType;

/// Only the first 40 characters of the supplied location anchor the
/// substring tier, so short/generic locations cannot over-match while
/// re-phrased tails still tolerate drift.
pub const LOCATION_ANCHOR_LEN: usize = 40;

/// Incident criteria driving the case tiers
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    pub incident_type: Option<IncidentType>,
    pub incident_date: Option<NaiveDate>,
    pub incident_location: Option<String>,
}

/// Which tier produced a case match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Exact incident-date match: same person, same day, near-certain
    /// identity signal
    IncidentDate,
    /// Incident-type equality plus location-anchor substring fallback
    TypeAndLocation,
}

/// Candidate client: case-insensitive exact first+last name, most recently
/// created one on duplicates.
pub fn find_client<'a>(
    clients: &'a [ClientRow],
    first_name: &str,
    last_name: &str,
) -> Option<&'a ClientRow> {
    clients
        .iter()
        .filter(|c| {
            c.first_name.eq_ignore_ascii_case(first_name)
                && c.last_name.eq_ignore_ascii_case(last_name)
        })
        .max_by_key(|c| c.created_at)
}

/// Tiered case match over a client's cases, in the cases' creation order.
/// The date tier always wins over the type+location tier; within a tier the
/// first encountered case wins.
pub fn match_case<'a>(
    cases: &'a [CaseRow],
    criteria: &MatchCriteria,
) -> Option<(&'a CaseRow, MatchTier)> {
    if let Some(date) = criteria.incident_date
        && let Some(case) = cases.iter().find(|c| c.incident_date == Some(date))
    {
        return Some((case, MatchTier::IncidentDate));
    }

    if let (Some(incident_type), Some(location)) = (
        criteria.incident_type,
        criteria.incident_location.as_deref(),
    ) {
        let anchor: String = location.chars().take(LOCATION_ANCHOR_LEN).collect();
        let anchor = anchor.trim().to_lowercase();
        if !anchor.is_empty()
            && let Some(case) = cases.iter().find(|c| {
                c.incident_type == incident_type.as_str()
                    && c.incident_location.to_lowercase().contains(&anchor)
            })
        {
            return Some((case, MatchTier::TypeAndLocation));
        }
    }

    None
}

/// Repository-backed matcher
pub struct CaseMatcher<'a> {
    repo: &'a IntakeRepository,
}

impl<'a> CaseMatcher<'a> {
    pub fn new(repo: &'a IntakeRepository) -> Self {
        Self { repo }
    }

    /// Look for an existing client + case matching the caller and incident.
    /// Returns `None` when any gate fails; the caller then creates new
    /// records.
    pub async fn find_existing_case(
        &self,
        law_firm_id: Uuid,
        first_name: &str,
        last_name: &str,
        criteria: &MatchCriteria,
    ) -> Result<Option<(ClientRow, CaseRow)>, DbError> {
        let clients = self.repo.clients_for_firm(law_firm_id).await?;
        let Some(client) = find_client(&clients, first_name, last_name) else {
            return Ok(None);
        };

        let cases = self.repo.cases_for_client(client.id).await?;
        match match_case(&cases, criteria) {
            Some((case, tier)) => {
                tracing::info!(
                    case_id = %case.id,
                    client_id = %client.id,
                    tier = ?tier,
                    "Matched existing case for caller"
                );
                Ok(Some((client.clone(), case.clone())))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn client(first: &str, last: &str, age_days: i64) -> ClientRow {
        ClientRow {
            id: Uuid::new_v4(),
            law_firm_id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn case(incident_type: &str, date: Option<NaiveDate>, location: &str) -> CaseRow {
        CaseRow {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            case_number: "INTAKE-TEST0001".to_string(),
            status: "open".to_string(),
            incident_type: incident_type.to_string(),
            incident_date: date,
            incident_location: location.to_string(),
            created_at: Utc::now(),
        }
    }

    fn march_3() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
    }

    #[test]
    fn client_name_match_is_case_insensitive() {
        let clients = vec![client("Jane", "Smith", 10)];
        assert!(find_client(&clients, "jane", "SMITH").is_some());
        assert!(find_client(&clients, "Jane", "Smithe").is_none());
    }

    #[test]
    fn duplicate_clients_resolve_to_most_recently_created() {
        let older = client("Jane", "Smith", 30);
        let newer = client("Jane", "Smith", 1);
        let clients = vec![older.clone(), newer.clone()];

        let picked = find_client(&clients, "Jane", "Smith").unwrap();
        assert_eq!(picked.id, newer.id);
    }

    #[test]
    fn date_tier_beats_type_and_location_tier() {
        let by_type_loc = case("auto", None, "123 Main St, Springfield");
        let by_date = case("auto", Some(march_3()), "somewhere else entirely");
        let cases = vec![by_type_loc.clone(), by_date.clone()];

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: Some(march_3()),
            incident_location: Some("123 Main St, Springfield".to_string()),
        };

        let (matched, tier) = match_case(&cases, &criteria).unwrap();
        assert_eq!(matched.id, by_date.id);
        assert_eq!(tier, MatchTier::IncidentDate);
    }

    #[test]
    fn type_and_location_tier_needs_both_fields() {
        let cases = vec![case("auto", None, "123 Main St, Springfield")];

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: None,
            incident_location: None,
        };
        assert!(match_case(&cases, &criteria).is_none());

        let criteria = MatchCriteria {
            incident_type: None,
            incident_date: None,
            incident_location: Some("123 Main St, Springfield".to_string()),
        };
        assert!(match_case(&cases, &criteria).is_none());
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let cases = vec![case(
            "auto",
            None,
            "Near 123 MAIN ST, Springfield, by the gas station",
        )];

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: None,
            incident_location: Some("123 main st, springfield".to_string()),
        };

        let (_, tier) = match_case(&cases, &criteria).unwrap();
        assert_eq!(tier, MatchTier::TypeAndLocation);
    }

    #[test]
    fn only_the_first_forty_characters_anchor_the_location() {
        // Supplied location is 80 chars; the stored location only contains
        // its tail past char 40, so the anchor cannot match.
        let head = "a".repeat(40);
        let tail = "the corner of Elm Street and Fifth Avenue";
        let supplied = format!("{head}{tail}");
        let cases = vec![case("auto", None, tail)];

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: None,
            incident_location: Some(supplied),
        };
        assert!(match_case(&cases, &criteria).is_none());

        // The anchor itself still matches a stored location containing it
        let cases = vec![case("auto", None, &format!("somewhere {head} nearby"))];
        assert!(match_case(&cases, &criteria_with(&head)).is_some());
    }

    fn criteria_with(location: &str) -> MatchCriteria {
        MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: None,
            incident_location: Some(location.to_string()),
        }
    }

    #[test]
    fn incident_type_must_match_exactly() {
        let cases = vec![case("slip_fall", None, "123 Main St, Springfield")];

        let criteria = MatchCriteria {
            incident_type: Some(IncidentType::Auto),
            incident_date: None,
            incident_location: Some("123 Main St, Springfield".to_string()),
        };
        assert!(match_case(&cases, &criteria).is_none());
    }

    #[test]
    fn first_encountered_case_wins_within_the_location_tier() {
        let first = case("auto", None, "123 Main St, Springfield");
        let second = case("auto", None, "123 Main St, Springfield area");
        let cases = vec![first.clone(), second];

        let criteria = criteria_with("123 Main St, Springfield");
        let (matched, _) = match_case(&cases, &criteria).unwrap();
        assert_eq!(matched.id, first.id);
    }
}
