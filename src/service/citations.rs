//! Provenance citation writing
//!
//! One citation per created domain fact, with a typed reference when the
//! backing entity is in the referenceable set. Writes are best-effort: a
//! failed citation never blocks the fact it documents.

use uuid::Uuid;

use crate::db::repository::IntakeRepository;
use crate::model::{Confidence, Provenance, ReferenceTarget};

/// A citation about to be written
#[derive(Debug, Clone)]
pub struct NewCitation<'a> {
    pub key: &'a str,
    pub cited_text: &'a str,
    pub turn_index: Option<u32>,
    pub confidence: Confidence,
}

impl<'a> NewCitation<'a> {
    /// Build a citation from the provenance a classifier attached
    pub fn from_provenance(key: &'a str, provenance: &'a Provenance) -> Self {
        Self {
            key,
            cited_text: &provenance.cited_text,
            turn_index: provenance.turn_index,
            confidence: provenance.confidence,
        }
    }
}

/// Write one citation and its optional reference. Failures are logged and
/// swallowed here, by contract.
pub async fn write_citation(
    repo: &IntakeRepository,
    communication_id: Uuid,
    citation: NewCitation<'_>,
    reference: Option<(ReferenceTarget, &str)>,
) {
    let row = match repo
        .insert_citation(
            communication_id,
            citation.key,
            citation.cited_text,
            citation.turn_index.map(|i| i as i32),
            citation.confidence.score(),
        )
        .await
    {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(
                communication_id = %communication_id,
                citation_key = %citation.key,
                error = %e,
                "Failed to write citation"
            );
            return;
        }
    };

    if let Some((target, label)) = reference
        && let Err(e) = repo
            .insert_citation_reference(row.id, target.kind(), target.id(), label)
            .await
    {
        tracing::warn!(
            citation_id = %row.id,
            target_kind = target.kind(),
            error = %e,
            "Failed to write citation reference"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_carries_provenance_fields_and_score() {
        let provenance = Provenance {
            cited_text: "I went to St. Mary's Hospital that night.".to_string(),
            turn_index: Some(7),
            confidence: Confidence::Medium,
        };

        let citation = NewCitation::from_provenance("medical_provider", &provenance);
        assert_eq!(citation.key, "medical_provider");
        assert_eq!(citation.cited_text, "I went to St. Mary's Hospital that night.");
        assert_eq!(citation.turn_index, Some(7));
        assert_eq!(citation.confidence.score(), 0.7);
    }
}
