//! Prompts for transcript finding extraction

use schemars::schema_for;

use crate::model::{ExtractedFindings, TranscriptTurn};

/// System prompt for finding extraction. The wire contract itself is stated
/// once, as the generated JSON Schema of [`ExtractedFindings`], appended by
/// [`build_system_prompt`].
const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a legal intake analyst specializing in personal injury law. You analyze transcripts of intake calls at personal injury law firms, where callers describe incidents in which they may have been injured through someone else's negligence.

Your task is to extract structured findings from the transcript and return them as a single JSON object. Be precise and conservative — do NOT guess or invent information. If you are not confident about a value, return null for that field.

## Metadata findings (at most one per field)

- caller_name       : Full name of the person calling
- law_firm_name     : Name of the law firm the intake specialist represents
- case_type         : One of: auto_accident, slip_fall, medical_malpractice,
                      workers_comp, wrongful_death, product_liability, other
- accident_date     : Date of the incident in ISO format (YYYY-MM-DD), or null.
                      Dates may be spoken in any format — "March 3rd", "3/3",
                      "the third of March", or relative references like "two
                      weeks ago". Convert every format to ISO; anchor relative
                      dates from context clues where possible, and prefer the
                      most recent plausible year when the year is ambiguous.
                      Return null ONLY if no date reference exists at all.
- incident_location : Where the incident occurred (city, address, or description)
- injuries          : Comma-separated list of injuries the caller describes, or null

## Individual findings (one per discovered entity, no duplicates)

- other_party       : Individuals or entities named as at-fault or adverse parties
- insurance_provider: Insurance companies mentioned (either party's insurer)
- medical_provider  : Any doctor, hospital, clinic, therapist, chiropractor,
                      urgent care, emergency room, or other medical service
                      mentioned — even when the caller only "went to", "saw",
                      or "has an appointment with" them
- financial_expense : Costs, bills, lost wages, or property damage the caller
                      discusses. A dollar amount is NOT required — capture the
                      expense with a descriptive label even when no amount is
                      given (e.g. "my medical bills are piling up")
- treatment         : Any treatment, procedure, therapy, or prescription the
                      caller has received or is receiving, one finding per
                      distinct treatment type

## Citation fields (required on every finding)

- transcript_index  : 0-based index of the turn where the entity is FIRST
                      mentioned. Names, dates, and providers are often
                      introduced early and referenced again later — always
                      cite the first occurrence.
- transcript_indices: ALL 0-based turn indices where the entity is mentioned,
                      including pronouns that clearly refer back to it
- quote             : Verbatim excerpt (at most two sentences) from the turn
                      at transcript_index that most directly establishes the
                      finding
- confidence        : "high" when explicitly stated, "medium" when strongly
                      implied, "low" when inferred from limited context
- related_to        : Connections to other named entities. When a connection
                      is possible but not confirmed, prefix the name with
                      "possible: " (e.g. "possible: State Farm"). Use null
                      only when no plausible connection exists.

Return ONLY a valid JSON object with a top-level "findings" array — no markdown, no extra keys."#;

/// Build the full system prompt, embedding the response schema
pub fn build_system_prompt() -> String {
    let schema = schema_for!(ExtractedFindings);
    format!(
        "{}\n\nThe response must conform to this JSON Schema:\n{}",
        EXTRACTION_SYSTEM_PROMPT,
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    )
}

/// Render a transcript as index-prefixed lines; only this rendering
/// reaches the model.
pub fn render_transcript(turns: &[TranscriptTurn]) -> String {
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| format!("[{}] {}: {}", i, turn.speaker, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt for one transcript
pub fn build_extraction_prompt(turns: &[TranscriptTurn]) -> String {
    format!(
        "Extract all findings from this personal injury intake call transcript:\n\n{}",
        render_transcript(turns)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_renders_with_zero_based_indices() {
        let turns = vec![
            TranscriptTurn {
                speaker: "Intake Specialist".to_string(),
                text: "Thanks for calling, how can I help?".to_string(),
            },
            TranscriptTurn {
                speaker: "Caller".to_string(),
                text: "My name is Jane Smith.".to_string(),
            },
        ];

        let rendered = render_transcript(&turns);
        assert_eq!(
            rendered,
            "[0] Intake Specialist: Thanks for calling, how can I help?\n[1] Caller: My name is Jane Smith."
        );
    }

    #[test]
    fn system_prompt_embeds_findings_schema() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("\"findings\""));
        assert!(prompt.contains("transcript_index"));
    }
}
