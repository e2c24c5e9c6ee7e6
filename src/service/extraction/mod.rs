//! Finding extraction from call transcripts
//!
//! One external structured-extraction call per transcript per pipeline run.
//! [`TranscriptExtractor`] owns the call and its strict post-processing;
//! [`ExtractionRun`] scopes the memoized result to a single pipeline
//! invocation so every consumer shares one call.

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use tokio::sync::OnceCell;

use crate::model::{ExtractedFinding, Finding, TranscriptTurn};
use crate::service::extraction::prompts::{build_extraction_prompt, build_system_prompt};
use crate::service::llm::LlmClient;

pub mod error;
pub mod prompts;

pub use error::ExtractionError;

/// Environment variable for the extraction model (defaults to gpt-4o if not set)
const ENV_EXTRACTION_MODEL: &str = "INTAKE_EXTRACTION_MODEL";

/// Default model for finding extraction (gpt-4o for verbatim excerpts and
/// long-context grounding)
const DEFAULT_MODEL: &str = openai::GPT_4O;

/// Longest raw-response sample attached to a malformed-response error
const ERROR_SAMPLE_LEN: usize = 500;

/// The extraction seam: one call in, a validated finding list out.
/// Implemented by [`TranscriptExtractor`] in production and by counting
/// mocks in tests.
#[async_trait]
pub trait FindingExtraction: Send + Sync {
    async fn extract(&self, turns: &[TranscriptTurn]) -> Result<Vec<Finding>, ExtractionError>;
}

/// Extracts findings from a transcript with a single model call
pub struct TranscriptExtractor {
    llm_client: LlmClient,
    model: String,
}

impl TranscriptExtractor {
    /// Create a new extractor over a shared LLM client.
    /// Optionally uses INTAKE_EXTRACTION_MODEL env var (defaults to gpt-4o).
    pub fn new(llm_client: LlmClient) -> Self {
        let model =
            std::env::var(ENV_EXTRACTION_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        tracing::info!(model = %model, "Transcript extractor initialized");
        Self { llm_client, model }
    }
}

#[async_trait]
impl FindingExtraction for TranscriptExtractor {
    async fn extract(&self, turns: &[TranscriptTurn]) -> Result<Vec<Finding>, ExtractionError> {
        // An empty transcript is the only input that legitimately yields
        // zero findings without calling out.
        if turns.is_empty() {
            tracing::debug!("Empty transcript, skipping extraction call");
            return Ok(Vec::new());
        }

        let system_prompt = build_system_prompt();
        let prompt = build_extraction_prompt(turns);

        tracing::debug!(
            model = %self.model,
            turn_count = turns.len(),
            prompt_length = prompt.len(),
            "Initiating extraction call"
        );

        let start_time = std::time::Instant::now();

        // temperature=0.0 and a fixed seed for reproducible outputs
        let agent = self
            .llm_client
            .openai_client()
            .agent(&self.model)
            .preamble(&system_prompt)
            .additional_params(serde_json::json!({
                "temperature": 0.0,
                "seed": 42,
                "response_format": {"type": "json_object"}
            }))
            .build();

        let raw = match agent.prompt(prompt.as_str()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Extraction call failed"
                );
                return Err(ExtractionError::Provider(e.to_string()));
            }
        };

        let findings = parse_findings(&raw)?;

        tracing::info!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis(),
            turn_count = turns.len(),
            finding_count = findings.len(),
            "Extraction call completed"
        );

        Ok(findings)
    }
}

/// Post-process a raw extraction response into validated findings.
///
/// Non-JSON or a missing `findings` array is a classified failure carrying a
/// truncated sample of the response. Null-valued findings are the model's
/// "not confident" signal and are dropped silently; individually malformed
/// array elements are dropped with a warning.
pub fn parse_findings(raw: &str) -> Result<Vec<Finding>, ExtractionError> {
    let parsed: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ExtractionError::InvalidJson {
            detail: e.to_string(),
            sample: truncate_sample(raw),
        })?;

    let Some(items) = parsed.get("findings").and_then(|f| f.as_array()) else {
        return Err(ExtractionError::MissingFindings {
            sample: truncate_sample(raw),
        });
    };

    let mut findings = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<ExtractedFinding>(item.clone()) {
            Ok(wire) => {
                if let Some(finding) = wire.into_finding() {
                    findings.push(finding);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed finding element");
            }
        }
    }

    Ok(findings)
}

fn truncate_sample(raw: &str) -> String {
    raw.chars().take(ERROR_SAMPLE_LEN).collect()
}

/// Per-invocation extraction stage. The underlying call runs at most once
/// per run; repeated `findings()` calls share the cached result. A new
/// pipeline invocation gets a fresh run, so a new transcript batch always
/// triggers a fresh call.
pub struct ExtractionRun {
    extractor: Arc<dyn FindingExtraction>,
    findings: OnceCell<Arc<Vec<Finding>>>,
}

impl ExtractionRun {
    pub fn new(extractor: Arc<dyn FindingExtraction>) -> Self {
        Self {
            extractor,
            findings: OnceCell::new(),
        }
    }

    /// The run's finding set, extracting on first use
    pub async fn findings(
        &self,
        turns: &[TranscriptTurn],
    ) -> Result<Arc<Vec<Finding>>, ExtractionError> {
        let findings = self
            .findings
            .get_or_try_init(|| async { self.extractor.extract(turns).await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(findings))
    }
}
