pub mod citations;
pub mod classify;
pub mod extraction;
pub mod intake;
pub mod llm;
pub mod matcher;
pub mod risk;

pub use extraction::TranscriptExtractor;
pub use intake::IntakeService;
pub use llm::LlmClient;
