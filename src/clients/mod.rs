pub mod llm_client;
pub mod submit_client;

pub use llm_client::{CompletionClient, CompletionRequest, LlmClient};
pub use submit_client::{resolve_submit_url, AnswerSubmitter, SubmitClient};
