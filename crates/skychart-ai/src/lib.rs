pub mod error;
pub mod llm_factory;
pub mod llm_provider;
pub mod openai_compatible_provider;
pub mod prompts;
pub mod retry;

pub use error::CompletionError;
pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
pub use openai_compatible_provider::{
    ChatCompletionsRequest, ChatMessage, CompletionTransport, OpenAICompatibleConfig,
    OpenAICompatibleProvider, ReqwestTransport, TransportError, TransportResponse,
};
pub use prompts::{PromptTemplateEngine, CELESTIAL_POINTS, NARRATIVE_SECTIONS};
pub use retry::{BackoffPolicy, FailureKind, RetryDecision, RetryPolicy};
