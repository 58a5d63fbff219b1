pub mod error;
pub mod logging;
pub mod orchestrator;

pub use error::{PipelineError, Result};
pub use orchestrator::PipelineOrchestrator;
