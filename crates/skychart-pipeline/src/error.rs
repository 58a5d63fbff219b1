use skychart_ai::CompletionError;
use skychart_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidBirthData(CoreError),

    #[error("Analysis generation failed: {0}")]
    GenerationFailed(#[from] CompletionError),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        PipelineError::InvalidBirthData(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
