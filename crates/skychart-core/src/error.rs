use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid birth data: {0}")]
    InvalidBirthData(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
