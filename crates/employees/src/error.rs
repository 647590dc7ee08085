use thiserror::Error;

use funcstream_core::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmployeeError {
    /// The command failed validation. Not retried; no event is emitted.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The employee store refused the write.
    #[error("employee storage failed: {0}")]
    Storage(String),
}

impl From<DomainError> for EmployeeError {
    fn from(value: DomainError) -> Self {
        EmployeeError::InvalidCommand(value.to_string())
    }
}
