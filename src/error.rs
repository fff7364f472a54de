use crate::state::Flow;

/// Every recoverable failure of the core. None of them leave the state
/// half-applied.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Required fields are missing or empty.
    #[error("Missing required fields: {}", missing_fields.join(", "))]
    ValidationError { missing_fields: Vec<String> },

    #[error("Index {index} out of range for dataset of {len} observations")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No observation selected")]
    NoSelection,

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("{0} is already in progress")]
    AlreadyInProgress(Flow),

    #[error("File has no data rows")]
    EmptyFile,

    #[error("Malformed CSV: {0}")]
    InvalidCsv(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}
