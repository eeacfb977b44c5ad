use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Claim payload has no identifier (tried claim_id, claimId, id)")]
    MissingIdentifier,

    #[error("Invalid page request: page {page}, page size {page_size}")]
    InvalidPage { page: usize, page_size: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Claim submission failures, reported before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "You can only submit claims for your own account. Patient name must match your registered name."
    )]
    PatientNameMismatch,

    #[error("Patient ID must match your registered ID.")]
    PatientIdMismatch,

    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Files exceed 500KB limit: {}", .0.join(", "))]
    OversizedFiles(Vec<String>),

    #[error("Invalid file types. Only PDF, JPG, PNG, and TXT files are allowed: {}", .0.join(", "))]
    InvalidFileTypes(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ViewError>;
