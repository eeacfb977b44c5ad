use claims_view::{ValidationError, ViewError};
use thiserror::Error;

/// Failures talking to the claims REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Unexpected payload from {endpoint}: {reason}")]
    UnexpectedPayload { endpoint: String, reason: String },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("Cannot build request URL from {0}")]
    InvalidUrl(String),

    #[error("Attachment {name} cannot be sent: {source}")]
    InvalidAttachment {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Username and password are required")]
    EmptyCredentials,

    #[error("Invalid username or password")]
    LoginRejected,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Local state I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local state is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PortalError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("Logged-in user has no {0}")]
    MissingIdentity(&'static str),

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
