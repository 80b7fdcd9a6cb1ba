use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open input {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema parsing error: {schema} - {details}")]
    SchemaParsing { schema: String, details: String },

    /// The parser hit a condition it cannot continue from. Records finalized
    /// before this point have already been reported.
    #[error("problem near record {record_id}: {details}")]
    Aborted { record_id: String, details: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {details}")]
    SchemaParseFailed { details: String },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Input buffer creation failed")]
    InputBufferCreationFailed,

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Stream validation returned internal error code {code}")]
    InternalError { code: i32 },
}

impl From<LibXml2Error> for ValidationError {
    fn from(err: LibXml2Error) -> Self {
        match err {
            LibXml2Error::SchemaParseFailed { details } => ValidationError::SchemaParsing {
                schema: "<memory>".to_string(),
                details,
            },
            other => ValidationError::LibXml2Internal {
                details: other.to_string(),
            },
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
