//! Error types for the docshape core library
//!
//! This module defines the error handling system for docshape, using thiserror
//! for ergonomic error definitions and anyhow for flexible error sources.

use thiserror::Error;

/// Main error type for docshape operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed export XML
    #[error("Failed to parse XML: {message}")]
    DocumentParse {
        message: String,
    },

    /// Malformed or structurally invalid schema JSON
    #[error("Failed to parse schema: {message}")]
    SchemaParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The export document carries no schema URL
    #[error("Schema URL not found in the document")]
    SchemaUrlMissing,

    /// Credential acquisition failures
    #[error("Failed to obtain new bearer token: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Transport failures and rejected upstream requests
    #[error("Upstream request failed: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Failures delivering the converted document downstream
    #[error("Failed to deliver converted document: {message}")]
    Delivery {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Output tree serialization failures
    #[error("Failed to serialize output XML: {message}")]
    Serialize {
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SchemaParse {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            source: Some(anyhow::Error::new(err)),
        }
    }
}
