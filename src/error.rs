//! Error handling for the marketplace client

use std::fmt;
use thiserror::Error;

use crate::submission::FieldErrors;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the marketplace client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The backend answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Listing table errors
    #[error("Database error: {0}")]
    Database(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// The operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Only JPEG and PNG images are accepted
    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// One or more form fields failed validation
    #[error("Invalid form: {0}")]
    Validation(FieldErrors),

    /// The submission state machine rejected an event
    #[error("Cannot apply {event} while {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Status code of a backend rejection, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
