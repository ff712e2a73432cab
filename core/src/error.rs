//! Error types for the Hatena Blog client.
//!
//! # Design
//! `Validation` is raised locally before any request is built, so callers can
//! fix the entry and try again. Any non-2xx response becomes `InvalidRequest`
//! with the raw status and body. Transport failures from ureq pass through
//! untouched.

/// Errors returned by `Client`, `BlogApi`, `Collection` and `Entry`.
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// An entry is missing a field required for the operation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The platform answered with a non-success status.
    #[error("invalid request: HTTP {status}: {body}")]
    InvalidRequest { status: u16, body: String },

    /// The Atom document was malformed or lacked a required element.
    #[error("atom parse failed: {0}")]
    Parse(String),

    /// Credentials or endpoint settings could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] ureq::Error),
}

impl From<quick_xml::Error> for BlogError {
    fn from(err: quick_xml::Error) -> Self {
        BlogError::Parse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for BlogError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        BlogError::Parse(err.to_string())
    }
}
