//! Failure modes of a reconstruction run.
//!
//! Every stage fails the whole run on the first error: nothing is retried and
//! no stage leaves a partially accumulated volume behind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Inconsistent or missing configuration, detected before any computation
    /// starts (e.g. geometry/projection count mismatch).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed filter or reconstruction parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Geometry record violating `SDD > SID > 0`.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A projection, kernel or volume buffer could not be allocated.
    #[error("could not allocate {what} ({elements} elements)")]
    ResourceExhausted { what: &'static str, elements: usize },

    /// The run was aborted between two pipeline stages.
    #[error("reconstruction cancelled in state {0:?}")]
    Cancelled(crate::reconstruction::State),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
