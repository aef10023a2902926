//! Error taxonomy and multi-error aggregation.
//!
//! Two heterogeneous failure domains meet in the bridge: the platform's
//! REST/gateway errors and the router's session errors. Both are typed
//! here; multi-step lifecycle operations combine their failures through
//! [`join_errors`] so no error can mask another.

use std::fmt;

use thiserror::Error;

/// Failure reported by the chat-platform capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// A classified REST failure with a known HTTP status.
    #[error("{message} (status {status})")]
    Rest { status: u16, message: String },

    /// Any other failure shape reported by the platform client.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    pub fn rest(status: u16, message: impl Into<String>) -> Self {
        Self::Rest {
            status,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// The HTTP status code, when known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rest { status, .. } => Some(*status),
            Self::Other(_) => None,
        }
    }
}

/// Failure reported by the router capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("{0}")]
    Connect(String),

    #[error("registration of {procedure} failed: {reason}")]
    Register { procedure: String, reason: String },

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("router session closed")]
    Closed,
}

/// Fatal startup failure: one of the two sessions could not be built.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection to platform failed: {0}")]
    Platform(#[source] PlatformError),

    #[error("connection to router failed: {0}")]
    Router(#[source] RouterError),
}

/// More than one failure out of a multi-step operation.
///
/// Displays every cause's message newline-joined; the individual causes
/// stay retrievable through [`AggregateError::errors`].
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    fn new(errors: Vec<anyhow::Error>) -> Self {
        Self { errors }
    }

    /// The individual causes, in the order they were collected.
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Combine candidate errors per the aggregation policy: none → `None`,
/// exactly one → that error unchanged (its kind stays downcastable),
/// several → an [`AggregateError`] carrying all of them.
pub fn join_errors(errors: impl IntoIterator<Item = anyhow::Error>) -> Option<anyhow::Error> {
    let mut errors: Vec<anyhow::Error> = errors.into_iter().collect();
    match errors.len() {
        0 => None,
        1 => errors.pop(),
        _ => Some(anyhow::Error::new(AggregateError::new(errors))),
    }
}
