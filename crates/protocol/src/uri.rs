//! Procedure, topic and error identifiers.
//!
//! Every procedure and topic of one bridge instance lives under a single
//! dotted namespace prefix, so multiple bridges can coexist on one
//! router. Error identifiers form a closed set: four namespaced platform
//! identifiers plus the router protocol's shared ones below.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shared invalid-argument identifier defined by the router protocol,
/// distinguishable from every platform error.
pub const INVALID_ARGUMENT_URI: &str = "rpc.error.invalid_argument";

/// Shared identifier for an invocation abandoned by its caller.
pub const CANCELED_URI: &str = "rpc.error.canceled";

/// Dotted prefix under which one bridge instance registers all of its
/// procedures and topics. Always stored with a trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub const DEFAULT: &'static str = "com.voxlink.";

    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('.') {
            prefix.push('.');
        }
        Self(prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified procedure name.
    pub fn procedure(&self, name: &str) -> String {
        format!("{}{name}", self.0)
    }

    /// Fully qualified topic for a forwarded platform event.
    pub fn event_topic(&self, event: &str) -> String {
        format!("{}on_{event}", self.0)
    }

    /// Generic platform error identifier.
    pub fn error_uri(&self) -> String {
        format!("{}error", self.0)
    }

    /// Bridge-side invariant violation.
    pub fn internal_error_uri(&self) -> String {
        format!("{}error.internal", self.0)
    }

    /// HTTP-401-equivalent platform failure.
    pub fn unauthorized_uri(&self) -> String {
        format!("{}error.unauthorized", self.0)
    }

    /// HTTP-404-equivalent platform failure.
    pub fn not_found_uri(&self) -> String {
        format!("{}error.not_found", self.0)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}
