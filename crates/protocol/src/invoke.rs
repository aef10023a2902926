//! The result of one remote invocation: exactly one of a success payload
//! or an error descriptor. Handlers never surface anything else — every
//! failure path collapses into an [`InvokeError`].

use serde_json::{Map, Value};

use crate::uri::INVALID_ARGUMENT_URI;

/// Ordered result values plus optional named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokePayload {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

/// Stable error identifier plus free-form detail values and structured
/// named fields (notably a numeric `status_code` when known).
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeError {
    pub uri: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl InvokeError {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Invalid-argument error naming the offending parameter.
    pub fn invalid_argument(detail: impl Into<Value>) -> Self {
        Self::new(INVALID_ARGUMENT_URI).with_arg(detail)
    }

    pub fn with_arg(mut self, v: impl Into<Value>) -> Self {
        self.args.push(v.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, v: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), v.into());
        self
    }
}

/// Outcome of one dispatched invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeResult {
    Success(InvokePayload),
    Error(InvokeError),
}

impl InvokeResult {
    /// Empty success, for procedures with no return value.
    pub fn empty() -> Self {
        Self::Success(InvokePayload::default())
    }

    /// Success carrying ordered result values.
    pub fn ok(args: Vec<Value>) -> Self {
        Self::Success(InvokePayload {
            args,
            kwargs: Map::new(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn payload(&self) -> Option<&InvokePayload> {
        match self {
            Self::Success(p) => Some(p),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&InvokeError> {
        match self {
            Self::Success(_) => None,
            Self::Error(e) => Some(e),
        }
    }
}

impl From<InvokeError> for InvokeResult {
    fn from(e: InvokeError) -> Self {
        Self::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_success_has_no_values() {
        let res = InvokeResult::empty();
        assert!(res.is_success());
        assert!(res.payload().is_some_and(|p| p.args.is_empty() && p.kwargs.is_empty()));
    }

    #[test]
    fn error_builder_accumulates() {
        let res: InvokeResult = InvokeError::new("com.voxlink.error")
            .with_arg("unexpected error response")
            .with_kwarg("status_code", 500)
            .into();
        let err = res.error().expect("error result");
        assert_eq!(err.uri, "com.voxlink.error");
        assert_eq!(err.args, vec![json!("unexpected error response")]);
        assert_eq!(err.kwargs.get("status_code"), Some(&json!(500)));
    }

    #[test]
    fn invalid_argument_uses_shared_identifier() {
        let err = InvokeError::invalid_argument("guild_id missing");
        assert_eq!(err.uri, INVALID_ARGUMENT_URI);
        assert_eq!(err.args, vec![json!("guild_id missing")]);
    }
}
