//! Maps platform failures into the closed cross-process error taxonomy.
//!
//! Remote callers only ever see the stable identifiers produced here;
//! the platform's own error shapes never cross the router.

use voxlink_protocol::{InvokeError, InvokeResult, Namespace};

use crate::errors::PlatformError;

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_NOT_FOUND: u16 = 404;

/// Translate a platform failure into an error result.
///
/// A known HTTP status is always attached as the `status_code` kwarg,
/// whatever the classification. Unrecognized error shapes map to the
/// generic identifier with an "unknown error" marker.
pub fn result_from_platform_error(ns: &Namespace, err: PlatformError) -> InvokeResult {
    match err {
        PlatformError::Rest { status, message } => {
            let base = match status {
                STATUS_UNAUTHORIZED => InvokeError::new(ns.unauthorized_uri()),
                STATUS_NOT_FOUND => InvokeError::new(ns.not_found_uri()),
                _ => InvokeError::new(ns.error_uri())
                    .with_arg("unexpected error response")
                    .with_arg(message),
            };
            base.with_kwarg("status_code", status).into()
        },
        PlatformError::Other(message) => InvokeError::new(ns.error_uri())
            .with_arg("unknown error")
            .with_arg(message)
            .into(),
    }
}

/// Error result for a bridge-side invariant violation. Still returned as
/// an ordinary result rather than crashing the session.
pub fn internal_error(ns: &Namespace, message: impl Into<String>) -> InvokeResult {
    InvokeError::new(ns.internal_error_uri()).with_arg(message.into()).into()
}
