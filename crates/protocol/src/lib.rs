//! Protocol-level building blocks shared across the bridge: generic value
//! coercions, namespaced identifiers, and the invocation result model.
//!
//! This crate is deliberately leaf-level — it knows nothing about the
//! platform or router capabilities, only about the shapes that cross the
//! wire between them.

pub mod invoke;
pub mod uri;
pub mod value;

pub use invoke::{InvokeError, InvokePayload, InvokeResult};
pub use uri::{CANCELED_URI, INVALID_ARGUMENT_URI, Namespace};
pub use value::{as_snowflake, bool_or};
