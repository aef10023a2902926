//! Bridge core: exposes a chat platform's voice-channel control and
//! identity/guild lookup as remote procedures and published topics on a
//! pub/sub+RPC router, without other router peers ever holding platform
//! credentials.
//!
//! Lifecycle:
//! 1. [`Bridge::connect`] builds the platform client and router session
//! 2. [`Bridge::open`] opens the platform session, installs event
//!    forwarding, then registers the full procedure catalogue
//! 3. the router session drives invocations, the platform session drives
//!    events, independently and concurrently
//! 4. [`Bridge::done`] resolves when the router session terminates
//!
//! The platform and router wire protocols stay behind the capability
//! traits in [`platform`] and [`router`]; concrete transports are wired
//! in by the embedding process.

pub mod bridge;
pub mod errors;
pub mod exec;
pub mod forward;
pub mod platform;
pub mod procedures;
pub mod router;
pub mod testkit;
pub mod translate;

pub use bridge::Bridge;
pub use errors::{AggregateError, ConnectError, PlatformError, RouterError, join_errors};
