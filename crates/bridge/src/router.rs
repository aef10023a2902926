//! Router capability: the consumed interface of the pub/sub+RPC session.
//! Like the platform side, the wire protocol stays opaque; the bridge
//! only needs register/publish/close and a termination signal.

use std::sync::Arc;

use {
    async_trait::async_trait,
    futures::future::BoxFuture,
    serde_json::{Map, Value},
    tokio_util::sync::CancellationToken,
};

use voxlink_config::RouterConfig;
use voxlink_protocol::InvokeResult;

use crate::errors::RouterError;

/// One inbound remote-call request: decoded arguments plus the router
/// layer's cancellation handle for this call.
pub struct Invocation {
    /// Decoded positional arguments.
    pub args: Vec<Value>,
    /// Decoded named arguments.
    pub kwargs: Map<String, Value>,
    /// Fires when the router abandons the call (deadline or disconnect).
    pub cancel: CancellationToken,
}

impl Invocation {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self {
            args,
            kwargs,
            cancel: CancellationToken::new(),
        }
    }
}

/// A registered procedure body. Always resolves to an [`InvokeResult`];
/// no handler failure escapes as an uncaught fault.
pub type ProcedureHandler =
    Arc<dyn Fn(Invocation) -> BoxFuture<'static, InvokeResult> + Send + Sync>;

/// Establishes router sessions.
#[async_trait]
pub trait RouterConnector: Send + Sync {
    async fn connect(
        &self,
        addr: &str,
        config: &RouterConfig,
    ) -> Result<Arc<dyn RouterSession>, RouterError>;
}

/// One router session.
#[async_trait]
pub trait RouterSession: Send + Sync {
    /// Register a named procedure. Names arrive fully qualified.
    async fn register(&self, procedure: &str, handler: ProcedureHandler)
    -> Result<(), RouterError>;

    /// Publish positional arguments to a topic.
    async fn publish(&self, topic: &str, args: Vec<Value>) -> Result<(), RouterError>;

    /// Whether the session is currently connected.
    fn connected(&self) -> bool;

    /// Close the session. Idempotent.
    async fn close(&self) -> Result<(), RouterError>;

    /// Resolves exactly once, when the session terminates for any reason
    /// (clean shutdown or transport failure).
    async fn done(&self);
}
