//! In-memory capability implementations.
//!
//! These back the bridge's own test suite and give downstream consumers
//! something to wire a bridge against in their tests, the same way the
//! production process wires real transports.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use {
    async_trait::async_trait,
    serde_json::{Map, Value},
    tokio_util::sync::CancellationToken,
};

use voxlink_config::RouterConfig;
use voxlink_protocol::{InvokeError, InvokeResult};

use crate::{
    errors::{PlatformError, RouterError},
    platform::{
        EventHook, EventKind, GuildMembership, Identity, PlatformClient, PlatformConnector,
        VoiceStateRequest,
    },
    router::{Invocation, ProcedureHandler, RouterConnector, RouterSession},
};

/// Lock a mutex, recovering from poisoning — a panicked test thread must
/// not cascade into unrelated assertions.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Platform fakes ───────────────────────────────────────────────────────────

#[derive(Default)]
struct PlatformState {
    ready: bool,
    close_calls: usize,
    user: Option<Identity>,
    guilds: Vec<GuildMembership>,
    hooks: HashMap<EventKind, Vec<EventHook>>,
    voice_requests: Vec<VoiceStateRequest>,
    fail_rest: Option<PlatformError>,
    fail_open: Option<PlatformError>,
    delay_voice: bool,
}

/// Scripted in-memory platform client.
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<PlatformState>,
}

impl MemoryPlatform {
    pub fn set_user(&self, user: Identity) {
        lock(&self.state).user = Some(user);
    }

    pub fn set_guilds(&self, guilds: Vec<GuildMembership>) {
        lock(&self.state).guilds = guilds;
    }

    /// Make every subsequent REST call fail with this error.
    pub fn fail_with(&self, err: PlatformError) {
        lock(&self.state).fail_rest = Some(err);
    }

    /// Make the next `open` fail with this error.
    pub fn fail_open(&self, err: PlatformError) {
        lock(&self.state).fail_open = Some(err);
    }

    /// Make voice-state calls take long enough for a cancellation to win.
    pub fn delay_voice_calls(&self) {
        lock(&self.state).delay_voice = true;
    }

    /// Deliver an event to every hook subscribed for `kind`.
    pub fn emit(&self, kind: EventKind, payload: Value) {
        let hooks: Vec<EventHook> = lock(&self.state).hooks.get(&kind).cloned().unwrap_or_default();
        for hook in hooks {
            hook(payload.clone());
        }
    }

    pub fn voice_requests(&self) -> Vec<VoiceStateRequest> {
        lock(&self.state).voice_requests.clone()
    }

    pub fn close_calls(&self) -> usize {
        lock(&self.state).close_calls
    }

    fn rest_failure(&self) -> Option<PlatformError> {
        lock(&self.state).fail_rest.clone()
    }
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    async fn open(&self) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.fail_open.take() {
            return Err(err);
        }
        state.ready = true;
        Ok(())
    }

    async fn close(&self) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        state.close_calls += 1;
        state.ready = false;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        lock(&self.state).ready
    }

    fn subscribe(&self, kind: EventKind, hook: EventHook) {
        lock(&self.state).hooks.entry(kind).or_default().push(hook);
    }

    async fn current_user(&self) -> Result<Identity, PlatformError> {
        if let Some(err) = self.rest_failure() {
            return Err(err);
        }
        lock(&self.state)
            .user
            .clone()
            .ok_or_else(|| PlatformError::other("no identity scripted"))
    }

    async fn guild_memberships(
        &self,
        limit: usize,
    ) -> Result<Vec<GuildMembership>, PlatformError> {
        if let Some(err) = self.rest_failure() {
            return Err(err);
        }
        let guilds = lock(&self.state).guilds.clone();
        Ok(guilds.into_iter().take(limit).collect())
    }

    async fn set_voice_state(&self, req: VoiceStateRequest) -> Result<(), PlatformError> {
        let delay = lock(&self.state).delay_voice;
        if delay {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if let Some(err) = self.rest_failure() {
            return Err(err);
        }
        lock(&self.state).voice_requests.push(req);
        Ok(())
    }
}

/// Hands out scripted clients per token. Tokens without a scripted client
/// get a fresh default one, which is remembered for later inspection.
#[derive(Default)]
pub struct MemoryPlatformConnector {
    clients: Mutex<HashMap<String, Arc<MemoryPlatform>>>,
    fail_connect: Mutex<Option<PlatformError>>,
}

impl MemoryPlatformConnector {
    pub fn insert(&self, token: &str, client: Arc<MemoryPlatform>) {
        lock(&self.clients).insert(token.to_owned(), client);
    }

    /// Make the next `client` call itself fail.
    pub fn fail_with(&self, err: PlatformError) {
        *lock(&self.fail_connect) = Some(err);
    }

    /// The client handed out for `token`, if any.
    pub fn client_for(&self, token: &str) -> Option<Arc<MemoryPlatform>> {
        lock(&self.clients).get(token).cloned()
    }
}

#[async_trait]
impl PlatformConnector for MemoryPlatformConnector {
    async fn client(&self, token: &str) -> Result<Arc<dyn PlatformClient>, PlatformError> {
        if let Some(err) = lock(&self.fail_connect).take() {
            return Err(err);
        }
        let client = Arc::clone(
            lock(&self.clients)
                .entry(token.to_owned())
                .or_insert_with(|| Arc::new(MemoryPlatform::default())),
        );
        Ok(client)
    }
}

// ── Router fakes ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct RouterState {
    procedures: HashMap<String, ProcedureHandler>,
    register_attempts: Vec<String>,
    register_failures: HashMap<String, String>,
    publishes: Vec<(String, Vec<Value>)>,
    fail_publishes: bool,
    closed: bool,
    close_calls: usize,
}

/// In-memory router session capturing registrations and publishes, with
/// a test-side dispatch entry point.
pub struct MemoryRouter {
    state: Mutex<RouterState>,
    done: CancellationToken,
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self {
            state: Mutex::new(RouterState::default()),
            done: CancellationToken::new(),
        }
    }
}

impl MemoryRouter {
    /// Make registration of this exact procedure name fail.
    pub fn fail_register(&self, procedure: &str, reason: &str) {
        lock(&self.state).register_failures.insert(procedure.to_owned(), reason.to_owned());
    }

    /// Make every subsequent publish fail.
    pub fn fail_publishes(&self) {
        lock(&self.state).fail_publishes = true;
    }

    /// Terminate the session, tripping `done` waiters.
    pub fn terminate(&self) {
        lock(&self.state).closed = true;
        self.done.cancel();
    }

    /// Successfully registered procedure names, in registration order.
    pub fn registered(&self) -> Vec<String> {
        let state = lock(&self.state);
        state
            .register_attempts
            .iter()
            .filter(|name| state.procedures.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Every registration attempt, successful or not.
    pub fn register_attempts(&self) -> Vec<String> {
        lock(&self.state).register_attempts.clone()
    }

    pub fn publishes(&self) -> Vec<(String, Vec<Value>)> {
        lock(&self.state).publishes.clone()
    }

    pub fn close_calls(&self) -> usize {
        lock(&self.state).close_calls
    }

    /// Dispatch an invocation to a registered procedure, as the router
    /// would on behalf of a remote caller.
    pub async fn invoke(
        &self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> InvokeResult {
        let Some(handler) = lock(&self.state).procedures.get(procedure).cloned() else {
            return InvokeError::new("rpc.error.no_such_procedure").with_arg(procedure).into();
        };
        handler(Invocation::new(args, kwargs)).await
    }
}

#[async_trait]
impl RouterSession for MemoryRouter {
    async fn register(
        &self,
        procedure: &str,
        handler: ProcedureHandler,
    ) -> Result<(), RouterError> {
        let mut state = lock(&self.state);
        state.register_attempts.push(procedure.to_owned());
        if let Some(reason) = state.register_failures.get(procedure) {
            return Err(RouterError::Register {
                procedure: procedure.to_owned(),
                reason: reason.clone(),
            });
        }
        state.procedures.insert(procedure.to_owned(), handler);
        Ok(())
    }

    async fn publish(&self, topic: &str, args: Vec<Value>) -> Result<(), RouterError> {
        let mut state = lock(&self.state);
        if state.fail_publishes || state.closed {
            return Err(RouterError::Publish {
                topic: topic.to_owned(),
                reason: "publish rejected".into(),
            });
        }
        state.publishes.push((topic.to_owned(), args));
        Ok(())
    }

    fn connected(&self) -> bool {
        !lock(&self.state).closed
    }

    async fn close(&self) -> Result<(), RouterError> {
        let mut state = lock(&self.state);
        state.close_calls += 1;
        state.closed = true;
        drop(state);
        self.done.cancel();
        Ok(())
    }

    async fn done(&self) {
        self.done.cancelled().await;
    }
}

/// Connector handing out one shared [`MemoryRouter`] session, so tests
/// keep a handle to the session the bridge connects to.
pub struct MemoryRouterConnector {
    session: Arc<MemoryRouter>,
    fail_connect: Mutex<Option<RouterError>>,
}

impl MemoryRouterConnector {
    pub fn new(session: Arc<MemoryRouter>) -> Self {
        Self {
            session,
            fail_connect: Mutex::new(None),
        }
    }

    /// Make the next `connect` fail.
    pub fn fail_with(&self, err: RouterError) {
        *lock(&self.fail_connect) = Some(err);
    }
}

#[async_trait]
impl RouterConnector for MemoryRouterConnector {
    async fn connect(
        &self,
        _addr: &str,
        _config: &RouterConfig,
    ) -> Result<Arc<dyn RouterSession>, RouterError> {
        if let Some(err) = lock(&self.fail_connect).take() {
            return Err(err);
        }
        Ok(Arc::clone(&self.session) as Arc<dyn RouterSession>)
    }
}
