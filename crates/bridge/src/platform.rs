//! Chat-platform capability: the consumed interface of the platform
//! client. The wire protocol behind it is opaque to the bridge; anything
//! that can open a session, answer the REST lookups and deliver gateway
//! events can be bridged.

use std::sync::Arc;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::errors::PlatformError;

/// Platform gateway events the bridge can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    VoiceStateUpdate,
    VoiceServerUpdate,
}

impl EventKind {
    /// Event name as it appears in outbound topic names.
    pub fn name(self) -> &'static str {
        match self {
            Self::VoiceStateUpdate => "voice_state_update",
            Self::VoiceServerUpdate => "voice_server_update",
        }
    }
}

/// Hook invoked synchronously for every delivered event of one kind.
/// Must not block the platform's delivery loop.
pub type EventHook = Arc<dyn Fn(Value) + Send + Sync>;

/// The identity record behind a caller-supplied token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// One guild-membership record for a token's user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMembership {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: bool,
}

/// Voice-state change request. `channel_id: None` signals leaving voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceStateRequest {
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub mute: bool,
    pub deaf: bool,
}

/// Builds platform clients from tokens.
///
/// Building is local and cheap; tokens are only validated once a call
/// actually reaches the platform. Scoped per-invocation clients for
/// `token.*` lookups come from here as well.
#[async_trait]
pub trait PlatformConnector: Send + Sync {
    async fn client(&self, token: &str) -> Result<Arc<dyn PlatformClient>, PlatformError>;
}

/// One platform session: a gateway connection plus REST operations.
///
/// Shared read-only across concurrent handler executions; implementations
/// must be safe to call from overlapping tasks.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Open the gateway session. Required for events and voice control;
    /// the REST lookups work without it.
    async fn open(&self) -> Result<(), PlatformError>;

    /// Close the session. Idempotent.
    async fn close(&self) -> Result<(), PlatformError>;

    /// Whether the gateway session currently reports itself ready.
    fn is_ready(&self) -> bool;

    /// Install an event hook. Hooks installed before `open` observe every
    /// delivered event, in the platform's per-kind delivery order.
    fn subscribe(&self, kind: EventKind, hook: EventHook);

    /// Fetch the identity owning this session's token.
    async fn current_user(&self) -> Result<Identity, PlatformError>;

    /// Fetch up to `limit` guild memberships for this session's token,
    /// in platform-reported order.
    async fn guild_memberships(&self, limit: usize)
    -> Result<Vec<GuildMembership>, PlatformError>;

    /// Join or leave a voice channel. No native cancellation once issued.
    async fn set_voice_state(&self, req: VoiceStateRequest) -> Result<(), PlatformError>;
}
