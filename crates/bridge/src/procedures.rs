//! Procedure table and handlers.
//!
//! Every handler follows the same contract: validate arguments first,
//! execute the platform call (through the cancellation executor when the
//! call has no native abort), translate failures through the error
//! taxonomy, and always resolve to an [`InvokeResult`] — no handler
//! failure ever escapes as an uncaught fault.

use std::{future::Future, sync::Arc};

use {serde_json::Value, tracing::debug};

use voxlink_protocol::{CANCELED_URI, InvokeError, InvokeResult, Namespace, as_snowflake, bool_or};

use crate::{
    exec::{RaceError, race_cancel},
    platform::{PlatformClient, PlatformConnector, VoiceStateRequest},
    router::{Invocation, ProcedureHandler},
    translate::{internal_error, result_from_platform_error},
};

// ── Types ────────────────────────────────────────────────────────────────────

/// Hard upper bound on the guild-membership page size.
pub const MAX_GUILD_PAGE: usize = 100;

/// Shared, read-only context captured by every handler. Handlers only
/// ever invoke the session handles, never mutate them.
pub struct BridgeContext {
    pub platform: Arc<dyn PlatformClient>,
    pub connector: Arc<dyn PlatformConnector>,
    pub ns: Namespace,
    pub guild_page: usize,
}

/// The full procedure catalogue for one bridge instance, built once at
/// open time and owned by the bridge — no process-wide registry.
pub struct ProcedureTable {
    entries: Vec<(String, ProcedureHandler)>,
}

impl ProcedureTable {
    pub fn build(ctx: &Arc<BridgeContext>) -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.register_meta_procedures(ctx);
        table.register_voice_procedures(ctx);
        table.register_token_procedures(ctx);
        table
    }

    fn add<F, Fut>(&mut self, name: String, handler: F)
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InvokeResult> + Send + 'static,
    {
        self.entries.push((name, Arc::new(move |inv| Box::pin(handler(inv)))));
    }

    pub fn entries(&self) -> &[(String, ProcedureHandler)] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    // ── Meta procedures ──────────────────────────────────────────────────

    fn register_meta_procedures(&mut self, ctx: &Arc<BridgeContext>) {
        // meta.assert_ready — local readiness check, no platform call.
        let name = ctx.ns.procedure("meta.assert_ready");
        let c = Arc::clone(ctx);
        self.add(name, move |_inv| {
            let c = Arc::clone(&c);
            async move {
                if c.platform.is_ready() {
                    InvokeResult::empty()
                } else {
                    InvokeError::new(c.ns.error_uri()).with_arg("not connected").into()
                }
            }
        });
    }

    // ── Voice procedures ─────────────────────────────────────────────────

    fn register_voice_procedures(&mut self, ctx: &Arc<BridgeContext>) {
        let name = ctx.ns.procedure("update_voice_state");
        let c = Arc::clone(ctx);
        self.add(name, move |inv| {
            let c = Arc::clone(&c);
            async move { update_voice_state(c, inv).await }
        });
    }

    // ── Token procedures ─────────────────────────────────────────────────

    fn register_token_procedures(&mut self, ctx: &Arc<BridgeContext>) {
        let name = ctx.ns.procedure("token.user");
        let c = Arc::clone(ctx);
        self.add(name, move |inv| {
            let c = Arc::clone(&c);
            async move { token_user(c, inv).await }
        });

        let name = ctx.ns.procedure("token.guilds");
        let c = Arc::clone(ctx);
        self.add(name, move |inv| {
            let c = Arc::clone(&c);
            async move { token_guilds(c, inv).await }
        });

        let name = ctx.ns.procedure("token.in_guild");
        let c = Arc::clone(ctx);
        self.add(name, move |inv| {
            let c = Arc::clone(&c);
            async move { token_in_guild(c, inv).await }
        });
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn update_voice_state(ctx: Arc<BridgeContext>, inv: Invocation) -> InvokeResult {
    let Some(guild_arg) = inv.args.first() else {
        return InvokeError::invalid_argument("guild_id missing").into();
    };
    let Some(guild_id) = as_snowflake(guild_arg) else {
        return InvokeError::invalid_argument("guild_id must be a snowflake").into();
    };

    // Absent or null channel id signals leaving voice.
    let channel_id = match inv.args.get(1) {
        None | Some(Value::Null) => None,
        Some(v) => match as_snowflake(v) {
            Some(id) => Some(id),
            None => {
                return InvokeError::invalid_argument("channel_id must be a snowflake").into();
            },
        },
    };

    let mute = bool_or(inv.kwargs.get("mute"), false);
    let deaf = bool_or(inv.kwargs.get("deaf"), false);

    debug!(
        guild_id = %guild_id,
        channel_id = channel_id.as_deref().unwrap_or("<leave>"),
        mute,
        deaf,
        "update_voice_state"
    );

    let req = VoiceStateRequest {
        guild_id,
        channel_id,
        mute,
        deaf,
    };
    let platform = Arc::clone(&ctx.platform);
    match race_cancel(&inv.cancel, async move { platform.set_voice_state(req).await }).await {
        Ok(Ok(())) => InvokeResult::empty(),
        Ok(Err(e)) => result_from_platform_error(&ctx.ns, e),
        Err(e) => race_error_result(&ctx.ns, e),
    }
}

async fn token_user(ctx: Arc<BridgeContext>, inv: Invocation) -> InvokeResult {
    let client = match scoped_client(&ctx, &inv).await {
        Ok(client) => client,
        Err(res) => return res,
    };

    let call = {
        let client = Arc::clone(&client);
        async move { client.current_user().await }
    };
    let outcome = race_cancel(&inv.cancel, call).await;
    let _ = client.close().await;

    match outcome {
        Ok(Ok(user)) => match serde_json::to_value(&user) {
            Ok(v) => InvokeResult::ok(vec![v]),
            Err(e) => internal_error(&ctx.ns, e.to_string()),
        },
        Ok(Err(e)) => result_from_platform_error(&ctx.ns, e),
        Err(e) => race_error_result(&ctx.ns, e),
    }
}

async fn token_guilds(ctx: Arc<BridgeContext>, inv: Invocation) -> InvokeResult {
    let client = match scoped_client(&ctx, &inv).await {
        Ok(client) => client,
        Err(res) => return res,
    };

    let limit = ctx.guild_page.min(MAX_GUILD_PAGE);
    let call = {
        let client = Arc::clone(&client);
        async move { client.guild_memberships(limit).await }
    };
    let outcome = race_cancel(&inv.cancel, call).await;
    let _ = client.close().await;

    match outcome {
        Ok(Ok(guilds)) => {
            let mut args = Vec::with_capacity(guilds.len());
            for guild in &guilds {
                match serde_json::to_value(guild) {
                    Ok(v) => args.push(v),
                    Err(e) => return internal_error(&ctx.ns, e.to_string()),
                }
            }
            InvokeResult::ok(args)
        },
        Ok(Err(e)) => result_from_platform_error(&ctx.ns, e),
        Err(e) => race_error_result(&ctx.ns, e),
    }
}

async fn token_in_guild(ctx: Arc<BridgeContext>, inv: Invocation) -> InvokeResult {
    if inv.args.len() != 2 {
        return InvokeError::invalid_argument("expected 2 arguments (token, guild_id)").into();
    }
    let Some(guild_id) = as_snowflake(&inv.args[1]) else {
        return InvokeError::invalid_argument("guild_id must be a snowflake").into();
    };

    let client = match scoped_client(&ctx, &inv).await {
        Ok(client) => client,
        Err(res) => return res,
    };

    let limit = ctx.guild_page.min(MAX_GUILD_PAGE);
    let call = {
        let client = Arc::clone(&client);
        async move { client.guild_memberships(limit).await }
    };
    let outcome = race_cancel(&inv.cancel, call).await;
    let _ = client.close().await;

    match outcome {
        Ok(Ok(guilds)) => {
            let found = guilds.iter().any(|g| g.id == guild_id);
            InvokeResult::ok(vec![Value::Bool(found)])
        },
        Ok(Err(e)) => result_from_platform_error(&ctx.ns, e),
        Err(e) => race_error_result(&ctx.ns, e),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Build a scoped client from the caller-supplied token in argument 0.
///
/// The returned client is exclusively owned by this invocation; callers
/// close it before returning on every path.
async fn scoped_client(
    ctx: &BridgeContext,
    inv: &Invocation,
) -> Result<Arc<dyn PlatformClient>, InvokeResult> {
    let Some(token_arg) = inv.args.first() else {
        return Err(InvokeError::invalid_argument("token missing").into());
    };
    let Some(token) = token_arg.as_str() else {
        return Err(InvokeError::invalid_argument("token must be a string").into());
    };

    match ctx.connector.client(token).await {
        Ok(client) => Ok(client),
        // Client construction is local; failing here is a bridge-side
        // fault, not a caller error.
        Err(e) => Err(internal_error(&ctx.ns, e.to_string())),
    }
}

fn race_error_result(ns: &Namespace, err: RaceError) -> InvokeResult {
    match err {
        RaceError::Canceled => InvokeError::new(CANCELED_URI).into(),
        RaceError::Join(msg) => internal_error(ns, msg),
    }
}
