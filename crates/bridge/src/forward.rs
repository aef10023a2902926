//! Forwards selected platform events to router topics, fire-and-forget.

use std::sync::Arc;

use {serde_json::Value, tokio::sync::mpsc, tracing::debug};

use voxlink_protocol::Namespace;

use crate::{
    platform::{EventKind, PlatformClient},
    router::RouterSession,
};

/// Event kinds forwarded to the router. Fixed at open time.
pub const FORWARDED_EVENTS: &[EventKind] =
    &[EventKind::VoiceStateUpdate, EventKind::VoiceServerUpdate];

/// Install one forwarding rule per event kind of interest.
///
/// Each rule owns an unbounded channel: the platform hook enqueues the
/// payload without blocking the delivery loop, and a drain task publishes
/// it to `<ns>on_<event>` with the payload as the single positional
/// argument. Publish failures are logged and swallowed — forwarding must
/// never interrupt the platform session's own event delivery. Per-kind
/// ordering follows the platform's delivery order; there is no ordering
/// across kinds.
pub fn install_forwarding(
    platform: &dyn PlatformClient,
    router: &Arc<dyn RouterSession>,
    ns: &Namespace,
) {
    for &kind in FORWARDED_EVENTS {
        let topic = ns.event_topic(kind.name());
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        platform.subscribe(
            kind,
            Arc::new(move |payload| {
                // Send failure means the drain task is gone (session
                // closing); dropping the event is the intended behavior.
                let _ = tx.send(payload);
            }),
        );

        let router = Arc::clone(router);
        tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                if let Err(e) = router.publish(&topic, vec![payload]).await {
                    debug!(topic = %topic, error = %e, "event publish failed");
                }
            }
        });
    }
}
