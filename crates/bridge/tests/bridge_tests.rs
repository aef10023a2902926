//! End-to-end bridge lifecycle tests against the in-memory capabilities.

use std::{sync::Arc, time::Duration};

use serde_json::{Map, json};

use {
    voxlink_bridge::{
        AggregateError, Bridge, ConnectError, RouterError,
        errors::PlatformError,
        platform::{EventKind, GuildMembership, Identity, PlatformClient},
        testkit::{MemoryPlatform, MemoryPlatformConnector, MemoryRouter, MemoryRouterConnector},
    },
    voxlink_config::BridgeConfig,
};

const BOT_TOKEN: &str = "bot-token";

struct Fixture {
    config: BridgeConfig,
    bot: Arc<MemoryPlatform>,
    platforms: Arc<MemoryPlatformConnector>,
    router: Arc<MemoryRouter>,
    routers: Arc<MemoryRouterConnector>,
}

fn fixture() -> Fixture {
    let mut config = BridgeConfig::default();
    config.platform.token = BOT_TOKEN.into();

    let bot = Arc::new(MemoryPlatform::default());
    let platforms = Arc::new(MemoryPlatformConnector::default());
    platforms.insert(BOT_TOKEN, Arc::clone(&bot));

    let router = Arc::new(MemoryRouter::default());
    let routers = Arc::new(MemoryRouterConnector::new(Arc::clone(&router)));

    Fixture {
        config,
        bot,
        platforms,
        router,
        routers,
    }
}

async fn connect(f: &Fixture) -> Bridge {
    Bridge::connect(
        &f.config,
        Arc::clone(&f.platforms) as _,
        Arc::clone(&f.routers) as _,
    )
    .await
    .expect("connect")
}

/// Poll until `check` passes or a short deadline expires. Event
/// forwarding runs on spawned drain tasks, so publishes land
/// asynchronously.
async fn wait_for(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn open_registers_full_catalogue() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    assert!(f.bot.is_ready());
    assert_eq!(f.router.registered(), vec![
        "com.voxlink.meta.assert_ready",
        "com.voxlink.update_voice_state",
        "com.voxlink.token.user",
        "com.voxlink.token.guilds",
        "com.voxlink.token.in_guild",
    ]);
}

#[tokio::test]
async fn router_failure_releases_platform_client() {
    let f = fixture();
    f.routers.fail_with(RouterError::Connect("router unreachable".into()));

    let err = Bridge::connect(
        &f.config,
        Arc::clone(&f.platforms) as _,
        Arc::clone(&f.routers) as _,
    )
    .await
    .expect_err("router down");

    assert!(matches!(err, ConnectError::Router(_)));
    assert_eq!(f.bot.close_calls(), 1);
}

#[tokio::test]
async fn platform_failure_surfaces_as_connect_error() {
    let f = fixture();
    f.platforms.fail_with(PlatformError::other("credential store offline"));

    let err = Bridge::connect(
        &f.config,
        Arc::clone(&f.platforms) as _,
        Arc::clone(&f.routers) as _,
    )
    .await
    .expect_err("platform down");

    assert!(matches!(err, ConnectError::Platform(_)));
}

#[tokio::test]
async fn open_failure_registers_nothing() {
    let f = fixture();
    f.bot.fail_open(PlatformError::other("gateway handshake failed"));

    let bridge = connect(&f).await;
    assert!(bridge.open().await.is_err());
    assert!(f.router.register_attempts().is_empty());
}

#[tokio::test]
async fn registration_failures_are_aggregated() {
    let f = fixture();
    f.router.fail_register("com.voxlink.token.user", "procedure already exists");
    f.router.fail_register("com.voxlink.token.guilds", "procedure already exists");

    let bridge = connect(&f).await;
    let err = bridge.open().await.expect_err("two registrations fail");

    let agg = err.downcast_ref::<AggregateError>().expect("aggregate");
    assert_eq!(agg.errors().len(), 2);
    // Every registration was still attempted.
    assert_eq!(f.router.register_attempts().len(), 5);
    assert_eq!(f.router.registered().len(), 3);
}

#[tokio::test]
async fn single_registration_failure_keeps_its_identity() {
    let f = fixture();
    f.router.fail_register("com.voxlink.update_voice_state", "procedure already exists");

    let bridge = connect(&f).await;
    let err = bridge.open().await.expect_err("one registration fails");

    let router_err = err.downcast_ref::<RouterError>().expect("router error");
    assert!(matches!(router_err, RouterError::Register { procedure, .. }
        if procedure == "com.voxlink.update_voice_state"));
}

#[tokio::test]
async fn close_is_safe_to_repeat() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    bridge.close().await.expect("first close");
    bridge.close().await.expect("second close");
    assert!(!bridge.connected());
    assert!(!f.bot.is_ready());
}

#[tokio::test]
async fn done_resolves_when_session_terminates() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");
    assert!(bridge.connected());

    f.router.terminate();
    tokio::time::timeout(Duration::from_secs(1), bridge.done())
        .await
        .expect("done resolves");
    assert!(!bridge.connected());
}

#[tokio::test]
async fn events_are_forwarded_in_delivery_order() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    for n in 1..=3 {
        f.bot.emit(EventKind::VoiceStateUpdate, json!({ "seq": n }));
    }
    f.bot.emit(EventKind::VoiceServerUpdate, json!({ "endpoint": "voice.example" }));

    wait_for(|| f.router.publishes().len() == 4).await;

    let state_updates: Vec<_> = f
        .router
        .publishes()
        .into_iter()
        .filter(|(topic, _)| topic == "com.voxlink.on_voice_state_update")
        .collect();
    assert_eq!(state_updates.len(), 3);
    for (n, (_, args)) in state_updates.iter().enumerate() {
        assert_eq!(args, &vec![json!({ "seq": n + 1 })]);
    }

    assert!(
        f.router
            .publishes()
            .iter()
            .any(|(topic, _)| topic == "com.voxlink.on_voice_server_update")
    );
}

#[tokio::test]
async fn publish_failures_do_not_stop_forwarding() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    f.router.fail_publishes();
    f.bot.emit(EventKind::VoiceStateUpdate, json!({ "seq": 1 }));

    // The drain task swallows the failure; the session stays usable.
    let res = f.router.invoke("com.voxlink.meta.assert_ready", vec![], Map::new()).await;
    assert!(res.is_success());
}

#[tokio::test]
async fn update_voice_state_reaches_platform_through_router() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let mut kwargs = Map::new();
    kwargs.insert("deaf".into(), json!(true));
    let res = f
        .router
        .invoke(
            "com.voxlink.update_voice_state",
            vec![json!("10"), json!("20")],
            kwargs,
        )
        .await;
    assert!(res.is_success());

    let requests = f.bot.voice_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].guild_id, "10");
    assert_eq!(requests[0].channel_id.as_deref(), Some("20"));
    assert!(!requests[0].mute);
    assert!(requests[0].deaf);
}

#[tokio::test]
async fn update_voice_state_rejects_missing_guild() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let res = f.router.invoke("com.voxlink.update_voice_state", vec![], Map::new()).await;
    let err = res.error().expect("invalid");
    assert_eq!(err.uri, "rpc.error.invalid_argument");
    assert_eq!(err.args, vec![json!("guild_id missing")]);
}

#[tokio::test]
async fn token_guilds_returns_memberships_and_releases_client() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let scoped = Arc::new(MemoryPlatform::default());
    scoped.set_guilds(vec![
        GuildMembership {
            id: "100".into(),
            name: "alpha".into(),
            owner: true,
        },
        GuildMembership {
            id: "200".into(),
            name: "beta".into(),
            owner: false,
        },
    ]);
    f.platforms.insert("user-token", Arc::clone(&scoped));

    let res = f
        .router
        .invoke("com.voxlink.token.guilds", vec![json!("user-token")], Map::new())
        .await;
    let payload = res.payload().expect("success");
    assert_eq!(payload.args, vec![
        json!({ "id": "100", "name": "alpha", "owner": true }),
        json!({ "id": "200", "name": "beta", "owner": false }),
    ]);
    assert_eq!(scoped.close_calls(), 1);
}

#[tokio::test]
async fn token_user_returns_identity() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let scoped = Arc::new(MemoryPlatform::default());
    scoped.set_user(Identity {
        id: "42".into(),
        username: "someone".into(),
        avatar: None,
        bot: false,
    });
    f.platforms.insert("user-token", Arc::clone(&scoped));

    let res = f
        .router
        .invoke("com.voxlink.token.user", vec![json!("user-token")], Map::new())
        .await;
    let payload = res.payload().expect("success");
    assert_eq!(payload.args, vec![json!({ "id": "42", "username": "someone", "bot": false })]);
    assert_eq!(scoped.close_calls(), 1);
}

#[tokio::test]
async fn invalid_token_maps_to_unauthorized() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let scoped = Arc::new(MemoryPlatform::default());
    scoped.fail_with(PlatformError::rest(401, "401: Unauthorized"));
    f.platforms.insert("bad-token", Arc::clone(&scoped));

    let res = f
        .router
        .invoke("com.voxlink.token.user", vec![json!("bad-token")], Map::new())
        .await;
    let err = res.error().expect("unauthorized");
    assert_eq!(err.uri, "com.voxlink.error.unauthorized");
    assert_eq!(err.kwargs.get("status_code"), Some(&json!(401)));
    assert_eq!(scoped.close_calls(), 1);
}

#[tokio::test]
async fn unknown_procedure_is_routed_as_error() {
    let f = fixture();
    let bridge = connect(&f).await;
    bridge.open().await.expect("open");

    let res = f.router.invoke("com.voxlink.no_such_thing", vec![], Map::new()).await;
    let err = res.error().expect("missing procedure");
    assert_eq!(err.uri, "rpc.error.no_such_procedure");
}
