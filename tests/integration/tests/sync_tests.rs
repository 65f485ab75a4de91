//! Live sync tests: the event stream and the client runtime end to end
//!
//! Run with: cargo test -p integration-tests --test sync_tests

use std::time::Duration;

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use gallery_client::{ClientConfig, ClientError, LikeEventStream, LikeSync, StrategyKind, UiEffect};
use gallery_core::{ChangeKind, LikeEvent, LikeStatus};
use integration_tests::{fixtures::*, image_id, TestServer};
use tokio::sync::mpsc;

async fn next_event(stream: &mut LikeEventStream) -> LikeEvent {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("no event within 5s")
        .expect("stream ended")
        .expect("bad event")
}

/// Wait for the first effect matching `pred`, skipping the rest
async fn wait_for_effect(
    effects: &mut mpsc::Receiver<UiEffect>,
    pred: impl Fn(&UiEffect) -> bool,
) -> UiEffect {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let effect = tokio::time::timeout_at(deadline, effects.recv())
            .await
            .expect("no matching effect within 5s")
            .expect("effect channel closed");
        if pred(&effect) {
            return effect;
        }
    }
}

async fn wait_for_status(sync: &LikeSync, image: &str, expected: LikeStatus) {
    let id = image_id(image);
    for _ in 0..100 {
        if sync.status(&id) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{image} never reached {expected:?}, last {:?}", sync.status(&id));
}

// ============================================================================
// Event Stream Tests
// ============================================================================

#[tokio::test]
async fn test_like_and_unlike_reach_other_subscribers() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let mut bob = server.open_stream("bob").await.unwrap();

    server.toggle(&image, "alice").await.unwrap();
    let insert = next_event(&mut bob).await;
    assert_eq!(insert.image_id.as_str(), image);
    assert_eq!(insert.user_name.as_str(), "alice");
    assert_eq!(insert.kind, ChangeKind::Insert);
    assert_eq!(insert.status(), LikeStatus::new(true, 1));

    server.toggle(&image, "alice").await.unwrap();
    let delete = next_event(&mut bob).await;
    assert_eq!(delete.kind, ChangeKind::Delete);
    assert_eq!(delete.count, 0);
}

#[tokio::test]
async fn test_own_events_are_not_echoed() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let mut alice = server.open_stream("alice").await.unwrap();

    server.toggle(&image, "alice").await.unwrap();
    server.toggle(&image, "bob").await.unwrap();

    let event = next_event(&mut alice).await;
    assert_eq!(event.user_name.as_str(), "bob");
    assert_eq!(event.count, 2);
}

// ============================================================================
// Client Runtime Tests
// ============================================================================

#[tokio::test]
async fn test_poll_client_sees_remote_like() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let config = server.client_config("bob", StrategyKind::Poll).unwrap();
    let (bob, _effects) = LikeSync::start(config, vec![image_id(&image)]).unwrap();

    server.toggle(&image, "alice").await.unwrap();
    wait_for_status(&bob, &image, LikeStatus::new(false, 1)).await;

    bob.shutdown().await;
}

#[tokio::test]
async fn test_client_toggle_confirms_and_celebrates() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    server.toggle(&image, "alice").await.unwrap();

    let config = server.client_config("bob", StrategyKind::Poll).unwrap();
    let (bob, mut effects) = LikeSync::start(config, vec![image_id(&image)]).unwrap();
    wait_for_status(&bob, &image, LikeStatus::new(false, 1)).await;

    let status = bob.toggle(&image_id(&image)).await.unwrap();
    assert_eq!(status, LikeStatus::new(true, 2));
    wait_for_effect(&mut effects, |e| matches!(e, UiEffect::Celebrate { .. })).await;

    let status = bob.toggle(&image_id(&image)).await.unwrap();
    assert_eq!(status, LikeStatus::new(false, 1));
    assert_eq!(bob.status(&image_id(&image)), LikeStatus::new(false, 1));

    bob.shutdown().await;
}

#[tokio::test]
async fn test_push_client_applies_event_counts() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    server.toggle(&image, "alice").await.unwrap();

    let config = server.client_config("bob", StrategyKind::Push).unwrap();
    let (bob, mut effects) = LikeSync::start(config, vec![image_id(&image)]).unwrap();
    // The first resync subscribes before fetching, so the stream is live once it lands
    wait_for_effect(&mut effects, |e| matches!(e, UiEffect::Updated { .. })).await;
    assert_eq!(bob.status(&image_id(&image)), LikeStatus::new(false, 1));

    server.toggle(&image, "carol").await.unwrap();
    let effect = wait_for_effect(&mut effects, |e| matches!(e, UiEffect::Celebrate { .. })).await;
    assert_eq!(effect, UiEffect::Celebrate { image_id: image_id(&image) });
    assert_eq!(bob.status(&image_id(&image)), LikeStatus::new(false, 2));

    bob.shutdown().await;
}

#[tokio::test]
async fn test_subscribe_client_refetches_on_event() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    server.toggle(&image, "alice").await.unwrap();

    let config = server.client_config("bob", StrategyKind::Subscribe).unwrap();
    let (bob, mut effects) = LikeSync::start(config, vec![image_id(&image)]).unwrap();
    wait_for_effect(&mut effects, |e| matches!(e, UiEffect::Updated { .. })).await;

    // An unlike updates the count without celebration
    server.toggle(&image, "alice").await.unwrap();
    wait_for_status(&bob, &image, LikeStatus::new(false, 0)).await;

    server.toggle(&image, "dana").await.unwrap();
    wait_for_effect(&mut effects, |e| matches!(e, UiEffect::Celebrate { .. })).await;
    assert_eq!(bob.status(&image_id(&image)), LikeStatus::new(false, 1));

    bob.shutdown().await;
}

#[tokio::test]
async fn test_hidden_page_pauses_until_visible() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let config = server.client_config("bob", StrategyKind::Poll).unwrap();
    let (bob, _effects) = LikeSync::start(config, vec![image_id(&image)]).unwrap();

    bob.set_page_visible(false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    server.toggle(&image, "alice").await.unwrap();

    // Several poll intervals pass without a fetch
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(bob.status(&image_id(&image)), LikeStatus::empty());

    bob.set_page_visible(true).await.unwrap();
    wait_for_status(&bob, &image, LikeStatus::new(false, 1)).await;

    bob.shutdown().await;
}

#[tokio::test]
async fn test_show_images_switches_visible_set() {
    let server = TestServer::start().await.unwrap();
    let first = unique_image();
    let second = unique_image();
    server.toggle(&second, "alice").await.unwrap();

    let config = server.client_config("bob", StrategyKind::Poll).unwrap();
    let (bob, _effects) = LikeSync::start(config, vec![image_id(&first)]).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(bob.status(&image_id(&second)), LikeStatus::empty());

    bob.show_images(vec![image_id(&second)]).await.unwrap();
    wait_for_status(&bob, &second, LikeStatus::new(false, 1)).await;

    bob.shutdown().await;
}

#[tokio::test]
async fn test_anonymous_client_cannot_toggle() {
    let server = TestServer::start().await.unwrap();
    let config = server.client_config("", StrategyKind::Poll).unwrap();
    let (anonymous, _effects) = LikeSync::start(config, Vec::new()).unwrap();

    let err = anonymous.toggle(&image_id("img1")).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingUserName));

    anonymous.shutdown().await;
}

// ============================================================================
// Reconnect Tests
// ============================================================================

/// Like server whose first stream drops after a while, with a like landing
/// in the gap that no event reports
#[derive(Clone, Default)]
struct FlakyServer {
    count: Arc<AtomicU64>,
    streams: Arc<AtomicUsize>,
}

async fn flaky_poll(
    State(server): State<FlakyServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let count = server.count.load(Ordering::SeqCst);
    let statuses: serde_json::Map<String, serde_json::Value> = query
        .get("ids")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .map(|id| (id.to_string(), serde_json::json!({"liked": false, "count": count})))
        .collect();
    Json(serde_json::Value::Object(statuses))
}

async fn flaky_stream(
    State(server): State<FlakyServer>,
) -> Sse<BoxStream<'static, Result<Event, Infallible>>> {
    let events = if server.streams.fetch_add(1, Ordering::SeqCst) == 0 {
        stream::once(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            server.count.store(5, Ordering::SeqCst);
        })
        .filter_map(|()| async { None::<Result<Event, Infallible>> })
        .boxed()
    } else {
        stream::pending::<Result<Event, Infallible>>().boxed()
    };
    Sse::new(events)
}

async fn assert_recovers_missed_like(strategy: StrategyKind) {
    let server = FlakyServer::default();
    server.count.store(1, Ordering::SeqCst);
    let router = Router::new()
        .route("/likes/poll", get(flaky_poll))
        .route("/likes/stream", get(flaky_stream))
        .with_state(server.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = ClientConfig::new(format!("http://{addr}"))
        .with_user_name("bob")
        .unwrap()
        .with_strategy(strategy)
        .with_poll_interval(Duration::from_millis(100))
        .with_request_timeout(Duration::from_secs(2));
    let (bob, _effects) = LikeSync::start(config, vec![image_id("img1")]).unwrap();

    wait_for_status(&bob, "img1", LikeStatus::new(false, 5)).await;
    assert!(server.streams.load(Ordering::SeqCst) >= 2);

    bob.shutdown().await;
}

#[tokio::test]
async fn test_push_client_recovers_likes_missed_while_disconnected() {
    assert_recovers_missed_like(StrategyKind::Push).await;
}

#[tokio::test]
async fn test_subscribe_client_recovers_likes_missed_while_disconnected() {
    assert_recovers_missed_like(StrategyKind::Subscribe).await;
}
