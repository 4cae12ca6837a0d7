//! End-to-end sync loop tests: echo suppression, canvas-side change
//! detection, and the outbound peer push.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{self, Duration};

use bridge_core::Element;
use bridge_sync::{
    router, BridgeEvent, BridgeState, CanvasPoller, CrudApplier, EchoSuppressor, ElementStore,
    MemoryCanvas, NoopNotifier, OutboundPusher, SharedStore,
};

struct Harness {
    state: Arc<BridgeState>,
    canvas: MemoryCanvas,
    store: SharedStore,
    applier: CrudApplier,
    poller: CanvasPoller,
    events: broadcast::Receiver<BridgeEvent>,
}

fn harness(pusher: Option<OutboundPusher>) -> Harness {
    let canvas = MemoryCanvas::new();
    let store = ElementStore::shared();
    let suppressor = Arc::new(EchoSuppressor::new());
    let applier = CrudApplier::new(
        Arc::new(canvas.clone()),
        store.clone(),
        suppressor.clone(),
        Arc::new(NoopNotifier),
        Duration::from_millis(1500),
    );
    let state = Arc::new(BridgeState::new(store.clone(), applier.clone()));
    let events = state.subscribe();
    let poller = CanvasPoller::new(
        Arc::new(canvas.clone()),
        store.clone(),
        suppressor,
        state.event_sender(),
        pusher,
        Duration::from_millis(1500),
    );
    Harness {
        state,
        canvas,
        store,
        applier,
        poller,
        events,
    }
}

fn drain(events: &mut broadcast::Receiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test(start_paused = true)]
async fn test_remote_create_is_not_echoed() {
    let mut h = harness(None);

    h.applier
        .create(Element::new("rectangle", 1.0, 2.0), true)
        .await
        .unwrap();

    // Poll inside the suppression window: skipped entirely.
    h.poller.tick().await;
    assert!(drain(&mut h.events).is_empty());

    // Poll after the window: the canvas matches the recorded fingerprints,
    // so the bridge's own write is never re-broadcast.
    time::advance(Duration::from_millis(1600)).await;
    h.poller.tick().await;
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_human_edit_after_window_is_broadcast() {
    let mut h = harness(None);

    h.applier
        .create(Element::new("rectangle", 1.0, 2.0), true)
        .await
        .unwrap();
    time::advance(Duration::from_millis(1600)).await;
    h.poller.tick().await;
    drain(&mut h.events);

    // A human draws directly on the canvas.
    let mut drawn = Element::new("ellipse", 40.0, 40.0).normalized();
    drawn.id = "human-1".to_string();
    h.canvas.place(drawn).await;

    h.poller.tick().await;
    let events = drain(&mut h.events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        BridgeEvent::ElementCreated { element } => assert_eq!(element.id, "human-1"),
        other => panic!("unexpected event: {}", other.type_name()),
    }
    assert!(h.store.read().await.contains("human-1"));
}

#[tokio::test(start_paused = true)]
async fn test_store_converges_to_canvas() {
    let h = harness(None);

    let mut a = Element::new("rectangle", 0.0, 0.0).normalized();
    a.id = "a".to_string();
    let mut b = Element::new("text", 5.0, 5.0).normalized();
    b.text = Some("note".to_string());
    b.id = "b".to_string();
    h.canvas.place(a).await;
    h.canvas.place(b).await;

    h.poller.tick().await;
    assert_eq!(h.store.read().await.len(), 2);

    h.canvas.erase("a").await;
    h.poller.tick().await;

    let store = h.store.read().await;
    assert_eq!(store.len(), 1);
    assert!(store.contains("b"));
}

#[tokio::test]
async fn test_changes_are_pushed_to_peer() {
    // The peer is a second bridge with its own store, served for real so
    // the outbound client can reach it.
    let peer = harness(None);
    let peer_store = peer.store.clone();
    let peer_app = router(peer.state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, peer_app).await.ok();
    });

    let local = harness(Some(OutboundPusher::new(&format!("http://{}", addr))));
    let mut element = Element::new("diamond", 7.0, 8.0).normalized();
    element.id = "pushed-1".to_string();
    local.canvas.place(element).await;

    local.poller.tick().await;

    assert!(peer_store.read().await.contains("pushed-1"));
}
