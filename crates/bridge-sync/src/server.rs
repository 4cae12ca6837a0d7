//! # Bridge Protocol Server
//!
//! The REST + WebSocket surface remote peers talk to. Every response is a
//! JSON envelope with a `success` flag; the Element Store is the
//! authoritative response source and canvas mirroring is best effort.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bridge Server (Axum)                                │
//! │                                                                         │
//! │  GET  /api/elements          ──▶ store read                             │
//! │  GET  /api/elements/{id}     ──▶ store read (404 on miss)               │
//! │  GET  /api/elements/search   ──▶ store read, field filters              │
//! │  GET  /api/sync/status       ──▶ store count + timestamp                │
//! │  POST /api/elements          ──▶ CRUD applier create  ──▶ broadcast     │
//! │  PUT  /api/elements/{id}     ──▶ merge + applier update ─▶ broadcast    │
//! │  DEL  /api/elements/{id}     ──▶ applier delete       ──▶ broadcast     │
//! │  POST /api/elements/batch    ──▶ applier batch_create ──▶ broadcast     │
//! │  POST /api/elements/sync     ──▶ applier replace_all  ──▶ broadcast     │
//! │  GET  /ws                    ──▶ upgrade, bootstrap, then fan-out       │
//! │                                                                         │
//! │  Request bodies are parsed by hand so malformed JSON surfaces as a      │
//! │  500 "Internal error" envelope, never a framework-shaped rejection.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use bridge_core::Element;

use crate::applier::CrudApplier;
use crate::config::ServerSettings;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{BatchRequest, BridgeEvent, SyncRequest};
use crate::store::SharedStore;

/// Broadcast channel capacity for WebSocket fan-out.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Server State
// =============================================================================

/// Shared state behind every handler.
pub struct BridgeState {
    store: SharedStore,
    applier: CrudApplier,
    events: broadcast::Sender<BridgeEvent>,
}

impl BridgeState {
    pub fn new(store: SharedStore, applier: CrudApplier) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        BridgeState {
            store,
            applier,
            events,
        }
    }

    /// Creates state sharing an existing event channel (so the poller and
    /// the server fan out to the same subscribers).
    pub fn with_events(
        store: SharedStore,
        applier: CrudApplier,
        events: broadcast::Sender<BridgeEvent>,
    ) -> Self {
        BridgeState {
            store,
            applier,
            events,
        }
    }

    /// Pushes an event to every connected WebSocket client.
    pub fn broadcast(&self, event: BridgeEvent) {
        // A send error only means no subscribers are connected.
        let _ = self.events.send(event);
    }

    /// Subscribes to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// The shared event sender, for wiring the poller.
    pub fn event_sender(&self) -> broadcast::Sender<BridgeEvent> {
        self.events.clone()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the full protocol router. Exposed separately from the server so
/// tests can drive it without a listener.
pub fn router(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/api/elements", get(list_elements))
        .route("/api/elements", post(create_element))
        .route("/api/elements/search", get(search_elements))
        .route("/api/elements/batch", post(batch_create))
        .route("/api/elements/sync", post(sync_elements))
        .route("/api/elements/{id}", get(get_element))
        .route("/api/elements/{id}", put(update_element))
        .route("/api/elements/{id}", delete(delete_element))
        .route("/api/sync/status", get(sync_status))
        .route("/ws", get(ws_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

// =============================================================================
// Bridge Server
// =============================================================================

/// Owns the listener lifecycle for the protocol surface.
pub struct BridgeServer {
    config: ServerSettings,
    state: Arc<BridgeState>,
}

/// Handle for controlling a running server.
#[derive(Clone)]
pub struct ServerHandle {
    addr: String,
    shutdown_tx: mpsc::Sender<()>,
}

impl ServerHandle {
    /// The address the server is bound to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Shuts the server down gracefully.
    pub async fn shutdown(&self) -> BridgeResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| BridgeError::Channel("Server shutdown channel closed".into()))
    }
}

impl BridgeServer {
    pub fn new(config: ServerSettings, state: Arc<BridgeState>) -> Self {
        BridgeServer { config, state }
    }

    /// Binds the configured address and serves until shutdown. Bind
    /// failure is the one startup error that is fatal to the server.
    pub async fn start(self) -> BridgeResult<ServerHandle> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| BridgeError::BindFailed {
                addr: bind_addr.clone(),
                source,
            })?;

        let handle = ServerHandle {
            addr: bind_addr.clone(),
            shutdown_tx,
        };

        let app = router(self.state);
        info!(addr = %bind_addr, "Bridge server started");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await;
                    info!("Bridge server shutting down");
                })
                .await
                .ok();
        });

        Ok(handle)
    }
}

// =============================================================================
// Response Envelopes
// =============================================================================

fn ok_envelope(mut payload: Value) -> Response {
    if let Some(object) = payload.as_object_mut() {
        object.insert("success".into(), Value::Bool(true));
    }
    (StatusCode::OK, Json(payload)).into_response()
}

fn error_envelope(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// Maps an applier failure onto the wire. Absorbed canvas failures never
/// reach here; what does is either a client mistake or internal.
fn bridge_error_response(err: BridgeError) -> Response {
    match err {
        BridgeError::UnsupportedElementType(_) => {
            error_envelope(StatusCode::BAD_REQUEST, &err.to_string())
        }
        BridgeError::NotFound(_) => error_envelope(StatusCode::NOT_FOUND, "Element not found"),
        other => {
            warn!(error = %other, "Request failed");
            error_envelope(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

/// Parses a request body by hand so malformed JSON becomes the generic
/// 500 envelope instead of a framework rejection.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| {
        warn!(error = %err, "Malformed request body");
        error_envelope(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })
}

// =============================================================================
// Read Handlers
// =============================================================================

async fn list_elements(State(state): State<Arc<BridgeState>>) -> Response {
    let elements = state.store.read().await.list();
    let count = elements.len();
    ok_envelope(json!({ "elements": elements, "count": count }))
}

async fn get_element(
    State(state): State<Arc<BridgeState>>,
    Path(id): Path<String>,
) -> Response {
    match state.store.read().await.get(&id) {
        Some(element) => ok_envelope(json!({ "element": element })),
        None => error_envelope(StatusCode::NOT_FOUND, "Element not found"),
    }
}

async fn search_elements(
    State(state): State<Arc<BridgeState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let elements = state.store.read().await.list();
    let matched: Vec<Element> = elements
        .into_iter()
        .filter(|element| matches_filters(element, &params))
        .collect();
    let count = matched.len();
    ok_envelope(json!({ "elements": matched, "count": count }))
}

/// Field filter: every query pair must match the element's serialized
/// field of the same name. Strings compare raw, numbers numerically.
fn matches_filters(element: &Element, params: &HashMap<String, String>) -> bool {
    let serialized = match serde_json::to_value(element) {
        Ok(value) => value,
        Err(_) => return false,
    };
    params.iter().all(|(key, wanted)| {
        let field = if key == "type" {
            serialized.get("type")
        } else {
            serialized.get(key)
        };
        match field {
            Some(Value::String(actual)) => actual == wanted,
            Some(Value::Number(actual)) => wanted
                .parse::<f64>()
                .ok()
                .zip(actual.as_f64())
                .map(|(w, a)| w == a)
                .unwrap_or(false),
            Some(Value::Bool(actual)) => wanted.parse::<bool>().map(|w| w == *actual).unwrap_or(false),
            _ => false,
        }
    })
}

async fn sync_status(State(state): State<Arc<BridgeState>>) -> Response {
    let count = state.store.read().await.len();
    ok_envelope(json!({
        "count": count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// =============================================================================
// Write Handlers
// =============================================================================

async fn create_element(State(state): State<Arc<BridgeState>>, body: Bytes) -> Response {
    let element: Element = match parse_body(&body) {
        Ok(element) => element,
        Err(response) => return response,
    };

    match state.applier.create(element, false).await {
        Ok(element) => {
            state.broadcast(BridgeEvent::ElementCreated {
                element: element.clone(),
            });
            ok_envelope(json!({ "element": element }))
        }
        Err(err) => bridge_error_response(err),
    }
}

async fn update_element(
    State(state): State<Arc<BridgeState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let patch: Value = match parse_body(&body) {
        Ok(patch) => patch,
        Err(response) => return response,
    };

    let existing = match state.store.read().await.get(&id) {
        Some(element) => element.clone(),
        None => return error_envelope(StatusCode::NOT_FOUND, "Element not found"),
    };

    let merged = match merge_patch(&existing, patch, &id) {
        Ok(merged) => merged,
        Err(err) => {
            warn!(element_id = %id, error = %err, "Patch merge failed");
            return error_envelope(StatusCode::INTERNAL_SERVER_ERROR, "Internal error");
        }
    };

    match state.applier.update(merged, false).await {
        Ok(element) => {
            state.broadcast(BridgeEvent::ElementUpdated {
                element: element.clone(),
            });
            ok_envelope(json!({ "element": element }))
        }
        Err(err) => bridge_error_response(err),
    }
}

/// Merges partial fields over the existing element. Identity is pinned to
/// the path id regardless of what the patch carries.
fn merge_patch(existing: &Element, patch: Value, id: &str) -> BridgeResult<Element> {
    let mut base = serde_json::to_value(existing)?;
    if let (Some(base_obj), Value::Object(patch_obj)) = (base.as_object_mut(), patch) {
        for (key, value) in patch_obj {
            base_obj.insert(key, value);
        }
        base_obj.insert("id".into(), Value::String(id.to_string()));
    }
    Ok(serde_json::from_value(base)?)
}

async fn delete_element(
    State(state): State<Arc<BridgeState>>,
    Path(id): Path<String>,
) -> Response {
    if !state.store.read().await.contains(&id) {
        return error_envelope(StatusCode::NOT_FOUND, "Element not found");
    }

    match state.applier.delete(&id).await {
        Ok(_) => {
            state.broadcast(BridgeEvent::ElementDeleted {
                element_id: id.clone(),
            });
            ok_envelope(json!({}))
        }
        Err(err) => bridge_error_response(err),
    }
}

async fn batch_create(State(state): State<Arc<BridgeState>>, body: Bytes) -> Response {
    let request: BatchRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.applier.batch_create(request.elements, false).await {
        Ok(elements) => {
            let count = elements.len();
            state.broadcast(BridgeEvent::ElementsBatchCreated {
                elements: elements.clone(),
                count,
            });
            ok_envelope(json!({ "elements": elements, "count": count }))
        }
        Err(err) => bridge_error_response(err),
    }
}

async fn sync_elements(State(state): State<Arc<BridgeState>>, body: Bytes) -> Response {
    let request: SyncRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.applier.replace_all(request.elements).await {
        Ok(elements) => {
            let count = elements.len();
            state.broadcast(BridgeEvent::elements_synced(count));
            ok_envelope(json!({ "count": count }))
        }
        Err(err) => bridge_error_response(err),
    }
}

async fn fallback_handler() -> Response {
    error_envelope(StatusCode::NOT_FOUND, "Not found")
}

// =============================================================================
// WebSocket Handler
// =============================================================================

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<BridgeState>>) -> Response {
    debug!("WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Bootstraps a client with the full cache, then forwards broadcast events
/// until the peer hangs up.
async fn handle_socket(socket: WebSocket, state: Arc<BridgeState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the bootstrap snapshot so no event published while
    // it is in flight can be missed.
    let mut events_rx = state.subscribe();

    let bootstrap = {
        let store = state.store.read().await;
        let elements = store.list();
        let count = elements.len();
        vec![
            BridgeEvent::InitialElements { elements },
            BridgeEvent::sync_status(count),
        ]
    };
    for event in bootstrap {
        if send_event(&mut sender, &event).await.is_err() {
            debug!("Client dropped during bootstrap");
            return;
        }
    }

    info!("WebSocket client connected");

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sender, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagged behind event stream");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {
                        // The channel is push-only; inbound payloads are ignored.
                    }
                    Some(Err(err)) => {
                        debug!(error = %err, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket client closed");
}

async fn send_event(
    sender: &mut (impl SinkExt<Message> + Unpin),
    event: &BridgeEvent,
) -> Result<(), ()> {
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
