//! # Bridge Protocol
//!
//! Wire messages shared by the WebSocket fan-out and the REST surface.
//! Events are JSON objects tagged by a `type` field; payload field names
//! follow the canvas wire convention (camelCase).
//!
//! ## Event Flow
//! ```text
//! ┌──────────────┐   element_created / element_updated / element_deleted
//! │  Poll cycle  │──────────────────────────────────────────────┐
//! └──────────────┘                                              │
//! ┌──────────────┐   element_* / elements_batch_created /       ▼
//! │ REST handler │   elements_synced                     ┌────────────┐
//! └──────────────┘──────────────────────────────────────▶│ WS clients │
//! ┌──────────────┐   initial_elements + sync_status      └────────────┘
//! │  On connect  │──────────────────────────────────────────────▲
//! └──────────────┘                                              │
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use bridge_core::Element;

// =============================================================================
// Events
// =============================================================================

/// A broadcast event pushed to every connected WebSocket client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Full cache contents, sent once per connection at bootstrap.
    InitialElements { elements: Vec<Element> },

    /// Cache summary, sent after the bootstrap payload.
    SyncStatus {
        #[serde(rename = "elementCount")]
        element_count: usize,
        timestamp: String,
    },

    /// A canvas-side or remote creation.
    ElementCreated { element: Element },

    /// A canvas-side or remote update.
    ElementUpdated { element: Element },

    /// A canvas-side or remote deletion.
    ElementDeleted {
        #[serde(rename = "elementId")]
        element_id: String,
    },

    /// A remote batch creation, announced as one event.
    ElementsBatchCreated { elements: Vec<Element>, count: usize },

    /// A full remote snapshot replacement.
    ElementsSynced { count: usize, timestamp: String },
}

impl BridgeEvent {
    pub fn sync_status(element_count: usize) -> Self {
        BridgeEvent::SyncStatus {
            element_count,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn elements_synced(count: usize) -> Self {
        BridgeEvent::ElementsSynced {
            count,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// The wire `type` tag, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            BridgeEvent::InitialElements { .. } => "initial_elements",
            BridgeEvent::SyncStatus { .. } => "sync_status",
            BridgeEvent::ElementCreated { .. } => "element_created",
            BridgeEvent::ElementUpdated { .. } => "element_updated",
            BridgeEvent::ElementDeleted { .. } => "element_deleted",
            BridgeEvent::ElementsBatchCreated { .. } => "elements_batch_created",
            BridgeEvent::ElementsSynced { .. } => "elements_synced",
        }
    }
}

// =============================================================================
// Request / Push Payloads
// =============================================================================

/// Body of `POST /api/elements/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub elements: Vec<Element>,
}

/// Body of `POST /api/elements/sync`: a full snapshot replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub elements: Vec<Element>,
}

/// Outbound push body sent to the remote peer after a poll cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPush {
    pub elements: Vec<Element>,
    pub timestamp: String,
}

impl SyncPush {
    pub fn now(elements: Vec<Element>) -> Self {
        SyncPush {
            elements,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = BridgeEvent::ElementDeleted {
            element_id: "el-1".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "element_deleted");
        assert_eq!(value["elementId"], "el-1");
    }

    #[test]
    fn test_created_event_embeds_element() {
        let element = Element::new("ellipse", 5.0, 6.0).normalized();
        let event = BridgeEvent::ElementCreated {
            element: element.clone(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "element_created");
        assert_eq!(value["element"]["id"], element.id.as_str());
        assert_eq!(value["element"]["type"], "ellipse");
    }

    #[test]
    fn test_event_round_trip() {
        let event = BridgeEvent::sync_status(7);
        let json = serde_json::to_string(&event).unwrap();
        let back: BridgeEvent = serde_json::from_str(&json).unwrap();
        match back {
            BridgeEvent::SyncStatus { element_count, .. } => assert_eq!(element_count, 7),
            other => panic!("unexpected event: {}", other.type_name()),
        }
    }

    #[test]
    fn test_batch_request_parses_bare_elements() {
        let body = r#"{"elements": [{"type": "rectangle", "x": 0, "y": 0}]}"#;
        let request: BatchRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.elements.len(), 1);
        assert!(request.elements[0].id.is_empty());
    }
}
