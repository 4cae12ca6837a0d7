//! # Outbound Pusher
//!
//! Pushes the full local snapshot to a remote peer store after each poll
//! cycle that observed changes. Fire-and-forget with respect to local
//! state: transport failures are logged and the next cycle tries again
//! naturally if the scene still differs.

use reqwest::Client;
use tracing::debug;

use bridge_core::Element;

use crate::error::{BridgeError, BridgeResult};
use crate::protocol::SyncPush;

/// HTTP client for the remote peer's snapshot endpoint.
#[derive(Debug, Clone)]
pub struct OutboundPusher {
    client: Client,
    base_url: String,
}

impl OutboundPusher {
    /// Creates a pusher for the given base URL (scheme + authority, no
    /// trailing slash required).
    pub fn new(base_url: &str) -> Self {
        OutboundPusher {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends the full snapshot to `POST {base}/api/elements/sync`.
    pub async fn push_snapshot(&self, elements: Vec<Element>) -> BridgeResult<()> {
        let url = format!("{}/api/elements/sync", self.base_url);
        let count = elements.len();
        let payload = SyncPush::now(elements);

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Transport(format!(
                "peer returned {} for {}",
                status, url
            )));
        }

        debug!(count, url = %url, "Snapshot pushed to peer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let pusher = OutboundPusher::new("http://localhost:3031/");
        assert_eq!(pusher.base_url, "http://localhost:3031");
    }
}
