//! Chat Client Capability
//!
//! The bot never talks to a chat service directly. Everything that leaves the
//! bot goes through a [`ChatClient`], which the transport layer implements
//! (see [`crate::connection::RelayClient`]). [`MemoryClient`] records sends
//! instead of delivering them, for tests and dry runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors returned by a chat client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The underlying connection is gone
    #[error("chat connection closed")]
    Closed,

    /// The service refused the request
    #[error("chat service rejected request: {0}")]
    Rejected(String),
}

/// Handle to a message the client has sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub id: u64,
}

/// Sends and deletes messages on the chat service.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends `text` to the channel with the given id.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<SentMessage, ClientError>;

    /// Deletes a message previously sent by this client.
    async fn delete_message(&self, message: &SentMessage) -> Result<(), ClientError>;
}

/// A [`ChatClient`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    next_id: AtomicU64,
    sent: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<SentMessage>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(channel_id, text)` pairs sent so far, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Texts of everything sent so far.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    /// Messages deleted so far.
    pub fn deleted(&self) -> Vec<SentMessage> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for MemoryClient {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<SentMessage, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.sent
            .lock()
            .map_err(|_| ClientError::Closed)?
            .push((channel_id.to_string(), text.to_string()));
        Ok(SentMessage {
            channel_id: channel_id.to_string(),
            id,
        })
    }

    async fn delete_message(&self, message: &SentMessage) -> Result<(), ClientError> {
        self.deleted
            .lock()
            .map_err(|_| ClientError::Closed)?
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_client_records_in_order() {
        let client = MemoryClient::new();

        let first = client.send_message("10", "one").await.unwrap();
        let second = client.send_message("11", "two").await.unwrap();
        assert!(second.id > first.id);

        client.delete_message(&first).await.unwrap();

        assert_eq!(
            client.sent(),
            vec![
                ("10".to_string(), "one".to_string()),
                ("11".to_string(), "two".to_string())
            ]
        );
        assert_eq!(client.deleted(), vec![first]);
    }
}
