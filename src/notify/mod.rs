//! Outbound notification plumbing.
//!
//! The engine emits fire-and-forget notifications to per-employee and
//! tenant-admin channels after an assignment commits. Delivery failure is
//! logged and swallowed; it never delays or rolls back the commit.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, channel: &str, payload: Value) -> Result<(), NotifyError>;
}

pub fn employee_channel(employee_id: Uuid) -> String {
    format!("employee:{employee_id}")
}

pub fn tenant_admin_channel(tenant_id: Uuid) -> String {
    format!("tenant-admin:{tenant_id}")
}

/// Sink that only writes the payload to the log. Default when the embedder
/// wires no delivery channel.
#[derive(Default)]
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn send(&self, channel: &str, payload: Value) -> Result<(), NotifyError> {
        debug!("notify {channel}: {payload}");
        Ok(())
    }
}

/// Sink backed by per-channel mpsc senders. Channels are registered lazily;
/// sends to unregistered channels are dropped silently, matching the
/// at-most-once delivery contract.
#[derive(Default)]
pub struct ChannelSink {
    channels: RwLock<HashMap<String, mpsc::Sender<Value>>>,
}

impl ChannelSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, channel: impl Into<String>, sender: mpsc::Sender<Value>) {
        self.channels.write().await.insert(channel.into(), sender);
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn send(&self, channel: &str, payload: Value) -> Result<(), NotifyError> {
        let sender = {
            let channels = self.channels.read().await;
            channels.get(channel).cloned()
        };

        match sender {
            Some(tx) => tx
                .send(payload)
                .await
                .map_err(|e| NotifyError(e.to_string())),
            None => {
                debug!("no listener on channel {channel}, dropping notification");
                Ok(())
            }
        }
    }
}
