use super::content::Content;
use super::lineworks::ChatTransport;
use crate::error::Error;
use anyhow::Result;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serializes sends to the chat channel.
///
/// The transport is not safe to drive concurrently, so every send holds the
/// channel lock. Waiting longer than `lock_timeout` fails the send.
pub struct ChatChannel {
    transport: Arc<dyn ChatTransport>,
    lock: Mutex<()>,
    lock_timeout: Duration,
}

impl ChatChannel {
    pub fn new(transport: Arc<dyn ChatTransport>, lock_timeout: Duration) -> Self {
        Self {
            transport,
            lock: Mutex::new(()),
            lock_timeout,
        }
    }

    pub async fn send(&self, content: &Content) -> Result<()> {
        let _guard = tokio::time::timeout(self.lock_timeout, self.lock.lock())
            .await
            .map_err(|_| {
                warn!("Channel lock not acquired within {:?}", self.lock_timeout);
                Error::LockTimeout(self.lock_timeout.as_secs())
            })?;

        self.transport.send_to_channel(content).await
    }
}
