use crate::config::LedgerConfig;
use crate::ledger::RecordStore;
use crate::messaging::MotionMessages;
use anyhow::Result;
use log::info;

/// Event number used by the test messages
pub const TEST_EVENT_NUMBER: i64 = -1;

/// Drop the ledger and recreate it empty, header row only
pub async fn rebuild_ledger(store: &dyn RecordStore, ledger: &LedgerConfig) -> Result<()> {
    info!(
        "Rebuilding ledger {} with {} slots",
        ledger.name, ledger.record_limit
    );
    store.rebuild(ledger).await?;
    info!("Ledger {} rebuilt", ledger.name);
    Ok(())
}

/// Send one of each outbound message kind, to check bot credentials
pub async fn test_send(messages: &MotionMessages) -> Result<()> {
    messages.motion_detected(TEST_EVENT_NUMBER).await?;
    messages
        .event_files(
            &format!("[#{}]", TEST_EVENT_NUMBER),
            "1970/01/01 00:00:00",
            "https://example.com/test.jpg",
            "https://example.com/test.mp4",
        )
        .await?;
    messages.text("test message").await?;
    info!("Test messages sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::messaging::channel::tests::RecordingTransport;
    use crate::messaging::motion_messages::motion_detected_content;
    use crate::messaging::{ChatChannel, Content};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn rebuild_discards_slots() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = LedgerConfig::default();
        assert!(!store.exists(&ledger).await?);

        rebuild_ledger(&store, &ledger).await?;
        let at = NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        store.initialize(&ledger, 5, at).await?;

        rebuild_ledger(&store, &ledger).await?;
        assert!(store.exists(&ledger).await?);
        assert_eq!(store.read(&ledger, 5).await?.event_number, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_covers_every_kind() -> Result<()> {
        let transport = Arc::new(RecordingTransport::default());
        let channel = Arc::new(ChatChannel::new(transport.clone(), Duration::from_secs(30)));
        test_send(&MotionMessages::new(channel)).await?;

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], motion_detected_content(-1));
        assert_eq!(sent[1].kind(), "list_template");
        assert_eq!(sent[2], Content::text("test message"));
        Ok(())
    }
}
