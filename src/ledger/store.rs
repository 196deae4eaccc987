use super::addressing::slot_row;
use crate::config::LedgerConfig;
use crate::db::models::{FileColumn, LedgerSlot};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Row access to a fixed-size event ledger
///
/// Every slot operation addresses its row with [`slot_row`] and fails with
/// [`Error::LedgerNotFound`] when the named ledger has not been built.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether the named ledger exists
    async fn exists(&self, ledger: &LedgerConfig) -> Result<bool>;

    /// Drop the ledger with all of its rows and create it empty
    async fn rebuild(&self, ledger: &LedgerConfig) -> Result<()>;

    /// Overwrite the whole slot: number, time, and both file columns cleared
    async fn initialize(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        event_datetime: Option<NaiveDateTime>,
    ) -> Result<()>;

    /// Write a single file column, leaving the rest of the row alone.
    ///
    /// There is no check that the row still belongs to `event_number`; a late
    /// upload for an event whose slot has since been reused lands on the newer
    /// occupant.
    async fn patch_file(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        column: FileColumn,
        path: &str,
    ) -> Result<()>;

    /// Read the slot as stored. Callers compare `event_number` themselves.
    async fn read(&self, ledger: &LedgerConfig, event_number: i64) -> Result<LedgerSlot>;
}

/// Process-local ledger
#[derive(Default)]
pub struct MemoryLedger {
    ledgers: RwLock<HashMap<String, BTreeMap<i64, LedgerSlot>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryLedger {
    async fn exists(&self, ledger: &LedgerConfig) -> Result<bool> {
        Ok(self.ledgers.read().await.contains_key(&ledger.name))
    }

    async fn rebuild(&self, ledger: &LedgerConfig) -> Result<()> {
        self.ledgers
            .write()
            .await
            .insert(ledger.name.clone(), BTreeMap::new());
        Ok(())
    }

    async fn initialize(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        event_datetime: Option<NaiveDateTime>,
    ) -> Result<()> {
        let mut ledgers = self.ledgers.write().await;
        let rows = ledgers
            .get_mut(&ledger.name)
            .ok_or_else(|| Error::LedgerNotFound(ledger.name.clone()))?;
        let row = slot_row(event_number, ledger.record_limit);
        debug!("Initializing row {} for event {}", row, event_number);
        rows.insert(
            row,
            LedgerSlot {
                event_number: Some(event_number),
                event_datetime,
                jpg_path: None,
                mp4_path: None,
            },
        );
        Ok(())
    }

    async fn patch_file(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        column: FileColumn,
        path: &str,
    ) -> Result<()> {
        let mut ledgers = self.ledgers.write().await;
        let rows = ledgers
            .get_mut(&ledger.name)
            .ok_or_else(|| Error::LedgerNotFound(ledger.name.clone()))?;
        let slot = rows
            .entry(slot_row(event_number, ledger.record_limit))
            .or_default();
        match column {
            FileColumn::Jpg => slot.jpg_path = Some(path.to_string()),
            FileColumn::Mp4 => slot.mp4_path = Some(path.to_string()),
        }
        Ok(())
    }

    async fn read(&self, ledger: &LedgerConfig, event_number: i64) -> Result<LedgerSlot> {
        let ledgers = self.ledgers.read().await;
        let rows = ledgers
            .get(&ledger.name)
            .ok_or_else(|| Error::LedgerNotFound(ledger.name.clone()))?;
        Ok(rows
            .get(&slot_row(event_number, ledger.record_limit))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ledger(capacity: u32) -> LedgerConfig {
        LedgerConfig {
            name: "motioneye".to_string(),
            record_limit: capacity,
            ..LedgerConfig::default()
        }
    }

    fn noon() -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0)
    }

    #[tokio::test]
    async fn initialize_then_read() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(1000);
        store.rebuild(&ledger).await?;

        store.initialize(&ledger, 42, noon()).await?;
        let slot = store.read(&ledger, 42).await?;
        assert_eq!(
            slot,
            LedgerSlot {
                event_number: Some(42),
                event_datetime: noon(),
                jpg_path: None,
                mp4_path: None,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn patch_touches_one_column() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(1000);
        store.rebuild(&ledger).await?;

        store.initialize(&ledger, 42, noon()).await?;
        store.patch_file(&ledger, 42, FileColumn::Jpg, "p").await?;
        let slot = store.read(&ledger, 42).await?;
        assert_eq!(slot.jpg_path.as_deref(), Some("p"));
        assert_eq!(slot.mp4_path, None);
        assert_eq!(slot.event_number, Some(42));
        assert_eq!(slot.event_datetime, noon());
        Ok(())
    }

    #[tokio::test]
    async fn reinitialize_clears_files() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(10);
        store.rebuild(&ledger).await?;

        store.initialize(&ledger, 3, noon()).await?;
        store.patch_file(&ledger, 3, FileColumn::Mp4, "a/b/c.mp4").await?;
        store.initialize(&ledger, 13, None).await?;

        let slot = store.read(&ledger, 3).await?;
        assert_eq!(slot.event_number, Some(13));
        assert_eq!(slot.mp4_path, None);
        Ok(())
    }

    #[tokio::test]
    async fn stale_patch_lands_on_new_occupant() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(10);
        store.rebuild(&ledger).await?;

        store.initialize(&ledger, 13, noon()).await?;
        store.patch_file(&ledger, 3, FileColumn::Jpg, "old/event/3.jpg").await?;

        let slot = store.read(&ledger, 13).await?;
        assert_eq!(slot.event_number, Some(13));
        assert_eq!(slot.jpg_path.as_deref(), Some("old/event/3.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn patch_on_unwritten_row_leaves_number_empty() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(1000);
        store.rebuild(&ledger).await?;

        store.patch_file(&ledger, 5, FileColumn::Mp4, "x/y/z.mp4").await?;
        let slot = store.read(&ledger, 5).await?;
        assert_eq!(slot.event_number, None);
        assert!(!slot.holds(5));
        Ok(())
    }

    #[tokio::test]
    async fn missing_ledger_is_an_error() {
        let store = MemoryLedger::new();
        let err = store.read(&ledger(1000), 1).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::LedgerNotFound(name)) if name == "motioneye"
        ));
    }

    #[tokio::test]
    async fn rebuild_discards_rows() -> Result<()> {
        let store = MemoryLedger::new();
        let ledger = ledger(1000);
        store.rebuild(&ledger).await?;
        store.initialize(&ledger, 1, noon()).await?;
        store.rebuild(&ledger).await?;
        assert_eq!(store.read(&ledger, 1).await?, LedgerSlot::default());
        Ok(())
    }
}
