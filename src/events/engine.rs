use super::notification::Notification;
use super::path::EventKind;
use crate::config::LedgerConfig;
use crate::db::models::FileColumn;
use crate::ledger::store::RecordStore;
use crate::storage::{FileResolver, LinkVariant};
use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// What the ledger knows about an event right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum EventState {
    /// The slot belongs to the event but at least one file can't be reached yet
    Uploading,
    /// Photo and video are both available
    Ready {
        jpg_url: String,
        mp4_url: String,
        datetime: Option<NaiveDateTime>,
    },
    /// Never recorded, or the slot has been reused by a later event
    Missing,
}

/// Applies camera notifications to the ledger and answers event queries
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn RecordStore>,
    resolver: FileResolver,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn RecordStore>, resolver: FileResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Record a notification. Returns the kind that was applied.
    pub async fn apply(&self, ledger: &LedgerConfig, notification: &Notification) -> Result<EventKind> {
        let n = notification;
        match n.kind {
            EventKind::Started => {
                info!("Event {} started at {:?}", n.event_number, n.event_datetime);
                self.store
                    .initialize(ledger, n.event_number, n.event_datetime)
                    .await?;
            }
            EventKind::Jpg => {
                info!("Event {} snapshot: {}", n.event_number, n.filepath);
                self.store
                    .patch_file(ledger, n.event_number, FileColumn::Jpg, &n.filepath)
                    .await?;
            }
            EventKind::Mp4 => {
                info!("Event {} movie: {}", n.event_number, n.filepath);
                self.store
                    .patch_file(ledger, n.event_number, FileColumn::Mp4, &n.filepath)
                    .await?;
            }
            EventKind::Unknown => {
                debug!("Ignoring event {} file {}", n.event_number, n.filepath);
            }
        }

        Ok(n.kind)
    }

    /// Current state of `event_number`, with file links resolved under `root`
    pub async fn query(&self, ledger: &LedgerConfig, root: &str, event_number: i64) -> Result<EventState> {
        let slot = self.store.read(ledger, event_number).await?;
        if !slot.holds(event_number) {
            debug!(
                "Event {} missing (slot holds {:?})",
                event_number, slot.event_number
            );
            return Ok(EventState::Missing);
        }

        let jpg_url = self
            .resolver
            .resolve(slot.jpg_path.as_deref().unwrap_or_default(), root, LinkVariant::View)
            .await;
        let mp4_url = self
            .resolver
            .resolve(slot.mp4_path.as_deref().unwrap_or_default(), root, LinkVariant::Open)
            .await;

        let state = match (jpg_url, mp4_url) {
            (Some(jpg_url), Some(mp4_url)) => EventState::Ready {
                jpg_url,
                mp4_url,
                datetime: slot.event_datetime,
            },
            _ => EventState::Uploading,
        };
        debug!("Event {} is {:?}", event_number, state);
        Ok(state)
    }
}
