use super::free_space::free_space_alert;
use super::sweep::{sweep_subfolders, SweepReport};
use crate::config::{MaintenanceConfig, StorageConfig};
use crate::messaging::MotionMessages;
use crate::storage::DriveStorage;
use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Retention sweep and free-space alert over the upload root
pub struct StorageCleanupService {
    config: MaintenanceConfig,
    storage: StorageConfig,
    drive: Arc<dyn DriveStorage>,
    root: String,
    messages: Option<MotionMessages>,
}

impl StorageCleanupService {
    pub fn new(
        config: MaintenanceConfig,
        storage: StorageConfig,
        drive: Arc<dyn DriveStorage>,
        root: String,
    ) -> Self {
        Self {
            config,
            storage,
            drive,
            root,
            messages: None,
        }
    }

    /// Channel used for free-space alerts
    pub fn with_messages(mut self, messages: MotionMessages) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Start the periodic loop in the background
    pub fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Storage maintenance is disabled");
            return;
        }

        info!(
            "Starting storage maintenance with interval of {} seconds",
            self.config.interval_secs
        );

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(self.config.interval_secs.max(1)));

            loop {
                interval.tick().await;

                if let Err(e) = self.run_once().await {
                    error!("Error running storage maintenance: {}", e);
                }
            }
        });
    }

    /// One maintenance pass: cleanup, then the free-space check
    pub async fn run_once(&self) -> Result<()> {
        self.cleanup().await?;
        self.check_free_space().await?;
        Ok(())
    }

    /// Trash folders older than `storage.cleanup_days`; does nothing when unset
    pub async fn cleanup(&self) -> Result<Option<SweepReport>> {
        let Some(days) = self.storage.cleanup_days else {
            info!("No cleanup retention configured, skipping cleanup");
            return Ok(None);
        };

        info!("Cleaning up folders older than {} days", days);
        let report = sweep_subfolders(self.drive.as_ref(), &self.root, days, false, Utc::now()).await?;
        info!(
            "Cleaned up {} folders, freed {:.3} GB",
            report.folder_names.len(),
            report.total_gb()
        );
        Ok(Some(report))
    }

    /// What a zero-day cleanup would remove right now, without removing it
    pub async fn cleanup_report(&self) -> Result<SweepReport> {
        let report = sweep_subfolders(self.drive.as_ref(), &self.root, 0, true, Utc::now()).await?;
        info!("Folders: {:?}", report.folder_names);
        info!("total: {}GB", report.total_gb());
        Ok(report)
    }

    /// Send an alert to the channel when free space is under the threshold.
    /// Returns the alert text, if any.
    pub async fn check_free_space(&self) -> Result<Option<String>> {
        let quota = self.drive.quota().await?;
        let Some(alert) = free_space_alert(&quota, &self.storage.free_size_threshold) else {
            info!(
                "Free space {} bytes is above threshold {}",
                quota.free_bytes(),
                self.storage.free_size_threshold
            );
            return Ok(None);
        };

        info!("Free space below threshold: {}", alert.replace('\n', " "));
        match &self.messages {
            Some(messages) => messages.text(&alert).await?,
            None => info!("No channel configured, alert not sent"),
        }
        Ok(Some(alert))
    }
}
