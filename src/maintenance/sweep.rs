use crate::storage::DriveStorage;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Serialize;

/// Outcome of a sweep over the root's subfolders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Recursive size of every swept folder
    pub total_bytes: u64,
    pub folder_names: Vec<String>,
}

impl SweepReport {
    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / 1024.0 / 1024.0 / 1024.0
    }
}

/// Trash every immediate subfolder of `root` last updated strictly before
/// `now - retention_days`. With `dry_run` nothing is trashed but the report
/// is the same.
///
/// A failed trash aborts the sweep; folders trashed before it stay trashed.
pub async fn sweep_subfolders(
    drive: &dyn DriveStorage,
    root: &str,
    retention_days: u32,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let mut report = SweepReport::default();

    for folder in drive.list_folders(root).await? {
        if folder.updated >= cutoff {
            debug!("Keeping {} (updated {})", folder.name, folder.updated);
            continue;
        }

        let size = folder_size(drive, &folder.id).await?;
        if dry_run {
            info!("Would trash {} ({} bytes)", folder.name, size);
        } else {
            drive.trash_folder(&folder.id).await?;
            info!("Trashed {} ({} bytes)", folder.name, size);
        }

        report.total_bytes += size;
        report.folder_names.push(folder.name);
    }

    Ok(report)
}

/// Sum of all file sizes under `folder`, walked with an explicit stack
async fn folder_size(drive: &dyn DriveStorage, folder: &str) -> Result<u64> {
    let mut total = 0;
    let mut stack = vec![folder.to_string()];

    while let Some(id) = stack.pop() {
        total += drive.list_files(&id).await?.iter().map(|f| f.size).sum::<u64>();
        stack.extend(drive.list_folders(&id).await?.into_iter().map(|f| f.id));
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryDrive, MEMORY_ROOT};

    fn populated(now: DateTime<Utc>) -> (MemoryDrive, String, String) {
        let drive = MemoryDrive::new(1 << 30);

        let old = drive.add_folder(MEMORY_ROOT, "2024-04-01", now - Duration::days(10));
        drive.add_file(&old, "a.jpg", 100);
        let nested = drive.add_folder(&old, "extra", now);
        drive.add_file(&nested, "b.mp4", 1000);

        let fresh = drive.add_folder(MEMORY_ROOT, "2024-04-10", now - Duration::hours(1));
        drive.add_file(&fresh, "c.jpg", 7);

        (drive, old, fresh)
    }

    #[tokio::test]
    async fn trashes_only_expired_folders() -> Result<()> {
        let now = Utc::now();
        let (drive, old, fresh) = populated(now);

        let report = sweep_subfolders(&drive, MEMORY_ROOT, 3, false, now).await?;
        assert_eq!(report.total_bytes, 1100);
        assert_eq!(report.folder_names, vec!["2024-04-01".to_string()]);
        assert!(!drive.contains_folder(&old));
        assert!(drive.contains_folder(&fresh));
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_matches_real_run() -> Result<()> {
        let now = Utc::now();
        let (drive, old, fresh) = populated(now);

        let dry = sweep_subfolders(&drive, MEMORY_ROOT, 0, true, now).await?;
        assert!(drive.contains_folder(&old));
        assert!(drive.contains_folder(&fresh));

        let real = sweep_subfolders(&drive, MEMORY_ROOT, 0, false, now).await?;
        assert_eq!(dry, real);
        assert_eq!(real.total_bytes, 1107);
        Ok(())
    }

    #[tokio::test]
    async fn cutoff_is_strict() -> Result<()> {
        let now = Utc::now();
        let drive = MemoryDrive::new(0);
        let edge = drive.add_folder(MEMORY_ROOT, "edge", now - Duration::days(2));

        let report = sweep_subfolders(&drive, MEMORY_ROOT, 2, false, now).await?;
        assert!(report.folder_names.is_empty());
        assert!(drive.contains_folder(&edge));
        Ok(())
    }

    #[tokio::test]
    async fn drive_failure_aborts() {
        let now = Utc::now();
        let (drive, _, _) = populated(now);
        drive.set_unavailable(true);
        assert!(sweep_subfolders(&drive, MEMORY_ROOT, 0, false, now).await.is_err());
    }
}
