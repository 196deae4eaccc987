use super::{DriveStorage, LinkVariant};
use crate::events::path::classify;
use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;

/// Turns a path recorded in the ledger into a link under the root folder
#[derive(Clone)]
pub struct FileResolver {
    drive: Arc<dyn DriveStorage>,
}

impl FileResolver {
    pub fn new(drive: Arc<dyn DriveStorage>) -> Self {
        Self { drive }
    }

    /// Link to `root/<folder of filepath>/<file name of filepath>`.
    ///
    /// Every failure (unclassifiable path, missing folder or file, drive
    /// error) resolves to `None`.
    pub async fn resolve(&self, filepath: &str, root: &str, variant: LinkVariant) -> Option<String> {
        match self.lookup(filepath, root, variant).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Failed to resolve {}: {}", filepath, e);
                None
            }
        }
    }

    async fn lookup(&self, filepath: &str, root: &str, variant: LinkVariant) -> Result<Option<String>> {
        let Some(info) = classify(filepath) else {
            return Ok(None);
        };

        let Some(folder) = self.drive.find_folder(root, &info.folder_name).await? else {
            debug!("Folder {} not found under {}", info.folder_name, root);
            return Ok(None);
        };

        let Some(file) = self.drive.find_file(&folder.id, &info.file_name).await? else {
            debug!("File {} not found in {}", info.file_name, info.folder_name);
            return Ok(None);
        };

        Ok(Some(self.drive.file_link(&file, variant)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryDrive, MEMORY_ROOT};
    use chrono::Utc;

    fn setup() -> (Arc<MemoryDrive>, FileResolver, String) {
        let drive = Arc::new(MemoryDrive::new(1 << 30));
        let folder = drive.add_folder(MEMORY_ROOT, "2024-05-01", Utc::now());
        let file = drive.add_file(&folder, "10-11-12.jpg", 100);
        (drive.clone(), FileResolver::new(drive), file)
    }

    #[tokio::test]
    async fn resolves_existing_file() {
        let (_, resolver, file) = setup();
        let link = resolver
            .resolve("/var/lib/motioneye/Camera1/2024-05-01/10-11-12.jpg", MEMORY_ROOT, LinkVariant::View)
            .await;
        assert_eq!(link, Some(format!("mem:/view/{}", file)));

        let link = resolver
            .resolve("x/2024-05-01/10-11-12.jpg", MEMORY_ROOT, LinkVariant::Open)
            .await;
        assert_eq!(link, Some(format!("mem:/open/{}", file)));
    }

    #[tokio::test]
    async fn absence_is_not_an_error() {
        let (_, resolver, _) = setup();
        for path in ["", "10-11-12.jpg", "x/2024-05-02/10-11-12.jpg", "x/2024-05-01/other.jpg"] {
            assert_eq!(resolver.resolve(path, MEMORY_ROOT, LinkVariant::View).await, None, "{path}");
        }
    }

    #[tokio::test]
    async fn drive_errors_are_absorbed() {
        let (drive, resolver, _) = setup();
        drive.set_unavailable(true);
        let link = resolver
            .resolve("x/2024-05-01/10-11-12.jpg", MEMORY_ROOT, LinkVariant::View)
            .await;
        assert_eq!(link, None);
    }
}
