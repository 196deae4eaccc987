use super::{render_link, DriveStorage, FileEntry, FolderEntry, LinkVariant, StorageQuota};
use crate::config::StorageConfig;
use crate::error::Error;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Drive backed by a local directory tree (e.g. motionEye's upload target).
///
/// Folder and file ids are filesystem paths. Links are built from the path
/// relative to `base_dir`, which the API server exposes under `/media` and `/files`.
pub struct LocalDrive {
    base_dir: PathBuf,
    public_base_url: String,
    view_url_template: String,
    open_url_template: String,
}

impl LocalDrive {
    pub fn new(config: &StorageConfig, public_base_url: &str) -> Self {
        Self {
            base_dir: config.root_folder.clone(),
            public_base_url: public_base_url.to_string(),
            view_url_template: config.view_url_template.clone(),
            open_url_template: config.open_url_template.clone(),
        }
    }

    /// Id of the configured root folder
    pub fn root_id(&self) -> String {
        self.base_dir.to_string_lossy().to_string()
    }

    /// `parent/name`, refusing names that would leave `parent`
    fn child(parent: &str, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }
        Some(Path::new(parent).join(name))
    }

    fn relative_id(&self, id: &str) -> String {
        let path = Path::new(id);
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn modified_at(meta: &std::fs::Metadata) -> Result<DateTime<Utc>> {
    Ok(DateTime::<Utc>::from(meta.modified()?))
}

fn path_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Parse `df -k` output. Size, used and available are the three columns
/// starting at `first_column` of the second line, in KB.
///
/// Available space comes from `df` itself rather than `size - used`, so
/// blocks reserved for root are not counted as free.
fn parse_df(output: &str, first_column: usize) -> Result<StorageQuota> {
    let line = output
        .lines()
        .nth(1)
        .ok_or_else(|| anyhow!("Invalid df output"))?;

    let values: Vec<&str> = line.split_whitespace().skip(first_column).take(3).collect();
    if values.len() < 3 {
        return Err(anyhow!("Invalid df output format"));
    }

    let total_kb: u64 = values[0].parse()?;
    let used_kb: u64 = values[1].parse()?;
    let avail_kb: u64 = values[2].parse()?;

    Ok(StorageQuota {
        limit_bytes: total_kb * 1024,
        used_bytes: used_kb * 1024,
        available_bytes: avail_kb * 1024,
    })
}

#[async_trait]
impl DriveStorage for LocalDrive {
    async fn find_folder(&self, parent: &str, name: &str) -> Result<Option<FolderEntry>> {
        let Some(path) = Self::child(parent, name) else {
            return Ok(None);
        };
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(FolderEntry {
                id: path.to_string_lossy().to_string(),
                name: name.to_string(),
                updated: modified_at(&meta)?,
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to stat {}: {}", path.display(), e)).into()),
        }
    }

    async fn find_file(&self, folder: &str, name: &str) -> Result<Option<FileEntry>> {
        let Some(path) = Self::child(folder, name) else {
            return Ok(None);
        };
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(FileEntry {
                id: path.to_string_lossy().to_string(),
                name: name.to_string(),
                size: meta.len(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to stat {}: {}", path.display(), e)).into()),
        }
    }

    async fn list_folders(&self, parent: &str) -> Result<Vec<FolderEntry>> {
        let mut folders = Vec::new();
        let mut entries = fs::read_dir(parent)
            .await
            .map_err(|e| Error::Storage(format!("Failed to read dir {}: {}", parent, e)))?;

        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                let path = entry.path();
                folders.push(FolderEntry {
                    id: path.to_string_lossy().to_string(),
                    name: path_name(&path),
                    updated: modified_at(&meta)?,
                });
            }
        }

        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(folder)
            .await
            .map_err(|e| Error::Storage(format!("Failed to read dir {}: {}", folder, e)))?;

        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_file() {
                let path = entry.path();
                files.push(FileEntry {
                    id: path.to_string_lossy().to_string(),
                    name: path_name(&path),
                    size: meta.len(),
                });
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn trash_folder(&self, folder: &str) -> Result<()> {
        info!("Removing folder {}", folder);
        fs::remove_dir_all(folder)
            .await
            .map_err(|e| Error::Storage(format!("Failed to remove {}: {}", folder, e)))?;
        Ok(())
    }

    async fn quota(&self) -> Result<StorageQuota> {
        let path = self.base_dir.to_string_lossy().to_string();

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            #[cfg(target_os = "linux")]
            let (args, first_column) = (["--output=size,used,avail", "-k", path.as_str()].to_vec(), 0);
            #[cfg(target_os = "macos")]
            let (args, first_column) = (["-k", path.as_str()].to_vec(), 1);

            let out = tokio::process::Command::new("df").args(&args).output().await?;
            if !out.status.success() {
                return Err(anyhow!("Failed to get disk usage"));
            }

            let quota = parse_df(&String::from_utf8_lossy(&out.stdout), first_column)?;
            debug!("df {}: {:?}", path, quota);
            Ok(quota)
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            Err(anyhow!("Disk usage is not supported on this OS ({})", path))
        }
    }

    fn file_link(&self, file: &FileEntry, variant: LinkVariant) -> String {
        let template = match variant {
            LinkVariant::View => &self.view_url_template,
            LinkVariant::Open => &self.open_url_template,
        };
        render_link(template, &self.public_base_url, &self.relative_id(&file.id))
    }
}
