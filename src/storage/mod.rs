use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

pub mod local;
pub mod memory;
pub mod resolver;

pub use local::LocalDrive;
pub use memory::MemoryDrive;
pub use resolver::FileResolver;

/// A folder in the drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    pub updated: DateTime<Utc>,
}

/// A file in the drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
}

/// Drive capacity in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageQuota {
    pub limit_bytes: u64,
    pub used_bytes: u64,
    /// Space that can still be written. Can be less than `limit - used` when
    /// the filesystem reserves blocks.
    pub available_bytes: u64,
}

impl StorageQuota {
    /// Quota of a drive with no reserved space
    pub fn from_usage(limit_bytes: u64, used_bytes: u64) -> Self {
        Self {
            limit_bytes,
            used_bytes,
            available_bytes: limit_bytes.saturating_sub(used_bytes),
        }
    }

    pub fn free_bytes(&self) -> u64 {
        self.available_bytes
    }
}

/// Which kind of link to hand out for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVariant {
    /// Direct content, usable as an embedded image
    View,
    /// Generic page that opens the file
    Open,
}

/// Hierarchical file storage: root folder -> event folders -> files
#[async_trait]
pub trait DriveStorage: Send + Sync {
    /// Child folder of `parent` called `name`
    async fn find_folder(&self, parent: &str, name: &str) -> Result<Option<FolderEntry>>;

    /// File called `name` directly inside `folder`
    async fn find_file(&self, folder: &str, name: &str) -> Result<Option<FileEntry>>;

    /// Immediate child folders
    async fn list_folders(&self, parent: &str) -> Result<Vec<FolderEntry>>;

    /// Files directly inside `folder`
    async fn list_files(&self, folder: &str) -> Result<Vec<FileEntry>>;

    /// Remove a folder and everything under it
    async fn trash_folder(&self, folder: &str) -> Result<()>;

    async fn quota(&self) -> Result<StorageQuota>;

    fn file_link(&self, file: &FileEntry, variant: LinkVariant) -> String;
}

/// Fill a link template such as `{base}/media/{id}`. Each `/`-separated
/// segment of `id` is percent-encoded.
pub fn render_link(template: &str, base: &str, id: &str) -> String {
    template
        .replace("{base}", base.trim_end_matches('/'))
        .replace("{id}", &encode_path(id))
}

fn encode_path(id: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return id.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(id.split('/'));
    }
    url.path().trim_start_matches('/').to_string()
}
