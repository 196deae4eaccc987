use super::{render_link, DriveStorage, FileEntry, FolderEntry, LinkVariant, StorageQuota};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Folder {
    parent: String,
    name: String,
    updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct File {
    folder: String,
    name: String,
    size: u64,
}

#[derive(Default)]
struct Tree {
    folders: BTreeMap<String, Folder>,
    files: BTreeMap<String, File>,
}

/// In-process drive with generated ids; links look like `mem:/view/<id>`
pub struct MemoryDrive {
    tree: Mutex<Tree>,
    next_id: AtomicU64,
    limit_bytes: u64,
    unavailable: AtomicBool,
}

pub const MEMORY_ROOT: &str = "root";

impl MemoryDrive {
    pub fn new(limit_bytes: u64) -> Self {
        Self {
            tree: Mutex::new(Tree::default()),
            next_id: AtomicU64::new(1),
            limit_bytes,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every call fail, as a drive outage would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn add_folder(&self, parent: &str, name: &str, updated: DateTime<Utc>) -> String {
        let id = format!("d{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.lock().folders.insert(
            id.clone(),
            Folder {
                parent: parent.to_string(),
                name: name.to_string(),
                updated,
            },
        );
        id
    }

    pub fn add_file(&self, folder: &str, name: &str, size: u64) -> String {
        let id = format!("f{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.lock().files.insert(
            id.clone(),
            File {
                folder: folder.to_string(),
                name: name.to_string(),
                size,
            },
        );
        id
    }

    pub fn contains_folder(&self, id: &str) -> bool {
        self.lock().folders.contains_key(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Storage("drive unavailable".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DriveStorage for MemoryDrive {
    async fn find_folder(&self, parent: &str, name: &str) -> Result<Option<FolderEntry>> {
        Ok(self
            .list_folders(parent)
            .await?
            .into_iter()
            .find(|f| f.name == name))
    }

    async fn find_file(&self, folder: &str, name: &str) -> Result<Option<FileEntry>> {
        Ok(self
            .list_files(folder)
            .await?
            .into_iter()
            .find(|f| f.name == name))
    }

    async fn list_folders(&self, parent: &str) -> Result<Vec<FolderEntry>> {
        self.check()?;
        Ok(self
            .lock()
            .folders
            .iter()
            .filter(|(_, f)| f.parent == parent)
            .map(|(id, f)| FolderEntry {
                id: id.clone(),
                name: f.name.clone(),
                updated: f.updated,
            })
            .collect())
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<FileEntry>> {
        self.check()?;
        Ok(self
            .lock()
            .files
            .iter()
            .filter(|(_, f)| f.folder == folder)
            .map(|(id, f)| FileEntry {
                id: id.clone(),
                name: f.name.clone(),
                size: f.size,
            })
            .collect())
    }

    async fn trash_folder(&self, folder: &str) -> Result<()> {
        self.check()?;
        let mut tree = self.lock();
        if tree.folders.remove(folder).is_none() {
            return Err(Error::NotFound(format!("folder {}", folder)).into());
        }

        let mut pending = vec![folder.to_string()];
        while let Some(id) = pending.pop() {
            tree.files.retain(|_, f| f.folder != id);
            let children: Vec<String> = tree
                .folders
                .iter()
                .filter(|(_, f)| f.parent == id)
                .map(|(child, _)| child.clone())
                .collect();
            for child in children {
                tree.folders.remove(&child);
                pending.push(child);
            }
        }
        Ok(())
    }

    async fn quota(&self) -> Result<StorageQuota> {
        self.check()?;
        let used_bytes = self.lock().files.values().map(|f| f.size).sum();
        Ok(StorageQuota::from_usage(self.limit_bytes, used_bytes))
    }

    fn file_link(&self, file: &FileEntry, variant: LinkVariant) -> String {
        let template = match variant {
            LinkVariant::View => "{base}/view/{id}",
            LinkVariant::Open => "{base}/open/{id}",
        };
        render_link(template, "mem:/", &file.id)
    }
}
