use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of a motionEye notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Motion started; no file yet
    #[default]
    Started,
    /// Snapshot uploaded
    Jpg,
    /// Movie uploaded
    Mp4,
    /// A file with any other extension
    Unknown,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Jpg => write!(f, "jpg"),
            Self::Mp4 => write!(f, "mp4"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Parts of an uploaded file path that matter for the ledger and the drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub extension: String,
    pub file_name: String,
    /// Immediate parent folder; groups the jpg and mp4 of one event
    pub folder_name: String,
}

impl FileInfo {
    pub fn kind(&self) -> EventKind {
        match self.extension.as_str() {
            "jpg" => EventKind::Jpg,
            "mp4" => EventKind::Mp4,
            _ => EventKind::Unknown,
        }
    }
}

/// Split an upload path such as `/var/lib/motioneye/Camera1/2024-05-01/10-11-12.jpg`.
///
/// Paths with fewer than three `/`-separated segments carry no usable file
/// information and yield `None`.
pub fn classify(filepath: &str) -> Option<FileInfo> {
    if filepath.is_empty() {
        return None;
    }

    let segments: Vec<&str> = filepath.split('/').collect();
    if segments.len() < 3 {
        return None;
    }

    let file_name = segments[segments.len() - 1];
    let folder_name = segments[segments.len() - 2];
    let extension = file_name.rsplit('.').next().unwrap_or(file_name);

    Some(FileInfo {
        extension: extension.to_string(),
        file_name: file_name.to_string(),
        folder_name: folder_name.to_string(),
    })
}
