use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One ledger row. Cells of a row that was never written read back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerSlot {
    pub event_number: Option<i64>,
    pub event_datetime: Option<NaiveDateTime>,
    pub jpg_path: Option<String>,
    pub mp4_path: Option<String>,
}

impl LedgerSlot {
    /// Whether this row currently belongs to `event_number`
    pub fn holds(&self, event_number: i64) -> bool {
        self.event_number == Some(event_number)
    }
}

/// The two file reference columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileColumn {
    Jpg,
    Mp4,
}

impl FileColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            FileColumn::Jpg => "jpg_path",
            FileColumn::Mp4 => "mp4_path",
        }
    }
}
