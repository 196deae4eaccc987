use crate::storage::StorageQuota;
use once_cell::sync::Lazy;
use regex::Regex;

static THRESHOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(GB|MB|KB|B)$").expect("threshold pattern is valid"));

/// Free-space threshold such as `2GB`, `500mb` or `1024B` (1024-based units)
#[derive(Debug, Clone, PartialEq)]
pub struct FreeSpaceThreshold {
    /// Upper-cased setting, as shown in the alert
    pub label: String,
    /// `None` when the number part is not a number; never alerts
    pub bytes: Option<f64>,
}

impl FreeSpaceThreshold {
    /// Parse `setting` against the drive's total size. An unknown unit falls
    /// back to the whole drive.
    pub fn parse(setting: &str, limit_bytes: u64) -> Self {
        let label = setting.trim().to_uppercase();
        let bytes = match THRESHOLD_RE.captures(&label) {
            Some(caps) => {
                let unit: f64 = match &caps[2] {
                    "GB" => 1024.0 * 1024.0 * 1024.0,
                    "MB" => 1024.0 * 1024.0,
                    "KB" => 1024.0,
                    _ => 1.0,
                };
                parse_amount(&caps[1]).map(|n| n * unit)
            }
            None => Some(limit_bytes as f64),
        };
        Self { label, bytes }
    }

    pub fn is_exceeded_by(&self, free_bytes: u64) -> bool {
        matches!(self.bytes, Some(t) if (free_bytes as f64) < t)
    }
}

/// Blank counts as zero
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn gb(bytes: f64) -> String {
    format!("{:.1}", bytes / 1024.0 / 1024.0 / 1024.0)
}

/// Alert text when free space is below the threshold, `None` otherwise
pub fn free_space_alert(quota: &StorageQuota, setting: &str) -> Option<String> {
    let threshold = FreeSpaceThreshold::parse(setting, quota.limit_bytes);
    let free = quota.free_bytes();
    if !threshold.is_exceeded_by(free) {
        return None;
    }

    Some(format!(
        "[Storage] ({})\nTotal:{}GB\nUsed:{}GB\nFree:{}GB(<{}GB)",
        threshold.label,
        gb(quota.limit_bytes as f64),
        gb(quota.used_bytes as f64),
        gb(free as f64),
        gb(threshold.bytes.unwrap_or_default()),
    ))
}
