use super::path::{classify, EventKind};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::warn;
use serde::Serialize;
use serde_json::Value;

/// A single motionEye webhook call, typed
///
/// motionEye is configured with two hooks:
///   started: `{"motioneye": "started", "eventnumber": "%v", "year": "%Y", "month": "%m", ...}`
///   storage: same fields plus `"filepath": "%f"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub event_number: i64,
    /// `None` when the date fields do not form a representable time
    pub event_datetime: Option<NaiveDateTime>,
    pub kind: EventKind,
    /// Empty unless the path could be classified
    pub filepath: String,
}

impl Notification {
    /// Convert a raw webhook payload. Never fails; malformed fields are carried
    /// through as event number 0 or a missing timestamp.
    pub fn from_payload(contents: &Value) -> Self {
        let event_number = match loose_number(contents.get("eventnumber")) {
            Some(n) => n as i64,
            None => {
                warn!("Notification without a numeric event number: {:?}", contents.get("eventnumber"));
                0
            }
        };

        let field = |name: &str| loose_number(contents.get(name)).map(|n| n as i64);
        let event_datetime = match (
            field("year"),
            field("month"),
            field("day"),
            field("hour"),
            field("minute"),
            field("second"),
        ) {
            (Some(year), Some(month), Some(day), Some(hour), Some(minute), Some(second)) => {
                datetime_from_fields(year, month, day, hour, minute, second)
            }
            _ => None,
        };

        let mut notification = Self {
            event_number,
            event_datetime,
            kind: EventKind::Started,
            filepath: String::new(),
        };

        if let Some(filepath) = contents.get("filepath").and_then(Value::as_str) {
            if let Some(info) = classify(filepath) {
                notification.kind = info.kind();
                notification.filepath = filepath.to_string();
            }
        }

        notification
    }
}

/// Numbers and numeric strings; fractions are truncated.
fn loose_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() {
        Some(n.trunc())
    } else {
        None
    }
}

/// Build a wall-clock time from calendar fields.
///
/// `month_index` is 0-based (0 = January) and is used exactly as received; the
/// camera sends 1-12, so stored times run one month ahead. Out-of-range fields
/// overflow into the next larger unit (month 12 is January of the next year,
/// day 0 is the last day of the previous month).
pub fn datetime_from_fields(
    year: i64,
    month_index: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<NaiveDateTime> {
    let year = i32::try_from(year.checked_add(month_index.div_euclid(12))?).ok()?;
    let month = month_index.rem_euclid(12) as u32 + 1;
    let month_start = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;

    let offset_secs = day
        .checked_sub(1)?
        .checked_mul(86_400)?
        .checked_add(hour.checked_mul(3_600)?)?
        .checked_add(minute.checked_mul(60)?)?
        .checked_add(second)?;

    month_start.checked_add_signed(Duration::try_seconds(offset_secs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn started_notification_has_no_file() {
        let n = Notification::from_payload(&json!({
            "motioneye": "started",
            "eventnumber": "42",
            "year": "2024", "month": "05", "day": "01",
            "hour": "10", "minute": "11", "second": "12",
        }));
        assert_eq!(n.event_number, 42);
        assert_eq!(n.kind, EventKind::Started);
        assert_eq!(n.filepath, "");
        // month 5 is taken as an index, i.e. June
        assert_eq!(n.event_datetime, Some(at(2024, 6, 1, 10, 11, 12)));
    }

    #[test]
    fn storage_notification_is_reclassified() {
        let path = "/var/lib/motioneye/Camera1/2024-05-01/10-11-12.mp4";
        let n = Notification::from_payload(&json!({
            "motioneye": "storage",
            "eventnumber": 7,
            "year": 2024, "month": 4, "day": 1, "hour": 0, "minute": 0, "second": 0,
            "filepath": path,
        }));
        assert_eq!(n.kind, EventKind::Mp4);
        assert_eq!(n.filepath, path);
        assert_eq!(n.event_datetime, Some(at(2024, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn unknown_extension_keeps_the_path() {
        let n = Notification::from_payload(&json!({"eventnumber": 3, "filepath": "a/b/c.txt"}));
        assert_eq!(n.kind, EventKind::Unknown);
        assert_eq!(n.filepath, "a/b/c.txt");
    }

    #[test]
    fn short_or_empty_paths_stay_started() {
        for path in ["", "c.jpg", "b/c.jpg"] {
            let n = Notification::from_payload(&json!({"eventnumber": 3, "filepath": path}));
            assert_eq!(n.kind, EventKind::Started, "{path}");
            assert_eq!(n.filepath, "");
        }
    }

    #[test]
    fn malformed_fields_do_not_fail() {
        let n = Notification::from_payload(&json!({
            "eventnumber": "abc",
            "year": "x", "month": 1, "day": 1, "hour": 0, "minute": 0, "second": 0,
        }));
        assert_eq!(n.event_number, 0);
        assert_eq!(n.event_datetime, None);
        assert_eq!(n.kind, EventKind::Started);
    }

    #[test]
    fn december_overflows_into_next_year() {
        assert_eq!(datetime_from_fields(2023, 12, 31, 23, 59, 59), Some(at(2024, 1, 31, 23, 59, 59)));
        assert_eq!(datetime_from_fields(2024, 1, 30, 0, 0, 0), Some(at(2024, 3, 1, 0, 0, 0)));
        assert_eq!(datetime_from_fields(2024, 0, 0, 24, 0, 0), Some(at(2024, 1, 1, 0, 0, 0)));
        assert_eq!(datetime_from_fields(2024, -1, 1, 0, 0, 0), Some(at(2023, 12, 1, 0, 0, 0)));
    }

    #[test]
    fn extreme_fields_do_not_fail() {
        let n = Notification::from_payload(&json!({
            "eventnumber": "-9223372036854775808",
            "year": 2024, "month": 0, "day": -1e19, "hour": 0, "minute": 0, "second": 0,
        }));
        assert_eq!(n.event_number, i64::MIN);
        assert_eq!(n.event_datetime, None);

        assert_eq!(datetime_from_fields(2024, 0, i64::MIN, 0, 0, 0), None);
        assert_eq!(datetime_from_fields(i64::MAX, i64::MAX, 1, 0, 0, 0), None);
    }
}
