use crate::error::MalformedTimestampError;
use crate::feed::types::Item;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// An adjacent pair where the earlier-listed item is strictly older than the
/// one after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// 1-based position of `item` in the collection.
    pub position: usize,
    pub item: Item,
    pub next_item: Item,
}

/// Parse a listing timestamp. Accepts RFC 3339 with an offset, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` which is taken as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Check newest-to-oldest order over adjacent pairs. Equal timestamps are
/// allowed; the first unparseable timestamp aborts the check.
pub fn validate(items: &[Item]) -> Result<Vec<Violation>, MalformedTimestampError> {
    let instants = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            parse_instant(&item.timestamp).ok_or_else(|| MalformedTimestampError {
                position: i + 1,
                raw: item.timestamp.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let violations = instants
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] < pair[1])
        .map(|(i, _)| Violation {
            position: i + 1,
            item: items[i].clone(),
            next_item: items[i + 1].clone(),
        })
        .collect();

    Ok(violations)
}
