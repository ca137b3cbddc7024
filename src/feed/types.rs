use serde::Serialize;

/// One listing row as the extractor found it. The timestamp is optional
/// because the source occasionally renders rows without an age attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub timestamp_raw: Option<String>,
    pub relative_age: String,
}

impl RawItem {
    /// Promote to an `Item`; `None` when the row carries no timestamp.
    pub fn into_item(self) -> Option<Item> {
        let timestamp = self.timestamp_raw?.trim().to_string();
        if timestamp.is_empty() {
            return None;
        }
        Some(Item {
            title: self.title,
            timestamp,
            relative_age: self.relative_age,
        })
    }
}

/// A collected listing entry with a present ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub title: String,
    pub timestamp: String,
    pub relative_age: String,
}
