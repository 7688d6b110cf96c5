use super::date::DayKey;
use super::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one registered owner of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One spending line: what the money went to and how much.
///
/// Ordering within a day is insertion order and is meaningful to the owner;
/// the append position is part of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendItem {
    pub description: String,
    pub amount: f64,
}

impl SpendItem {
    /// Validated constructor for the points where items originate (the entry
    /// UI). Deserialized request bodies bypass this and are accepted
    /// uncritically; the storage layer does not re-check.
    pub fn new(description: impl Into<String>, amount: f64) -> Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Spend item description cannot be empty".into(),
            ));
        }
        if !(amount > 0.0) {
            return Err(LedgerError::Validation(
                "Spend item amount must be positive".into(),
            ));
        }
        Ok(Self {
            description,
            amount,
        })
    }
}

/// The stored record for one owner and one calendar date.
///
/// At most one entry exists per `(owner, date)`; `last_modified` never
/// decreases across successful writes to the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub owner: OwnerId,
    pub date: DayKey,
    pub notes: String,
    pub spent_items: Vec<SpendItem>,
    pub last_modified: DateTime<Utc>,
}

impl DayEntry {
    /// Sum of all spend amounts for the day.
    pub fn total_spent(&self) -> f64 {
        self.spent_items.iter().map(|item| item.amount).sum()
    }
}

/// Client-supplied intent for one save: the fields only, without identity or
/// timestamp. Also the shape of the `GET /days/:date` payload for a date with
/// nothing stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub spent_items: Vec<SpendItem>,
}

impl EntryDraft {
    pub fn total_spent(&self) -> f64 {
        self.spent_items.iter().map(|item| item.amount).sum()
    }
}

/// How a save combines with whatever is already stored for the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Replace the stored entry with the incoming fields verbatim.
    #[default]
    Overwrite,
    /// Stack the incoming fields on top of the stored ones.
    Append,
}
