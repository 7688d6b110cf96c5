//! Entry merge engine: how one save combines with whatever is already stored
//! for the same owner and date.

use crate::core::{DayEntry, DayKey, EntryDraft, MergeMode, OwnerId};
use chrono::{DateTime, Utc};

/// Computes the stored entry that results from applying `incoming` on top of
/// `existing` under `mode`.
///
/// Pure function: callers are responsible for computing it atomically with
/// the read of `existing` (the store does this under the key's write lock).
///
/// Append is deliberately not idempotent: re-submitting the same draft twice
/// doubles the notes and the spend list. That is the "stack today's entries
/// on top of whatever's already there" workflow, not a bug to fix.
pub fn merge(
    owner: OwnerId,
    date: DayKey,
    existing: Option<&DayEntry>,
    incoming: EntryDraft,
    mode: MergeMode,
    now: DateTime<Utc>,
) -> DayEntry {
    // Keep last_modified monotone even if the wall clock stepped backwards.
    let last_modified = match existing {
        Some(entry) if entry.last_modified > now => entry.last_modified,
        _ => now,
    };

    match (mode, existing) {
        // Append onto nothing behaves exactly like overwrite.
        (MergeMode::Overwrite, _) | (MergeMode::Append, None) => DayEntry {
            owner,
            date,
            notes: incoming.notes,
            spent_items: incoming.spent_items,
            last_modified,
        },
        (MergeMode::Append, Some(existing)) => {
            let mut spent_items = existing.spent_items.clone();
            spent_items.extend(incoming.spent_items);
            DayEntry {
                owner,
                date,
                notes: join_notes(&existing.notes, &incoming.notes),
                spent_items,
                last_modified,
            }
        }
    }
}

fn join_notes(existing: &str, incoming: &str) -> String {
    if existing.is_empty() {
        incoming.to_string()
    } else if incoming.is_empty() {
        existing.to_string()
    } else {
        format!("{existing}\n{incoming}")
    }
}
