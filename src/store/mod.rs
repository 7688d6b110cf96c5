pub mod memory;
pub mod persistence;
pub mod range;

use crate::core::{DayEntry, DayKey};
use std::collections::BTreeMap;

/// One owner's entries, keyed (and therefore ordered) by calendar date.
pub type OwnerLedger = BTreeMap<DayKey, DayEntry>;

pub use memory::{EntryStore, LedgerStore};
pub use persistence::{
    DurabilityMode, JournalManager, LedgerEvent, LedgerRecovery, LedgerSnapshot,
    PersistenceManager, SnapshotManager,
};
pub use range::DateRange;
