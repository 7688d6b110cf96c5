pub mod date;
pub mod entry;
pub mod error;

pub use date::DayKey;
pub use entry::{DayEntry, EntryDraft, MergeMode, OwnerId, SpendItem};
pub use error::{LedgerError, Result};
