//! dayledger: a personal day ledger.
//!
//! Each owner keeps one entry per calendar date holding free-form notes and a
//! list of spend items. Saves go through a merge engine (overwrite or append),
//! reads treat absence as a defined empty day, and a bounded navigator drives
//! the history browser. State can be made durable with a journal plus
//! snapshot pair.

pub mod auth;
pub mod core;
pub mod facade;
pub mod merge;
pub mod navigator;
pub mod notes;
pub mod store;
pub mod web;

pub use crate::core::{
    DayEntry, DayKey, EntryDraft, LedgerError, MergeMode, OwnerId, Result, SpendItem,
};
pub use facade::Ledger;
pub use navigator::{DayView, HistoryNavigator, LoadTicket, StepDirection};
pub use store::{DateRange, DurabilityMode, EntryStore, LedgerStore};
