//! Terminal history browser: a ratatui client for the ledger API.

pub mod app;
pub mod client;
pub mod ui;
