//! High-level ledger facade tying accounts, storage and persistence together.

use crate::auth::{AccountManager, OwnerAccount};
use crate::core::{DayEntry, DayKey, EntryDraft, LedgerError, MergeMode, OwnerId, Result};
use crate::store::{
    DateRange, DurabilityMode, EntryStore, LedgerEvent, LedgerStore, PersistenceManager,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The ledger service: owner accounts plus their day entries, with optional
/// journal/snapshot durability. Everything the web layer and the binary need
/// goes through here.
pub struct Ledger {
    accounts: AccountManager,
    store: LedgerStore,
    persistence: Option<Arc<Mutex<PersistenceManager>>>,
}

impl Ledger {
    /// A purely in-memory ledger. State dies with the process.
    pub fn in_memory() -> Self {
        Self {
            accounts: AccountManager::new(),
            store: LedgerStore::new(),
            persistence: None,
        }
    }

    /// Opens a durable ledger at `data_dir`, recovering any previous state
    /// from the snapshot and journal.
    pub fn open<P: AsRef<Path>>(data_dir: P, durability: DurabilityMode) -> Result<Self> {
        let persistence = PersistenceManager::new(data_dir, durability)?;
        let (accounts, store) = match persistence.recover()? {
            Some(recovery) => {
                info!(
                    owners = recovery.accounts.len(),
                    "Recovered ledger state from disk"
                );
                (
                    AccountManager::restore(recovery.accounts),
                    LedgerStore::from_ledgers(recovery.ledgers),
                )
            }
            None => (AccountManager::new(), LedgerStore::new()),
        };
        Ok(Self {
            accounts,
            store,
            persistence: Some(Arc::new(Mutex::new(persistence))),
        })
    }

    async fn log(&self, event: LedgerEvent) -> Result<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        let mut persistence = persistence.lock().await;
        persistence.log(&event)?;
        if persistence.needs_checkpoint() {
            let accounts = self.accounts.export().await;
            let ledgers = self.store.export().await;
            persistence.checkpoint(accounts, ledgers)?;
            info!("Ledger checkpoint written");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    pub async fn register(&self, username: &str, password: &str) -> Result<OwnerAccount> {
        let account = self.accounts.create(username, password).await?;
        self.log(LedgerEvent::AccountCreated(account.clone())).await?;
        info!(username = account.username(), "Registered owner");
        Ok(account)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<OwnerAccount> {
        self.accounts.authenticate(username, password).await
    }

    // ------------------------------------------------------------------
    // Day entries
    // ------------------------------------------------------------------

    /// The entry for a day, or `None` for the defined empty state.
    pub async fn day(&self, owner: OwnerId, date: DayKey) -> Option<DayEntry> {
        self.store.get(owner, date).await
    }

    /// Merges a draft into the day and makes the result durable. A retryable
    /// conflict from the store is retried once before giving up.
    pub async fn save_day(
        &self,
        owner: OwnerId,
        date: DayKey,
        draft: EntryDraft,
        mode: MergeMode,
    ) -> Result<DayEntry> {
        let entry = match self.store.save(owner, date, draft.clone(), mode).await {
            Ok(entry) => entry,
            Err(LedgerError::Conflict(reason)) => {
                warn!(%date, reason, "Retrying conflicted save");
                self.store.save(owner, date, draft, mode).await?
            }
            Err(e) => return Err(e),
        };
        self.log(LedgerEvent::Upserted {
            owner,
            entry: entry.clone(),
        })
        .await?;
        Ok(entry)
    }

    /// Removes the day's entry. Idempotent.
    pub async fn delete_day(&self, owner: OwnerId, date: DayKey) -> Result<()> {
        self.store.delete(owner, date).await?;
        self.log(LedgerEvent::Deleted { owner, date }).await
    }

    /// Dates with stored entries, ascending.
    pub async fn entry_dates(&self, owner: OwnerId) -> Vec<DayKey> {
        self.store.list_dates(owner).await
    }

    /// The interval the history browser may navigate, ending today.
    pub async fn navigable_range(&self, owner: OwnerId) -> DateRange {
        let dates = self.store.list_dates(owner).await;
        DateRange::from_dates(&dates, DayKey::today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(raw: &str) -> DayKey {
        DayKey::parse(raw).unwrap()
    }

    fn draft(notes: &str) -> EntryDraft {
        EntryDraft {
            notes: notes.to_string(),
            spent_items: vec![],
        }
    }

    #[tokio::test]
    async fn save_then_read_back() {
        let ledger = Ledger::in_memory();
        let owner = ledger.register("alice", "password123").await.unwrap().id();

        ledger
            .save_day(owner, day("2025-09-10"), draft("hello"), MergeMode::Overwrite)
            .await
            .unwrap();

        let entry = ledger.day(owner, day("2025-09-10")).await.unwrap();
        assert_eq!(entry.notes, "hello");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let ledger = Ledger::in_memory();
        let owner = ledger.register("alice", "password123").await.unwrap().id();

        ledger
            .save_day(owner, day("2025-09-10"), draft("x"), MergeMode::Overwrite)
            .await
            .unwrap();
        ledger.delete_day(owner, day("2025-09-10")).await.unwrap();
        ledger.delete_day(owner, day("2025-09-10")).await.unwrap();
        assert!(ledger.day(owner, day("2025-09-10")).await.is_none());
    }

    #[tokio::test]
    async fn reopen_recovers_accounts_and_entries() {
        let temp_dir = TempDir::new().unwrap();
        let owner;
        {
            let ledger = Ledger::open(temp_dir.path(), DurabilityMode::Sync).unwrap();
            owner = ledger.register("alice", "password123").await.unwrap().id();
            ledger
                .save_day(owner, day("2025-09-10"), draft("kept"), MergeMode::Overwrite)
                .await
                .unwrap();
        }

        let reopened = Ledger::open(temp_dir.path(), DurabilityMode::Sync).unwrap();
        let account = reopened
            .authenticate("alice", "password123")
            .await
            .unwrap();
        assert_eq!(account.id(), owner);
        assert_eq!(
            reopened.day(owner, day("2025-09-10")).await.unwrap().notes,
            "kept"
        );
    }

    #[tokio::test]
    async fn navigable_range_ends_today() {
        let ledger = Ledger::in_memory();
        let owner = ledger.register("alice", "password123").await.unwrap().id();

        let range = ledger.navigable_range(owner).await;
        assert_eq!(range.min(), DayKey::today());
        assert_eq!(range.max(), DayKey::today());
    }
}
