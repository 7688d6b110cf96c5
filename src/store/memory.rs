use super::OwnerLedger;
use crate::core::{DayEntry, DayKey, EntryDraft, MergeMode, OwnerId, Result};
use crate::merge;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage contract for day entries, scoped by owner.
///
/// Absence of an entry is a defined empty state, never an error. `save` must
/// compute the merge atomically with the read of the existing entry for the
/// key; an implementation that cannot guarantee that reports a retryable
/// `LedgerError::Conflict` instead of losing a write silently.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn get(&self, owner: OwnerId, date: DayKey) -> Option<DayEntry>;

    async fn save(
        &self,
        owner: OwnerId,
        date: DayKey,
        draft: EntryDraft,
        mode: MergeMode,
    ) -> Result<DayEntry>;

    /// Idempotent; deleting an absent entry is not an error.
    async fn delete(&self, owner: OwnerId, date: DayKey) -> Result<()>;

    /// Dates only, ascending. Used to compute the navigable range without
    /// shipping full entries.
    async fn list_dates(&self, owner: OwnerId) -> Vec<DayKey>;
}

/// In-memory entry store.
pub struct LedgerStore {
    /// Per-owner ledgers with individual locks; the outer lock only guards
    /// ledger creation and lookup, so those operations stay fast.
    ledgers: RwLock<HashMap<OwnerId, Arc<RwLock<OwnerLedger>>>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuilds a store from recovered state.
    pub fn from_ledgers(ledgers: HashMap<OwnerId, OwnerLedger>) -> Self {
        let ledgers = ledgers
            .into_iter()
            .map(|(owner, ledger)| (owner, Arc::new(RwLock::new(ledger))))
            .collect();
        Self {
            ledgers: RwLock::new(ledgers),
        }
    }

    /// Handle to an owner's ledger, creating it lazily on first write.
    async fn ledger(&self, owner: OwnerId) -> Arc<RwLock<OwnerLedger>> {
        if let Some(handle) = self.ledgers.read().await.get(&owner) {
            return handle.clone();
        }
        let mut ledgers = self.ledgers.write().await;
        ledgers.entry(owner).or_default().clone()
    }

    /// Existing handle only; reads must not materialize an empty ledger.
    async fn existing_ledger(&self, owner: OwnerId) -> Option<Arc<RwLock<OwnerLedger>>> {
        self.ledgers.read().await.get(&owner).cloned()
    }

    /// Full clone of all ledgers, for persistence checkpoints.
    pub async fn export(&self) -> HashMap<OwnerId, OwnerLedger> {
        let ledgers = self.ledgers.read().await;
        let mut out = HashMap::with_capacity(ledgers.len());
        for (owner, handle) in ledgers.iter() {
            out.insert(*owner, handle.read().await.clone());
        }
        out
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for LedgerStore {
    async fn get(&self, owner: OwnerId, date: DayKey) -> Option<DayEntry> {
        let handle = self.existing_ledger(owner).await?;
        let ledger = handle.read().await;
        ledger.get(&date).cloned()
    }

    async fn save(
        &self,
        owner: OwnerId,
        date: DayKey,
        draft: EntryDraft,
        mode: MergeMode,
    ) -> Result<DayEntry> {
        let handle = self.ledger(owner).await;
        let mut ledger = handle.write().await;
        // Merge decision and write happen under the same write lock, so the
        // read of the existing entry can never be stale; the map key makes
        // the one-entry-per-(owner, date) invariant hold by construction.
        let merged = merge::merge(owner, date, ledger.get(&date), draft, mode, Utc::now());
        ledger.insert(date, merged.clone());
        Ok(merged)
    }

    async fn delete(&self, owner: OwnerId, date: DayKey) -> Result<()> {
        if let Some(handle) = self.existing_ledger(owner).await {
            handle.write().await.remove(&date);
        }
        Ok(())
    }

    async fn list_dates(&self, owner: OwnerId) -> Vec<DayKey> {
        match self.existing_ledger(owner).await {
            Some(handle) => handle.read().await.keys().copied().collect(),
            None => Vec::new(),
        }
    }
}
