//! Journal and snapshot persistence for the day ledger.
//!
//! Every account creation, upsert and delete is appended to a length-prefixed
//! MessagePack journal; a checkpoint writes the full state to a snapshot file
//! (tmp-then-rename) and truncates the journal. Recovery loads the snapshot
//! and replays the journal on top.

use super::OwnerLedger;
use crate::auth::OwnerAccount;
use crate::core::{DayEntry, DayKey, LedgerError, OwnerId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Journal entry types
// ============================================================================

/// One durable mutation of ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    AccountCreated(OwnerAccount),
    Upserted { owner: OwnerId, entry: DayEntry },
    Deleted { owner: OwnerId, date: DayKey },
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub accounts: Vec<OwnerAccount>,
    pub ledgers: HashMap<OwnerId, OwnerLedger>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub owner_count: usize,
    pub entry_count: usize,
}

impl LedgerSnapshot {
    pub fn new(accounts: Vec<OwnerAccount>, ledgers: HashMap<OwnerId, OwnerLedger>) -> Self {
        let entry_count = ledgers.values().map(|l| l.len()).sum();
        let owner_count = accounts.len();
        let created_at = unix_millis();

        Self {
            version: 1,
            accounts,
            ledgers,
            metadata: SnapshotMetadata {
                created_at,
                owner_count,
                entry_count,
            },
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// State rebuilt from disk at startup.
#[derive(Debug, Default)]
pub struct LedgerRecovery {
    pub accounts: Vec<OwnerAccount>,
    pub ledgers: HashMap<OwnerId, OwnerLedger>,
}

// ============================================================================
// Durability configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync after every journal append.
    Sync,
    /// Flush to the OS after every append, fsync only at checkpoints.
    #[default]
    Async,
    /// No durability at all (tests, throwaway servers).
    None,
}

// ============================================================================
// Journal manager
// ============================================================================

pub struct JournalManager {
    journal_path: PathBuf,
    journal_file: Option<BufWriter<File>>,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
    checkpoint_threshold: usize,
}

impl JournalManager {
    pub fn new<P: AsRef<Path>>(journal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let journal_path = journal_path.as_ref().to_path_buf();
        if let Some(parent) = journal_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LedgerError::IoError(format!("Failed to create journal directory: {e}")))?;
        }

        let journal_file = if durability_mode != DurabilityMode::None {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&journal_path)
                .map_err(|e| LedgerError::IoError(format!("Failed to open journal: {e}")))?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        Ok(Self {
            journal_path,
            journal_file,
            durability_mode,
            entries_since_checkpoint: 0,
            checkpoint_threshold: 1000,
        })
    }

    pub fn append(&mut self, event: &LedgerEvent) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let file = self
            .journal_file
            .as_mut()
            .ok_or_else(|| LedgerError::IoError("Journal file not initialized".to_string()))?;
        let serialized = rmp_serde::to_vec(event)
            .map_err(|e| LedgerError::SerializationError(format!("Failed to serialize event: {e}")))?;
        let len = serialized.len() as u32;
        file.write_all(&len.to_le_bytes())
            .map_err(|e| LedgerError::IoError(format!("Failed to write journal: {e}")))?;
        file.write_all(&serialized)
            .map_err(|e| LedgerError::IoError(format!("Failed to write journal: {e}")))?;
        file.flush()
            .map_err(|e| LedgerError::IoError(format!("Failed to flush journal: {e}")))?;
        if self.durability_mode == DurabilityMode::Sync {
            file.get_mut()
                .sync_all()
                .map_err(|e| LedgerError::IoError(format!("Failed to sync journal: {e}")))?;
        }
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<LedgerEvent>> {
        if !self.journal_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.journal_path)
            .map_err(|e| LedgerError::IoError(format!("Failed to open journal for reading: {e}")))?;
        let mut reader = BufReader::new(file);
        let mut events = Vec::new();
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(LedgerError::IoError(format!(
                        "Failed to read journal frame length: {e}"
                    )));
                }
            }
            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut data = vec![0u8; len];
            reader
                .read_exact(&mut data)
                .map_err(|e| LedgerError::IoError(format!("Failed to read journal frame: {e}")))?;
            let event: LedgerEvent = rmp_serde::from_slice(&data).map_err(|e| {
                LedgerError::SerializationError(format!("Failed to deserialize event: {e}"))
            })?;
            events.push(event);
        }
        Ok(events)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        self.journal_file = None;
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.journal_path)
            .map_err(|e| LedgerError::IoError(format!("Failed to truncate journal: {e}")))?;
        self.journal_file = Some(BufWriter::new(file));
        self.entries_since_checkpoint = 0;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.entries_since_checkpoint >= self.checkpoint_threshold
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }
}

// ============================================================================
// Snapshot manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LedgerError::IoError(format!("Failed to create snapshot directory: {e}"))
            })?;
        }
        let temp_path = self.snapshot_path.with_extension("tmp");
        let temp_file = File::create(&temp_path)
            .map_err(|e| LedgerError::IoError(format!("Failed to create temp snapshot: {e}")))?;
        let mut writer = BufWriter::new(temp_file);
        let serialized = rmp_serde::to_vec(snapshot).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to serialize snapshot: {e}"))
        })?;
        writer
            .write_all(&serialized)
            .map_err(|e| LedgerError::IoError(format!("Failed to write snapshot: {e}")))?;
        writer
            .flush()
            .map_err(|e| LedgerError::IoError(format!("Failed to flush snapshot: {e}")))?;
        writer
            .get_mut()
            .sync_all()
            .map_err(|e| LedgerError::IoError(format!("Failed to sync snapshot: {e}")))?;
        fs::rename(&temp_path, &self.snapshot_path)
            .map_err(|e| LedgerError::IoError(format!("Failed to rename snapshot: {e}")))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path)
            .map_err(|e| LedgerError::IoError(format!("Failed to open snapshot: {e}")))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| LedgerError::IoError(format!("Failed to read snapshot: {e}")))?;
        let snapshot: LedgerSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            LedgerError::SerializationError(format!("Failed to deserialize snapshot: {e}"))
        })?;
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}

// ============================================================================
// Persistence manager
// ============================================================================

pub struct PersistenceManager {
    journal: JournalManager,
    snapshot: SnapshotManager,
    durability_mode: DurabilityMode,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let journal = JournalManager::new(data_dir.join("dayledger.journal"), durability_mode)?;
        let snapshot = SnapshotManager::new(data_dir.join("dayledger.snapshot"));
        Ok(Self {
            journal,
            snapshot,
            durability_mode,
        })
    }

    pub fn log(&mut self, event: &LedgerEvent) -> Result<()> {
        self.journal.append(event)
    }

    pub fn checkpoint(
        &mut self,
        accounts: Vec<OwnerAccount>,
        ledgers: HashMap<OwnerId, OwnerLedger>,
    ) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        self.snapshot.save(&LedgerSnapshot::new(accounts, ledgers))?;
        self.journal.clear()?;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.journal.needs_checkpoint()
    }

    /// Loads the snapshot (if any) and replays the journal on top. `None`
    /// means a cold start with nothing on disk.
    pub fn recover(&self) -> Result<Option<LedgerRecovery>> {
        let mut recovery = match self.snapshot.load()? {
            Some(snapshot) => LedgerRecovery {
                accounts: snapshot.accounts,
                ledgers: snapshot.ledgers,
            },
            None => LedgerRecovery::default(),
        };

        let events = self.journal.read_all()?;
        if recovery.accounts.is_empty() && recovery.ledgers.is_empty() && events.is_empty() {
            return Ok(None);
        }

        for event in events {
            match event {
                LedgerEvent::AccountCreated(account) => {
                    if !recovery.accounts.iter().any(|a| a.id() == account.id()) {
                        recovery.accounts.push(account);
                    }
                }
                LedgerEvent::Upserted { owner, entry } => {
                    recovery
                        .ledgers
                        .entry(owner)
                        .or_default()
                        .insert(entry.date, entry);
                }
                LedgerEvent::Deleted { owner, date } => {
                    if let Some(ledger) = recovery.ledgers.get_mut(&owner) {
                        ledger.remove(&date);
                    }
                }
            }
        }
        Ok(Some(recovery))
    }

    pub fn journal(&self) -> &JournalManager {
        &self.journal
    }
}
