//! The audit chain - sole writer of audit entries
//!
//! Invariant: `append` reads the chain tail and writes the new entry
//! under one write lock, so appends are linearized and two writers can
//! never extend the same tail. `prev_hash` values are therefore unique
//! across the chain.

use crate::entry::{AuditEntry, EntryDraft};
use crate::error::{AuditError, AuditResult};
use crate::hash::{self, GENESIS_PREV_HASH};
use fineflow_core::Clock;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

/// Append-only, hash-linked ledger of every state-changing action.
///
/// In-memory by default; [`AuditChain::with_file`] mirrors every entry
/// to an append-only JSONL file and replays it on startup.
pub struct AuditChain {
    clock: Arc<dyn Clock>,
    entries: RwLock<Vec<AuditEntry>>,
    sink: Mutex<Option<Box<dyn Write + Send>>>,
    path: Option<PathBuf>,
}

impl AuditChain {
    /// In-memory chain
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(Vec::new()),
            sink: Mutex::new(None),
            path: None,
        }
    }

    /// Chain mirrored to an arbitrary writer, one JSON line per entry.
    /// Unlike [`AuditChain::with_file`] nothing is replayed on open.
    pub fn with_writer(writer: Box<dyn Write + Send>, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(Vec::new()),
            sink: Mutex::new(Some(writer)),
            path: None,
        }
    }

    /// Chain mirrored to an append-only JSONL file.
    ///
    /// Existing entries are replayed and verified before the chain
    /// accepts new appends; a corrupt file surfaces as
    /// `ChainIntegrity` here, not later during writes.
    pub fn with_file(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut entries = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: AuditEntry = serde_json::from_str(&line)?;
                entries.push(entry);
            }
            hash::verify_entries(&entries, GENESIS_PREV_HASH)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            clock,
            entries: RwLock::new(entries),
            sink: Mutex::new(Some(Box::new(file))),
            path: Some(path),
        })
    }

    /// Append a new entry. The sole mutator of the chain.
    pub fn append(&self, draft: EntryDraft) -> AuditResult<AuditEntry> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        let (sequence, prev_hash) = match entries.last() {
            Some(last) => (last.sequence + 1, last.hash.clone()),
            None => (1, GENESIS_PREV_HASH.to_string()),
        };

        let mut entry = AuditEntry {
            sequence,
            action: draft.action,
            actor_id: draft.actor_id,
            target_id: draft.target_id,
            payload: draft.payload,
            client_info: draft.client_info,
            timestamp: self.clock.now(),
            prev_hash,
            hash: String::new(),
        };
        entry.hash = hash::calculate_entry_hash(&entry)?;

        // Mirror to the file before exposing the entry to readers, so
        // the durable order always matches the in-memory order.
        {
            let mut sink = self.sink.lock().map_err(|_| poisoned())?;
            if let Some(ref mut writer) = *sink {
                let json = serde_json::to_string(&entry)?;
                writeln!(writer, "{json}")?;
                writer.flush()?;
            }
        }

        entries.push(entry.clone());
        debug!(sequence, action = %entry.action, target = %entry.target_id, "audit entry appended");
        Ok(entry)
    }

    /// Recompute and check every hash from `from_sequence` (or the
    /// start) against storage, over a consistent snapshot.
    pub fn verify(&self, from_sequence: Option<u64>) -> AuditResult<()> {
        let entries = self.read_entries();

        match from_sequence {
            None | Some(0) | Some(1) => hash::verify_entries(&entries, GENESIS_PREV_HASH),
            Some(seq) => {
                let start = entries
                    .iter()
                    .position(|e| e.sequence == seq)
                    .ok_or(AuditError::EntryNotFound(seq))?;
                let starting_prev = &entries[start - 1].hash;
                hash::verify_entries(&entries[start..], starting_prev)
            }
        }
    }

    /// Snapshot of all entries in write order
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.read_entries().clone()
    }

    /// Snapshot of the entries targeting one record/case
    pub fn entries_for_target(&self, target_id: &str) -> Vec<AuditEntry> {
        self.read_entries()
            .iter()
            .filter(|entry| entry.target_id == target_id)
            .cloned()
            .collect()
    }

    pub fn get(&self, sequence: u64) -> AuditResult<AuditEntry> {
        self.read_entries()
            .iter()
            .find(|e| e.sequence == sequence)
            .cloned()
            .ok_or(AuditError::EntryNotFound(sequence))
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hash of the most recent entry, or the genesis value
    pub fn last_hash(&self) -> String {
        self.read_entries()
            .last()
            .map(|l| l.hash.clone())
            .unwrap_or_else(|| GENESIS_PREV_HASH.to_string())
    }

    /// Read access that survives lock poisoning. An entry is pushed as
    /// the last step under the write lock, so a panicked writer never
    /// committed a partial entry and the stored data is still
    /// consistent; reads must not misreport the chain as empty.
    /// `append` still refuses a poisoned lock.
    fn read_entries(&self) -> RwLockReadGuard<'_, Vec<AuditEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Path of the JSONL mirror, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn poisoned() -> AuditError {
    AuditError::Storage("audit chain lock poisoned".to_string())
}
