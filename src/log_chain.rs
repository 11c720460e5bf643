//! Hash-chained append-only evidence log.
//!
//! Independent of `tracing`'s structured diagnostic logging: this log is
//! the evidence record that gets projected into a certificate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Lowercase hex encoding, used for hashes throughout the crate so the
/// signer and the log chain agree on one representation.
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One node of the hash chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub entry_id: Uuid,
    pub level: LogLevel,
    pub message: String,
    pub prev_hash: String,
    pub entry_hash: String,
}

impl LogEntry {
    fn compute_hash(
        timestamp: &chrono::DateTime<chrono::Utc>,
        entry_id: &Uuid,
        message: &str,
        level: LogLevel,
        prev_hash: &str,
    ) -> String {
        let level_str = match level {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        let mut hasher = Sha256::new();
        hasher.update(timestamp.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true).as_bytes());
        hasher.update(entry_id.to_string().as_bytes());
        hasher.update(message.as_bytes());
        hasher.update(level_str.as_bytes());
        hasher.update(prev_hash.as_bytes());
        to_hex(&hasher.finalize())
    }

    fn recomputed_hash(&self) -> String {
        Self::compute_hash(
            &self.timestamp,
            &self.entry_id,
            &self.message,
            self.level,
            &self.prev_hash,
        )
    }
}

/// Process-scoped, persistent, append-only log. Appends are serialized
/// through `&mut self`; concurrent readers see snapshots at an entry
/// boundary since `entries()` returns an owned clone.
pub struct HashChainLog {
    entries: Vec<LogEntry>,
    path: PathBuf,
    /// Set when the log loaded from disk failed `verify_chain` at
    /// startup. The corrupted entries are kept and new entries are still
    /// appended on top: the corruption is itself part of the evidence.
    loaded_with_corruption: bool,
}

impl HashChainLog {
    /// Load a prior log file if present and verify it; a verification
    /// failure does not erase the file or abort construction.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Vec::new()
        };

        let mut log = Self {
            entries,
            path,
            loaded_with_corruption: false,
        };
        log.loaded_with_corruption = !log.verify_chain();
        if log.loaded_with_corruption {
            tracing::error!(
                "evidence log at {} failed chain verification on load",
                log.path.display()
            );
        }
        Ok(log)
    }

    pub fn loaded_with_corruption(&self) -> bool {
        self.loaded_with_corruption
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a new entry, persist, and return it.
    pub fn append(&mut self, message: impl Into<String>, level: LogLevel) -> anyhow::Result<LogEntry> {
        let prev_hash = self
            .entries
            .last()
            .map(|e| e.entry_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let timestamp = chrono::Utc::now();
        let entry_id = Uuid::new_v4();
        let message = message.into();
        let entry_hash = LogEntry::compute_hash(&timestamp, &entry_id, &message, level, &prev_hash);

        let entry = LogEntry {
            sequence: self.entries.len() as u64,
            timestamp,
            entry_id,
            level,
            message,
            prev_hash,
            entry_hash,
        };

        self.entries.push(entry.clone());
        self.flush()?;
        Ok(entry)
    }

    /// Walk the chain from index 1 and check every link. An empty or
    /// single-entry chain is trivially valid.
    pub fn verify_chain(&self) -> bool {
        for i in 1..self.entries.len() {
            let prev = &self.entries[i - 1];
            let cur = &self.entries[i];
            if cur.prev_hash != prev.entry_hash {
                return false;
            }
            if cur.entry_hash != cur.recomputed_hash() {
                return false;
            }
        }
        self.entries
            .first()
            .map(|e| e.entry_hash == e.recomputed_hash())
            .unwrap_or(true)
    }

    fn flush(&self) -> anyhow::Result<()> {
        let pretty = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&self.path)?;
        file.write_all(pretty.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(dir: &tempfile::TempDir) -> HashChainLog {
        HashChainLog::open(dir.path().join("log.json")).unwrap()
    }

    #[test]
    fn appends_form_a_valid_chain() {
        let dir = tempdir().unwrap();
        let mut log = open(&dir);
        for i in 0..5 {
            log.append(format!("event {i}"), LogLevel::Info).unwrap();
        }
        assert!(log.verify_chain());
        assert_eq!(log.len(), 5);
        assert_eq!(log.entries()[0].prev_hash, GENESIS_HASH);
    }

    #[test]
    fn tampering_breaks_the_chain() {
        let dir = tempdir().unwrap();
        let mut log = open(&dir);
        log.append("a", LogLevel::Info).unwrap();
        log.append("b", LogLevel::Info).unwrap();
        log.append("c", LogLevel::Info).unwrap();
        assert!(log.verify_chain());

        log.entries[1].message = "tampered".to_string();
        assert!(!log.verify_chain());
    }

    #[test]
    fn tampering_prev_hash_breaks_the_chain() {
        let dir = tempdir().unwrap();
        let mut log = open(&dir);
        log.append("a", LogLevel::Info).unwrap();
        log.append("b", LogLevel::Info).unwrap();
        log.entries[1].prev_hash = "f".repeat(64);
        assert!(!log.verify_chain());
    }

    #[test]
    fn reloads_and_continues_appending_through_prior_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        {
            let mut log = HashChainLog::open(&path).unwrap();
            log.append("a", LogLevel::Info).unwrap();
            log.append("b", LogLevel::Info).unwrap();
        }

        // Corrupt the persisted file directly.
        let raw = fs::read_to_string(&path).unwrap();
        let corrupted = raw.replace("\"b\"", "\"tampered\"");
        fs::write(&path, corrupted).unwrap();

        let mut reloaded = HashChainLog::open(&path).unwrap();
        assert!(reloaded.loaded_with_corruption());
        // New entries still append on top of the corrupted tail.
        reloaded.append("c", LogLevel::Info).unwrap();
        assert_eq!(reloaded.len(), 3);
    }
}
