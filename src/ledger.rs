/// Durable single-slot record of the most recent organization run.
///
/// A [`RunLedger`] lists the moves a run actually performed, in execution
/// order. [`LedgerStore`] persists at most one ledger as a JSON file inside
/// the organized directory; recording a new run replaces the previous one,
/// and [`LedgerStore::take_last`] consumes the slot for undo.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the ledger slot inside the organized directory.
pub const LEDGER_FILE_NAME: &str = ".deskbroom_ledger.json";

/// One as-executed move, captured after the filesystem rename succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before the run.
    pub source: PathBuf,
    /// Where the run put it.
    pub destination: PathBuf,
}

/// The ordered move records of one completed (or halted) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLedger {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    /// Moves in execution order.
    pub records: Vec<MoveRecord>,
}

impl RunLedger {
    /// Creates an empty ledger stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            records: Vec::new(),
        }
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from reading or writing the ledger slot.
#[derive(Debug)]
pub enum LedgerError {
    /// Failed to write or clear the slot.
    WriteFailed { source: std::io::Error },
    /// Failed to read the slot.
    ReadFailed { source: std::io::Error },
    /// The slot holds data that does not parse as a ledger.
    Corrupt { reason: String },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteFailed { source } => write!(f, "Failed to write ledger: {}", source),
            Self::ReadFailed { source } => write!(f, "Failed to read ledger: {}", source),
            Self::Corrupt { reason } => write!(f, "Ledger file is corrupt: {}", reason),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFailed { source } | Self::ReadFailed { source } => Some(source),
            Self::Corrupt { .. } => None,
        }
    }
}

/// File-backed single-slot ledger storage.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    slot: PathBuf,
}

impl LedgerStore {
    /// Storage for the ledger of `dir`, kept as a hidden file inside it.
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            slot: dir.join(LEDGER_FILE_NAME),
        }
    }

    /// Path of the slot file.
    pub fn slot_path(&self) -> &Path {
        &self.slot
    }

    /// Persists `ledger`, replacing any previously stored run.
    ///
    /// The write is atomic from the reader's perspective: the JSON is written
    /// to a temporary file first and renamed over the slot.
    pub fn record(&self, ledger: &RunLedger) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(ledger).map_err(|e| LedgerError::WriteFailed {
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        let tmp = self.slot.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| LedgerError::WriteFailed { source: e })?;
        fs::rename(&tmp, &self.slot).map_err(|e| LedgerError::WriteFailed { source: e })
    }

    /// Reads the stored ledger without consuming it. `None` if the slot is
    /// empty.
    pub fn read(&self) -> Result<Option<RunLedger>, LedgerError> {
        if !self.slot.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.slot)
            .map_err(|e| LedgerError::ReadFailed { source: e })?;
        let ledger = serde_json::from_str(&json).map_err(|e| LedgerError::Corrupt {
            reason: e.to_string(),
        })?;
        Ok(Some(ledger))
    }

    /// Returns the stored ledger and clears the slot. `None` if no run has
    /// completed since the last undo.
    pub fn take_last(&self) -> Result<Option<RunLedger>, LedgerError> {
        let ledger = self.read()?;
        if ledger.is_some() {
            self.clear()?;
        }
        Ok(ledger)
    }

    /// Empties the slot. A missing slot file is not an error.
    pub fn clear(&self) -> Result<(), LedgerError> {
        if self.slot.exists() {
            fs::remove_file(&self.slot).map_err(|e| LedgerError::WriteFailed { source: e })?;
        }
        Ok(())
    }
}
