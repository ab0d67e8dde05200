/// Organize/undo orchestration.
///
/// `OrganizeEngine` runs one organization pass over a source directory: it
/// plans the moves, executes them strictly in plan order, appends a record to
/// the in-memory ledger after each successful move, and persists the ledger
/// at the end of the run. Undo consumes the stored ledger and replays it in
/// reverse, skipping records that no longer apply.
use crate::category::RuleSet;
use crate::collision::CollisionExhausted;
use crate::config::ExclusionSpec;
use crate::fsio::{FileSystem, OsFileSystem};
use crate::ledger::{LedgerError, LedgerStore, MoveRecord, RunLedger};
use crate::planner::{self, PlannedMove};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors raised by the engine.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory does not exist or is not a directory.
    InvalidSourceDir { path: PathBuf },
    /// Listing the source directory failed.
    ScanFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A destination could not be disambiguated.
    Collision(CollisionExhausted),
    /// A single filesystem move failed.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// A move failure halted the run. Moves performed before the failure are
    /// recorded in the persisted ledger and remain undoable; nothing is
    /// rolled back.
    PartialRun {
        failed: PathBuf,
        moved: usize,
        source: Box<OrganizeError>,
    },
    /// Ledger storage failed.
    Ledger(LedgerError),
    /// No completed run is stored, so there is nothing to undo.
    NoRunToUndo,
    /// A run or undo is already in flight on this engine.
    AlreadyRunning,
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceDir { path } => {
                write!(f, "Source directory does not exist: {}", path.display())
            }
            Self::ScanFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::Collision(err) => write!(f, "{}", err),
            Self::MoveFailed { from, to, source } => write!(
                f,
                "Failed to move {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            Self::PartialRun {
                failed,
                moved,
                source,
            } => write!(
                f,
                "Run halted at {} after {} successful moves: {}",
                failed.display(),
                moved,
                source
            ),
            Self::Ledger(err) => write!(f, "{}", err),
            Self::NoRunToUndo => write!(f, "No previous organization run to undo"),
            Self::AlreadyRunning => write!(f, "An organize or undo operation is already running"),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ScanFailed { source, .. } | Self::MoveFailed { source, .. } => Some(source),
            Self::Collision(err) => Some(err),
            Self::PartialRun { source, .. } => Some(source.as_ref()),
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LedgerError> for OrganizeError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

/// Result type for engine operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Number of files moved.
    pub moved: usize,
    /// Categories that received at least one file, sorted.
    pub categories: Vec<String>,
}

/// Outcome of an undo.
#[derive(Debug, Clone)]
pub struct UndoReport {
    /// Number of files moved back to their original location.
    pub restored: usize,
    /// Records that could not be reversed, with the reason each was skipped.
    pub skipped: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// True if every record was reversed.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Organizes one directory and can revert its most recent run.
///
/// The engine is single-flight: overlapping `organize`/`undo` calls are
/// rejected with [`OrganizeError::AlreadyRunning`] rather than queued.
pub struct OrganizeEngine<F = OsFileSystem> {
    source_dir: PathBuf,
    rules: RuleSet,
    exclusions: ExclusionSpec,
    output_root: String,
    ledger: LedgerStore,
    fs: F,
    busy: AtomicBool,
}

impl OrganizeEngine<OsFileSystem> {
    /// Engine over the real filesystem.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        rules: RuleSet,
        exclusions: ExclusionSpec,
        output_root: impl Into<String>,
    ) -> Self {
        Self::with_fs(source_dir, rules, exclusions, output_root, OsFileSystem)
    }
}

impl<F: FileSystem> OrganizeEngine<F> {
    /// Engine over a caller-supplied filesystem implementation.
    pub fn with_fs(
        source_dir: impl Into<PathBuf>,
        rules: RuleSet,
        exclusions: ExclusionSpec,
        output_root: impl Into<String>,
        fs: F,
    ) -> Self {
        let source_dir = source_dir.into();
        let ledger = LedgerStore::for_dir(&source_dir);
        Self {
            source_dir,
            rules,
            exclusions,
            output_root: output_root.into(),
            ledger,
            fs,
            busy: AtomicBool::new(false),
        }
    }

    /// The directory this engine organizes.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Plans a run without moving anything.
    pub fn preview(&self) -> OrganizeResult<Vec<PlannedMove>> {
        self.check_source()?;
        planner::plan(
            &self.fs,
            &self.source_dir,
            &self.rules,
            &self.exclusions,
            &self.output_root,
        )
    }

    /// Performs one organization run. See [`Self::organize_with`].
    pub fn organize(&self) -> OrganizeResult<RunResult> {
        self.organize_with(|_| {})
    }

    /// Performs one organization run, invoking `observe` after each
    /// successful move.
    ///
    /// Moves execute strictly in plan order. Each success is appended to the
    /// in-memory ledger before the next move starts, so the ledger always
    /// describes the moves that actually happened. On a move failure the run
    /// halts, the partial ledger is persisted, and
    /// [`OrganizeError::PartialRun`] is returned; completed moves stay in
    /// place and can be reverted with [`Self::undo`].
    ///
    /// A run that moves no files leaves any previously stored ledger intact.
    /// This is a deliberate departure from replacing the stored run on every
    /// invocation: scheduled runs over an already-tidy directory would
    /// otherwise erase the record of the last run that actually moved
    /// something, leaving nothing to revert.
    pub fn organize_with(
        &self,
        mut observe: impl FnMut(&MoveRecord),
    ) -> OrganizeResult<RunResult> {
        let _guard = self.acquire()?;
        self.check_source()?;

        let plan = planner::plan(
            &self.fs,
            &self.source_dir,
            &self.rules,
            &self.exclusions,
            &self.output_root,
        )?;

        let mut run = RunLedger::new();
        let mut categories = BTreeSet::new();

        for mv in &plan {
            if let Err(err) = self.execute_move(mv) {
                if !run.records.is_empty() {
                    self.ledger.record(&run)?;
                }
                return Err(OrganizeError::PartialRun {
                    failed: mv.source.clone(),
                    moved: run.records.len(),
                    source: Box::new(err),
                });
            }
            let record = MoveRecord {
                source: mv.source.clone(),
                destination: mv.destination.clone(),
            };
            observe(&record);
            run.records.push(record);
            categories.insert(mv.category.clone());
        }

        if !run.records.is_empty() {
            self.ledger.record(&run)?;
        }

        Ok(RunResult {
            moved: run.records.len(),
            categories: categories.into_iter().collect(),
        })
    }

    /// Reverts the most recent run.
    ///
    /// The stored ledger is consumed exactly once: records are replayed in
    /// reverse, and a record whose file is no longer at its organized
    /// location, or whose original location is occupied, is skipped and
    /// reported while the rest are still reversed.
    pub fn undo(&self) -> OrganizeResult<UndoReport> {
        let _guard = self.acquire()?;

        let Some(run) = self.ledger.take_last()? else {
            return Err(OrganizeError::NoRunToUndo);
        };

        let mut report = UndoReport {
            restored: 0,
            skipped: Vec::new(),
        };

        for record in run.records.iter().rev() {
            if !self.fs.exists(&record.destination) {
                report.skipped.push((
                    record.destination.clone(),
                    "file is no longer at its organized location".to_string(),
                ));
                continue;
            }
            if self.fs.exists(&record.source) {
                report.skipped.push((
                    record.source.clone(),
                    "original location is occupied".to_string(),
                ));
                continue;
            }
            match self.fs.rename(&record.destination, &record.source) {
                Ok(()) => report.restored += 1,
                Err(err) => report
                    .skipped
                    .push((record.destination.clone(), format!("restore failed: {}", err))),
            }
        }

        Ok(report)
    }

    fn execute_move(&self, mv: &PlannedMove) -> OrganizeResult<()> {
        if let Some(parent) = mv.destination.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| OrganizeError::MoveFailed {
                    from: mv.source.clone(),
                    to: mv.destination.clone(),
                    source: e,
                })?;
        }
        self.fs
            .rename(&mv.source, &mv.destination)
            .map_err(|e| OrganizeError::MoveFailed {
                from: mv.source.clone(),
                to: mv.destination.clone(),
                source: e,
            })
    }

    fn check_source(&self) -> OrganizeResult<()> {
        if !self.fs.exists(&self.source_dir) {
            return Err(OrganizeError::InvalidSourceDir {
                path: self.source_dir.clone(),
            });
        }
        Ok(())
    }

    fn acquire(&self) -> OrganizeResult<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OrganizeError::AlreadyRunning);
        }
        Ok(BusyGuard(&self.busy))
    }
}

/// Clears the busy flag when a run or undo finishes, including on error.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> RuleSet {
        let mut categories = BTreeMap::new();
        categories.insert("Documents".to_string(), vec!["txt".to_string()]);
        categories.insert("Images".to_string(), vec!["png".to_string()]);
        RuleSet::build(&categories).unwrap()
    }

    fn engine(dir: &Path) -> OrganizeEngine {
        OrganizeEngine::new(dir, rules(), ExclusionSpec::none(), "Organized_Files")
    }

    #[test]
    fn test_organize_moves_files_into_categories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("note.txt"), "n").unwrap();
        fs::write(temp_dir.path().join("photo.png"), "p").unwrap();

        let result = engine(temp_dir.path()).organize().unwrap();

        assert_eq!(result.moved, 2);
        assert_eq!(result.categories, vec!["Documents", "Images"]);
        let out = temp_dir.path().join("Organized_Files");
        assert!(out.join("Documents").join("note.txt").exists());
        assert!(out.join("Images").join("photo.png").exists());
        assert!(!temp_dir.path().join("note.txt").exists());
    }

    #[test]
    fn test_organize_missing_source_dir_fails() {
        let result = engine(Path::new("/no/such/dir")).organize();
        assert!(matches!(
            result,
            Err(OrganizeError::InvalidSourceDir { .. })
        ));
    }

    #[test]
    fn test_second_run_does_not_reorganize_output_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("note.txt"), "n").unwrap();

        let eng = engine(temp_dir.path());
        assert_eq!(eng.organize().unwrap().moved, 1);
        assert_eq!(eng.organize().unwrap().moved, 0);

        // Still exactly one copy, untouched.
        assert!(
            temp_dir
                .path()
                .join("Organized_Files")
                .join("Documents")
                .join("note.txt")
                .exists()
        );
    }

    #[test]
    fn test_empty_run_preserves_previous_ledger() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("note.txt"), "n").unwrap();

        let eng = engine(temp_dir.path());
        eng.organize().unwrap();
        // Nothing left to move; the first run's ledger must survive.
        assert_eq!(eng.organize().unwrap().moved, 0);

        let report = eng.undo().unwrap();
        assert_eq!(report.restored, 1);
        assert!(temp_dir.path().join("note.txt").exists());
    }

    #[test]
    fn test_undo_without_a_run_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = engine(temp_dir.path()).undo();
        assert!(matches!(result, Err(OrganizeError::NoRunToUndo)));
    }

    #[test]
    fn test_undo_is_consumed_exactly_once() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("note.txt"), "n").unwrap();

        let eng = engine(temp_dir.path());
        eng.organize().unwrap();
        eng.undo().unwrap();

        assert!(matches!(eng.undo(), Err(OrganizeError::NoRunToUndo)));
    }

    #[test]
    fn test_undo_skips_missing_destination_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "b").unwrap();

        let eng = engine(temp_dir.path());
        eng.organize().unwrap();

        // User deletes one organized file before undoing.
        fs::remove_file(
            temp_dir
                .path()
                .join("Organized_Files")
                .join("Documents")
                .join("a.txt"),
        )
        .unwrap();

        let report = eng.undo().unwrap();
        assert_eq!(report.restored, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(temp_dir.path().join("b.txt").exists());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_undo_skips_occupied_original_location() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "original").unwrap();

        let eng = engine(temp_dir.path());
        eng.organize().unwrap();

        // An unrelated file reappears at the original location.
        fs::write(temp_dir.path().join("a.txt"), "unrelated").unwrap();

        let report = eng.undo().unwrap();
        assert_eq!(report.restored, 0);
        assert_eq!(report.skipped.len(), 1);
        // The unrelated file is untouched and the organized copy stays put.
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(),
            "unrelated"
        );
        assert!(
            temp_dir
                .path()
                .join("Organized_Files")
                .join("Documents")
                .join("a.txt")
                .exists()
        );
    }
}
