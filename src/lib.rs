//! deskbroom - organize a directory into category subfolders.
//!
//! Files are classified by extension rules, moved into
//! `<dir>/<output_root>/<Category>/`, and every move is recorded in a
//! single-slot ledger so the most recent run can be reverted. A thin
//! scheduler repeats the operation on a fixed period.

pub mod category;
pub mod cli;
pub mod collision;
pub mod config;
pub mod engine;
pub mod fsio;
pub mod ledger;
pub mod output;
pub mod planner;
pub mod scheduler;

pub use category::{OTHER_CATEGORY, RuleSet};
pub use config::{CompiledConfig, ConfigError, ExclusionRules, ExclusionSpec, OrganizerConfig};
pub use engine::{OrganizeEngine, OrganizeError, OrganizeResult, RunResult, UndoReport};
pub use fsio::{FileSystem, OsFileSystem};
pub use ledger::{LedgerStore, MoveRecord, RunLedger};
pub use planner::PlannedMove;
pub use scheduler::Scheduler;
