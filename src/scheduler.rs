/// Periodic re-organization.
///
/// The scheduler is a thin loop over the engine: one `organize()` call per
/// tick, a report callback per outcome, and a sleep in between. It never
/// retries a failed run; the next tick is the retry.
use crate::engine::{OrganizeEngine, OrganizeResult, RunResult};
use crate::fsio::FileSystem;
use std::thread;
use std::time::Duration;

/// Invokes an engine's `organize()` on a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Scheduler ticking every `minutes` minutes.
    pub fn every_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes * 60))
    }

    /// The configured tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until `stop` returns true, reporting each run's outcome.
    ///
    /// `stop` is consulted after each run, before sleeping, so a stopped
    /// scheduler never sleeps pointlessly.
    pub fn run_until<F: FileSystem>(
        &self,
        engine: &OrganizeEngine<F>,
        mut report: impl FnMut(&OrganizeResult<RunResult>),
        mut stop: impl FnMut() -> bool,
    ) {
        loop {
            let outcome = engine.organize();
            report(&outcome);
            if stop() {
                break;
            }
            thread::sleep(self.interval);
        }
    }

    /// Runs forever. Only process termination ends the loop.
    pub fn run_forever<F: FileSystem>(
        &self,
        engine: &OrganizeEngine<F>,
        report: impl FnMut(&OrganizeResult<RunResult>),
    ) {
        self.run_until(engine, report, || false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::RuleSet;
    use crate::config::ExclusionSpec;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scheduler_runs_engine_once_per_tick() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("note.txt"), "n").unwrap();

        let mut categories = BTreeMap::new();
        categories.insert("Documents".to_string(), vec!["txt".to_string()]);
        let engine = OrganizeEngine::new(
            temp_dir.path(),
            RuleSet::build(&categories).unwrap(),
            ExclusionSpec::none(),
            "Organized_Files",
        );

        let scheduler = Scheduler::new(Duration::from_millis(1));
        let mut outcomes = Vec::new();
        let mut ticks = 0;
        scheduler.run_until(
            &engine,
            |outcome| outcomes.push(outcome.as_ref().map(|r| r.moved).unwrap_or(usize::MAX)),
            || {
                ticks += 1;
                ticks >= 3
            },
        );

        // First tick moves the file, later ticks find nothing new.
        assert_eq!(outcomes, vec![1, 0, 0]);
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
    fn test_every_minutes_interval() {
        let scheduler = Scheduler::every_minutes(5);
        assert_eq!(scheduler.interval(), Duration::from_secs(300));
    }
}
