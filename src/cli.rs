//! Command-line interface for deskbroom.
//!
//! Wires the parsed command line to the engine: one-shot organization,
//! dry-run previews, undo, and the scheduled mode that re-runs organization
//! on a fixed period.

use crate::config::OrganizerConfig;
use crate::engine::{OrganizeEngine, OrganizeError, RunResult};
use crate::output::OutputFormatter;
use crate::scheduler::Scheduler;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;

/// Organize a directory into category subfolders, with undo and scheduled
/// runs.
#[derive(Parser, Debug)]
#[command(name = "deskbroom", version)]
pub struct Cli {
    /// Directory to organize
    pub directory: PathBuf,

    /// Revert the most recent organization run
    #[arg(long, conflicts_with_all = ["dry_run", "every"])]
    pub undo: bool,

    /// Show what would be moved without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Repeat the organization every N minutes until interrupted
    #[arg(long, value_name = "MINUTES", conflicts_with = "dry_run", value_parser = clap::value_parser!(u64).range(1..))]
    pub every: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Executes the parsed command line. Returns a user-facing error message on
/// failure.
pub fn run(cli: Cli) -> Result<(), String> {
    let config =
        OrganizerConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let compiled = config.compile().map_err(|e| e.to_string())?;
    let engine = OrganizeEngine::new(
        &cli.directory,
        compiled.rules,
        compiled.exclusions,
        compiled.output_root,
    );

    if cli.undo {
        undo(&engine)
    } else if cli.dry_run {
        dry_run(&engine)
    } else if let Some(minutes) = cli.every {
        schedule(&engine, minutes);
        Ok(())
    } else {
        organize(&engine)
    }
}

fn organize(engine: &OrganizeEngine) -> Result<(), String> {
    OutputFormatter::info(&format!("Organizing {}", engine.source_dir().display()));

    let spinner = OutputFormatter::spinner();
    let outcome = engine.organize_with(|record| {
        spinner.inc(1);
        if let Some(name) = record.destination.file_name() {
            spinner.set_message(name.to_string_lossy().into_owned());
        }
    });
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            report_run(&result);
            Ok(())
        }
        Err(err @ OrganizeError::PartialRun { .. }) => {
            OutputFormatter::warning(
                "The run stopped early; files moved before the failure remain undoable with --undo.",
            );
            Err(err.to_string())
        }
        Err(err) => Err(err.to_string()),
    }
}

fn report_run(result: &RunResult) {
    if result.moved == 0 {
        OutputFormatter::plain("Nothing to organize.");
        return;
    }
    OutputFormatter::success(&format!(
        "Moved {} {} into: {}",
        result.moved,
        if result.moved == 1 { "file" } else { "files" },
        result.categories.join(", ")
    ));
    OutputFormatter::plain("Use --undo to revert this run.");
}

fn dry_run(engine: &OrganizeEngine) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing {}",
        engine.source_dir().display()
    ));

    let plan = engine.preview().map_err(|e| e.to_string())?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let mut category_counts: HashMap<String, usize> = HashMap::new();
    for mv in &plan {
        let name = mv.source.file_name().unwrap_or_default().to_string_lossy();
        let dest = mv
            .destination
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        if name == dest {
            OutputFormatter::plain(&format!(" - {} → {}/", name, mv.category));
        } else {
            // Renamed to dodge a collision.
            OutputFormatter::plain(&format!(" - {} → {}/{}", name, mv.category, dest));
        }
        *category_counts.entry(mv.category.clone()).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&category_counts, plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn undo(engine: &OrganizeEngine) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    let report = engine.undo().map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!(
        "Restored {} {}",
        report.restored,
        if report.restored == 1 { "file" } else { "files" }
    ));
    if !report.skipped.is_empty() {
        OutputFormatter::warning(&format!("Skipped {}:", report.skipped.len()));
        for (path, reason) in &report.skipped {
            OutputFormatter::plain(&format!("  - {}: {}", path.display(), reason));
        }
    }
    Ok(())
}

fn schedule(engine: &OrganizeEngine, minutes: u64) {
    OutputFormatter::info(&format!(
        "Organizing {} every {} {} (Ctrl-C to stop)",
        engine.source_dir().display(),
        minutes,
        if minutes == 1 { "minute" } else { "minutes" }
    ));

    Scheduler::every_minutes(minutes).run_forever(engine, |outcome| match outcome {
        Ok(result) => report_run(result),
        Err(err) => OutputFormatter::error(&err.to_string()),
    });
}
