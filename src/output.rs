//! Console output formatting.
//!
//! Centralizes the CLI's colored status lines, summary table, and progress
//! spinner so formatting stays consistent across commands.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Consistent styling for all CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Success line, green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Error line to stderr, red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Warning line, yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Informational line, cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Plain unstyled line.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Bold section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Spinner for the move loop; callers `inc` per move and set the current
    /// file name as the message.
    pub fn spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} moved {msg}")
                .expect("Invalid spinner template"),
        );
        pb
    }

    /// Per-category file counts with a total row.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &categories {
            let file_word = if **count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
        );
    }

    /// Dry-run notice, yellow with a `[DRY RUN]` prefix.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
