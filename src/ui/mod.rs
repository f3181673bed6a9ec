//! Terminal output for conversion runs.
//!
//! Progress goes to stdout: an `indicatif` bar on a terminal, one plain line per DOI
//! otherwise. Logs go to stderr through `tracing`.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::{Doi, ResolutionOutcome, RunResult};
use crate::pipeline::RunObserver;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Format a status message with a colored icon.
pub fn status_line(status: Status, msg: &str) -> String {
    let icon = status_icon(status);
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    println!("{}", status_line(status, msg));
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// End-of-run summary lines for a run against `source_name`.
pub fn summary_lines(result: &RunResult, source_name: &str) -> Vec<(Status, String)> {
    let mut lines = Vec::with_capacity(2);
    match &result.missing_path {
        None => lines.push((
            Status::Success,
            format!("All DOIs were found in {}.", source_name),
        )),
        Some(path) => lines.push((
            Status::Warning,
            format!(
                "Some DOIs were not found in {} ({} of {}). Saved list to: {}",
                source_name,
                result.missing_count(),
                result.total(),
                path.display()
            ),
        )),
    }
    lines.push((
        Status::Success,
        format!(
            "RIS file created successfully: {} ({} records)",
            result.records_path.display(),
            result.found_count()
        ),
    ));
    lines
}

/// Print the end-of-run summary.
pub fn print_summary(result: &RunResult, source_name: &str) {
    for (status, msg) in summary_lines(result, source_name) {
        print_status(status, &msg);
    }
}

/// Per-DOI progress display for a conversion run.
#[derive(Debug)]
pub struct ConversionProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
    interactive: bool,
}

impl ConversionProgress {
    /// Create a progress display; `quiet` suppresses all output.
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: None,
            quiet,
            interactive: is_terminal(),
        }
    }

    /// Plain line output only, even on a terminal
    pub fn plain(quiet: bool) -> Self {
        Self {
            bar: None,
            quiet,
            interactive: false,
        }
    }

    fn line(&self, msg: &str) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(pb) => pb.println(msg),
            None => println!("{}", msg),
        }
    }
}

impl RunObserver for ConversionProgress {
    fn on_start(&mut self, total: usize) {
        if self.quiet {
            return;
        }

        println!("Number of DOIs read: {}", total);

        if self.interactive && total > 0 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░ "),
            );
            self.bar = Some(pb);
        }
    }

    fn on_item(&mut self, index: usize, total: usize, doi: &Doi) {
        match &self.bar {
            Some(pb) => pb.set_message(truncate_with_ellipsis(doi.as_str(), 50)),
            None => self.line(&format!("Processing {} of {}: {}", index, total, doi)),
        }
    }

    fn on_outcome(&mut self, _index: usize, _total: usize, outcome: &ResolutionOutcome) {
        match outcome {
            ResolutionOutcome::Found(_) => {}
            ResolutionOutcome::NotFound(doi) => self.line(&status_line(
                Status::Warning,
                &format!("No metadata found for DOI: {}", doi),
            )),
            ResolutionOutcome::Error(doi, err) => self.line(&status_line(
                Status::Error,
                &format!("Error fetching DOI {}: {}", doi, err),
            )),
        }

        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn on_finish(&mut self, _result: &RunResult) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}
