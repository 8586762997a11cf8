//! Terminal rendering of the progress log.

use crate::models::ProgressLogEntry;
use crate::stream::controller::SubmissionState;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Receives progress log lines as they are appended.
pub trait ProgressSink {
    /// A new line was appended to the log.
    fn entry(&mut self, entry: &ProgressLogEntry);

    /// The submission reached a terminal state (or stopped reading).
    fn finish(&mut self, _state: SubmissionState) {}
}

/// Collects entries in memory.
impl ProgressSink for Vec<ProgressLogEntry> {
    fn entry(&mut self, entry: &ProgressLogEntry) {
        self.push(entry.clone());
    }
}

/// Prints each log line above a spinner while a submission runs.
pub struct ProgressPrinter {
    spinner: ProgressBar,
}

impl ProgressPrinter {
    /// Create a printer; a hidden one prints nothing (quiet mode).
    pub fn new(visible: bool) -> Self {
        let spinner = if visible {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb.set_message("Evaluation in progress...");
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { spinner }
    }
}

impl ProgressSink for ProgressPrinter {
    fn entry(&mut self, entry: &ProgressLogEntry) {
        self.spinner
            .println(format!("   {} {}", entry.class.glyph(), entry.text));
    }

    fn finish(&mut self, state: SubmissionState) {
        let message = match state {
            SubmissionState::Completed => "Evaluation finished",
            SubmissionState::Failed => "Evaluation failed",
            _ => "Stream closed",
        };
        self.spinner.finish_with_message(message);
    }
}

impl Drop for ProgressPrinter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryClass;

    #[test]
    fn test_vec_sink_records_entries() {
        let mut sink: Vec<ProgressLogEntry> = Vec::new();
        sink.entry(&ProgressLogEntry::new("one", EntryClass::Info));
        sink.entry(&ProgressLogEntry::new("two", EntryClass::Pending));
        sink.finish(SubmissionState::Completed);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].class, EntryClass::Pending);
    }

    #[test]
    fn test_hidden_printer_accepts_entries() {
        let mut printer = ProgressPrinter::new(false);
        printer.entry(&ProgressLogEntry::new("quiet", EntryClass::Info));
        printer.finish(SubmissionState::Failed);
    }
}
