//! Progress state machine for one submission at a time.
//!
//! The controller owns the progress log and the submission state
//! (`Idle → Running → Completed | Failed`). Each call to
//! [`ProgressController::begin`] hands out a fresh [`Generation`]; every
//! mutation must present the generation it was issued for, so a read that
//! outlives its submission can never touch the log of the next one.

use crate::models::{EntryClass, ProgressEvent, ProgressLogEntry};
use serde_json::Value;
use tracing::{debug, info, warn};

/// First log line of every submission.
pub const OPENING_MESSAGE: &str = "Summarizing article and selecting evaluator models...";
/// Appended when the final payload arrives.
pub const COMPLETED_MESSAGE: &str = "🎯 Evaluation completed";
/// Appended on a transport failure.
pub const FAILED_MESSAGE: &str = "❌ Failed to evaluate the article.";

/// Submission identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Lifecycle of the active submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Completed | SubmissionState::Failed)
    }
}

/// What applying an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A line was added to the log.
    Appended(ProgressLogEntry),
    /// Repeated status line, log unchanged.
    Suppressed,
    /// Final payload received; the submission is now `Completed`.
    Completed {
        entry: ProgressLogEntry,
        payload: Value,
    },
    /// Transport failure recorded; the submission is now `Failed`.
    Failed(ProgressLogEntry),
    /// Malformed event, or the submission already ended.
    Ignored,
    /// The generation is not the current one.
    Stale,
}

/// Owner of the progress log and submission state.
#[derive(Debug)]
pub struct ProgressController {
    state: SubmissionState,
    log: Vec<ProgressLogEntry>,
    generation: u64,
}

impl Default for ProgressController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            log: Vec::new(),
            generation: 0,
        }
    }

    /// Start a new submission, abandoning whatever was in flight.
    pub fn begin(&mut self) -> Generation {
        if self.state == SubmissionState::Running {
            warn!("Abandoning in-flight submission {}", self.generation);
        }

        self.generation += 1;
        self.log.clear();
        self.log.push(ProgressLogEntry::new(
            OPENING_MESSAGE,
            classify_message(OPENING_MESSAGE),
        ));
        self.state = SubmissionState::Running;

        debug!("Submission {} started", self.generation);
        Generation(self.generation)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.generation
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn log(&self) -> &[ProgressLogEntry] {
        &self.log
    }

    /// Apply one stream event.
    pub fn apply(&mut self, generation: Generation, event: ProgressEvent) -> Applied {
        if !self.is_current(generation) {
            debug!("Dropping {} event from stale submission", event.kind());
            return Applied::Stale;
        }
        if self.state != SubmissionState::Running {
            debug!("Ignoring {} event in state {:?}", event.kind(), self.state);
            return Applied::Ignored;
        }

        match event {
            ProgressEvent::Status { message } => {
                if self.log.last().map(|e| e.text.as_str()) == Some(message.as_str()) {
                    return Applied::Suppressed;
                }
                let class = classify_message(&message);
                Applied::Appended(self.push(message, class))
            }
            ProgressEvent::EvaluationDone { model } => Applied::Appended(self.push(
                format!("✅ Model completed: {}", model),
                EntryClass::Complete,
            )),
            ProgressEvent::Error { message } => {
                Applied::Appended(self.push(format!("⚠️ {}", message), EntryClass::Error))
            }
            ProgressEvent::Done { payload } => {
                let entry = self.push(COMPLETED_MESSAGE.to_string(), EntryClass::Complete);
                self.state = SubmissionState::Completed;
                info!("Submission {} completed", self.generation);
                Applied::Completed { entry, payload }
            }
            ProgressEvent::Malformed => Applied::Ignored,
        }
    }

    /// Record a transport failure and end the submission.
    pub fn fail(&mut self, generation: Generation, reason: &str) -> Applied {
        if !self.is_current(generation) {
            return Applied::Stale;
        }
        if self.state != SubmissionState::Running {
            return Applied::Ignored;
        }

        warn!("Submission {} failed: {}", self.generation, reason);
        let entry = self.push(FAILED_MESSAGE.to_string(), EntryClass::Error);
        self.state = SubmissionState::Failed;
        Applied::Failed(entry)
    }

    fn push(&mut self, text: String, class: EntryClass) -> ProgressLogEntry {
        let entry = ProgressLogEntry { text, class };
        self.log.push(entry.clone());
        entry
    }
}

/// Best-effort classification of a human-readable status line.
///
/// Errors win over completions, completions over waiting.
pub fn classify_message(text: &str) -> EntryClass {
    let lower = text.to_lowercase();

    if lower.contains("failed")
        || lower.contains("error")
        || text.contains('⚠')
        || text.contains('❌')
    {
        EntryClass::Error
    } else if lower.contains("completed") || lower.contains("consensus reached") {
        EntryClass::Complete
    } else if lower.contains("waiting") {
        EntryClass::Pending
    } else {
        EntryClass::Info
    }
}
