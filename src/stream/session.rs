//! Submission driver.
//!
//! Runs the sequential read loop for one submission: wait for the next
//! chunk, feed the decoder, dispatch the decoded events to the
//! [`ProgressController`], repeat until the stream ends, fails, or delivers
//! its final payload.

use crate::models::ProgressEvent;
use crate::stream::controller::{Applied, Generation, ProgressController, SubmissionState};
use crate::stream::decoder::StreamDecoder;
use crate::stream::printer::ProgressSink;
use futures::{pin_mut, Stream, StreamExt};
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Display delay between the final log line and the completion callback.
pub const DEFAULT_DONE_DELAY: Duration = Duration::from_millis(800);

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome<T> {
    /// Final payload delivered; carries the completion callback's result.
    Completed(T),
    /// Transport failure, reported once.
    Failed(String),
    /// The stream closed without a final payload.
    Unfinished,
    /// A newer submission took over before this one finished.
    Superseded,
}

impl<T> SubmissionOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmissionOutcome::Completed(_))
    }
}

/// Owns the controller across submissions.
#[derive(Debug)]
pub struct Session {
    controller: ProgressController,
    done_delay: Duration,
}

impl Session {
    pub fn new(done_delay: Duration) -> Self {
        Self {
            controller: ProgressController::new(),
            done_delay,
        }
    }

    pub fn controller(&self) -> &ProgressController {
        &self.controller
    }

    /// Reset the log and start a new submission.
    pub fn start(&mut self, sink: &mut impl ProgressSink) -> Generation {
        let generation = self.controller.begin();
        for entry in self.controller.log() {
            sink.entry(entry);
        }
        generation
    }

    /// The stream could not be opened: record a single failure.
    pub fn abort<T>(
        &mut self,
        generation: Generation,
        error: &dyn Display,
        sink: &mut impl ProgressSink,
    ) -> SubmissionOutcome<T> {
        self.record_failure(generation, error.to_string(), sink)
    }

    /// Consume the event stream of the submission identified by `generation`.
    ///
    /// `on_complete` is invoked at most once, with the `done` payload, after
    /// the display delay, and only if `generation` is still current.
    ///
    /// The session is borrowed mutably for the whole read, so no other
    /// submission can start while it runs. The generation checks therefore
    /// only reject callers that hand in a token from an earlier `start`.
    pub async fn consume<S, B, E, F, T>(
        &mut self,
        generation: Generation,
        stream: S,
        sink: &mut impl ProgressSink,
        on_complete: F,
    ) -> SubmissionOutcome<T>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
        F: FnOnce(Value) -> T,
    {
        pin_mut!(stream);
        let mut decoder = StreamDecoder::new();

        while let Some(chunk) = stream.next().await {
            if !self.controller.is_current(generation) {
                return SubmissionOutcome::Superseded;
            }

            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    decoder.finish();
                    return self.record_failure(generation, err.to_string(), sink);
                }
            };

            for raw in decoder.feed(bytes.as_ref()) {
                let event = ProgressEvent::from_raw(raw);
                match self.controller.apply(generation, event) {
                    Applied::Appended(entry) => sink.entry(&entry),
                    Applied::Completed { entry, payload } => {
                        sink.entry(&entry);
                        sink.finish(SubmissionState::Completed);
                        decoder.finish();
                        return self.complete(generation, payload, on_complete).await;
                    }
                    Applied::Stale => return SubmissionOutcome::Superseded,
                    Applied::Suppressed | Applied::Ignored | Applied::Failed(_) => {}
                }
            }
        }

        let stats = decoder.stats();
        let leftover = decoder.finish();
        warn!(
            "Stream closed without a final result ({} events, {} dropped, {} bytes unterminated)",
            stats.events,
            stats.mismatched + stats.bad_payloads,
            leftover
        );
        sink.finish(self.controller.state());
        SubmissionOutcome::Unfinished
    }

    async fn complete<F, T>(
        &mut self,
        generation: Generation,
        payload: Value,
        on_complete: F,
    ) -> SubmissionOutcome<T>
    where
        F: FnOnce(Value) -> T,
    {
        if !self.done_delay.is_zero() {
            tokio::time::sleep(self.done_delay).await;
        }
        if !self.controller.is_current(generation) {
            debug!("Completion superseded by a newer submission");
            return SubmissionOutcome::Superseded;
        }

        info!("Delivering final payload");
        SubmissionOutcome::Completed(on_complete(payload))
    }

    fn record_failure<T>(
        &mut self,
        generation: Generation,
        reason: String,
        sink: &mut impl ProgressSink,
    ) -> SubmissionOutcome<T> {
        match self.controller.fail(generation, &reason) {
            Applied::Failed(entry) => {
                sink.entry(&entry);
                sink.finish(SubmissionState::Failed);
                SubmissionOutcome::Failed(reason)
            }
            Applied::Stale => SubmissionOutcome::Superseded,
            _ => SubmissionOutcome::Failed(reason),
        }
    }
}
