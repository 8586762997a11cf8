//! Analyze stream consumption.
//!
//! This module turns the backend's event stream into a live progress log:
//! the decoder frames and parses events, the controller tracks submission
//! state, and the session drives the read loop.

pub mod controller;
pub mod decoder;
pub mod printer;
pub mod session;

pub use printer::ProgressPrinter;
pub use session::{Session, SubmissionOutcome};
