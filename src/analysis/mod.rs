//! Analysis value modules.
//!
//! Normalization of the backend's weakly typed consensus values, lookup of
//! per-field disagreements, and ranking of historical answers.

pub mod disagreement;
pub mod interpreter;
pub mod ranking;

pub use disagreement::{build_answer_table, find_disagreement, AnswerRow};
pub use interpreter::interpret;
pub use ranking::top_n;
