//! Report rendering.
//!
//! Results are first resolved into display models ([`view`]), which the
//! Markdown generator renders and the JSON writer serializes as-is.

pub mod generator;
pub mod history;
pub mod view;

pub use generator::{generate_json_report, generate_markdown_reports};
pub use history::{build_history_view, generate_history_json, generate_history_markdown};
pub use view::ResultView;
