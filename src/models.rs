//! Data models for the evaluation client.
//!
//! This module contains the core data structures shared by the stream
//! consumer, the value interpreter and the report generator: progress
//! events and log entries, disagreement records, answer frequencies and
//! the (leniently typed) analysis result payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Classification of a progress log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryClass {
    /// Waiting on the backend (e.g. queued evaluator models)
    Pending,
    /// A step finished successfully
    Complete,
    /// Something went wrong
    Error,
    /// Plain informational status
    Info,
}

impl fmt::Display for EntryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryClass::Pending => write!(f, "pending"),
            EntryClass::Complete => write!(f, "complete"),
            EntryClass::Error => write!(f, "error"),
            EntryClass::Info => write!(f, "info"),
        }
    }
}

impl EntryClass {
    /// Returns the marker printed in front of a log line.
    pub fn glyph(&self) -> &'static str {
        match self {
            EntryClass::Pending => "⏳",
            EntryClass::Complete => "✔",
            EntryClass::Error => "✖",
            EntryClass::Info => "•",
        }
    }
}

/// A single line of the progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLogEntry {
    /// Human-readable text, exactly as shown.
    pub text: String,
    /// How the line is rendered.
    pub class: EntryClass,
}

impl ProgressLogEntry {
    pub fn new(text: impl Into<String>, class: EntryClass) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }
}

/// A named event decoded from the analyze stream, payload still untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// The `event:` name.
    pub name: String,
    /// The parsed `data:` payload.
    pub data: Value,
}

/// Typed progress event, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Backend status line.
    Status { message: String },
    /// One evaluator model has finished.
    EvaluationDone { model: String },
    /// Non-fatal backend error; the stream may continue.
    Error { message: String },
    /// Final consensus payload.
    Done { payload: Value },
    /// Unknown event name or payload without the expected fields.
    Malformed,
}

/// Fallback text for `error` events that carry no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error occurred";

impl ProgressEvent {
    /// Map a raw event onto its typed variant.
    pub fn from_raw(raw: RawEvent) -> Self {
        match raw.name.as_str() {
            "status" => match raw.data.get("message").and_then(Value::as_str) {
                Some(message) => ProgressEvent::Status {
                    message: message.to_string(),
                },
                None => ProgressEvent::Malformed,
            },
            "evaluation" => match raw.data.get("model").and_then(Value::as_str) {
                Some(model) => ProgressEvent::EvaluationDone {
                    model: model.to_string(),
                },
                None => ProgressEvent::Malformed,
            },
            "error" => {
                let message = raw
                    .data
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_ERROR_MESSAGE);
                ProgressEvent::Error {
                    message: message.to_string(),
                }
            }
            "done" => ProgressEvent::Done { payload: raw.data },
            _ => ProgressEvent::Malformed,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Status { .. } => "status",
            ProgressEvent::EvaluationDone { .. } => "evaluation",
            ProgressEvent::Error { .. } => "error",
            ProgressEvent::Done { .. } => "done",
            ProgressEvent::Malformed => "malformed",
        }
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Answer counts sometimes arrive as floats (`2.0`); anything that isn't a
/// non-negative number counts as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        _ => 0,
    };
    Ok(count)
}

/// One model's answer inside a disagreement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAnswer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    /// Raw answer; may be a string, a list, a serialized list, a number...
    #[serde(default)]
    pub value: Value,
}

/// Per-field listing of each model's answer when the models disagreed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisagreementRecord {
    /// Dotted field path, e.g. `article.perspective`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evaluations: Vec<ModelAnswer>,
}

/// How often an answer was given across previous evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

#[cfg(test)]
impl FrequencyEntry {
    pub fn new(answer: impl Into<String>, count: u64) -> Self {
        Self {
            answer: answer.into(),
            count,
        }
    }
}

/// Summary block produced by the summarizer model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    /// Article style (news, opinion, ...).
    #[serde(default, deserialize_with = "null_as_default", rename = "type")]
    pub style: String,
}

/// Aggregated multi-model judgment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub article: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publication: Map<String, Value>,
    #[serde(default)]
    pub confidence: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disagreements: Vec<DisagreementRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

impl ConsensusSummary {
    /// Look up a consensus value by dotted field path (`article.fairness`).
    ///
    /// Missing sections or keys yield `Value::Null`.
    pub fn value_at(&self, field: &str) -> &Value {
        let section = match field.split_once('.') {
            Some(("article", key)) => self.article.get(key),
            Some(("publication", key)) => self.publication.get(key),
            _ => None,
        };
        section.unwrap_or(&Value::Null)
    }
}

/// A single evaluator model's raw answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelEvaluation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub article: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publication: Map<String, Value>,
}

/// Historical consensus statistics for one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub consensus: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_consensus: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<FrequencyEntry>,
}

/// Historical results for the same article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    /// Per-field stats, kept raw and in backend order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Map<String, Value>,
}

impl History {
    /// Typed stats in backend order. Entries of unexpected shape are skipped.
    pub fn entries(&self) -> Vec<(&str, HistoryStat)> {
        self.stats
            .iter()
            .filter_map(|(key, raw)| {
                serde_json::from_value(raw.clone())
                    .ok()
                    .map(|stat| (key.as_str(), stat))
            })
            .collect()
    }
}

/// The `done` payload of the analyze stream (also the element type of the
/// results endpoint's article groups).
///
/// Every field is optional: the payload is produced by an external backend
/// and consumed leniently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Publication home page URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub publication: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: ArticleSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evaluations: Vec<ModelEvaluation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub consensus: ConsensusSummary,
    #[serde(default)]
    pub history: Option<History>,
}

/// Results grouped per article, as served by the results endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub article: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<AnalysisResult>,
}
