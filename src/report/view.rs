//! Display model of an analysis result.
//!
//! Every weakly typed value of the payload is resolved here, through the
//! value interpreter, the disagreement index and the frequency ranker, so
//! the Markdown and JSON renderers only deal with plain strings.

use crate::analysis::disagreement::normalize_answer;
use crate::analysis::interpreter::format_float;
use crate::analysis::{build_answer_table, find_disagreement, interpret, top_n, AnswerRow};
use crate::models::{AnalysisResult, FrequencyEntry, HistoryStat, ModelEvaluation};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

/// Placeholder for values the payload doesn't carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// A monitored consensus field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub title: &'static str,
    /// Dotted path, also the disagreement record key.
    pub field: &'static str,
    pub info: &'static str,
}

/// The seven fields the consensus model reports on.
pub const CONSENSUS_FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        title: "Perspective",
        field: "article.perspective",
        info: "The stance or slant of the article.",
    },
    FieldSpec {
        title: "Tone & Language",
        field: "article.tone_language",
        info: "Adjectives used to describe the tone and language of the article.",
    },
    FieldSpec {
        title: "Fairness",
        field: "article.fairness",
        info: "How well the article articulates multiple viewpoints.",
    },
    FieldSpec {
        title: "Headline vs. Article",
        field: "article.headline_article",
        info: "The gap between what the headline reads and what the article actually says. Designed to gauge the presence of clickbait.",
    },
    FieldSpec {
        title: "Publication Location",
        field: "publication.location",
        info: "The location of the publication's headquarters or where it's registered.",
    },
    FieldSpec {
        title: "Publication Ownership",
        field: "publication.ownership",
        info: "The person(s) or entity(ies) that own the publication.",
    },
    FieldSpec {
        title: "Publication Funding",
        field: "publication.source_of_funding",
        info: "Where the publication derives its funding.",
    },
];

/// Display name of a historical stats key (`tone_language` → `Tone & Language`).
pub fn history_field_title(key: &str) -> &str {
    match key {
        "perspective" => "Perspective",
        "tone_language" => "Tone & Language",
        "fairness" => "Fairness",
        "headline_article" => "Headline vs. Article",
        "source_of_funding" => "Publication Funding",
        "location" => "Publication Location",
        "ownership" => "Publication Ownership",
        other => other,
    }
}

/// One consensus field, resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusCard {
    pub title: String,
    pub field: String,
    pub info: String,
    pub display_text: String,
    pub is_no_consensus: bool,
    /// Per-model answers, only when the field has no consensus and the
    /// backend listed a disagreement for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AnswerRow>>,
}

/// Historical statistics for one field.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryCard {
    pub key: String,
    pub title: String,
    pub consensus_pct: String,
    pub no_consensus_pct: String,
    pub top_answers: Vec<FrequencyEntry>,
}

/// One labelled answer of an evaluator model.
#[derive(Debug, Clone, Serialize)]
pub struct LabelledValue {
    pub label: String,
    pub value: String,
}

/// An evaluator model's raw answers.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCard {
    pub model: String,
    pub answers: Vec<LabelledValue>,
}

/// Fully resolved analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub title: String,
    pub url: String,
    pub publication: String,
    pub authors: String,
    pub date: String,
    pub style: String,
    pub topics: Vec<String>,
    pub summary: String,
    pub cards: Vec<ConsensusCard>,
    pub confidence: String,
    pub notes: String,
    pub history: Vec<HistoryCard>,
    pub models: Vec<ModelCard>,
}

impl ResultView {
    /// Resolve a result payload for display.
    pub fn build(result: &AnalysisResult, top_answers: usize) -> Self {
        let consensus = &result.consensus;

        let cards = CONSENSUS_FIELDS
            .iter()
            .map(|def| {
                let interpretation = interpret(consensus.value_at(def.field));
                let answers = if interpretation.is_no_consensus {
                    find_disagreement(&consensus.disagreements, def.field).map(build_answer_table)
                } else {
                    None
                };

                ConsensusCard {
                    title: def.title.to_string(),
                    field: def.field.to_string(),
                    info: def.info.to_string(),
                    display_text: interpretation.display_text,
                    is_no_consensus: interpretation.is_no_consensus,
                    answers,
                }
            })
            .collect();

        let history = result
            .history
            .as_ref()
            .map(|h| {
                h.entries()
                    .into_iter()
                    .map(|(key, stat)| history_card(key, &stat, top_answers))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            publication: result.publication.clone(),
            authors: result.authors.join(", "),
            date: format_published_at(result.published_at.as_deref()),
            style: result.summary.style.clone(),
            topics: result.summary.topics.clone(),
            summary: result.summary.summary.clone(),
            cards,
            confidence: or_not_available(&consensus.confidence),
            notes: consensus.notes.clone(),
            history,
            models: result.evaluations.iter().map(model_card).collect(),
        }
    }

    /// Fields on which the models did not agree.
    pub fn no_consensus_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_no_consensus).count()
    }
}

fn history_card(key: &str, stat: &HistoryStat, top_answers: usize) -> HistoryCard {
    HistoryCard {
        key: key.to_string(),
        title: history_field_title(key).to_string(),
        consensus_pct: format_float(stat.consensus),
        no_consensus_pct: format_float(stat.no_consensus),
        top_answers: top_n(&stat.answers, top_answers),
    }
}

fn model_card(evaluation: &ModelEvaluation) -> ModelCard {
    let mut answers: Vec<LabelledValue> = CONSENSUS_FIELDS
        .iter()
        .map(|def| {
            let value = match def.field.split_once('.') {
                Some(("article", key)) => evaluation.article.get(key),
                Some(("publication", key)) => evaluation.publication.get(key),
                _ => None,
            };
            LabelledValue {
                label: def.title.to_string(),
                value: model_answer(value),
            }
        })
        .collect();

    answers.push(LabelledValue {
        label: "Notes".to_string(),
        value: model_answer(evaluation.article.get("notes")),
    });

    ModelCard {
        model: evaluation.model.clone(),
        answers,
    }
}

/// A single model's answer: no consensus semantics, missing shows as `-`.
fn model_answer(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(v) => normalize_answer(v),
    }
}

/// Display text, or `N/A` for null and empty strings.
pub fn or_not_available(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) if s.is_empty() => NOT_AVAILABLE.to_string(),
        other => interpret(other).display_text,
    }
}

/// Calendar date of the publication timestamp, `N/A` if it doesn't parse.
pub fn format_published_at(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format("%Y-%m-%d").to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }

    NOT_AVAILABLE.to_string()
}
