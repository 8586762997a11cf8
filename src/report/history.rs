//! Historical results report.
//!
//! One table per article group, one row per previous evaluation of that
//! article, each row naming the publication and the key consensus values.

use crate::analysis::interpreter::format_float;
use crate::models::{AnalysisResult, ArticleGroup};
use crate::report::generator::cell;
use crate::report::view::{or_not_available, NOT_AVAILABLE};
use anyhow::Result;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

/// One previous evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub publication: String,
    pub url: String,
    pub perspective: String,
    pub tone_language: String,
    pub clickbait: String,
    pub fairness: String,
    pub disagreements: usize,
    pub confidence: String,
}

/// Previous evaluations of one article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleGroupView {
    pub article: String,
    pub rows: Vec<HistoryRow>,
}

impl HistoryRow {
    fn build(result: &AnalysisResult) -> Self {
        let article = &result.consensus.article;
        let field = |key: &str| {
            article
                .get(key)
                .map_or_else(|| NOT_AVAILABLE.to_string(), or_not_available)
        };

        Self {
            publication: publication_host(&result.publication),
            url: result.url.clone(),
            perspective: field("perspective"),
            tone_language: field("tone_language"),
            clickbait: field("headline_article"),
            fairness: field("fairness"),
            disagreements: result.consensus.disagreements.len(),
            confidence: confidence_percent(&result.consensus.confidence),
        }
    }
}

/// Build the display model of all groups.
pub fn build_history_view(groups: &[ArticleGroup]) -> Vec<ArticleGroupView> {
    groups
        .iter()
        .map(|group| ArticleGroupView {
            article: group.article.clone(),
            rows: group.results.iter().map(HistoryRow::build).collect(),
        })
        .collect()
}

/// Host part of a publication URL; the raw value when it isn't a URL.
pub fn publication_host(publication: &str) -> String {
    match Url::parse(publication) {
        Ok(url) => url
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| publication.to_string()),
        Err(_) if publication.is_empty() => NOT_AVAILABLE.to_string(),
        Err(_) => publication.to_string(),
    }
}

/// A `0..=1` confidence as a whole percentage.
pub fn confidence_percent(confidence: &Value) -> String {
    match confidence.as_f64() {
        Some(c) => format!("{}%", format_float((c * 100.0).round())),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Generate the Markdown historical report.
pub fn generate_history_markdown(groups: &[ArticleGroupView]) -> String {
    let mut output = String::new();

    output.push_str("# Historical Results\n\n");

    if groups.is_empty() {
        output.push_str("No articles have been evaluated yet.\n\n");
    }

    for group in groups {
        output.push_str(&format!("## {}\n\n", group.article));
        output.push_str(
            "| Publication | Perspective | Tone | Clickbait | Fairness | Disagreements | Confidence |\n",
        );
        output.push_str("|:---|:---|:---|:---|:---|:---:|:---:|\n");

        for row in &group.rows {
            let publication = if row.url.is_empty() {
                cell(&row.publication)
            } else {
                format!("[{}]({})", cell(&row.publication), row.url)
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                publication,
                cell(&row.perspective),
                cell(&row.tone_language),
                cell(&row.clickbait),
                cell(&row.fairness),
                row.disagreements,
                row.confidence
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!("*Total article groups: {}*\n", groups.len()));

    output
}

/// Generate the JSON historical report.
pub fn generate_history_json(groups: &[ArticleGroupView]) -> Result<String> {
    serde_json::to_string_pretty(groups).map_err(Into::into)
}
