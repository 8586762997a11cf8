//! Markdown report generation.
//!
//! This module renders resolved analysis results as Markdown reports
//! and serializes them as JSON.

use crate::report::view::{ConsensusCard, HistoryCard, ModelCard, ResultView};
use anyhow::Result;

/// Generate a complete Markdown report for one result.
pub fn generate_markdown_report(view: &ResultView) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", heading_text(&view.title)));

    // Article summary
    output.push_str(&generate_article_section(view));

    // Consensus cards
    output.push_str(&generate_consensus_section(view));

    // Historical results
    output.push_str(&generate_history_section(&view.history));

    // Individual model results
    output.push_str(&generate_models_section(&view.models));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate one Markdown document for several results.
pub fn generate_markdown_reports(views: &[ResultView]) -> String {
    views
        .iter()
        .map(generate_markdown_report)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate a JSON report.
///
/// A single result is serialized as an object, several as an array.
pub fn generate_json_report(views: &[ResultView]) -> Result<String> {
    let json = match views {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(json)
}

fn heading_text(title: &str) -> &str {
    if title.trim().is_empty() {
        "Evaluation Results"
    } else {
        title
    }
}

/// Generate the article metadata and summary section.
fn generate_article_section(view: &ResultView) -> String {
    let mut section = String::new();

    section.push_str("## Article\n\n");
    section.push_str("| | |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| **Publication** | {} |\n", cell(&view.publication)));
    section.push_str(&format!("| **Author(s)** | {} |\n", cell(&view.authors)));
    section.push_str(&format!("| **Date** | {} |\n", cell(&view.date)));
    section.push_str(&format!("| **Style** | {} |\n", cell(&view.style)));
    section.push_str(&format!(
        "| **Topic(s)** | {} |\n\n",
        cell(&view.topics.join(", "))
    ));

    if !view.summary.is_empty() {
        section.push_str(&format!("**Summary:** {}\n\n", view.summary));
    }
    if !view.url.is_empty() {
        section.push_str(&format!("[Read full article]({})\n\n", view.url));
    }

    section
}

/// Generate the consensus section.
fn generate_consensus_section(view: &ResultView) -> String {
    let mut section = String::new();

    section.push_str("## Consensus\n\n");
    section.push_str(&format!(
        "*{} of {} fields without consensus*\n\n",
        view.no_consensus_count(),
        view.cards.len()
    ));

    for card in &view.cards {
        section.push_str(&generate_card_block(card));
    }

    section.push_str("### Consensus Model Confidence\n\n");
    section.push_str(&format!("**{}**\n\n", view.confidence));
    section.push_str("> Mean of the agreement ratios for the monitored fields.\n\n");

    if !view.notes.is_empty() {
        section.push_str(&format!("**Explanation:** {}\n\n", view.notes));
    }

    section
}

/// Generate a single consensus card.
fn generate_card_block(card: &ConsensusCard) -> String {
    let mut block = String::new();

    let badge = if card.is_no_consensus { "✖" } else { "✔" };
    block.push_str(&format!("### {} {}\n\n", badge, card.title));
    block.push_str(&format!("> {}\n\n", card.info));
    block.push_str(&format!("**{}**\n\n", card.display_text));

    if let Some(ref answers) = card.answers {
        block.push_str("<details>\n<summary>Model answers</summary>\n\n");
        block.push_str("| Model | Answer |\n");
        block.push_str("|:---|:---|\n");
        for row in answers {
            block.push_str(&format!("| {} | {} |\n", cell(&row.model), cell(&row.answer)));
        }
        block.push_str("\n</details>\n\n");
    }

    block
}

/// Generate the historical results section.
fn generate_history_section(history: &[HistoryCard]) -> String {
    let mut section = String::new();

    section.push_str("## Historical Results\n\n");

    if history.is_empty() {
        section.push_str(
            "This is the first time this article has been evaluated, so no historical results are available.\n\n",
        );
        return section;
    }

    for card in history {
        section.push_str(&format!("### {}\n\n", card.title));
        section.push_str("| ✔ Consensus | ✖ No Consensus |\n");
        section.push_str("|:---:|:---:|\n");
        section.push_str(&format!(
            "| {}% | {}% |\n\n",
            card.consensus_pct, card.no_consensus_pct
        ));

        if !card.top_answers.is_empty() {
            section.push_str("| Most frequent answers | Count |\n");
            section.push_str("|:---|:---:|\n");
            for entry in &card.top_answers {
                section.push_str(&format!("| {} | {} |\n", cell(&entry.answer), entry.count));
            }
            section.push('\n');
        }
    }

    section
}

/// Generate the per-model results section.
fn generate_models_section(models: &[ModelCard]) -> String {
    if models.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Model Results\n\n");

    for model in models {
        section.push_str(&format!("### `{}`\n\n", model.model));
        section.push_str("| Field | Answer |\n");
        section.push_str("|:---|:---|\n");
        for answer in &model.answers {
            section.push_str(&format!("| {} | {} |\n", answer.label, cell(&answer.value)));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by NewsEval v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Keep a value inside its table cell.
pub(crate) fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}
