//! Lookup of per-field disagreement records.

use crate::analysis::interpreter::interpret;
use crate::models::DisagreementRecord;
use serde::Serialize;
use serde_json::Value;

/// One row of a "which model said what" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRow {
    pub model: String,
    pub answer: String,
}

/// Find the disagreement record for `field`.
///
/// Keys are compared for exact equality only.
pub fn find_disagreement<'a>(
    records: &'a [DisagreementRecord],
    field: &str,
) -> Option<&'a DisagreementRecord> {
    records.iter().find(|record| record.field == field)
}

/// Build the per-model answer table for a record, in record order.
pub fn build_answer_table(record: &DisagreementRecord) -> Vec<AnswerRow> {
    record
        .evaluations
        .iter()
        .map(|evaluation| AnswerRow {
            model: evaluation.model.clone(),
            answer: normalize_answer(&evaluation.value),
        })
        .collect()
}

/// Normalize a single model answer for display.
///
/// Models sometimes return a list serialized into a string. Strings that
/// start with `[` are parsed opportunistically; anything that doesn't parse
/// to a list is shown verbatim.
pub fn normalize_answer(value: &Value) -> String {
    match value {
        Value::Array(_) => interpret(value).display_text,
        Value::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Value>(s.trim()) {
                Ok(parsed @ Value::Array(_)) => interpret(&parsed).display_text,
                _ => s.clone(),
            }
        }
        Value::String(s) => s.clone(),
        other => interpret(other).display_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelAnswer;
    use serde_json::json;

    fn record(field: &str, answers: Vec<(&str, Value)>) -> DisagreementRecord {
        DisagreementRecord {
            field: field.to_string(),
            evaluations: answers
                .into_iter()
                .map(|(model, value)| ModelAnswer {
                    model: model.to_string(),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_find_exact_match_only() {
        let records = vec![
            record("article.perspective", vec![]),
            record("article.tone_language", vec![]),
        ];

        assert_eq!(
            find_disagreement(&records, "article.tone_language").map(|r| r.field.as_str()),
            Some("article.tone_language")
        );
        assert!(find_disagreement(&records, "article.tone").is_none());
        assert!(find_disagreement(&records, "perspective").is_none());
        assert!(find_disagreement(&records, "publication.location").is_none());
        assert!(find_disagreement(&[], "article.perspective").is_none());
    }

    #[test]
    fn test_answer_table_normalization() {
        let rec = record(
            "publication.source_of_funding",
            vec![
                ("gpt", json!(["Ads", "Subscriptions"])),
                ("claude", json!("[\"Donations\", \"Grants\"]")),
                ("gemini", json!("Advertising")),
                ("llama", json!("[not json")),
                ("mistral", json!("  [\"Trimmed\"]  ")),
            ],
        );

        let table = build_answer_table(&rec);
        let answers: Vec<&str> = table.iter().map(|r| r.answer.as_str()).collect();

        assert_eq!(
            answers,
            vec![
                "Ads, Subscriptions",
                "Donations, Grants",
                "Advertising",
                "[not json",
                "Trimmed"
            ]
        );
        assert_eq!(table[1].model, "claude");
    }

    #[test]
    fn test_bracketed_non_list_kept_verbatim() {
        assert_eq!(normalize_answer(&json!("[1]x")), "[1]x");
        assert_eq!(normalize_answer(&json!(42)), "42");
    }
}
