//! Consensus value interpretation.
//!
//! Analysis values arrive weakly typed: a consensus field may be a plain
//! string, a list of strings, a number, a consensus/no-consensus ratio,
//! some other object, or missing altogether. Everything here is total;
//! any JSON value maps to exactly one [`AnalysisValue`].

use serde::Serialize;
use serde_json::{Number, Value};

/// Display text used whenever models could not agree.
pub const NO_CONSENSUS: &str = "No Consensus";

/// Normalized shape of a single analysis value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisValue {
    Text(String),
    /// Elements in display order.
    List(Vec<String>),
    Number(String),
    ConsensusRatio {
        consensus_pct: String,
        no_consensus_pct: String,
    },
    /// Object of unrecognized shape, kept as its JSON text.
    Other(String),
    Absent,
}

/// Display form of an analysis value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub display_text: String,
    pub is_no_consensus: bool,
}

impl AnalysisValue {
    /// Classify a raw JSON value.
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::String(s) => AnalysisValue::Text(s.clone()),
            Value::Array(items) => AnalysisValue::List(items.iter().map(list_element).collect()),
            Value::Number(n) => AnalysisValue::Number(format_number(n)),
            Value::Object(map) => match (map.get("consensus"), map.get("no_consensus")) {
                (Some(Value::Number(c)), Some(Value::Number(n))) => AnalysisValue::ConsensusRatio {
                    consensus_pct: format_number(c),
                    no_consensus_pct: format_number(n),
                },
                _ => AnalysisValue::Other(value.to_string()),
            },
            Value::Null | Value::Bool(_) => AnalysisValue::Absent,
        }
    }

    pub fn interpretation(&self) -> Interpretation {
        let (display_text, is_no_consensus) = match self {
            AnalysisValue::Text(s) => (s.clone(), is_no_consensus_text(s)),
            AnalysisValue::List(items) if items.is_empty() => (NO_CONSENSUS.to_string(), true),
            AnalysisValue::List(items) => (items.join(", "), false),
            AnalysisValue::Number(n) => (n.clone(), false),
            AnalysisValue::ConsensusRatio {
                consensus_pct,
                no_consensus_pct,
            } => (
                format!(
                    "{}% Consensus / {}% No Consensus",
                    consensus_pct, no_consensus_pct
                ),
                false,
            ),
            AnalysisValue::Other(dump) => (dump.clone(), false),
            AnalysisValue::Absent => (NO_CONSENSUS.to_string(), true),
        };

        Interpretation {
            display_text,
            is_no_consensus,
        }
    }
}

/// Interpret an arbitrary analysis value for display.
pub fn interpret(value: &Value) -> Interpretation {
    AnalysisValue::classify(value).interpretation()
}

/// True for the backend's "no consensus" sentinel string.
pub fn is_no_consensus_text(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(NO_CONSENSUS)
}

/// Decimal form of a JSON number; integral floats drop the fraction.
pub fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => format_float(f),
        None => n.to_string(),
    }
}

/// Decimal form of a float without a trailing `.0` for whole numbers.
pub fn format_float(f: f64) -> String {
    // f64's Display already prints 80.0 as "80"
    f.to_string()
}

fn list_element(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(value: Value) -> (String, bool) {
        let i = interpret(&value);
        (i.display_text, i.is_no_consensus)
    }

    #[test]
    fn test_strings() {
        assert_eq!(pair(json!("Center")), ("Center".to_string(), false));
        assert!(pair(json!("No Consensus")).1);
        assert!(pair(json!("no consensus")).1);
        assert!(pair(json!("  NO CONSENSUS ")).1);
        // Displayed verbatim even when flagged
        assert_eq!(pair(json!(" no consensus")).0, " no consensus");
    }

    #[test]
    fn test_lists() {
        assert_eq!(pair(json!([])), ("No Consensus".to_string(), true));
        assert_eq!(pair(json!(["a", "b"])), ("a, b".to_string(), false));
        assert_eq!(pair(json!(["x", 2, null])), ("x, 2, ".to_string(), false));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(pair(json!(0.75)), ("0.75".to_string(), false));
        assert_eq!(pair(json!(3)), ("3".to_string(), false));
        assert_eq!(pair(json!(80.0)), ("80".to_string(), false));
    }

    #[test]
    fn test_consensus_ratio() {
        assert_eq!(
            pair(json!({"consensus": 80, "no_consensus": 20})),
            ("80% Consensus / 20% No Consensus".to_string(), false)
        );
        assert_eq!(
            pair(json!({"consensus": 66.7, "no_consensus": 33.3})).0,
            "66.7% Consensus / 33.3% No Consensus"
        );
    }

    #[test]
    fn test_other_objects_are_dumped() {
        let (text, flag) = pair(json!({"consensus": "80", "no_consensus": 20}));
        assert!(!flag);
        assert!(text.contains("\"consensus\":\"80\""));

        let (text, flag) = pair(json!({"label": "mixed"}));
        assert_eq!(text, r#"{"label":"mixed"}"#);
        assert!(!flag);
    }

    #[test]
    fn test_absent_values() {
        assert_eq!(pair(Value::Null), ("No Consensus".to_string(), true));
        assert_eq!(pair(json!(true)), ("No Consensus".to_string(), true));
    }

    #[test]
    fn test_interpret_is_deterministic() {
        let values = vec![
            json!("Left"),
            json!(["a", "b"]),
            json!(1.5),
            json!({"consensus": 1, "no_consensus": 2}),
            json!({"b": 1, "a": 2}),
            Value::Null,
        ];
        for value in values {
            assert_eq!(interpret(&value), interpret(&value.clone()));
        }
    }
}
