use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod analyzer;

/// First `{` through the last `}` of the reply, across newlines.
static JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

const RECORD_FIELDS: [&str; 3] = ["Risk", "Description", "Recommendation"];

/// One finding reported by the model. Field names match the reply contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRecord {
    #[serde(rename = "Risk", default)]
    pub risk: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Recommendation", default)]
    pub recommendation: String,
}

impl RiskRecord {
    pub fn new(
        risk: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            risk: risk.into(),
            description: description.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// The reply shapes the model may choose, resolved once after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// `{"risks": [...]}`
    Wrapped(Vec<RiskRecord>),
    /// `[...]`
    List(Vec<RiskRecord>),
    /// A single record object.
    Single(RiskRecord),
    /// Anything else; carries a short description of what was seen.
    Unrecognized(String),
}

impl AnalysisResult {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.get_mut("risks") {
                    return Self::Wrapped(records_from(std::mem::take(items)));
                }
                if !RECORD_FIELDS.iter().any(|field| map.contains_key(*field)) {
                    return Self::Unrecognized(
                        "object without `risks` array or risk fields".into(),
                    );
                }
                match serde_json::from_value(Value::Object(map)) {
                    Ok(record) => Self::Single(record),
                    Err(err) => Self::Unrecognized(format!("risk object with invalid fields: {err}")),
                }
            }
            Value::Array(items) => Self::List(records_from(items)),
            other => Self::Unrecognized(format!("{} value", value_kind(&other))),
        }
    }

    /// Ordered records regardless of shape; empty for unrecognized replies.
    pub fn into_risks(self) -> Vec<RiskRecord> {
        match self {
            Self::Wrapped(risks) | Self::List(risks) => risks,
            Self::Single(risk) => vec![risk],
            Self::Unrecognized(_) => Vec::new(),
        }
    }
}

/// Non-fatal problems with a reply. Each one degrades to "no risks".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplyWarning {
    #[error("model reply did not contain a JSON object")]
    NoJsonObject,
    #[error("model reply contained malformed JSON: {0}")]
    MalformedJson(String),
    #[error("model reply had an unrecognized shape: {0}")]
    UnrecognizedShape(String),
}

/// Records recovered from a reply together with any warning raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub risks: Vec<RiskRecord>,
    pub warning: Option<ReplyWarning>,
}

impl Normalized {
    fn degraded(warning: ReplyWarning) -> Self {
        tracing::warn!("{warning}; treating as no risks");
        Self {
            risks: Vec::new(),
            warning: Some(warning),
        }
    }
}

/// Greedy `{...}` span of `reply`, if any.
pub fn extract_json_span(reply: &str) -> Option<&str> {
    JSON_SPAN.find(reply).map(|m| m.as_str())
}

/// Turn free-form model output into an ordered list of risk records.
pub fn normalize_reply(reply: &str) -> Normalized {
    let Some(span) = extract_json_span(reply) else {
        return Normalized::degraded(ReplyWarning::NoJsonObject);
    };
    match serde_json::from_str::<Value>(span) {
        Ok(value) => normalize_value(value),
        Err(err) => Normalized::degraded(ReplyWarning::MalformedJson(err.to_string())),
    }
}

/// Normalize an already parsed reply value.
pub fn normalize_value(value: Value) -> Normalized {
    match AnalysisResult::classify(value) {
        AnalysisResult::Unrecognized(kind) => {
            Normalized::degraded(ReplyWarning::UnrecognizedShape(kind))
        }
        result => Normalized {
            risks: result.into_risks(),
            warning: None,
        },
    }
}

fn records_from(items: Vec<Value>) -> Vec<RiskRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let is_record = item
                .as_object()
                .is_some_and(|map| RECORD_FIELDS.iter().any(|field| map.contains_key(*field)));
            if !is_record {
                tracing::warn!(index = idx, "skipping {} entry in risk list", value_kind(&item));
                return None;
            }
            match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(index = idx, error = %err, "skipping malformed risk entry");
                    None
                }
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(map) if map.is_empty() => "empty object",
        Value::Object(_) => "object",
    }
}
