//! Response normalization: free-form model text in, well-formed result out.
//!
//! # Algorithm
//!
//! 1. If the reply is wrapped in a fenced code block, strip exactly one
//!    leading fence line (```` ``` ```` or ```` ```json ````) and one trailing
//!    fence line.
//! 2. Parse the remainder as JSON.
//! 3. If it does not parse, or is not the shape's top-level JSON type, log
//!    the raw reply and return the shape's default:
//!    - issues: `{"issues": []}`
//!    - metrics: every counter `0`
//!    - bug injection: the original code with no bugs listed
//! 4. Otherwise decode field by field. Absent or mistyped fields take their
//!    defaults (see [`models`](crate::models)) instead of failing the whole
//!    result.
//!
//! Nothing in this module returns an error to its caller.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{AnalysisResult, BugInjectionResult, IssueList, MetricsReport};

/// The output shape a reply is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    Issues,
    Metrics,
    /// `original_code` is returned as `buggy_code` when the reply is unusable.
    BugInjection { original_code: &'a str },
}

/// Why a reply could not be decoded. Logged, never surfaced.
#[derive(Debug, Error)]
enum MalformedResponse {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

pub fn normalize(raw: &str, shape: Shape<'_>) -> AnalysisResult {
    match shape {
        Shape::Issues => normalize_issues(raw).into(),
        Shape::Metrics => normalize_metrics(raw).into(),
        Shape::BugInjection { original_code } => {
            normalize_bug_injection(raw, original_code).into()
        }
    }
}

/// A bare JSON array is accepted as the issue list itself.
pub fn normalize_issues(raw: &str) -> IssueList {
    let decoded = parse(raw).and_then(|value| match value {
        Value::Array(items) => object(json!({ "issues": items })),
        other => object(other),
    });
    absorb(decoded, raw, "issues", IssueList::default)
}

pub fn normalize_metrics(raw: &str) -> MetricsReport {
    let decoded = parse(raw).and_then(object::<MetricsReport>);
    absorb(decoded, raw, "metrics", MetricsReport::default)
}

/// A missing or blank `buggy_code` falls back to `original_code`.
pub fn normalize_bug_injection(raw: &str, original_code: &str) -> BugInjectionResult {
    let decoded = parse(raw)
        .and_then(object::<BugInjectionResult>)
        .map(|mut result| {
            if result.buggy_code.trim().is_empty() {
                result.buggy_code = original_code.to_string();
            }
            result
        });
    absorb(decoded, raw, "bug_injection", || BugInjectionResult {
        buggy_code: original_code.to_string(),
        bugs_injected: Vec::new(),
    })
}

/// Strip one leading and one trailing Markdown fence line, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return trimmed;
    }
    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let body = &trimmed[first_newline + 1..];
    match body.rfind('\n') {
        Some(pos) if body[pos + 1..].trim() == "```" => &body[..pos],
        _ => body.strip_suffix("```").unwrap_or(body),
    }
}

fn parse(raw: &str) -> Result<Value, MalformedResponse> {
    Ok(serde_json::from_str(strip_code_fence(raw))?)
}

fn object<T: DeserializeOwned>(value: Value) -> Result<T, MalformedResponse> {
    match value {
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(MalformedResponse::NotAnObject(json_type(&other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn absorb<T>(
    decoded: Result<T, MalformedResponse>,
    raw: &str,
    shape: &'static str,
    default: impl FnOnce() -> T,
) -> T {
    match decoded {
        Ok(value) => value,
        Err(err) => {
            warn!(shape, error = %err, raw, "malformed model output, using default");
            default()
        }
    }
}
