//! Core data models shared by the ingestion and review pipelines.
//!
//! The result types ([`IssueList`], [`MetricsReport`], [`BugInjectionResult`])
//! deserialize leniently: every field has a default, numbers may arrive as
//! strings or floats, and malformed list elements are dropped. This is what
//! lets the normalizer turn partially valid model output into a complete,
//! well-formed value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered string metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, String>;

/// A unit of source text submitted for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded window of a document's text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub source_metadata: Metadata,
}

/// A chunk together with its embedding, as held by the vector store.
#[derive(Debug, Clone)]
pub struct IndexedVector {
    /// Opaque identifier assigned on insert.
    pub id: String,
    pub embedding: Vec<f32>,
    pub chunk: Chunk,
}

/// A retrieved chunk and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunks ranked by similarity, best first.
pub type RetrievalResult = Vec<ScoredChunk>;

// ============ Analysis results ============

/// Issue severity as reported by the model.
///
/// `Unspecified` covers absent or unrecognised values and serializes as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Severity {
    /// Case-insensitive parse; anything unknown maps to `Unspecified`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" | "moderate" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unspecified,
        }
    }
}

/// A single finding from code analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::severity")]
    pub severity: Severity,
    #[serde(
        rename = "lineNumber",
        alias = "line_number",
        default,
        deserialize_with = "lenient::line_number"
    )]
    pub line_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(
        rename = "suggestedFix",
        alias = "suggested_fix",
        default,
        deserialize_with = "lenient::string"
    )]
    pub suggested_fix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueList {
    #[serde(default, deserialize_with = "lenient::objects")]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// 0–100, higher is better.
    #[serde(default, deserialize_with = "lenient::score")]
    pub code_quality_score: u32,
    /// 0–100, higher is better.
    #[serde(default, deserialize_with = "lenient::score")]
    pub security_rating: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub bug_density: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub critical_issue_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueDistribution {
    #[serde(default, deserialize_with = "lenient::count")]
    pub security_vulnerabilities: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub code_smells: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub best_practices: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub performance_issues: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(default, deserialize_with = "lenient::object_or_default")]
    pub summary_metrics: SummaryMetrics,
    #[serde(default, deserialize_with = "lenient::object_or_default")]
    pub issue_distribution: IssueDistribution,
}

/// One bug the model claims to have injected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectedBug {
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(alias = "lineNumber", default, deserialize_with = "lenient::count")]
    pub line_number: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BugInjectionResult {
    #[serde(default, deserialize_with = "lenient::string")]
    pub buggy_code: String,
    #[serde(default, deserialize_with = "lenient::objects")]
    pub bugs_injected: Vec<InjectedBug>,
}

/// The three output shapes the review pipeline can produce.
///
/// Serializes untagged, so the JSON is exactly the inner shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Issues(IssueList),
    Metrics(MetricsReport),
    BugInjection(BugInjectionResult),
}

impl From<IssueList> for AnalysisResult {
    fn from(v: IssueList) -> Self {
        AnalysisResult::Issues(v)
    }
}

impl From<MetricsReport> for AnalysisResult {
    fn from(v: MetricsReport) -> Self {
        AnalysisResult::Metrics(v)
    }
}

impl From<BugInjectionResult> for AnalysisResult {
    fn from(v: BugInjectionResult) -> Self {
        AnalysisResult::BugInjection(v)
    }
}

/// Field-level coercions used by the result types above.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Severity;

    fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    fn to_u32(f: f64) -> u32 {
        if f <= 0.0 {
            0
        } else if f >= u32::MAX as f64 {
            u32::MAX
        } else {
            f.round() as u32
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(number(&v).map(to_u32).unwrap_or(0))
    }

    pub fn score<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        count(d).map(|n| n.min(100))
    }

    pub fn line_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(number(&v).filter(|f| *f >= 0.0).map(to_u32))
    }

    pub fn severity<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Severity::parse(&s),
            _ => Severity::Unspecified,
        })
    }

    /// Keep only array elements that are JSON objects.
    pub fn objects<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn object_or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(d)? {
            v @ Value::Object(_) => serde_json::from_value(v).unwrap_or_default(),
            _ => T::default(),
        })
    }
}
