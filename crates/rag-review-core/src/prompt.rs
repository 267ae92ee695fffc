//! Prompt templates for the three review tasks.
//!
//! Retrieved chunks are joined in ranked order with a blank line between
//! them to form the code context, which is then placed into the task's fixed
//! template. Selecting the template is a plain match on [`Task`].

use serde::Serialize;

use crate::models::ScoredChunk;

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Parameters for bug injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugInjectionParams {
    pub bug_type: String,
    /// 1 = Low … 5 = Extreme.
    pub severity_level: u8,
    pub num_bugs: u8,
}

impl BugInjectionParams {
    pub const SEVERITY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
    pub const NUM_BUGS_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

    pub fn severity_label(&self) -> &'static str {
        match self.severity_level {
            1 => "Low",
            2 => "Medium",
            3 => "High",
            4 => "Critical",
            _ => "Extreme",
        }
    }
}

/// Which template to render, with its task-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Analysis,
    Metrics,
    InjectBugs(BugInjectionParams),
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Analysis => "analysis",
            Task::Metrics => "metrics",
            Task::InjectBugs(_) => "inject_bugs",
        }
    }
}

/// A filled-in prompt: system instruction plus user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
    /// The code context embedded in `user`.
    pub context: String,
}

impl RenderedPrompt {
    /// Single-string form for backends without a separate system role.
    pub fn as_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Join chunk texts in ranked order, separated by a blank line.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn render(task: &Task, chunks: &[ScoredChunk]) -> RenderedPrompt {
    let context = build_context(chunks);
    let (system, user) = match task {
        Task::Analysis => (
            "You are a helpful assistant that analyzes code for potential issues and returns the analysis in a structured JSON format.".to_string(),
            format!(
                "Analyze the following code snippet for potential issues.\n\
                 Provide the analysis in a structured JSON format, including 'title', 'type', \
                 'severity' (e.g., 'Low', 'Medium', 'High', 'Critical'), 'lineNumber', \
                 'description', and 'suggestedFix' for each issue found.\n\n\
                 Code:\n```\n{context}\n```\n\n\
                 Example JSON format for issues:\n\
                 {{\"issues\": [{{\"title\": \"Issue Title\", \"type\": \"Bug\", \"severity\": \"High\", \
                 \"lineNumber\": 10, \"description\": \"Detailed description of the issue.\", \
                 \"suggestedFix\": \"Recommended fix for the issue.\"}}]}}"
            ),
        ),
        Task::Metrics => (
            "You are a helpful assistant that analyzes code and provides summary metrics and issue distribution in a structured JSON format.".to_string(),
            format!(
                "Analyze the following code snippet and provide the analysis in a structured JSON format. \
                 I need two main sections: 'summary_metrics' and 'issue_distribution'.\n\n\
                 For 'summary_metrics', include:\n\
                 - 'code_quality_score' (an integer from 0-100 where higher is better)\n\
                 - 'security_rating' (an integer from 0-100 where higher is better)\n\
                 - 'bug_density' (count of bugs/runtime errors)\n\
                 - 'critical_issue_count' (count of critical severity issues)\n\n\
                 For 'issue_distribution', include:\n\
                 - 'security_vulnerabilities' (count of security/vulnerability issues)\n\
                 - 'code_smells' (count of code smell issues)\n\
                 - 'best_practices' (count of best practice violations, if any)\n\
                 - 'performance_issues' (count of performance-related issues, if any)\n\n\
                 Ensure the output is a single JSON object. Example:\n\
                 {{\"summary_metrics\": {{\"code_quality_score\": 85, \"security_rating\": 90, \
                 \"bug_density\": 1, \"critical_issue_count\": 0}}, \
                 \"issue_distribution\": {{\"security_vulnerabilities\": 0, \"code_smells\": 2, \
                 \"best_practices\": 1, \"performance_issues\": 0}}}}\n\n\
                 Code:\n```\n{context}\n```"
            ),
        ),
        Task::InjectBugs(params) => (
            "You are a helpful assistant that injects bugs into code based on given parameters and returns the modified code and bug details in JSON format.".to_string(),
            format!(
                "Inject {num_bugs} bugs of type '{bug_type}' with severity level {level} ({label}) \
                 into the following code snippet.\n\
                 Provide the output in a structured JSON format with two keys: 'buggy_code' \
                 (containing the full modified code) and 'bugs_injected' (an array of objects, \
                 where each object describes an injected bug with 'type', 'line_number', and \
                 'description').\n\n\
                 Code:\n```\n{context}\n```\n\n\
                 Example JSON format:\n\
                 {{\"buggy_code\": \"def example_function():\\n    return 0\", \
                 \"bugs_injected\": [{{\"type\": \"{bug_type}\", \"line_number\": 2, \
                 \"description\": \"Description of the injected bug.\"}}]}}",
                num_bugs = params.num_bugs,
                bug_type = params.bug_type,
                level = params.severity_level,
                label = params.severity_label(),
            ),
        ),
    };

    RenderedPrompt {
        system,
        user,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, Metadata};

    fn scored(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                source_metadata: Metadata::new(),
            },
            score,
        }
    }

    #[test]
    fn test_context_joined_in_rank_order() {
        let chunks = vec![scored("first()", 0.9), scored("second()", 0.4)];
        assert_eq!(build_context(&chunks), "first()\n\nsecond()");
    }

    #[test]
    fn test_empty_context() {
        let p = render(&Task::Analysis, &[]);
        assert_eq!(p.context, "");
        assert!(p.user.contains("```\n\n```"));
    }

    #[test]
    fn test_analysis_template() {
        let p = render(&Task::Analysis, &[scored("x = 1 / 0", 1.0)]);
        assert!(p.system.contains("analyzes code"));
        assert!(p.user.contains("x = 1 / 0"));
        assert!(p.user.contains("\"suggestedFix\""));
    }

    #[test]
    fn test_metrics_template() {
        let p = render(&Task::Metrics, &[scored("pass", 1.0)]);
        assert!(p.user.contains("summary_metrics"));
        assert!(p.user.contains("issue_distribution"));
        assert!(p.user.contains("pass"));
    }

    #[test]
    fn test_inject_bugs_template_fills_params() {
        let task = Task::InjectBugs(BugInjectionParams {
            bug_type: "SQL Injection".to_string(),
            severity_level: 5,
            num_bugs: 2,
        });
        let p = render(&task, &[scored("def q(): pass", 1.0)]);
        assert!(p.user.starts_with("Inject 2 bugs of type 'SQL Injection' with severity level 5 (Extreme)"));
        assert!(p.user.contains("\"type\": \"SQL Injection\""));
        assert_eq!(p.context, "def q(): pass");
    }

    #[test]
    fn test_as_text_contains_both_parts() {
        let p = render(&Task::Metrics, &[]);
        let text = p.as_text();
        assert!(text.starts_with(&p.system));
        assert!(text.ends_with(&p.user));
    }
}
