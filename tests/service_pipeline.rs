//! End-to-end review pipeline with the hash embedder and a scripted model.

mod common;

use common::{service, ScriptedClient};
use rag_review_core::models::{AnalysisResult, MetricsReport, Severity};
use rag_review_core::prompt::{BugInjectionParams, Task};
use rag_review_core::ReviewError;

const LOGIN_SNIPPET: &str = "def login(db, user, password):\n    query = f\"SELECT * FROM users WHERE name = '{user}' AND pw = '{password}'\"\n    return db.execute(query).fetchone()";

fn sql_injection(severity_level: u8, num_bugs: u8) -> BugInjectionParams {
    BugInjectionParams {
        bug_type: "SQL Injection".to_string(),
        severity_level,
        num_bugs,
    }
}

#[tokio::test]
async fn test_analyze_returns_parsed_issues() {
    let client = ScriptedClient::new(
        "```json\n{\"issues\": [{\"title\": \"SQL injection\", \"type\": \"Security\", \
         \"severity\": \"critical\", \"lineNumber\": 2, \"description\": \"f-string query\", \
         \"suggestedFix\": \"use placeholders\"}]}\n```",
    );
    let svc = service(client.clone(), Some("env-key"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    let list = svc.analyze("database login", None).await.unwrap();
    assert_eq!(list.issues.len(), 1);
    assert_eq!(list.issues[0].severity, Severity::Critical);
    assert_eq!(list.issues[0].line_number, Some(2));

    let prompt = client.last_prompt().unwrap();
    assert!(prompt.user.contains("SELECT * FROM users"));
    assert_eq!(client.last_key().as_deref(), Some("env-key"));
}

#[tokio::test]
async fn test_single_snippet_retrieved_for_unrelated_query() {
    let client = ScriptedClient::new("{\"issues\": []}");
    let svc = service(client.clone(), Some("k"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    svc.analyze("completely unrelated words about weather", None)
        .await
        .unwrap();
    assert_eq!(client.last_prompt().unwrap().context, LOGIN_SNIPPET);
}

#[tokio::test]
async fn test_missing_credential_never_calls_model() {
    let client = ScriptedClient::new("{\"issues\": []}");
    let svc = service(client.clone(), None);
    svc.ingest(&[LOGIN_SNIPPET.to_string()], Some("ingest-key"))
        .await
        .unwrap();

    for placeholder in [None, Some(""), Some("string"), Some("None")] {
        let err = svc.analyze("login", placeholder).await.unwrap_err();
        assert!(matches!(err, ReviewError::Configuration(_)));
    }
    let err = svc
        .inject_bugs("login", sql_injection(5, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Configuration(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_ingest_without_credential_rejected() {
    let client = ScriptedClient::new("{}");
    let svc = service(client.clone(), None);

    for placeholder in [None, Some(""), Some("string"), Some("null")] {
        let err = svc
            .ingest(&[LOGIN_SNIPPET.to_string()], placeholder)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Configuration(_)), "{err}");
    }
    assert_eq!(svc.indexed_chunks().await.unwrap(), 0);

    svc.ingest(&[LOGIN_SNIPPET.to_string()], Some("call-key"))
        .await
        .unwrap();
    assert_eq!(svc.indexed_chunks().await.unwrap(), 1);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_review_result_matches_task() {
    let client = ScriptedClient::new("not json at all");
    let svc = service(client.clone(), Some("k"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    let result = svc.review("login", Task::Analysis, None).await.unwrap();
    assert!(matches!(result, AnalysisResult::Issues(ref list) if list.issues.is_empty()));

    let result = svc.review("login", Task::Metrics, None).await.unwrap();
    assert_eq!(result, AnalysisResult::Metrics(MetricsReport::default()));

    let result = svc
        .review("login", Task::InjectBugs(sql_injection(2, 1)), None)
        .await
        .unwrap();
    let AnalysisResult::BugInjection(injected) = result else {
        panic!("expected a bug injection result, got {result:?}");
    };
    assert_eq!(injected.buggy_code, LOGIN_SNIPPET);
    assert_eq!(client.calls(), 3);

    let err = svc
        .review("login", Task::InjectBugs(sql_injection(9, 1)), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::InvalidInput(_)));
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn test_override_credential_used() {
    let client = ScriptedClient::new("{}");
    let svc = service(client.clone(), Some("env-key"));
    svc.metrics("anything", Some("  call-key  ")).await.unwrap();
    assert_eq!(client.last_key().as_deref(), Some("call-key"));
}

#[tokio::test]
async fn test_out_of_range_bug_params_rejected() {
    let client = ScriptedClient::new("{}");
    let svc = service(client.clone(), Some("k"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    for params in [
        sql_injection(0, 2),
        sql_injection(6, 2),
        sql_injection(3, 0),
        sql_injection(3, 11),
    ] {
        let err = svc.inject_bugs("login", params, None).await.unwrap_err();
        assert!(matches!(err, ReviewError::InvalidInput(_)), "{err}");
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_inject_bugs_success() {
    let client = ScriptedClient::new(
        r#"{"buggy_code": "def login(db, user, password):\n    return db.execute('SELECT * FROM users WHERE name = ' + user)", "bugs_injected": [
            {"type": "SQL Injection", "line_number": 2, "description": "string concatenation"},
            {"type": "SQL Injection", "line_number": 2, "description": "no password check"}
        ]}"#,
    );
    let svc = service(client.clone(), Some("k"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    let result = svc
        .inject_bugs("login", sql_injection(5, 2), None)
        .await
        .unwrap();
    assert!(!result.buggy_code.is_empty());
    assert_eq!(result.bugs_injected.len(), 2);
    assert_eq!(result.bugs_injected[0].kind, "SQL Injection");

    let prompt = client.last_prompt().unwrap();
    assert!(prompt.user.contains("Inject 2 bugs of type 'SQL Injection'"));
    assert!(prompt.user.contains("severity level 5"));
}

#[tokio::test]
async fn test_inject_bugs_garbage_returns_original_code() {
    let client = ScriptedClient::new("Sure! Here is your code with bugs: ...");
    let svc = service(client, Some("k"));
    svc.ingest(&[LOGIN_SNIPPET.to_string()], None).await.unwrap();

    let result = svc
        .inject_bugs("login", sql_injection(5, 2), None)
        .await
        .unwrap();
    assert_eq!(result.buggy_code, LOGIN_SNIPPET);
    assert!(result.bugs_injected.is_empty());
}

#[tokio::test]
async fn test_metrics_on_empty_index_defaults() {
    let client = ScriptedClient::new("not json at all");
    let svc = service(client.clone(), Some("k"));

    let report = svc.metrics("anything", None).await.unwrap();
    assert_eq!(report, MetricsReport::default());
    assert_eq!(client.last_prompt().unwrap().context, "");
}

#[tokio::test]
async fn test_empty_inputs_rejected() {
    let client = ScriptedClient::new("{}");
    let svc = service(client.clone(), Some("k"));

    assert!(matches!(
        svc.ingest(&[], None).await.unwrap_err(),
        ReviewError::InvalidInput(_)
    ));
    assert!(matches!(
        svc.analyze("   ", None).await.unwrap_err(),
        ReviewError::InvalidInput(_)
    ));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_ingest_counts_and_reset() {
    let client = ScriptedClient::new("{}");
    let svc = service(client, Some("k"));

    let long = "x = 1\n".repeat(400);
    let report = svc
        .ingest(&[LOGIN_SNIPPET.to_string(), long, "   ".to_string()], None)
        .await
        .unwrap();
    assert_eq!(report.documents, 3);
    assert!(report.chunks >= 4);
    assert_eq!(svc.indexed_chunks().await.unwrap(), report.chunks);

    svc.reset().await.unwrap();
    assert_eq!(svc.indexed_chunks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_top_k_limits_context() {
    let client = ScriptedClient::new("{\"issues\": []}");
    let svc = service(client.clone(), Some("k"));
    let snippets: Vec<String> = (0..8).map(|i| format!("def handler_{i}(): return {i}")).collect();
    svc.ingest(&snippets, None).await.unwrap();

    svc.analyze("handler", None).await.unwrap();
    let context = client.last_prompt().unwrap().context;
    assert_eq!(context.split("\n\n").count(), 5);
}
