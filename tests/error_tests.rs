//! Tests for the error system.

use arche::error::*;

#[test]
fn error_api_creation() {
    let err = ArcheError::api(404, "Not found");
    assert!(matches!(&err, ArcheError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn categories_and_retryability_for_major_variants() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        (ArcheError::Authentication("bad-key".into()), ErrorCategory::Authentication, false),
        (ArcheError::RateLimited { retry_after_ms: Some(1000) }, ErrorCategory::RateLimit, true),
        (ArcheError::Timeout(30_000), ErrorCategory::Timeout, true),
        (ArcheError::api(503, "unavailable"), ErrorCategory::Server, true),
        (ArcheError::api(429, "slow down"), ErrorCategory::RateLimit, true),
        (ArcheError::api(403, "forbidden"), ErrorCategory::Authentication, false),
        (ArcheError::api(400, "bad request"), ErrorCategory::Api, false),
        (ArcheError::Configuration("missing model".into()), ErrorCategory::Configuration, false),
        (ArcheError::Serialization(serde_error), ErrorCategory::Serialization, false),
        (ArcheError::ToolNotFound("search".into()), ErrorCategory::ToolExecution, false),
        (ArcheError::tool("gcd", "division by zero"), ErrorCategory::ToolExecution, false),
        (ArcheError::InvalidArgument("a".into()), ErrorCategory::ToolExecution, false),
        (ArcheError::DuplicateAgent("Writer".into()), ErrorCategory::Configuration, false),
        (ArcheError::Model("refused".into()), ErrorCategory::Model, false),
        (ArcheError::Io(io_error), ErrorCategory::Unknown, false),
    ];

    for (error, category, retryable) in cases {
        assert_eq!(error.category(), category, "category for {error}");
        assert_eq!(error.is_retryable(), retryable, "retryability for {error}");
    }
}

#[test]
fn tool_errors_render_for_result_entries() {
    assert_eq!(
        ArcheError::ToolNotFound("search".into()).to_string(),
        "Tool 'search' not found"
    );
    assert_eq!(
        ArcheError::tool("gcd", "division by zero").to_string(),
        "Tool 'gcd' failed: division by zero"
    );
}

#[test]
fn declaration_errors_name_the_tool_and_parameter() {
    let err = ArcheError::EnumOptionsMissing {
        tool_name: "convert".into(),
        parameter: "unit".into(),
    };
    assert_eq!(
        err.to_string(),
        "Parameter 'unit' of tool 'convert' has type 'enum' but no options list"
    );
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn io_and_json_errors_convert_with_question_mark() {
    fn read() -> Result<String> {
        Ok(std::fs::read_to_string("/nonexistent/arche/file")?)
    }
    fn parse() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{")?)
    }

    assert!(matches!(read(), Err(ArcheError::Io(_))));
    assert!(matches!(parse(), Err(ArcheError::Serialization(_))));
}
