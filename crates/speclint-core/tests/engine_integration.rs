//! Integration test: rulesets on disk resolved and run end-to-end.
//!
//! Uses fixture files under `tests/fixtures/` to verify the full
//! file → DTO → migrate → extends → model → Engine pipeline.

use speclint_core::ruleset::{locate, BuiltinRulesets, ResolveError, RulesetResolver};
use speclint_core::{Engine, LintEngine, Position, Severity};
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

struct NoBuiltins;

impl BuiltinRulesets for NoBuiltins {
    fn source(&self, _name: &str) -> Option<&'static str> {
        None
    }
}

async fn engine_for(ruleset: &str) -> Engine {
    let root = fixture_root();
    let resolver = RulesetResolver::new(&NoBuiltins, &root).expect("resolver should build");
    let locator = locate(ruleset, &root)
        .await
        .expect("ruleset should be located");
    let ruleset = resolver.resolve(&locator).await.expect("ruleset should resolve");
    Engine::new(ruleset)
}

fn petstore() -> String {
    std::fs::read_to_string(fixture_root().join("petstore.yaml")).expect("fixture should exist")
}

// ── Happy path ──

#[tokio::test]
async fn extended_ruleset_reports_expected_diagnostics() {
    let engine = engine_for("ruleset/main.yaml").await;
    let diagnostics = engine.run(&petstore()).expect("document should lint");

    let summary: Vec<(&str, Severity, usize)> = diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.severity, d.range.start.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("info-contact", Severity::Error, 1),
            ("title-length", Severity::Info, 2),
            ("operation-description", Severity::Hint, 10),
            ("operation-operationId-valid-in-url", Severity::Warn, 11),
        ],
        "got {diagnostics:#?}"
    );

    let title = &diagnostics[1];
    assert_eq!(title.message, "Title is too long: Petstore");
    assert_eq!(title.range.start, Position::new(2, 9));

    let op_id = &diagnostics[3];
    assert!(op_id.message.starts_with("`operationId` must match the pattern"));
    assert_eq!(op_id.path_string(), "paths./pets.post.operationId");
}

#[tokio::test]
async fn non_recommended_rules_stay_off() {
    let engine = engine_for("ruleset/main.yaml").await;
    let diagnostics = engine.run(&petstore()).expect("document should lint");
    assert!(diagnostics.iter().all(|d| d.code != "info-license"));
    assert!(!engine.ruleset().get("info-license").expect("rule exists").is_enabled());
}

// ── Error paths ──

#[tokio::test]
async fn cyclic_extends_are_rejected() {
    let root = fixture_root();
    let resolver = RulesetResolver::new(&NoBuiltins, &root).expect("resolver should build");
    let locator = locate("ruleset/cycle-a.yaml", &root)
        .await
        .expect("ruleset should be located");
    let err = resolver.resolve(&locator).await.expect_err("cycle should fail");
    assert!(matches!(err, ResolveError::Cycle { .. }), "got {err}");
}

#[tokio::test]
async fn missing_ruleset_file_is_an_io_error() {
    let root = fixture_root();
    let resolver = RulesetResolver::new(&NoBuiltins, &root).expect("resolver should build");
    let locator = locate("ruleset/nope.yaml", &root)
        .await
        .expect("ruleset should be located");
    let err = resolver.resolve(&locator).await.expect_err("missing file should fail");
    assert!(matches!(err, ResolveError::Io { .. }), "got {err}");
}
