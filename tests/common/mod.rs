//! Common test utilities
//!
//! Builds a fully wired orchestrator over the mock portal so integration
//! tests can drive real request flows without a browser.

use std::sync::Arc;

use vtop_relay::auth::{LoginWorkflow, ScriptChallengeResolver};
use vtop_relay::config::Config;
use vtop_relay::extract::{Extractor, ExtractorPipeline, ScriptExtractor, SEMESTER_KEY};
use vtop_relay::portal::mock::{MockLoginBehavior, MockPageFactory, MockPortalPage, ScriptOutcome};
use vtop_relay::server::Orchestrator;
use vtop_relay::session::{PoolSettings, SessionPool};

pub const VALID_USERNAME: &str = "22BCE1234";
pub const VALID_PASSWORD: &str = "hunter2!";

pub const SEMESTERS: &str =
    r#"{"semesters": [{"name": "Fall 2024", "id": "VL20242505"}, {"name": "Winter 2024", "id": "VL20242506"}]}"#;

/// Extractor keys every successful request carries, in order
pub fn expected_keys() -> Vec<&'static str> {
    vec![SEMESTER_KEY, "Attendance", "Marks", "CGPA"]
}

/// Configuration with fast timings for tests
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.pooled_captcha_retries = 3;
    config.cold_captcha_retries = 6;
    config.retry_pause_ms = 1;
    config.settle_timeout_ms = 0;
    config.selector_timeout_ms = 500;
    config
}

/// Mock page template with canned extractor data and credential checking
pub fn portal_page(behavior: MockLoginBehavior) -> MockPortalPage {
    MockPortalPage::new(behavior)
        .with_credentials(VALID_USERNAME, VALID_PASSWORD)
        .with_script_result("FETCH_SEMESTERS", ScriptOutcome::Value(SEMESTERS.to_string()))
        .with_script_result(
            "FETCH_ATTENDANCE",
            ScriptOutcome::Value(r#"{"attendance": [{"course_code": "CSE1002", "percentage": 87.5}]}"#.to_string()),
        )
        .with_script_result(
            "FETCH_MARKS",
            ScriptOutcome::Value(r#"{"marks": [{"title": "CAT-1", "score": 42.0}]}"#.to_string()),
        )
        .with_script_result("FETCH_CGPA", ScriptOutcome::Value(r#"{"cgpa": 8.75}"#.to_string()))
}

/// Factory handing out identically scripted pages
pub fn mock_factory(behavior: MockLoginBehavior) -> Arc<MockPageFactory> {
    Arc::new(MockPageFactory::with_template(move || {
        portal_page(behavior.clone())
    }))
}

/// Pipeline matching the canned script markers
pub fn test_pipeline() -> ExtractorPipeline {
    ExtractorPipeline::new(
        Box::new(ScriptExtractor::new(SEMESTER_KEY, "FETCH_SEMESTERS")),
        vec![
            Box::new(ScriptExtractor::new("Attendance", "FETCH_ATTENDANCE")) as Box<dyn Extractor>,
            Box::new(ScriptExtractor::new("Marks", "FETCH_MARKS")) as Box<dyn Extractor>,
            Box::new(ScriptExtractor::new("CGPA", "FETCH_CGPA")) as Box<dyn Extractor>,
        ],
    )
}

/// Wire an orchestrator over a mock factory
pub fn build_orchestrator(
    factory: Arc<MockPageFactory>,
    pool_size: usize,
    max_overflow: usize,
) -> (Arc<Orchestrator>, SessionPool) {
    let config = test_config();
    let settings = PoolSettings {
        pool_size,
        max_overflow,
        prelogin_url: config.prelogin_url.clone(),
        selector_timeout_ms: config.selector_timeout_ms,
    };

    let pool = SessionPool::new(factory, settings);
    let workflow = LoginWorkflow::new(
        Arc::new(ScriptChallengeResolver::new("solve('#captchaStr')")),
        &config,
    );

    (
        Arc::new(Orchestrator::new(pool.clone(), workflow, test_pipeline())),
        pool,
    )
}
