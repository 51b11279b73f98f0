//! Extractor trait and the script-backed implementation

use async_trait::async_trait;
use serde_json::Value;

use crate::cdp::EvaluationResult;
use crate::portal::PortalPage;
use crate::Result;

/// A named unit of extraction logic run inside an authenticated session
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Key this extractor's result is stored under
    fn name(&self) -> &str;

    /// Produce one category of data, optionally scoped to a semester
    async fn run(&self, page: &dyn PortalPage, semester_id: Option<&str>) -> Result<Value>;
}

/// Extractor backed by an in-page script
///
/// The script is a function literal taking the semester id as its only
/// parameter; it is invoked with the id as a real JSON-encoded argument (or
/// `null` when none was discovered), never by textual substitution.
pub struct ScriptExtractor {
    name: String,
    script: String,
}

impl ScriptExtractor {
    /// Create a named extractor around a script
    pub fn new<S: Into<String>>(name: S, script: S) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
        }
    }
}

#[async_trait]
impl Extractor for ScriptExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, page: &dyn PortalPage, semester_id: Option<&str>) -> Result<Value> {
        let argument = match semester_id {
            Some(id) => serde_json::to_string(id)?,
            None => "null".to_string(),
        };
        let invocation = format!("({})({})", self.script, argument);

        let result = page.evaluate(&invocation).await?;

        // Scripts return JSON-encoded strings; anything unparseable is kept
        // raw rather than dropped
        Ok(match result {
            EvaluationResult::String(raw) => {
                serde_json::from_str(&raw).unwrap_or(Value::String(raw))
            }
            EvaluationResult::Object(value) => value,
            EvaluationResult::Number(n) => serde_json::json!(n),
            EvaluationResult::Bool(b) => Value::Bool(b),
            EvaluationResult::Null => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::mock::{MockLoginBehavior, MockPortalPage, ScriptOutcome};

    fn page_with(marker: &str, outcome: ScriptOutcome) -> MockPortalPage {
        MockPortalPage::new(MockLoginBehavior::SucceedAfter(0)).with_script_result(marker, outcome)
    }

    #[tokio::test]
    async fn test_json_string_results_are_parsed() {
        let page = page_with(
            "FETCH_CGPA",
            ScriptOutcome::Value(r#"{"cgpa": 8.9, "total_credits": 120}"#.to_string()),
        );
        let extractor = ScriptExtractor::new("CGPA", "FETCH_CGPA");

        let value = extractor.run(&page, None).await.unwrap();
        assert_eq!(value["cgpa"], 8.9);
    }

    #[tokio::test]
    async fn test_unparseable_results_are_kept_raw() {
        let page = page_with("FETCH_RAW", ScriptOutcome::Value("not json".to_string()));
        let extractor = ScriptExtractor::new("Raw", "FETCH_RAW");

        let value = extractor.run(&page, None).await.unwrap();
        assert_eq!(value, Value::String("not json".to_string()));
    }

    #[tokio::test]
    async fn test_semester_id_is_passed_as_argument() {
        let page = page_with("FETCH_MARKS", ScriptOutcome::Value("{}".to_string()));
        let extractor = ScriptExtractor::new("Marks", "FETCH_MARKS");

        extractor.run(&page, Some("VL20242505")).await.unwrap();

        let scripts = page.evaluated_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with(r#"("VL20242505")"#));
    }

    #[tokio::test]
    async fn test_missing_semester_id_passes_null() {
        let page = page_with("FETCH_MARKS", ScriptOutcome::Value("{}".to_string()));
        let extractor = ScriptExtractor::new("Marks", "FETCH_MARKS");

        extractor.run(&page, None).await.unwrap();

        let scripts = page.evaluated_scripts();
        assert!(scripts[0].ends_with("(null)"));
    }

    #[tokio::test]
    async fn test_script_failure_propagates() {
        let page = page_with("FETCH_BAD", ScriptOutcome::Fail("table not found".to_string()));
        let extractor = ScriptExtractor::new("Bad", "FETCH_BAD");

        let result = extractor.run(&page, None).await;
        assert!(result.is_err());
    }
}
