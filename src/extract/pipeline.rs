//! Extraction pipeline

use serde_json::Value;
use tracing::{debug, warn};

use super::extractor::{Extractor, ScriptExtractor};
use super::scripts;
use crate::portal::PortalPage;

/// Reserved result-set key for the discovery extractor
pub const SEMESTER_KEY: &str = "semester";

/// Aggregated extraction results, insertion-ordered
pub type ResultSet = serde_json::Map<String, Value>;

/// Ordered set of extractors sharing one authenticated session
pub struct ExtractorPipeline {
    discovery: Box<dyn Extractor>,
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorPipeline {
    /// Build a pipeline from a discovery extractor and the remaining set
    pub fn new(discovery: Box<dyn Extractor>, extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self {
            discovery,
            extractors,
        }
    }

    /// The full VTOP extractor set backed by the embedded scripts
    pub fn vtop_default() -> Self {
        let discovery = Box::new(ScriptExtractor::new(SEMESTER_KEY, scripts::SEMESTER_DISCOVERY));
        let extractors = scripts::EXTRACTORS
            .iter()
            .map(|(name, script)| Box::new(ScriptExtractor::new(*name, *script)) as Box<dyn Extractor>)
            .collect();
        Self::new(discovery, extractors)
    }

    /// Run every extractor against an authenticated page
    ///
    /// Discovery runs first; its `semesters[sem_index].id` becomes the dynamic
    /// parameter for the rest. Discovery failure or an out-of-range index
    /// leaves the parameter absent. A failed extractor records `null` under
    /// its key and the pipeline continues: one bad extractor never loses the
    /// others' results.
    pub async fn run(&self, page: &dyn PortalPage, sem_index: usize) -> ResultSet {
        let mut results = ResultSet::new();

        let semester_id = match self.discovery.run(page, None).await {
            Ok(value) => {
                let id = value
                    .get("semesters")
                    .and_then(|semesters| semesters.get(sem_index))
                    .and_then(|semester| semester.get("id"))
                    .and_then(|id| id.as_str())
                    .map(str::to_string);
                if id.is_none() {
                    warn!("No semester id at index {}", sem_index);
                }
                results.insert(SEMESTER_KEY.to_string(), value);
                id
            }
            Err(e) => {
                warn!("Semester discovery failed: {}", e);
                results.insert(SEMESTER_KEY.to_string(), Value::Null);
                None
            }
        };

        for extractor in &self.extractors {
            let value = match extractor.run(page, semester_id.as_deref()).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("Extractor {} failed: {}", extractor.name(), e);
                    Value::Null
                }
            };
            debug!("Extractor {} done", extractor.name());
            results.insert(extractor.name().to_string(), value);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::mock::{MockLoginBehavior, MockPortalPage, ScriptOutcome};

    const SEMESTERS: &str =
        r#"{"semesters": [{"name": "Fall 2024", "id": "VL20242505"}, {"name": "Winter 2024", "id": "VL20242506"}]}"#;

    fn pipeline_of(names: &[&str]) -> ExtractorPipeline {
        let extractors = names
            .iter()
            .map(|name| {
                Box::new(ScriptExtractor::new(
                    name.to_string(),
                    format!("FETCH_{}", name),
                )) as Box<dyn Extractor>
            })
            .collect();
        ExtractorPipeline::new(
            Box::new(ScriptExtractor::new(SEMESTER_KEY, "FETCH_SEMESTERS")),
            extractors,
        )
    }

    fn page_with_semesters() -> MockPortalPage {
        MockPortalPage::new(MockLoginBehavior::SucceedAfter(0))
            .with_script_result("FETCH_SEMESTERS", ScriptOutcome::Value(SEMESTERS.to_string()))
    }

    #[tokio::test]
    async fn test_all_extractors_contribute_in_order() {
        let page = page_with_semesters()
            .with_script_result("FETCH_A", ScriptOutcome::Value(r#"{"a": 1}"#.to_string()))
            .with_script_result("FETCH_B", ScriptOutcome::Value(r#"{"b": 2}"#.to_string()));

        let results = pipeline_of(&["A", "B"]).run(&page, 0).await;

        let keys: Vec<&String> = results.keys().collect();
        assert_eq!(keys, vec![SEMESTER_KEY, "A", "B"]);
        assert_eq!(results["A"]["a"], 1);
        assert_eq!(results["B"]["b"], 2);
    }

    #[tokio::test]
    async fn test_one_failing_extractor_never_loses_the_others() {
        let page = page_with_semesters()
            .with_script_result("FETCH_A", ScriptOutcome::Value(r#"{"a": 1}"#.to_string()))
            .with_script_result("FETCH_B", ScriptOutcome::Fail("no table".to_string()))
            .with_script_result("FETCH_C", ScriptOutcome::Value(r#"{"c": 3}"#.to_string()));

        let results = pipeline_of(&["A", "B", "C"]).run(&page, 0).await;

        assert_eq!(results["A"]["a"], 1);
        assert_eq!(results["B"], Value::Null);
        assert_eq!(results["C"]["c"], 3);
    }

    #[tokio::test]
    async fn test_semester_id_reaches_downstream_extractors() {
        let page = page_with_semesters()
            .with_script_result("FETCH_A", ScriptOutcome::Value("{}".to_string()));

        pipeline_of(&["A"]).run(&page, 1).await;

        let scripts = page.evaluated_scripts();
        assert!(scripts.last().unwrap().ends_with(r#"("VL20242506")"#));
    }

    #[tokio::test]
    async fn test_out_of_range_index_runs_without_parameter() {
        let page = page_with_semesters()
            .with_script_result("FETCH_A", ScriptOutcome::Value(r#"{"a": 1}"#.to_string()));

        let results = pipeline_of(&["A"]).run(&page, 9).await;

        assert_eq!(results["A"]["a"], 1);
        let scripts = page.evaluated_scripts();
        assert!(scripts.last().unwrap().ends_with("(null)"));
    }

    #[tokio::test]
    async fn test_failed_discovery_is_not_fatal() {
        let page = MockPortalPage::new(MockLoginBehavior::SucceedAfter(0))
            .with_script_result("FETCH_SEMESTERS", ScriptOutcome::Fail("timed out".to_string()))
            .with_script_result("FETCH_A", ScriptOutcome::Value(r#"{"a": 1}"#.to_string()));

        let results = pipeline_of(&["A"]).run(&page, 0).await;

        assert_eq!(results[SEMESTER_KEY], Value::Null);
        assert_eq!(results["A"]["a"], 1);
    }

    #[test]
    fn test_default_pipeline_covers_every_category() {
        let pipeline = ExtractorPipeline::vtop_default();
        let names: Vec<&str> = pipeline.extractors.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["Attendance", "Course", "Marks", "CGPA", "ExamSchedule"]
        );
    }
}
