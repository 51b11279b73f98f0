//! Per-request orchestration

use tracing::debug;

use crate::auth::{Credentials, LoginWorkflow};
use crate::extract::{ExtractorPipeline, ResultSet};
use crate::session::{Session, SessionPool};
use crate::Result;

/// Coordinates one request end to end
///
/// Every acquired session is released exactly once, on every exit path:
/// success, partial extraction failure, and every authentication failure.
pub struct Orchestrator {
    pool: SessionPool,
    workflow: LoginWorkflow,
    pipeline: ExtractorPipeline,
}

impl Orchestrator {
    /// Create an orchestrator over a pool, workflow, and pipeline
    pub fn new(pool: SessionPool, workflow: LoginWorkflow, pipeline: ExtractorPipeline) -> Self {
        Self {
            pool,
            workflow,
            pipeline,
        }
    }

    /// Authenticate and collect every data category for one user
    pub async fn handle(&self, credentials: Credentials, sem_index: usize) -> Result<ResultSet> {
        let mut lease = self.pool.acquire().await?;
        debug!("Request running on session {}", lease.session_mut().id());

        let outcome = self
            .authenticate_and_extract(lease.session_mut(), &credentials, sem_index)
            .await;

        lease.release().await;
        outcome
    }

    async fn authenticate_and_extract(
        &self,
        session: &mut Session,
        credentials: &Credentials,
        sem_index: usize,
    ) -> Result<ResultSet> {
        self.workflow.login(session, credentials).await?;
        let page = session.page();
        Ok(self.pipeline.run(page.as_ref(), sem_index).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::ScriptChallengeResolver;
    use crate::config::Config;
    use crate::extract::{Extractor, ScriptExtractor, SEMESTER_KEY};
    use crate::portal::mock::{MockLoginBehavior, MockPageFactory, ScriptOutcome, PRELOGIN_URL};
    use crate::session::{PoolSettings, SessionState};
    use crate::Error;

    const SEMESTERS: &str = r#"{"semesters": [{"name": "Fall 2024", "id": "VL20242505"}]}"#;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.pooled_captcha_retries = 2;
        config.cold_captcha_retries = 4;
        config.retry_pause_ms = 1;
        config.settle_timeout_ms = 0;
        config
    }

    fn test_pipeline() -> ExtractorPipeline {
        ExtractorPipeline::new(
            Box::new(ScriptExtractor::new(SEMESTER_KEY, "FETCH_SEMESTERS")),
            vec![
                Box::new(ScriptExtractor::new("Marks", "FETCH_MARKS")) as Box<dyn Extractor>,
                Box::new(ScriptExtractor::new("CGPA", "FETCH_CGPA")) as Box<dyn Extractor>,
            ],
        )
    }

    fn orchestrator_with(behavior: MockLoginBehavior) -> (Orchestrator, SessionPool) {
        let factory = Arc::new(MockPageFactory::with_template(move || {
            crate::portal::mock::MockPortalPage::new(behavior.clone())
                .with_script_result("FETCH_SEMESTERS", ScriptOutcome::Value(SEMESTERS.to_string()))
                .with_script_result("FETCH_MARKS", ScriptOutcome::Value(r#"{"marks": []}"#.to_string()))
                .with_script_result("FETCH_CGPA", ScriptOutcome::Value(r#"{"cgpa": 9.1}"#.to_string()))
        }));

        let config = test_config();
        let settings = PoolSettings {
            pool_size: 2,
            max_overflow: 1,
            prelogin_url: PRELOGIN_URL.to_string(),
            selector_timeout_ms: 1000,
        };
        let pool = SessionPool::new(factory, settings);
        let workflow = LoginWorkflow::new(
            Arc::new(ScriptChallengeResolver::new("solve('#captchaStr')")),
            &config,
        );
        (
            Orchestrator::new(pool.clone(), workflow, test_pipeline()),
            pool,
        )
    }

    #[tokio::test]
    async fn test_successful_request_returns_every_category() {
        let (orchestrator, pool) = orchestrator_with(MockLoginBehavior::SucceedAfter(0));
        pool.initialize().await.unwrap();

        let results = orchestrator
            .handle(Credentials::new("user", "pass"), 0)
            .await
            .unwrap();

        let keys: Vec<&String> = results.keys().collect();
        assert_eq!(keys, vec![SEMESTER_KEY, "Marks", "CGPA"]);
        assert_eq!(results["CGPA"]["cgpa"], 9.1);
    }

    #[tokio::test]
    async fn test_session_returns_to_pool_after_success() {
        let (orchestrator, pool) = orchestrator_with(MockLoginBehavior::SucceedAfter(0));
        pool.initialize().await.unwrap();

        orchestrator
            .handle(Credentials::new("user", "pass"), 0)
            .await
            .unwrap();

        assert_eq!(pool.idle_count().await, 2);
        assert_eq!(pool.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn test_auth_failure_skips_extraction_and_still_releases() {
        let (orchestrator, pool) = orchestrator_with(MockLoginBehavior::RejectLogin);
        pool.initialize().await.unwrap();

        let result = orchestrator
            .handle(Credentials::new("user", "wrong"), 0)
            .await;

        assert!(matches!(result, Err(Error::InvalidCredentials)));
        assert_eq!(pool.idle_count().await, 2);
        assert_eq!(
            pool.idle_states().await,
            vec![SessionState::PreWarmed, SessionState::PreWarmed]
        );
    }

    #[tokio::test]
    async fn test_pool_exhaustion_propagates() {
        let (orchestrator, pool) = orchestrator_with(MockLoginBehavior::SucceedAfter(0));
        pool.initialize().await.unwrap();

        // Hold every admissible session so the next request is rejected
        let _a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();
        let _c = pool.acquire().await.unwrap();

        let result = orchestrator
            .handle(Credentials::new("user", "pass"), 0)
            .await;
        assert!(matches!(result, Err(Error::PoolExhausted)));
    }
}
