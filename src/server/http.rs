//! HTTP surface

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::auth::Credentials;
use crate::Error;

/// Seconds clients should back off when the pool is exhausted
const RETRY_AFTER_SECS: &str = "5";

/// Query parameters of `/vtopdata`
#[derive(Debug, Deserialize)]
pub struct VtopDataQuery {
    pub username: String,
    pub password: String,
    #[serde(rename = "semIndex", default)]
    pub sem_index: usize,
}

/// Build the service router
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/vtopdata", get(vtopdata))
        .with_state(orchestrator)
}

async fn vtopdata(
    State(orchestrator): State<Arc<Orchestrator>>,
    query: Result<Query<VtopDataQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    info!("Data request for {}", query.username);

    let credentials = Credentials::new(query.username, query.password);
    match orchestrator.handle(credentials, query.sem_index).await {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "data": data })),
        )
            .into_response(),
        Err(e) => {
            warn!("Request failed: {}", e);
            let mut response = error_response(e.http_status(), e.to_string());
            if matches!(e, Error::PoolExhausted) {
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from_static(RETRY_AFTER_SECS),
                );
            }
            response
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    #[test]
    fn test_query_parses_sem_index() {
        let uri: Uri = "/vtopdata?username=alice&password=secret&semIndex=2"
            .parse()
            .unwrap();
        let Query(query) = Query::<VtopDataQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.username, "alice");
        assert_eq!(query.password, "secret");
        assert_eq!(query.sem_index, 2);
    }

    #[test]
    fn test_sem_index_defaults_to_zero() {
        let uri: Uri = "/vtopdata?username=alice&password=secret".parse().unwrap();
        let Query(query) = Query::<VtopDataQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.sem_index, 0);
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let uri: Uri = "/vtopdata?username=alice".parse().unwrap();
        let result = Query::<VtopDataQuery>::try_from_uri(&uri);
        assert!(result.is_err());
    }
}
