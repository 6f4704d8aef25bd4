use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ingest::types::Question;
use crate::service::QueryService;

/// Message returned on any fetch/parse failure. Details stay in the logs.
pub const SEARCH_FAILED_MSG: &str = "Failed to fetch questions";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

impl AppState {
    pub fn new(service: QueryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/questions", get(search_questions))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Response envelope shared by success and failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Question>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    fn ok(data: Vec<Question>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            data: None,
            error: Some(SEARCH_FAILED_MSG.to_string()),
        }
    }
}

/// First `term` wins; repeated or unknown keys never reject the request.
fn search_term(params: &[(String, String)]) -> String {
    params
        .iter()
        .find(|(k, _)| k == "term")
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

async fn search_questions(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let term = search_term(&params);
    match state.service.search(&term).await {
        Ok(questions) => (StatusCode::OK, Json(ApiResponse::ok(questions))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, term = %term, "question search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed()),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_term_wins() {
        let params = vec![
            ("page".to_string(), "2".to_string()),
            ("term".to_string(), "a".to_string()),
            ("term".to_string(), "b".to_string()),
        ];
        assert_eq!(search_term(&params), "a");
        assert_eq!(search_term(&[]), "");
    }
}
