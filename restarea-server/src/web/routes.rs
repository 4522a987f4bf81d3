//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use crate::facilities::{EnrichedResult, enrich};
use crate::finder::FindError;
use crate::interchanges::InterchangeSource;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: InterchangeSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog/status", get(catalog_status::<S>))
        .route("/route/rest-areas", post(find_rest_areas::<S>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Report what reference data is loaded, without triggering a load.
async fn catalog_status<S: InterchangeSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<CatalogStatus> {
    let snapshot = state.finder.catalog().current().await;

    Json(CatalogStatus {
        loaded: snapshot.is_some(),
        interchanges: snapshot.as_ref().map_or(0, |s| s.len()),
        highways: snapshot.as_ref().map_or(0, |s| s.highway_count()),
        built_at: snapshot.as_ref().map(|s| s.built_at()),
        rest_areas: state.rest_areas.len(),
    })
}

/// Find rest areas along a route.
async fn find_rest_areas<S: InterchangeSource + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<RestAreaRequest>,
) -> Result<Json<RestAreaResponse>, AppError> {
    let candidates = req
        .candidates
        .as_deref()
        .unwrap_or_else(|| state.rest_areas.candidates());

    let mut outcome = state
        .finder
        .find(&req.route, &req.highways, candidates, req.options.as_ref())
        .await?;

    if let Some(section) = req.section {
        outcome = outcome.within_section(section.start_km, section.end_km);
    }

    let results = match (&state.facilities, req.include_facilities) {
        (Some(client), true) => {
            enrich(outcome.results, client.as_ref(), state.facility_concurrency).await
        }
        _ => outcome.results.into_iter().map(EnrichedResult::from).collect(),
    };

    Ok(Json(RestAreaResponse {
        results,
        diagnostics: outcome.diagnostics,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
}

impl From<FindError> for AppError {
    fn from(e: FindError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::domain::{Coordinate, RestAreaCandidate};
    use crate::finder::RestAreaFinder;
    use crate::interchanges::fixtures::gyeongbu_rows;
    use crate::interchanges::{CatalogConfig, InterchangeCatalog, StaticSource};
    use crate::pipeline::FilterConfig;
    use crate::rest_areas::RestAreaCatalog;
    use crate::tables::DirectionTables;

    async fn serve(rest_areas: Vec<RestAreaCandidate>) -> String {
        let catalog = Arc::new(InterchangeCatalog::new(
            StaticSource::new(gyeongbu_rows()),
            &CatalogConfig::default(),
        ));
        let finder = RestAreaFinder::new(
            catalog,
            Arc::new(DirectionTables::korea().unwrap()),
            FilterConfig::default(),
        )
        .unwrap();
        let app = create_router(AppState::new(finder, RestAreaCatalog::new(rest_areas)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn route() -> Vec<Value> {
        gyeongbu_rows()
            .iter()
            .map(|r| json!({"lat": r.y_value.parse::<f64>().unwrap(), "lng": r.x_value.parse::<f64>().unwrap()}))
            .collect()
    }

    fn rest_areas() -> Vec<RestAreaCandidate> {
        vec![
            RestAreaCandidate::new("down", "A", Coordinate::new(36.9920, 127.3600))
                .with_highway("0010", "경부선")
                .with_direction_label("하행"),
            RestAreaCandidate::new("up", "B", Coordinate::new(36.6010, 127.6800))
                .with_highway("0010", "경부선")
                .with_direction_label("상행"),
            RestAreaCandidate::new("late", "C", Coordinate::new(35.4330, 128.6400))
                .with_highway("0010", "경부선"),
        ]
    }

    #[tokio::test]
    async fn health_check() {
        let base = serve(Vec::new()).await;
        let body = reqwest::get(format!("{base}/health")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn finds_rest_areas_from_loaded_catalog() {
        let base = serve(rest_areas()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/route/rest-areas"))
            .json(&json!({"route": route()}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        let ids: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["candidate"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["down", "late"]);
        assert_eq!(body["diagnostics"]["matchingQuality"], "high");
        assert_eq!(body["diagnostics"]["filterStages"]["initial"], 3);
        assert_eq!(body["diagnostics"]["filterStages"]["final"], 2);
        assert!(body["results"][0].get("facilityDetails").is_none());

        let status: Value = reqwest::get(format!("{base}/catalog/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["loaded"], true);
        assert_eq!(status["interchanges"], 14);
        assert_eq!(status["restAreas"], 3);
    }

    #[tokio::test]
    async fn section_and_request_candidates() {
        let base = serve(Vec::new()).await;
        let candidates = serde_json::to_value(rest_areas()).unwrap();
        let body: Value = reqwest::Client::new()
            .post(format!("{base}/route/rest-areas"))
            .json(&json!({
                "route": route(),
                "candidates": candidates,
                "section": {"startKm": 200, "endKm": 400},
                "options": {"enableDirectionFilter": false}
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let ids: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["candidate"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["late"]);
    }

    #[tokio::test]
    async fn bad_input_is_400() {
        let base = serve(Vec::new()).await;
        let client = reqwest::Client::new();

        let empty = client
            .post(format!("{base}/route/rest-areas"))
            .json(&json!({"route": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(empty.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = empty.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("route"));

        let bad_option = client
            .post(format!("{base}/route/rest-areas"))
            .json(&json!({"route": route(), "options": {"minHighwayCoverage": 3}}))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_option.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = bad_option.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("min_highway_coverage"));
    }
}
