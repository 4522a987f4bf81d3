//! Rest-area facility API client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::FacilityError;

/// Default endpoint for per-rest-area convenience facilities.
const DEFAULT_BASE_URL: &str = "https://data.ex.co.kr/openapi/business/conveniServiceArea";

/// A facility at a rest area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    #[serde(rename = "psCode", default)]
    pub code: String,
    #[serde(rename = "psName")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FacilityPage {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    list: Option<Vec<Facility>>,
}

/// Configuration for the facility API client.
#[derive(Debug, Clone)]
pub struct FacilityClientConfig {
    /// API key passed as the `key` query parameter
    pub api_key: String,
    /// Endpoint URL
    pub base_url: String,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Attempts after the first
    pub retries: u32,
    /// Wait before retry `n` is `n × backoff`
    pub backoff: Duration,
}

impl FacilityClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            retries: 2,
            backoff: Duration::from_secs(1),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Client for the facility feed.
#[derive(Debug, Clone)]
pub struct FacilityClient {
    http: reqwest::Client,
    config: FacilityClientConfig,
}

impl FacilityClient {
    pub fn new(config: FacilityClientConfig) -> Result<Self, FacilityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Facilities at the rest area with the given code, retrying failures
    /// with a linear back-off.
    pub async fn fetch(&self, rest_area_code: &str) -> Result<Vec<Facility>, FacilityError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(rest_area_code).await {
                Ok(facilities) => return Ok(facilities),
                Err(e) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!(rest_area_code, attempt, error = %e, "facility lookup failed, retrying");
                    tokio::time::sleep(self.config.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, rest_area_code: &str) -> Result<Vec<Facility>, FacilityError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("type", "json"),
                ("stdRestCd", rest_area_code),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FacilityError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let facilities = parse_facilities(&body)?;
        debug!(rest_area_code, count = facilities.len(), "fetched facilities");
        Ok(facilities)
    }
}

fn parse_facilities(body: &str) -> Result<Vec<Facility>, FacilityError> {
    let page: FacilityPage = serde_json::from_str(body).map_err(|e| FacilityError::Json {
        message: e.to_string(),
    })?;

    match (page.list, page.code) {
        (Some(list), _) => Ok(list),
        (None, Some(code)) if code != "SUCCESS" => Err(FacilityError::Api {
            status: 200,
            message: format!("{}: {}", code, page.message.unwrap_or_default()),
        }),
        (None, _) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    #[test]
    fn parse_facility_list() {
        let body = r#"{"code": "SUCCESS", "list": [
            {"stdRestCd": "000001", "stdRestNm": "서울만남(부산)", "psCode": "01", "psName": "화장실"},
            {"stdRestCd": "000001", "stdRestNm": "서울만남(부산)", "psName": "수유실"}
        ]}"#;
        let facilities = parse_facilities(body).unwrap();
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].code, "01");
        assert_eq!(facilities[1].name, "수유실");
    }

    #[test]
    fn parse_error_code() {
        let err = parse_facilities(r#"{"code": "ERROR", "message": "bad key"}"#).unwrap_err();
        assert!(matches!(err, FacilityError::Api { status: 200, .. }));
        assert!(matches!(
            parse_facilities("nope").unwrap_err(),
            FacilityError::Json { .. }
        ));
    }

    /// Serve `failures` errors, then a facility list.
    async fn flaky_server(failures: usize) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/facilities",
                get(|State((hits, failures)): State<(Arc<AtomicUsize>, usize)>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        (StatusCode::SERVICE_UNAVAILABLE, String::new())
                    } else {
                        (
                            StatusCode::OK,
                            r#"{"code":"SUCCESS","list":[{"psCode":"01","psName":"화장실"}]}"#.to_string(),
                        )
                    }
                }),
            )
            .with_state((hits.clone(), failures));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/facilities"), hits)
    }

    fn client(url: &str) -> FacilityClient {
        FacilityClient::new(
            FacilityClientConfig::new("k")
                .with_base_url(url)
                .with_backoff(Duration::from_millis(1)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn retries_until_success() {
        let (url, hits) = flaky_server(2).await;
        let facilities = client(&url).fetch("000001").await.unwrap();
        assert_eq!(facilities[0].name, "화장실");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_two_retries() {
        let (url, hits) = flaky_server(10).await;
        let err = client(&url).fetch("000001").await.unwrap_err();
        assert!(matches!(err, FacilityError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
