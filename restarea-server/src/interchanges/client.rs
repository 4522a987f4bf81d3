//! Korea Expressway Corporation interchange API client.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::CatalogError;

/// Default endpoint for the interchange location feed.
const DEFAULT_BASE_URL: &str = "https://data.ex.co.kr/openapi/locationinfo/locationinfoIc";

/// Rows requested per page.
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Hard stop for pagination.
const DEFAULT_MAX_PAGES: u32 = 50;

/// Interchange record as published by the feed.
///
/// Every field arrives as a string; coordinates and distances are parsed
/// when the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInterchange {
    pub unit_code: String,
    pub unit_name: String,
    pub route_code: String,
    pub route_name: String,
    /// Longitude.
    pub x_value: String,
    /// Latitude.
    pub y_value: String,
    /// Distance from the highway origin in km.
    #[serde(default)]
    pub start_value: Option<String>,
}

/// One page of the feed.
#[derive(Debug, Deserialize)]
struct InterchangePage {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    list: Option<Vec<RawInterchange>>,
}

/// Configuration for the interchange API client.
#[derive(Debug, Clone)]
pub struct InterchangeClientConfig {
    /// API key passed as the `key` query parameter
    pub api_key: String,
    /// Endpoint URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Rows requested per page
    pub page_size: u32,
    /// Maximum number of pages fetched
    pub max_pages: u32,
}

impl InterchangeClientConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Client for the interchange location feed.
#[derive(Debug, Clone)]
pub struct InterchangeClient {
    http: reqwest::Client,
    config: InterchangeClientConfig,
}

impl InterchangeClient {
    /// Create a new interchange API client.
    pub fn new(config: InterchangeClientConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch every page of the feed.
    ///
    /// Stops at the first empty page, the first short page, or after
    /// `max_pages` pages.
    pub async fn fetch_all(&self) -> Result<Vec<RawInterchange>, CatalogError> {
        let mut all = Vec::new();

        for page_no in 1..=self.config.max_pages {
            let rows = self.fetch_page(page_no).await?;
            let count = rows.len();
            debug!(page_no, count, "fetched interchange page");

            if count == 0 {
                break;
            }
            all.extend(rows);

            if !has_next_page(count, self.config.page_size) {
                break;
            }
        }

        info!(total = all.len(), "fetched interchange feed");
        Ok(all)
    }

    async fn fetch_page(&self, page_no: u32) -> Result<Vec<RawInterchange>, CatalogError> {
        let page_size = self.config.page_size.to_string();
        let page = page_no.to_string();
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("type", "json"),
                ("numOfRows", page_size.as_str()),
                ("pageNo", page.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_page(&body)
    }
}

/// Parse a page body, surfacing in-band error codes.
fn parse_page(body: &str) -> Result<Vec<RawInterchange>, CatalogError> {
    let page: InterchangePage = serde_json::from_str(body).map_err(|e| CatalogError::Json {
        message: e.to_string(),
    })?;

    match (page.list, page.code) {
        (Some(list), _) => Ok(list),
        (None, Some(code)) if code != "SUCCESS" => Err(CatalogError::Api {
            status: 200,
            message: format!("{}: {}", code, page.message.unwrap_or_default()),
        }),
        (None, _) => Ok(Vec::new()),
    }
}

fn has_next_page(rows_returned: usize, page_size: u32) -> bool {
    rows_returned >= page_size as usize
}
