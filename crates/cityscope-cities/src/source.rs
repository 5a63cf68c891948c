//! City source: the paged provider of city records.
//!
//! [`OpenDataSoftSource`] talks to the OpenDataSoft records API
//! (`/api/records/1.0/search/`). Anything else that can hand out pages of
//! cities in a stable order can implement [`CitySource`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::types::{City, CityError};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_DATASET: &str = "geonames-all-cities-with-a-population-1000";
pub const DEFAULT_BASE_URL: &str = "https://public.opendatasoft.com";
const SEARCH_PATH: &str = "api/records/1.0/search/";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// One page of the city listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: u32,
    /// Rows per page
    pub rows: u32,
}

impl PageRequest {
    pub fn new(page: u32, rows: u32) -> Self {
        Self { page, rows }
    }

    /// Offset of the first record of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.rows)
    }
}

/// A paged source of cities.
pub trait CitySource: Send + Sync {
    /// Fetch one page. Records come back in the source's order.
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Vec<City>, CityError>> + Send;

    /// Rows per page this source expects to be asked for.
    fn page_size(&self) -> u32 {
        DEFAULT_PAGE_SIZE
    }
}

impl<S: CitySource> CitySource for Arc<S> {
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Vec<City>, CityError>> + Send {
        (**self).fetch_page(request)
    }

    fn page_size(&self) -> u32 {
        (**self).page_size()
    }
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    fields: RecordFields,
}

#[derive(Debug, Deserialize)]
struct RecordFields {
    name: String,
    #[serde(default)]
    cou_name_en: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    population: Option<u64>,
    coordinates: [f64; 2],
}

impl From<RecordFields> for City {
    fn from(fields: RecordFields) -> Self {
        let [latitude, longitude] = fields.coordinates;
        City {
            name: fields.name,
            country: fields.cou_name_en.unwrap_or_default(),
            timezone: fields.timezone.unwrap_or_default(),
            population: fields.population.unwrap_or(0),
            latitude,
            longitude,
        }
    }
}

/// Parse a records API response body into cities, preserving record order.
pub fn parse_records(body: &str) -> Result<Vec<City>, CityError> {
    let response: RecordsResponse =
        serde_json::from_str(body).map_err(|e| CityError::Parse(e.to_string()))?;
    Ok(response
        .records
        .into_iter()
        .map(|record| City::from(record.fields))
        .collect())
}

/// OpenDataSoft records API client.
#[derive(Debug, Clone)]
pub struct OpenDataSoftSource {
    client: Arc<Client>,
    search_url: Url,
    dataset: String,
    sort_field: String,
    page_size: u32,
}

impl OpenDataSoftSource {
    pub fn new(base_url: &str, dataset: impl Into<String>) -> Result<Self, CityError> {
        Self::with_timeout(base_url, dataset, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        dataset: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CityError> {
        let base = Url::parse(base_url)
            .map_err(|e| CityError::InvalidConfig(format!("{}: {}", base_url, e)))?;
        let search_url = base
            .join(SEARCH_PATH)
            .map_err(|e| CityError::InvalidConfig(e.to_string()))?;

        let dataset = dataset.into();
        if dataset.trim().is_empty() {
            return Err(CityError::InvalidConfig("dataset is empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            search_url,
            dataset,
            sort_field: "name".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Field the API orders results by.
    pub fn with_sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_field = field.into();
        self
    }

    pub fn with_page_size(mut self, rows: u32) -> Self {
        self.page_size = rows.max(1);
        self
    }

    /// Full request URL for a page.
    pub fn page_url(&self, request: PageRequest) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("dataset", &self.dataset)
            .append_pair("rows", &request.rows.to_string())
            .append_pair("start", &request.offset().to_string())
            .append_pair("sort", &self.sort_field);
        url
    }
}

impl CitySource for OpenDataSoftSource {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<City>, CityError> {
        let url = self.page_url(request);
        tracing::debug!("Requesting cities: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CityError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let cities = parse_records(&body)?;

        tracing::info!("Fetched {} cities for page {}", cities.len(), request.page);
        Ok(cities)
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}
