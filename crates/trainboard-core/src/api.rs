// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Schedule API client
//
// Every endpoint answers with `{"data": [...]}` holding station schedules.
// All calls are read-only and safe to repeat.

use crate::models::StationSchedule;
use crate::types::AppError;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Source of live station schedules
pub trait ScheduleSource: Send + Sync + 'static {
    /// Stations whose name matches `query`
    fn search(&self, query: &str)
        -> impl Future<Output = Result<Vec<StationSchedule>, AppError>> + Send;

    /// A single station
    fn station(&self, id: &str) -> impl Future<Output = Result<StationSchedule, AppError>> + Send;

    /// Several stations in one request
    fn stations(&self, ids: &[String])
        -> impl Future<Output = Result<Vec<StationSchedule>, AppError>> + Send;

    /// Stations closest to a coordinate
    fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<StationSchedule>, AppError>> + Send;
}

#[derive(serde::Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// HTTP client for the schedule API
#[derive(Clone)]
pub struct HttpScheduleClient {
    http_client: Client,
    base_url: Url,
}

impl HttpScheduleClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::InvalidConfig(format!("Invalid API URL {}: {}", base_url, e)))?;

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InvalidConfig(format!("Invalid API path {}: {}", path, e)))
    }

    fn stations_url(&self, ids: &[String]) -> Result<Url, AppError> {
        self.url(&format!("stations/{}", ids.join(",")))
    }

    async fn request<T>(&self, url: Url) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!("Requesting {}", url);
        let response = self.http_client.get(url.clone()).send().await.map_err(|e| {
            if e.is_connect() {
                AppError::Network(format!("Cannot connect to {}: {}", url, e))
            } else {
                AppError::Network(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("{} returned status {}", url, status)));
        }

        let body = response.text().await?;
        tracing::trace!("Response: {}", body);
        let ApiResponse { data } = serde_json::from_str(&body)
            .map_err(|e| AppError::Serialization(format!("Failed to parse response: {}", e)))?;
        Ok(data)
    }
}

impl ScheduleSource for HttpScheduleClient {
    async fn search(&self, query: &str) -> Result<Vec<StationSchedule>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.url("stations")?;
        url.query_pairs_mut().append_pair("query", query);
        self.request(url).await
    }

    async fn station(&self, id: &str) -> Result<StationSchedule, AppError> {
        let stations: Vec<StationSchedule> = self.request(self.stations_url(&[id.to_string()])?).await?;
        stations
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Station {}", id)))
    }

    async fn stations(&self, ids: &[String]) -> Result<Vec<StationSchedule>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.request(self.stations_url(ids)?).await
    }

    async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        limit: u32,
    ) -> Result<Vec<StationSchedule>, AppError> {
        let mut url = self.url("stations")?;
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string())
            .append_pair("limit", &limit.to_string());
        self.request(url).await
    }
}

/// A schedule request a poller repeats
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleQuery {
    Search(String),
    Station(String),
    Stations(Vec<String>),
    Nearby {
        latitude: f64,
        longitude: f64,
        limit: u32,
    },
}

impl ScheduleQuery {
    /// Stable cache key for this query
    pub fn key(&self) -> String {
        match self {
            Self::Search(query) => format!("search:{}", query.trim()),
            Self::Station(id) => format!("station:{}", id),
            Self::Stations(ids) => format!("stations:{}", ids.join(",")),
            Self::Nearby {
                latitude,
                longitude,
                limit,
            } => format!("nearby:{},{}:{}", latitude, longitude, limit),
        }
    }

    /// Run the query; single-station results come back as a one-element list
    pub async fn run<C: ScheduleSource>(&self, client: &C) -> Result<Vec<StationSchedule>, AppError> {
        match self {
            Self::Search(query) => client.search(query).await,
            Self::Station(id) => client.station(id).await.map(|station| vec![station]),
            Self::Stations(ids) => client.stations(ids).await,
            Self::Nearby {
                latitude,
                longitude,
                limit,
            } => client.nearby(*latitude, *longitude, *limit).await,
        }
    }
}
