//! HTTP client with rate limiting for api.openf1.org

use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    build_race_record, collect_races, schedule_season, summarize_weather, Driver, Meeting, PositionSample,
    Session, WeatherSample,
};
use crate::error::SupplierError;
use crate::models::{RaceRecord, WeatherInfo};

/// Public OpenF1 endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Supplier configuration
#[derive(Debug, Clone)]
pub struct SupplierConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Delay between requests in milliseconds
    pub delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max attempts per request
    pub max_retries: u32,
    /// Query `/weather` for each race instead of using the dry defaults
    pub fetch_weather: bool,
    pub user_agent: String,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay_ms: 500,
            timeout_secs: 30,
            max_retries: 3,
            fetch_weather: false,
            user_agent: concat!("f1race/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SupplierConfig {
    /// Defaults overridden by `OPENF1_BASE_URL` and `OPENF1_DELAY_MS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OPENF1_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(delay) = std::env::var("OPENF1_DELAY_MS").ok().and_then(|v| v.parse().ok()) {
            config.delay_ms = delay;
        }
        config
    }
}

/// OpenF1 client with rate limiting
pub struct OpenF1Client {
    client: reqwest::Client,
    config: SupplierConfig,
    last_request: Mutex<Option<Instant>>,
}

impl OpenF1Client {
    /// Create a new client with the given configuration
    pub fn new(config: SupplierConfig) -> Result<Self, SupplierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SupplierConfig {
        &self.config
    }

    /// Wait for rate limit
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let delay = Duration::from_millis(self.config.delay_ms);

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Build URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint)
    }

    /// GET an endpoint with rate limiting and retry, decoding the JSON body
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, SupplierError> {
        let url = self.build_url(endpoint);
        let attempts = self.config.max_retries.max(1);

        for attempt in 0..attempts {
            self.wait_for_rate_limit().await;
            debug!("GET {} {:?}", url, query);

            match self.client.get(&url).query(query).send().await {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body)
                        .map_err(|e| SupplierError::Malformed(format!("{}: {}", endpoint, e)));
                }
                Ok(response) => {
                    warn!(
                        "Request failed with status {} (attempt {}/{})",
                        response.status(),
                        attempt + 1,
                        attempts
                    );
                }
                Err(e) => {
                    warn!("Request failed (attempt {}/{}): {}", attempt + 1, attempts, e);
                }
            }

            if attempt + 1 < attempts {
                let backoff = Duration::from_millis(self.config.delay_ms * (attempt as u64 + 1));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(SupplierError::RetriesExhausted { url, attempts })
    }

    /// All meetings (race weekends) of a season
    pub async fn get_meetings(&self, year: i32) -> Result<Vec<Meeting>, SupplierError> {
        self.get_json("meetings", &[("year", year.to_string())]).await
    }

    /// Sessions of a meeting, falling back to a year/location query
    pub async fn get_sessions(&self, year: i32, meeting: &Meeting) -> Result<Vec<Session>, SupplierError> {
        match (meeting.meeting_key, meeting.location.as_deref()) {
            (Some(key), _) => self.get_json("sessions", &[("meeting_key", key.to_string())]).await,
            (None, Some(location)) => {
                self.get_json(
                    "sessions",
                    &[("year", year.to_string()), ("location", location.to_string())],
                )
                .await
            }
            (None, None) => Err(SupplierError::Malformed("meeting without key or location".to_string())),
        }
    }

    pub async fn get_drivers(&self, session_key: u64) -> Result<Vec<Driver>, SupplierError> {
        self.get_json("drivers", &[("session_key", session_key.to_string())]).await
    }

    pub async fn get_positions(&self, session_key: u64) -> Result<Vec<PositionSample>, SupplierError> {
        self.get_json("position", &[("session_key", session_key.to_string())]).await
    }

    pub async fn get_weather(&self, session_key: u64) -> Result<Vec<WeatherSample>, SupplierError> {
        self.get_json("weather", &[("session_key", session_key.to_string())]).await
    }

    /// Fetch every race of a season
    ///
    /// Rounds are numbered by the meetings that have a race session, so
    /// testing events don't shift them. A failing race is logged and skipped.
    pub async fn fetch_season(&self, year: i32) -> Result<Vec<RaceRecord>, SupplierError> {
        let meetings = self.get_meetings(year).await?;
        info!("Found {} meetings for {}", meetings.len(), year);

        let mut listings = Vec::with_capacity(meetings.len());
        for meeting in meetings {
            let sessions = self.get_sessions(year, &meeting).await;
            listings.push((meeting, sessions));
        }

        let schedule = schedule_season(year, listings)?;

        let mut outcomes = Vec::with_capacity(schedule.len());
        for race in schedule {
            let outcome = self.fetch_race(year, race.round, &race.meeting, &race.session).await;
            outcomes.push((race, outcome));
        }

        Ok(collect_races(year, outcomes))
    }

    /// Fetch one race session's results
    pub async fn fetch_race(
        &self,
        year: i32,
        round: u32,
        meeting: &Meeting,
        session: &Session,
    ) -> Result<RaceRecord, SupplierError> {
        let drivers = self.get_drivers(session.session_key).await?;
        let positions = self.get_positions(session.session_key).await?;
        if drivers.is_empty() || positions.is_empty() {
            return Err(SupplierError::Malformed(format!(
                "session {} has no driver/position data",
                session.session_key
            )));
        }

        let weather = if self.config.fetch_weather {
            match self.get_weather(session.session_key).await {
                Ok(samples) => summarize_weather(&samples),
                Err(e) => {
                    warn!("No weather for session {}: {}", session.session_key, e);
                    WeatherInfo::default()
                }
            }
        } else {
            WeatherInfo::default()
        };

        Ok(build_race_record(year, round, meeting, session, &drivers, &positions, weather))
    }
}
