//! OpenF1 API supplier
//!
//! Fetches race sessions from the public OpenF1 REST API and converts them
//! into [`RaceRecord`]s.
//!
//! # Example
//!
//! ```no_run
//! use f1race::data::{DatasetConfig, DatasetLoader};
//! use f1race::openf1::{OpenF1Source, SupplierConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut source = OpenF1Source::new(SupplierConfig::from_env())?;
//!     let dataset = DatasetLoader::new(DatasetConfig::default()).load(&mut source, &[2023, 2024])?;
//!     println!("{} samples", dataset.len());
//!     Ok(())
//! }
//! ```

#[cfg(feature = "openf1")]
mod client;
#[cfg(feature = "openf1")]
mod source;

#[cfg(feature = "openf1")]
pub use client::{OpenF1Client, SupplierConfig, DEFAULT_BASE_URL};
#[cfg(feature = "openf1")]
pub use source::OpenF1Source;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::error::SupplierError;
use crate::models::{parse_timestamp, CircuitInfo, EntrantResult, RaceRecord, WeatherCondition, WeatherInfo};

/// Race weekend as listed by `/meetings`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default)]
    pub meeting_key: Option<u64>,
    #[serde(default)]
    pub meeting_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
}

impl Meeting {
    /// Short label for logs
    pub fn label(&self, year: i32) -> String {
        let name = self
            .location
            .as_deref()
            .or(self.meeting_name.as_deref())
            .unwrap_or("unknown");
        format!("{} {}", year, name)
    }
}

/// Session as listed by `/sessions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub session_key: u64,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
}

/// Driver entry from `/drivers`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default)]
    pub driver_number: Option<u32>,
    #[serde(default)]
    pub team_name: Option<String>,
}

/// Running-order sample from `/position`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionSample {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub driver_number: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
}

/// Weather sample from `/weather`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherSample {
    #[serde(default)]
    pub air_temperature: Option<f64>,
    #[serde(default)]
    pub rainfall: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
}

/// Pick the main race of a weekend
///
/// Sprint weekends list two sessions of type "Race"; prefer the one named
/// "Race", else the first of type "Race".
pub fn find_race_session(sessions: &[Session]) -> Option<&Session> {
    sessions
        .iter()
        .find(|s| s.session_name.as_deref() == Some("Race"))
        .or_else(|| sessions.iter().find(|s| s.session_type.as_deref() == Some("Race")))
}

/// Final classified position per driver: the latest position sample
pub fn final_positions(samples: &[PositionSample]) -> HashMap<u32, u32> {
    let mut latest: HashMap<u32, (Option<DateTime<Utc>>, u32)> = HashMap::new();

    for sample in samples {
        let (Some(driver), Some(position)) = (sample.driver_number, sample.position) else {
            continue;
        };
        let date = sample.date.as_deref().and_then(parse_timestamp);
        match latest.get(&driver) {
            Some((seen, _)) if *seen > date => {}
            _ => {
                latest.insert(driver, (date, position));
            }
        }
    }

    latest.into_iter().map(|(driver, (_, pos))| (driver, pos)).collect()
}

/// Summarize a session's weather samples
///
/// No samples means no data: the nominal dry defaults are returned.
pub fn summarize_weather(samples: &[WeatherSample]) -> WeatherInfo {
    let defaults = WeatherInfo::default();
    if samples.is_empty() {
        return defaults;
    }

    let mean = |values: Vec<f64>| -> Option<f64> {
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    let temperature = mean(samples.iter().filter_map(|s| s.air_temperature).collect());
    let wind_speed = mean(samples.iter().filter_map(|s| s.wind_speed).collect());

    let rain: Vec<f64> = samples.iter().filter_map(|s| s.rainfall).collect();
    let (condition, rain_chance) = match mean(rain.iter().map(|&r| if r > 0.0 { 1.0 } else { 0.0 }).collect()) {
        None => (defaults.condition, defaults.rain_chance),
        Some(share) if share <= 0.0 => (WeatherCondition::Dry, 0.0),
        Some(share) if share >= 1.0 => (WeatherCondition::Wet, 100.0),
        Some(share) => (WeatherCondition::Mixed, share * 100.0),
    };

    WeatherInfo {
        temperature: temperature.unwrap_or(defaults.temperature),
        condition,
        rain_chance,
        wind_speed: wind_speed.unwrap_or(defaults.wind_speed),
    }
}

/// Build a race record from one session's payloads
///
/// Every listed driver becomes a result; drivers without a final position
/// keep `position: None` and are dropped later by the assembler.
pub fn build_race_record(
    year: i32,
    round: u32,
    meeting: &Meeting,
    session: &Session,
    drivers: &[Driver],
    positions: &[PositionSample],
    weather: WeatherInfo,
) -> RaceRecord {
    let finals = final_positions(positions);
    let mut seen = HashSet::new();

    let results = drivers
        .iter()
        .filter_map(|d| d.driver_number.map(|n| (n, d)))
        .filter(|(n, _)| seen.insert(*n))
        .map(|(number, driver)| EntrantResult {
            entrant_id: number.to_string(),
            team_id: driver.team_name.clone().unwrap_or_default(),
            position: finals.get(&number).copied(),
        })
        .collect();

    RaceRecord {
        date: session
            .date_start
            .as_deref()
            .or(meeting.date_start.as_deref())
            .and_then(parse_timestamp),
        season: year,
        round,
        location: meeting.location.clone().or_else(|| meeting.meeting_name.clone()),
        circuit: CircuitInfo::default(),
        weather,
        results,
    }
}

/// A meeting with its race session and assigned round
#[derive(Debug, Clone)]
pub struct ScheduledRace {
    pub round: u32,
    pub meeting: Meeting,
    pub session: Session,
}

/// Assign round numbers to a season's meetings
///
/// Takes each meeting with the result of listing its sessions. Meetings
/// without a race session (pre-season testing) or whose listing failed are
/// skipped and don't consume a round. No meetings at all is `NoData`.
pub fn schedule_season(
    year: i32,
    listings: Vec<(Meeting, Result<Vec<Session>, SupplierError>)>,
) -> Result<Vec<ScheduledRace>, SupplierError> {
    if listings.is_empty() {
        return Err(SupplierError::NoData(year));
    }

    let mut scheduled = Vec::new();
    let mut round = 0;

    for (meeting, sessions) in listings {
        let label = meeting.label(year);
        let session = match sessions {
            Ok(sessions) => match find_race_session(&sessions) {
                Some(session) => session.clone(),
                None => {
                    warn!("Skipping {}: {}", label, SupplierError::NoRaceSession(label.clone()));
                    continue;
                }
            },
            Err(e) => {
                warn!("Skipping {}: {}", label, e);
                continue;
            }
        };

        round += 1;
        scheduled.push(ScheduledRace { round, meeting, session });
    }

    Ok(scheduled)
}

/// Keep the races that were fetched, logging the ones that failed
pub fn collect_races(year: i32, outcomes: Vec<(ScheduledRace, Result<RaceRecord, SupplierError>)>) -> Vec<RaceRecord> {
    outcomes
        .into_iter()
        .filter_map(|(race, outcome)| match outcome {
            Ok(record) => {
                info!(
                    "Round {}: {} ({} drivers)",
                    race.round,
                    race.meeting.label(year),
                    record.results.len()
                );
                Some(record)
            }
            Err(e) => {
                warn!(
                    "Error processing round {} ({}): {}",
                    race.round,
                    race.meeting.label(year),
                    e
                );
                None
            }
        })
        .collect()
}
