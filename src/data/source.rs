//! Race record suppliers
//!
//! A [`RaceSource`] delivers the race weekends of one season. Sources may be
//! remote (OpenF1) or local (CSV, memory).

use polars::prelude::{CsvReadOptions, DataFrame, DataType, Float64Chunked, Int64Chunked, PolarsError, SerReader, StringChunked};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::SupplierError;
use crate::models::{
    parse_timestamp, CircuitInfo, CircuitType, EntrantResult, RaceRecord, WeatherCondition, WeatherInfo,
};

/// Supplier of race records, one season at a time
pub trait RaceSource {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// All race weekends of a season, in any order
    fn races_for_year(&mut self, year: i32) -> Result<Vec<RaceRecord>, SupplierError>;
}

/// Already-decoded records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    races: Vec<RaceRecord>,
}

impl MemorySource {
    pub fn new(races: Vec<RaceRecord>) -> Self {
        Self { races }
    }
}

impl RaceSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn races_for_year(&mut self, year: i32) -> Result<Vec<RaceRecord>, SupplierError> {
        Ok(self.races.iter().filter(|r| r.season == year).cloned().collect())
    }
}

/// Race results loaded from a CSV file, one row per entrant result
///
/// Required columns: `date`, `season`, `round`, `entrant_id`, `team_id`,
/// `position`. Optional: `location`, `laps`, `distance_km`, `circuit_type`,
/// `temperature`, `condition`, `rain_chance`, `wind_speed`. Race-level fields
/// are taken from the first row of each (season, round).
pub struct CsvRaceSource {
    races: Vec<RaceRecord>,
}

impl CsvRaceSource {
    /// Load and group all rows from CSV
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self, SupplierError> {
        let df = CsvReadOptions::default()
            .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
            .finish()?;

        let races = Self::dataframe_to_races(&df)?;
        info!("Loaded {} races from {:?}", races.len(), csv_path.as_ref());
        Ok(Self { races })
    }

    pub fn races(&self) -> &[RaceRecord] {
        &self.races
    }

    fn dataframe_to_races(df: &DataFrame) -> Result<Vec<RaceRecord>, PolarsError> {
        let date_col = require(str_column(df, "date")?, "date")?;
        let season_col = require(int_column(df, "season")?, "season")?;
        let round_col = require(int_column(df, "round")?, "round")?;
        let entrant_col = require(str_column(df, "entrant_id")?, "entrant_id")?;
        let team_col = str_column(df, "team_id")?;
        let position_col = require(int_column(df, "position")?, "position")?;

        let location_col = str_column(df, "location")?;
        let laps_col = int_column(df, "laps")?;
        let distance_col = float_column(df, "distance_km")?;
        let circuit_type_col = str_column(df, "circuit_type")?;
        let temperature_col = float_column(df, "temperature")?;
        let condition_col = str_column(df, "condition")?;
        let rain_col = float_column(df, "rain_chance")?;
        let wind_col = float_column(df, "wind_speed")?;

        let mut races: BTreeMap<(i32, u32), RaceRecord> = BTreeMap::new();

        for i in 0..df.height() {
            let season = season_col.get(i).and_then(|v| i32::try_from(v).ok());
            let round = round_col.get(i).and_then(|v| u32::try_from(v).ok());
            let (Some(season), Some(round)) = (season, round) else {
                warn!("Skipping CSV row {}: missing or invalid season/round", i + 1);
                continue;
            };

            let race = races.entry((season, round)).or_insert_with(|| {
                let circuit = CircuitInfo {
                    laps: opt_i64(&laps_col, i)
                        .and_then(|v| u32::try_from(v).ok())
                        .unwrap_or(CircuitInfo::default().laps),
                    distance_km: opt_f64(&distance_col, i).unwrap_or(CircuitInfo::default().distance_km),
                    circuit_type: opt_str(&circuit_type_col, i).map(CircuitType::parse).unwrap_or_default(),
                };
                let defaults = WeatherInfo::default();
                let weather = WeatherInfo {
                    temperature: opt_f64(&temperature_col, i).unwrap_or(defaults.temperature),
                    condition: opt_str(&condition_col, i)
                        .map(WeatherCondition::parse)
                        .unwrap_or(defaults.condition),
                    rain_chance: opt_f64(&rain_col, i).unwrap_or(defaults.rain_chance),
                    wind_speed: opt_f64(&wind_col, i).unwrap_or(defaults.wind_speed),
                };
                RaceRecord {
                    date: date_col.get(i).and_then(parse_timestamp),
                    season,
                    round,
                    location: opt_str(&location_col, i).map(str::to_string),
                    circuit,
                    weather,
                    results: Vec::new(),
                }
            });

            if race.date.is_none() {
                race.date = date_col.get(i).and_then(parse_timestamp);
            }

            race.results.push(EntrantResult {
                entrant_id: entrant_col.get(i).unwrap_or("").trim().to_string(),
                team_id: opt_str(&team_col, i).unwrap_or("").trim().to_string(),
                position: position_col.get(i).and_then(|p| u32::try_from(p).ok()),
            });
        }

        Ok(races.into_values().collect())
    }
}

impl RaceSource for CsvRaceSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn races_for_year(&mut self, year: i32) -> Result<Vec<RaceRecord>, SupplierError> {
        Ok(self.races.iter().filter(|r| r.season == year).cloned().collect())
    }
}

fn require<T>(col: Option<T>, name: &str) -> Result<T, PolarsError> {
    col.ok_or_else(|| PolarsError::ColumnNotFound(format!("required column '{}' is missing", name).into()))
}

fn int_column(df: &DataFrame, name: &str) -> Result<Option<Int64Chunked>, PolarsError> {
    match df.column(name) {
        Ok(c) => Ok(Some(c.cast(&DataType::Int64)?.i64()?.clone())),
        Err(_) => Ok(None),
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>, PolarsError> {
    match df.column(name) {
        Ok(c) => Ok(Some(c.cast(&DataType::Float64)?.f64()?.clone())),
        Err(_) => Ok(None),
    }
}

// Numeric-looking id columns are inferred as integers, so cast everything to text
fn str_column(df: &DataFrame, name: &str) -> Result<Option<StringChunked>, PolarsError> {
    match df.column(name) {
        Ok(c) => Ok(Some(c.cast(&DataType::String)?.str()?.clone())),
        Err(_) => Ok(None),
    }
}

fn opt_i64(col: &Option<Int64Chunked>, i: usize) -> Option<i64> {
    col.as_ref().and_then(|c| c.get(i))
}

// NaN and infinities count as missing
fn opt_f64(col: &Option<Float64Chunked>, i: usize) -> Option<f64> {
    col.as_ref().and_then(|c| c.get(i)).filter(|v| v.is_finite())
}

fn opt_str(col: &Option<StringChunked>, i: usize) -> Option<&str> {
    col.as_ref().and_then(|c| c.get(i)).filter(|s| !s.trim().is_empty())
}
