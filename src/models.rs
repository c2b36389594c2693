use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest classified position that produces a training row
pub const MIN_POSITION: u32 = 1;
/// Highest classified position that produces a training row
pub const MAX_POSITION: u32 = 20;

/// Default lap count when the supplier has no circuit data
pub const DEFAULT_LAPS: u32 = 50;
/// Default race distance in km when the supplier has no circuit data
pub const DEFAULT_DISTANCE_KM: f64 = 300.0;
/// Default ambient temperature (°C) when the supplier has no weather data
pub const DEFAULT_TEMPERATURE: f64 = 25.0;

/// Whether a classified finishing position is inside the scored range
pub fn is_scored_position(position: u32) -> bool {
    (MIN_POSITION..=MAX_POSITION).contains(&position)
}

/// Circuit layout type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitType {
    #[default]
    Permanent,
    Street,
}

impl CircuitType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "street" => CircuitType::Street,
            _ => CircuitType::Permanent,
        }
    }
}

/// Static circuit descriptor attached to a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitInfo {
    pub laps: u32,
    pub distance_km: f64,
    pub circuit_type: CircuitType,
}

impl Default for CircuitInfo {
    /// Nominal permanent circuit used when no circuit data is available
    fn default() -> Self {
        Self {
            laps: DEFAULT_LAPS,
            distance_km: DEFAULT_DISTANCE_KM,
            circuit_type: CircuitType::Permanent,
        }
    }
}

/// Track condition during the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    #[default]
    Dry,
    Wet,
    Mixed,
    /// Anything the supplier reported that we don't recognize
    Unknown,
}

impl WeatherCondition {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry" => WeatherCondition::Dry,
            "wet" => WeatherCondition::Wet,
            "mixed" => WeatherCondition::Mixed,
            _ => WeatherCondition::Unknown,
        }
    }
}

/// Weather descriptor attached to a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Ambient temperature in °C
    pub temperature: f64,
    pub condition: WeatherCondition,
    /// Rain probability in percent (0-100)
    pub rain_chance: f64,
    pub wind_speed: f64,
}

impl Default for WeatherInfo {
    /// Nominal dry race used when no weather data is available
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            condition: WeatherCondition::Dry,
            rain_chance: 0.0,
            wind_speed: 0.0,
        }
    }
}

/// One entrant's classified result in a race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrantResult {
    pub entrant_id: String,
    pub team_id: String,
    /// Final classified position; `None` when the supplier had no position
    pub position: Option<u32>,
}

impl EntrantResult {
    pub fn new(entrant_id: impl Into<String>, team_id: impl Into<String>, position: u32) -> Self {
        Self {
            entrant_id: entrant_id.into(),
            team_id: team_id.into(),
            position: Some(position),
        }
    }

    /// Position if it falls inside the scored range
    pub fn scored_position(&self) -> Option<u32> {
        self.position.filter(|&p| is_scored_position(p))
    }
}

/// A single race weekend as delivered by a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    /// Race start time; records without a date cannot be placed in time
    pub date: Option<DateTime<Utc>>,
    pub season: i32,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub circuit: CircuitInfo,
    #[serde(default)]
    pub weather: WeatherInfo,
    pub results: Vec<EntrantResult>,
}

impl RaceRecord {
    pub fn new(date: DateTime<Utc>, season: i32, round: u32) -> Self {
        Self {
            date: Some(date),
            season,
            round,
            location: None,
            circuit: CircuitInfo::default(),
            weather: WeatherInfo::default(),
            results: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitInfo) -> Self {
        self.circuit = circuit;
        self
    }

    pub fn with_weather(mut self, weather: WeatherInfo) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_result(mut self, result: EntrantResult) -> Self {
        self.results.push(result);
        self
    }

    /// Position of an entrant in this race, if classified in the scored range
    pub fn position_of(&self, entrant_id: &str) -> Option<u32> {
        self.results
            .iter()
            .find(|r| r.entrant_id == entrant_id)
            .and_then(EntrantResult::scored_position)
    }

    /// Short label for logging, e.g. "2024 R3 (Melbourne)"
    pub fn label(&self) -> String {
        match &self.location {
            Some(loc) => format!("{} R{} ({})", self.season, self.round, loc),
            None => format!("{} R{}", self.season, self.round),
        }
    }
}

/// Parse an ISO-8601 timestamp as delivered by the supplier
///
/// Accepts RFC 3339 with offset ("2024-03-02T15:00:00+00:00", "...Z"),
/// naive date-times (assumed UTC) and plain dates.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scored_position_range() {
        assert!(!is_scored_position(0));
        assert!(is_scored_position(1));
        assert!(is_scored_position(20));
        assert!(!is_scored_position(21));
    }

    #[test]
    fn test_entrant_result_scored_position() {
        assert_eq!(EntrantResult::new("1", "Red Bull", 3).scored_position(), Some(3));
        assert_eq!(EntrantResult::new("1", "Red Bull", 22).scored_position(), None);

        let missing = EntrantResult {
            entrant_id: "1".to_string(),
            team_id: "Red Bull".to_string(),
            position: None,
        };
        assert_eq!(missing.scored_position(), None);
    }

    #[test]
    fn test_defaults_are_nominal_placeholders() {
        let circuit = CircuitInfo::default();
        assert_eq!(circuit.laps, 50);
        assert!((circuit.distance_km - 300.0).abs() < 1e-9);
        assert_eq!(circuit.circuit_type, CircuitType::Permanent);

        let weather = WeatherInfo::default();
        assert!((weather.temperature - 25.0).abs() < 1e-9);
        assert_eq!(weather.condition, WeatherCondition::Dry);
    }

    #[test]
    fn test_parse_condition_and_circuit_type() {
        assert_eq!(WeatherCondition::parse("Wet"), WeatherCondition::Wet);
        assert_eq!(WeatherCondition::parse("mixed"), WeatherCondition::Mixed);
        assert_eq!(WeatherCondition::parse("snow"), WeatherCondition::Unknown);
        assert_eq!(CircuitType::parse("street"), CircuitType::Street);
        assert_eq!(CircuitType::parse(""), CircuitType::Permanent);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-02T15:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02T15:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02T15:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02 15:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-02"),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_position_of() {
        let date = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        let race = RaceRecord::new(date, 2024, 1)
            .with_result(EntrantResult::new("1", "Red Bull", 1))
            .with_result(EntrantResult::new("44", "Mercedes", 25));

        assert_eq!(race.position_of("1"), Some(1));
        assert_eq!(race.position_of("44"), None);
        assert_eq!(race.position_of("16"), None);
    }
}
