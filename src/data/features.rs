//! Feature Engineering
//!
//! Turn an entrant's pre-race aggregates, recent form and the race context
//! into a fixed 24-value vector.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::data::history::RECENT_RACE_WINDOW;
use crate::data::stats::{EntrantStats, TeamStats};
use crate::models::{CircuitType, RaceRecord, WeatherCondition};

/// Number of values in every feature vector
pub const NUM_FEATURES: usize = 24;

/// Track-history score used for every race; no per-circuit history is kept
pub const TRACK_HISTORY_PLACEHOLDER: f64 = 0.5;

/// Value for a missing (zero) history position
const MISSING_POSITION_VALUE: f64 = 0.5;

// Normalization constants. Values may exceed 1.0 for extreme inputs.
const ENTRANT_POINTS_SCALE: f64 = 500.0;
const ENTRANT_COUNT_SCALE: f64 = 25.0;
const TEAM_POINTS_SCALE: f64 = 1000.0;
const TEAM_WINS_SCALE: f64 = 25.0;
const TEAM_PODIUMS_SCALE: f64 = 50.0;
const LAPS_SCALE: f64 = 100.0;
const DISTANCE_SCALE: f64 = 400.0;
const TEMPERATURE_SCALE: f64 = 50.0;
const RAIN_SCALE: f64 = 100.0;
const WIND_SCALE: f64 = 50.0;
const ROUNDS_PER_SEASON: f64 = 24.0;

/// Map a finishing position to (0, 1]: P1 = 1.0, P20 = 0.05
fn encode_position(position: f64) -> f64 {
    (21.0 - position) / 20.0
}

/// Encode one history slot; 0 means "no position" and maps to neutral
fn encode_history_slot(position: u32) -> f64 {
    if position == 0 {
        MISSING_POSITION_VALUE
    } else {
        encode_position(position as f64)
    }
}

/// One normalized training row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for FeatureVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Recent form (slots 1-5)
#[derive(Debug, Clone, PartialEq)]
pub struct FormFeatures {
    pub recent: [f64; RECENT_RACE_WINDOW],
}

/// Entrant standing (slots 6-9)
#[derive(Debug, Clone, PartialEq)]
pub struct EntrantFeatures {
    pub points: f64,
    pub wins: f64,
    pub podiums: f64,
    pub poles: f64,
}

/// Team standing (slots 10-12)
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFeatures {
    pub points: f64,
    pub wins: f64,
    pub podiums: f64,
}

/// Static race context (slots 13-23)
#[derive(Debug, Clone, PartialEq)]
pub struct RaceContextFeatures {
    pub laps: f64,
    pub distance: f64,
    pub is_street: f64,
    pub track_history: f64,
    pub temperature: f64,
    pub is_dry: f64,
    pub is_wet: f64,
    pub is_mixed: f64,
    pub rain_chance: f64,
    pub wind_speed: f64,
    pub season_progress: f64,
}

/// Complete feature set for one entrant in one race
#[derive(Debug, Clone, PartialEq)]
pub struct RaceFeatures {
    pub form: FormFeatures,
    pub entrant: EntrantFeatures,
    pub team: TeamFeatures,
    pub context: RaceContextFeatures,
    /// Slot 24
    pub avg_finish: f64,
}

impl RaceFeatures {
    /// Flatten in model input order
    pub fn to_vector(&self) -> FeatureVector {
        let f = &self.form.recent;
        FeatureVector([
            // Recent form (5)
            f[0],
            f[1],
            f[2],
            f[3],
            f[4],
            // Entrant (4)
            self.entrant.points,
            self.entrant.wins,
            self.entrant.podiums,
            self.entrant.poles,
            // Team (3)
            self.team.points,
            self.team.wins,
            self.team.podiums,
            // Circuit (4)
            self.context.laps,
            self.context.distance,
            self.context.is_street,
            self.context.track_history,
            // Weather (6)
            self.context.temperature,
            self.context.is_dry,
            self.context.is_wet,
            self.context.is_mixed,
            self.context.rain_chance,
            self.context.wind_speed,
            // Season (2)
            self.context.season_progress,
            self.avg_finish,
        ])
    }
}

/// Feature construction for entrant-race occurrences
pub struct FeatureEngineering;

impl FeatureEngineering {
    /// Build the feature vector for one entrant
    ///
    /// Pure function of its inputs. `entrant` and `team` must be snapshots
    /// taken before the race's own results were recorded, and `history` must
    /// only contain races dated before it.
    pub fn build(race: &RaceRecord, history: &[u32], entrant: &EntrantStats, team: &TeamStats) -> FeatureVector {
        Self::create_race_features(race, history, entrant, team).to_vector()
    }

    /// Build the structured feature set (before flattening)
    pub fn create_race_features(
        race: &RaceRecord,
        history: &[u32],
        entrant: &EntrantStats,
        team: &TeamStats,
    ) -> RaceFeatures {
        RaceFeatures {
            form: Self::create_form_features(history),
            entrant: EntrantFeatures {
                points: entrant.points as f64 / ENTRANT_POINTS_SCALE,
                wins: entrant.wins as f64 / ENTRANT_COUNT_SCALE,
                podiums: entrant.podiums as f64 / ENTRANT_COUNT_SCALE,
                poles: entrant.poles as f64 / ENTRANT_COUNT_SCALE,
            },
            team: TeamFeatures {
                points: team.points as f64 / TEAM_POINTS_SCALE,
                wins: team.wins as f64 / TEAM_WINS_SCALE,
                podiums: team.podiums as f64 / TEAM_PODIUMS_SCALE,
            },
            context: Self::create_context_features(race),
            avg_finish: encode_position(entrant.avg_finish),
        }
    }

    /// Encode the recency window; short input is treated as missing slots
    pub fn create_form_features(history: &[u32]) -> FormFeatures {
        let mut recent = [MISSING_POSITION_VALUE; RECENT_RACE_WINDOW];
        for (slot, &pos) in recent.iter_mut().zip(history) {
            *slot = encode_history_slot(pos);
        }
        FormFeatures { recent }
    }

    /// Encode circuit, weather and season progress
    pub fn create_context_features(race: &RaceRecord) -> RaceContextFeatures {
        let circuit = &race.circuit;
        let weather = &race.weather;
        let one_hot = |c: WeatherCondition| if weather.condition == c { 1.0 } else { 0.0 };

        RaceContextFeatures {
            laps: circuit.laps as f64 / LAPS_SCALE,
            distance: circuit.distance_km / DISTANCE_SCALE,
            is_street: if circuit.circuit_type == CircuitType::Street { 1.0 } else { 0.0 },
            track_history: TRACK_HISTORY_PLACEHOLDER,
            temperature: weather.temperature / TEMPERATURE_SCALE,
            is_dry: one_hot(WeatherCondition::Dry),
            is_wet: one_hot(WeatherCondition::Wet),
            is_mixed: one_hot(WeatherCondition::Mixed),
            rain_chance: weather.rain_chance / RAIN_SCALE,
            wind_speed: weather.wind_speed / WIND_SCALE,
            season_progress: race.round as f64 / ROUNDS_PER_SEASON,
        }
    }
}

/// Feature column names in vector order
pub fn feature_names() -> [&'static str; NUM_FEATURES] {
    [
        // Recent form (5)
        "recent_pos_1",
        "recent_pos_2",
        "recent_pos_3",
        "recent_pos_4",
        "recent_pos_5",
        // Entrant (4)
        "driver_points",
        "driver_wins",
        "driver_podiums",
        "driver_poles",
        // Team (3)
        "team_points",
        "team_wins",
        "team_podiums",
        // Circuit (4)
        "circuit_laps",
        "circuit_distance",
        "circuit_is_street",
        "track_history",
        // Weather (6)
        "temperature",
        "weather_dry",
        "weather_wet",
        "weather_mixed",
        "rain_chance",
        "wind_speed",
        // Season (2)
        "season_progress",
        "avg_finish",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CircuitInfo, EntrantResult, WeatherInfo};
    use chrono::{TimeZone, Utc};

    fn test_race() -> RaceRecord {
        RaceRecord::new(Utc.with_ymd_and_hms(2024, 4, 7, 5, 0, 0).unwrap(), 2024, 4)
            .with_result(EntrantResult::new("1", "Red Bull", 1))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_vector_length_and_names() {
        let v = FeatureEngineering::build(
            &test_race(),
            &[10; 5],
            &EntrantStats::default(),
            &TeamStats::default(),
        );
        assert_eq!(v.len(), NUM_FEATURES);
        assert_eq!(feature_names().len(), NUM_FEATURES);
        assert_eq!(feature_names()[0], "recent_pos_1");
        assert_eq!(feature_names()[23], "avg_finish");
    }

    #[test]
    fn test_history_encoding() {
        let form = FeatureEngineering::create_form_features(&[5, 1, 10, 10, 10]);
        assert_close(form.recent[0], 0.8);
        assert_close(form.recent[1], 1.0);
        for slot in &form.recent[2..] {
            assert_close(*slot, 0.55);
        }

        let form = FeatureEngineering::create_form_features(&[20, 0]);
        assert_close(form.recent[0], 0.05);
        assert_close(form.recent[1], 0.5);
        assert_close(form.recent[4], 0.5);
    }

    #[test]
    fn test_no_history_all_padding() {
        let v = FeatureEngineering::build(
            &test_race(),
            &[10; 5],
            &EntrantStats::default(),
            &TeamStats::default(),
        );
        for value in &v[0..5] {
            assert_close(*value, 0.55);
        }
    }

    #[test]
    fn test_default_race_context() {
        let v = FeatureEngineering::build(
            &test_race(),
            &[10; 5],
            &EntrantStats::default(),
            &TeamStats::default(),
        );

        // Zero aggregates
        for value in &v[5..12] {
            assert_close(*value, 0.0);
        }
        assert_close(v[12], 0.5); // 50 laps
        assert_close(v[13], 0.75); // 300 km
        assert_close(v[14], 0.0); // permanent
        assert_close(v[15], 0.5); // track history placeholder
        assert_close(v[16], 0.5); // 25 °C
        assert_close(v[17], 1.0); // dry
        assert_close(v[18], 0.0);
        assert_close(v[19], 0.0);
        assert_close(v[20], 0.0);
        assert_close(v[21], 0.0);
        assert_close(v[22], 4.0 / 24.0);
        assert_close(v[23], 0.525); // default average finish 10.5
    }

    #[test]
    fn test_standings_normalization() {
        let entrant = EntrantStats {
            points: 250,
            wins: 5,
            podiums: 10,
            poles: 0,
            team: "Red Bull".to_string(),
            positions: vec![1, 3],
            avg_finish: 2.0,
        };
        let team = TeamStats {
            points: 400,
            wins: 5,
            podiums: 20,
        };

        let v = FeatureEngineering::build(&test_race(), &[1; 5], &entrant, &team);
        assert_close(v[5], 0.5);
        assert_close(v[6], 0.2);
        assert_close(v[7], 0.4);
        assert_close(v[8], 0.0);
        assert_close(v[9], 0.4);
        assert_close(v[10], 0.2);
        assert_close(v[11], 0.4);
        assert_close(v[23], 0.95);
    }

    #[test]
    fn test_values_not_clamped() {
        let entrant = EntrantStats {
            points: 600,
            ..EntrantStats::default()
        };
        let v = FeatureEngineering::build(&test_race(), &[10; 5], &entrant, &TeamStats::default());
        assert_close(v[5], 1.2);
    }

    #[test]
    fn test_street_and_weather_one_hot() {
        let race = test_race()
            .with_circuit(CircuitInfo {
                laps: 78,
                distance_km: 260.0,
                circuit_type: CircuitType::Street,
            })
            .with_weather(WeatherInfo {
                temperature: 20.0,
                condition: WeatherCondition::Wet,
                rain_chance: 80.0,
                wind_speed: 10.0,
            });

        let ctx = FeatureEngineering::create_context_features(&race);
        assert_close(ctx.laps, 0.78);
        assert_close(ctx.distance, 0.65);
        assert_close(ctx.is_street, 1.0);
        assert_close(ctx.temperature, 0.4);
        assert_close(ctx.is_dry + ctx.is_wet + ctx.is_mixed, 1.0);
        assert_close(ctx.is_wet, 1.0);
        assert_close(ctx.rain_chance, 0.8);
        assert_close(ctx.wind_speed, 0.2);
    }

    #[test]
    fn test_unknown_weather_has_no_one_hot() {
        let race = test_race().with_weather(WeatherInfo {
            condition: WeatherCondition::Unknown,
            ..WeatherInfo::default()
        });
        let v = FeatureEngineering::build(&race, &[10; 5], &EntrantStats::default(), &TeamStats::default());
        assert_close(v[17] + v[18] + v[19], 0.0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let race = test_race();
        let entrant = EntrantStats::default();
        let team = TeamStats::default();
        let a = FeatureEngineering::build(&race, &[3, 4, 5, 6, 7], &entrant, &team);
        let b = FeatureEngineering::build(&race, &[3, 4, 5, 6, 7], &entrant, &team);
        assert_eq!(a, b);
    }
}
