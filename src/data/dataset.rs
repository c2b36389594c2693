//! Dataset Assembler
//!
//! Drives history lookup, feature construction and the statistics tracker over
//! a chronological stream of races.

use chrono::{DateTime, Utc};
use polars::prelude::{Column, CsvWriter, DataFrame, PolarsResult, SerWriter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::data::features::{feature_names, FeatureEngineering, FeatureVector, NUM_FEATURES};
use crate::data::history::{RecencyHistory, RECENT_RACE_WINDOW};
use crate::data::stats::RollingStatsTracker;
use crate::error::PipelineError;
use crate::models::RaceRecord;

/// Aligned features and finishing-position labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, features: FeatureVector, label: u8) {
        self.features.push(features);
        self.labels.push(label);
    }

    /// Min, max and mean label, or `None` when empty
    pub fn label_summary(&self) -> Option<(u8, u8, f64)> {
        let min = *self.labels.iter().min()?;
        let max = *self.labels.iter().max()?;
        let mean = self.labels.iter().map(|&l| l as f64).sum::<f64>() / self.labels.len() as f64;
        Some((min, max, mean))
    }

    /// Convert to a DataFrame with one column per feature plus `position`
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = feature_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<f64> = self.features.iter().map(|row| row.0[i]).collect();
                Column::new((*name).into(), values)
            })
            .collect();
        let labels: Vec<u32> = self.labels.iter().map(|&l| l as u32).collect();
        columns.push(Column::new("position".into(), labels));
        DataFrame::new(columns)
    }

    /// Write the dataset as CSV (feature columns then `position`)
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        Ok(())
    }
}

/// Assembly settings
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Number of prior results in the recency window
    pub history_window: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            history_window: RECENT_RACE_WINDOW,
        }
    }
}

/// A scored row waiting for the tracker update of its race
struct PendingResult {
    entrant_id: String,
    team_id: String,
    position: u32,
}

/// Builds the training corpus from race records
///
/// Owns the tracker and history for a single run; construct a new assembler
/// for every run.
pub struct DatasetAssembler {
    config: AssemblerConfig,
    tracker: RollingStatsTracker,
    history: RecencyHistory,
    /// Results featurized at `pending_date` but not yet applied to the tracker
    pending: Vec<PendingResult>,
    pending_date: Option<DateTime<Utc>>,
}

impl Default for DatasetAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl DatasetAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            tracker: RollingStatsTracker::new(),
            history: RecencyHistory::new(),
            pending: Vec::new(),
            pending_date: None,
        }
    }

    /// Assemble a dataset from race records in any order
    ///
    /// Records are sorted by date. Records without a date and results without
    /// an entrant id are skipped with a warning; unscored positions produce
    /// no row. Fails only when nothing usable remains.
    pub fn assemble(mut self, records: Vec<RaceRecord>) -> Result<Dataset, PipelineError> {
        let total = records.len();
        let mut dated: Vec<RaceRecord> = records
            .into_iter()
            .filter(|r| {
                if r.date.is_none() {
                    warn!("Skipping {}: no race date", r.label());
                }
                r.date.is_some()
            })
            .collect();
        dated.sort_by_key(|r| r.date);

        let mut dataset = Dataset::default();
        for race in dated {
            self.process_race(race, &mut dataset);
        }
        self.flush_pending();

        if dataset.is_empty() {
            return Err(PipelineError::EmptyDataset { races: total });
        }

        info!(
            "Assembled {} rows with {} features from {} races ({} drivers, {} teams)",
            dataset.len(),
            NUM_FEATURES,
            self.history.len(),
            self.tracker.entrant_count(),
            self.tracker.team_count()
        );
        Ok(dataset)
    }

    /// Featurize one race from pre-race state
    ///
    /// Tracker updates are deferred until a race with a later date arrives, so
    /// races sharing a start time all see the same snapshot.
    fn process_race(&mut self, race: RaceRecord, dataset: &mut Dataset) {
        let Some(date) = race.date else {
            return;
        };
        if self.pending_date.is_some_and(|d| d < date) {
            self.flush_pending();
        }

        let mut rows = 0;
        for result in &race.results {
            if result.entrant_id.trim().is_empty() {
                warn!("Skipping result without entrant id in {}", race.label());
                continue;
            }
            let Some(position) = result.scored_position() else {
                debug!(
                    "{}: entrant {} unclassified ({:?})",
                    race.label(),
                    result.entrant_id,
                    result.position
                );
                continue;
            };

            let history = self
                .history
                .history(&result.entrant_id, date, self.config.history_window);
            let entrant = self.tracker.read(&result.entrant_id);
            let team = self.tracker.read_team(&result.team_id);
            let features = FeatureEngineering::build(&race, &history, &entrant, &team);

            dataset.push(features, position as u8);
            self.pending.push(PendingResult {
                entrant_id: result.entrant_id.clone(),
                team_id: result.team_id.clone(),
                position,
            });
            rows += 1;
        }

        if rows == 0 {
            debug!("Skipping {}: no usable results", race.label());
            return;
        }

        debug!("{}: {} drivers featurized", race.label(), rows);
        self.pending_date = Some(date);
        self.history.push(race);
    }

    fn flush_pending(&mut self) {
        for p in self.pending.drain(..) {
            self.tracker.update(&p.entrant_id, &p.team_id, p.position);
        }
        self.pending_date = None;
    }
}

/// Assemble with default settings
pub fn assemble(records: Vec<RaceRecord>) -> Result<Dataset, PipelineError> {
    DatasetAssembler::default().assemble(records)
}
