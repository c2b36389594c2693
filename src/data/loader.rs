//! Season-range driver: cache lookup, per-season fetch, assembly

use std::path::PathBuf;
use tracing::{info, warn};

use crate::data::cache::{cache_key, DatasetCache};
use crate::data::dataset::{AssemblerConfig, Dataset, DatasetAssembler};
use crate::data::source::RaceSource;
use crate::error::PipelineError;
use crate::models::RaceRecord;

/// Dataset loading settings
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub assembler: AssemblerConfig,
    /// Directory for cached datasets
    pub cache_dir: PathBuf,
    /// Read and write the cache
    pub use_cache: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            assembler: AssemblerConfig::default(),
            cache_dir: PathBuf::from("data/cache"),
            use_cache: true,
        }
    }
}

/// Outcome of fetching one season
#[derive(Debug, Clone, PartialEq)]
pub enum SeasonProgress {
    /// Season fetched with this many races
    Fetched { year: i32, races: usize },
    /// Season could not be fetched and was skipped
    Failed { year: i32 },
}

/// Builds a dataset for a list of seasons
pub struct DatasetLoader {
    config: DatasetConfig,
}

impl DatasetLoader {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    fn cache(&self) -> Option<DatasetCache> {
        self.config
            .use_cache
            .then(|| DatasetCache::new(&self.config.cache_dir))
    }

    /// Load a dataset for `years`, from cache when possible
    pub fn load<S: RaceSource + ?Sized>(&self, source: &mut S, years: &[i32]) -> Result<Dataset, PipelineError> {
        self.load_with_progress(source, years, |_| {})
    }

    /// Like [`load`](Self::load), reporting each season as it is fetched
    pub fn load_with_progress<S, F>(&self, source: &mut S, years: &[i32], on_season: F) -> Result<Dataset, PipelineError>
    where
        S: RaceSource + ?Sized,
        F: FnMut(SeasonProgress),
    {
        let years = cache_key(years);
        let cache = self.cache();

        if let Some(cache) = &cache {
            match cache.load(&years) {
                Ok(Some(dataset)) => {
                    info!(
                        "Loaded {} samples from cache {:?}",
                        dataset.len(),
                        cache.path_for(&years)
                    );
                    return Ok(dataset);
                }
                Ok(None) => {}
                Err(e) => warn!("Cache file corrupted, recomputing: {}", e),
            }
        }

        let records = fetch_seasons(source, &years, on_season);
        let dataset = DatasetAssembler::new(self.config.assembler.clone()).assemble(records)?;

        if let Some((min, max, mean)) = dataset.label_summary() {
            info!(
                "Position distribution: min={}, max={}, mean={:.2}",
                min, max, mean
            );
        }

        if let Some(cache) = &cache {
            match cache.save(&years, &dataset) {
                Ok(path) => info!("Cache saved to {:?}", path),
                Err(e) => warn!("Failed to save cache: {}", e),
            }
        }

        Ok(dataset)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(DatasetConfig::default())
    }
}

/// Fetch every season, skipping the ones the source can't deliver
pub fn fetch_seasons<S, F>(source: &mut S, years: &[i32], mut on_season: F) -> Vec<RaceRecord>
where
    S: RaceSource + ?Sized,
    F: FnMut(SeasonProgress),
{
    let mut records = Vec::new();
    for &year in years {
        info!("Processing year {} from {}", year, source.name());
        match source.races_for_year(year) {
            Ok(races) => {
                if races.is_empty() {
                    warn!("No races found for {}", year);
                } else {
                    info!("Found {} races for {}", races.len(), year);
                }
                on_season(SeasonProgress::Fetched {
                    year,
                    races: races.len(),
                });
                records.extend(races);
            }
            Err(e) => {
                warn!("Error processing year {}: {}", year, e);
                on_season(SeasonProgress::Failed { year });
            }
        }
    }
    records
}
