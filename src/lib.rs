//! F1 Race - Leak-free feature construction for finishing-position models
//!
//! This library provides:
//! - Race record suppliers (OpenF1 API, CSV, in-memory)
//! - Rolling per-driver and per-team statistics
//! - Recency history and the 24-value feature vector
//! - Chronological dataset assembly with a JSON cache and CSV export
//!
//! Features of a race are computed only from races dated strictly before it.
//!
//! # Example
//!
//! ```no_run
//! use f1race::data::{CsvRaceSource, DatasetConfig, DatasetLoader};
//!
//! let mut source = CsvRaceSource::load("data/results.csv").unwrap();
//! let loader = DatasetLoader::new(DatasetConfig::default());
//! let dataset = loader.load(&mut source, &[2023, 2024]).unwrap();
//! println!("{} samples", dataset.len());
//! ```

pub mod data;
pub mod error;
pub mod models;
pub mod openf1;

// Re-export commonly used types
pub use data::{
    assemble, feature_names, CsvRaceSource, Dataset, DatasetAssembler, DatasetConfig, DatasetLoader,
    FeatureEngineering, FeatureVector, MemorySource, RaceSource, RollingStatsTracker, NUM_FEATURES,
};
pub use error::{CacheError, PipelineError, SupplierError};
pub use models::{CircuitInfo, CircuitType, EntrantResult, RaceRecord, WeatherCondition, WeatherInfo};
