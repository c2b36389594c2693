//! Race records, rolling statistics and feature construction

pub mod cache;
pub mod dataset;
pub mod features;
pub mod history;
pub mod loader;
pub mod source;
pub mod stats;

// Re-export commonly used types
pub use cache::{cache_file_name, DatasetCache};
pub use dataset::{assemble, AssemblerConfig, Dataset, DatasetAssembler};
pub use features::{feature_names, FeatureEngineering, FeatureVector, NUM_FEATURES};
pub use history::{RecencyHistory, HISTORY_PAD_POSITION, RECENT_RACE_WINDOW};
pub use loader::{fetch_seasons, DatasetConfig, DatasetLoader, SeasonProgress};
pub use source::{CsvRaceSource, MemorySource, RaceSource};
pub use stats::{points_for_position, EntrantStats, RollingStatsTracker, TeamStats};
