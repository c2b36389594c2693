//! On-disk dataset cache keyed by the requested seasons

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::dataset::Dataset;
use crate::data::features::{FeatureVector, NUM_FEATURES};
use crate::error::CacheError;
use crate::models::is_scored_position;

/// Serialized cache artifact: exactly the two arrays
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    features: Vec<Vec<f64>>,
    labels: Vec<i64>,
}

/// Cache key: the sorted, de-duplicated list of seasons
pub fn cache_key(years: &[i32]) -> Vec<i32> {
    let mut key = years.to_vec();
    key.sort_unstable();
    key.dedup();
    key
}

/// Cache file name for a set of seasons, e.g. `f1_data_cache_2023-2024.json`
pub fn cache_file_name(years: &[i32]) -> String {
    let key: Vec<String> = cache_key(years).iter().map(|y| y.to_string()).collect();
    format!("f1_data_cache_{}.json", key.join("-"))
}

/// Directory-backed store of assembled datasets
#[derive(Debug, Clone)]
pub struct DatasetCache {
    dir: PathBuf,
}

impl DatasetCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the artifact for a set of seasons
    pub fn path_for(&self, years: &[i32]) -> PathBuf {
        self.dir.join(cache_file_name(years))
    }

    /// Load a cached dataset
    ///
    /// `Ok(None)` when no artifact exists; `Err` when one exists but can't be
    /// used. Callers treat both as a miss.
    pub fn load(&self, years: &[i32]) -> Result<Option<Dataset>, CacheError> {
        let path = self.path_for(years);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(&path).map(Some)
    }

    /// Read and validate an artifact from an explicit path
    pub fn read_file(path: &Path) -> Result<Dataset, CacheError> {
        let content = fs::read_to_string(path)?;
        let file: CacheFile = serde_json::from_str(&content)?;
        Self::validate(file)
    }

    /// Write a dataset for a set of seasons, returning the artifact path
    ///
    /// Non-finite values have no JSON form; such a dataset is refused and
    /// nothing is written.
    pub fn save(&self, years: &[i32], dataset: &Dataset) -> Result<PathBuf, CacheError> {
        if let Some((row, col)) = first_non_finite(dataset) {
            return Err(CacheError::Invalid(format!(
                "row {} feature {} is not finite",
                row, col
            )));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(years);
        let file = CacheFile {
            features: dataset.features.iter().map(|f| f.to_vec()).collect(),
            labels: dataset.labels.iter().map(|&l| l as i64).collect(),
        };

        // Write a sibling temp file, then rename over the artifact
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&file)?)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    fn validate(file: CacheFile) -> Result<Dataset, CacheError> {
        if file.features.len() != file.labels.len() {
            return Err(CacheError::Invalid(format!(
                "{} feature rows but {} labels",
                file.features.len(),
                file.labels.len()
            )));
        }

        let mut features = Vec::with_capacity(file.features.len());
        for (i, row) in file.features.into_iter().enumerate() {
            let row: [f64; NUM_FEATURES] = row.try_into().map_err(|row: Vec<f64>| {
                CacheError::Invalid(format!("row {} has {} features, expected {}", i, row.len(), NUM_FEATURES))
            })?;
            features.push(FeatureVector(row));
        }

        let mut labels = Vec::with_capacity(file.labels.len());
        for (i, label) in file.labels.into_iter().enumerate() {
            let valid = u32::try_from(label).map(is_scored_position).unwrap_or(false);
            if !valid {
                return Err(CacheError::Invalid(format!("label {} out of range: {}", i, label)));
            }
            labels.push(label as u8);
        }

        Ok(Dataset { features, labels })
    }
}

fn first_non_finite(dataset: &Dataset) -> Option<(usize, usize)> {
    dataset.features.iter().enumerate().find_map(|(row, f)| {
        f.iter().position(|v| !v.is_finite()).map(|col| (row, col))
    })
}
