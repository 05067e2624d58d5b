//! The on-disk dataset: an append-only CSV of labeled feature vectors.
//!
//! One row per sample, 64 comma-separated fields: 63 feature values followed
//! by one label token. No header, no schema version. Rows are never mutated
//! or deleted by this pipeline.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{ensure, Context, Result};

use crate::feature::{FeatureVector, FEATURE_LEN};

/// One labeled feature vector, immutable once written.
#[derive(Debug, Clone)]
pub struct Sample {
    pub features: FeatureVector,
    pub label: String,
}

/// Appends one sample row to the dataset at `path`.
///
/// The file is opened for append and closed again within this call; no
/// handle persists across captures, so a kill between captures cannot leave
/// a partially buffered row behind. Parent directories are created as
/// needed. Feature values are written with Rust's shortest round-trip float
/// formatting, so reloading reproduces the exact `f32` values.
pub fn append(path: &Path, vector: &FeatureVector, label: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dataset directory `{}`", parent.display()))?;
        }
    }

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open dataset `{}` for append", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    let mut record = Vec::with_capacity(FEATURE_LEN + 1);
    for value in vector.as_slice() {
        record.push(value.to_string());
    }
    record.push(label.to_string());
    writer.write_record(&record)?;
    writer.flush()?;
    Ok(())
}

/// Loads every sample from the dataset at `path`.
///
/// Any malformed row (wrong field count, unparseable feature, empty label)
/// fails the whole load; training must not proceed on a partially read
/// dataset.
pub fn load(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open dataset `{}`", path.display()))?;

    let mut samples = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record.with_context(|| format!("dataset row {row} is unreadable"))?;
        ensure!(
            record.len() == FEATURE_LEN + 1,
            "dataset row {row} has {} fields, expected {}",
            record.len(),
            FEATURE_LEN + 1,
        );

        let mut values = [0.0f32; FEATURE_LEN];
        for (j, (slot, field)) in values.iter_mut().zip(record.iter()).enumerate() {
            *slot = field.parse().with_context(|| {
                format!("dataset row {row}, field {}: `{field}` is not a number", j + 1)
            })?;
        }
        let label = record
            .get(FEATURE_LEN)
            .with_context(|| format!("dataset row {row} is missing its label"))?;
        ensure!(!label.is_empty(), "dataset row {row} has an empty label");

        let features = FeatureVector::from_slice(&values)
            .with_context(|| format!("dataset row {row} has an invalid feature vector"))?;
        samples.push(Sample {
            features,
            label: label.to_string(),
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vector(fill: f32) -> FeatureVector {
        FeatureVector::from_slice(&[fill; FEATURE_LEN]).unwrap()
    }

    #[test]
    fn append_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");

        let mut values = [0.0f32; FEATURE_LEN];
        values[0] = 0.1;
        values[1] = -1.5e-7;
        values[2] = 0.123_456_79;
        let vector = FeatureVector::from_slice(&values).unwrap();

        append(&path, &vector, "A").unwrap();
        append(&path, &self::vector(1.0), "7").unwrap();

        let samples = load(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].features, vector);
        assert_eq!(samples[0].label, "A");
        assert_eq!(samples[1].label, "7");
    }

    #[test]
    fn appends_are_monotonic_64_field_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");

        for i in 0..5 {
            append(&path, &vector(i as f32), "B").unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 5);
        for row in rows {
            assert_eq!(row.split(',').count(), FEATURE_LEN + 1);
        }
    }

    #[test]
    fn append_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("signs.csv");
        append(&path, &vector(0.0), "A").unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);
    }

    #[test]
    fn load_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");
        fs::write(&path, "0.5,0.5,A\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn load_rejects_non_numeric_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");
        let mut row = vec!["0.5"; FEATURE_LEN];
        row[10] = "not-a-number";
        row.push("A");
        fs::write(&path, row.join(",") + "\n").unwrap();
        assert!(load(&path).is_err());
    }
}
