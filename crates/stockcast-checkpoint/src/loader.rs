//! Reads run directories back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::artifact::{TrainingArtifact, FORMAT_VERSION};
use crate::writer::RUN_TIMESTAMP_FORMAT;
use crate::{CheckpointError, Result, ARTIFACT_FILE};

/// Parses the `YYYYmmdd-HHMMSS` suffix of a run directory name.
pub fn parse_run_timestamp(dir_name: &str) -> Option<NaiveDateTime> {
    let (_, stamp) = dir_name.rsplit_once('_')?;
    NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()
}

/// Loads artifacts and locates runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Loads `artifact.json` from a run directory.
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::NotFound`] if the directory has no artifact
    /// - [`CheckpointError::Deserialization`] for malformed JSON
    /// - [`CheckpointError::VersionMismatch`] for an unknown format version
    pub fn load(run_dir: &Path) -> Result<TrainingArtifact> {
        let path = run_dir.join(ARTIFACT_FILE);
        info!(path = %path.display(), "loading training artifact");
        if !path.is_file() {
            return Err(CheckpointError::NotFound(path));
        }

        let json = fs::read_to_string(&path).map_err(CheckpointError::io(&path))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(CheckpointError::Deserialization)?;
        let found = value
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| CheckpointError::Corrupted("missing format_version".to_string()))?;
        if found != u64::from(FORMAT_VERSION) {
            return Err(CheckpointError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: u32::try_from(found).unwrap_or(u32::MAX),
            });
        }

        let artifact: TrainingArtifact =
            serde_json::from_value(value).map_err(CheckpointError::Deserialization)?;
        info!(
            path = %path.display(),
            model = artifact.model_name(),
            epochs = artifact.history.len(),
            "training artifact loaded"
        );
        Ok(artifact)
    }

    /// Completed runs under `model_dir`, oldest first.
    ///
    /// A run is a directory whose name ends in a timestamp suffix and that
    /// contains `artifact.json`. A missing `model_dir` yields no runs.
    pub fn list_runs(model_dir: &Path) -> Vec<(NaiveDateTime, PathBuf)> {
        let mut runs: Vec<(NaiveDateTime, PathBuf)> = fs::read_dir(model_dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let stamp = path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .and_then(parse_run_timestamp)?;
                path.join(ARTIFACT_FILE).is_file().then_some((stamp, path))
            })
            .collect();
        runs.sort();
        runs
    }

    /// The run directory with the newest timestamp suffix.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::NotFound`] if `model_dir` holds no runs.
    pub fn latest(model_dir: &Path) -> Result<PathBuf> {
        let (stamp, path) = Self::list_runs(model_dir)
            .pop()
            .ok_or_else(|| CheckpointError::NotFound(model_dir.to_path_buf()))?;
        info!(path = %path.display(), created_at = %stamp, "selected latest run");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_run_timestamp() {
        let stamp = parse_run_timestamp("LSTM_v1_20240105-093012").unwrap();
        assert_eq!(stamp.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-05 09:30:12");
        assert!(parse_run_timestamp("LSTM_v1").is_none());
        assert!(parse_run_timestamp("notes_2024").is_none());
        assert!(parse_run_timestamp("20240105-093012").is_none());
    }

    #[test]
    fn test_latest_ignores_incomplete_and_foreign_dirs() {
        let dir = tempdir().unwrap();
        for name in ["a_20240101-000000", "b_20240301-000000", "c_20231231-235959"] {
            let run = dir.path().join(name);
            fs::create_dir(&run).unwrap();
            fs::write(run.join(ARTIFACT_FILE), "{}").unwrap();
        }
        // Newer, but no artifact.json.
        fs::create_dir(dir.path().join("d_20250101-000000")).unwrap();
        fs::create_dir(dir.path().join("scratch")).unwrap();
        fs::write(dir.path().join("e_20260101-000000"), "not a dir").unwrap();

        let runs = ArtifactLoader::list_runs(dir.path());
        assert_eq!(runs.len(), 3);
        assert_eq!(
            ArtifactLoader::latest(dir.path()).unwrap(),
            dir.path().join("b_20240301-000000")
        );
    }

    #[test]
    fn test_latest_in_empty_or_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ArtifactLoader::latest(dir.path()),
            Err(CheckpointError::NotFound(_))
        ));
        assert!(ArtifactLoader::latest(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ArtifactLoader::load(dir.path()),
            Err(CheckpointError::NotFound(_))
        ));

        fs::write(dir.path().join(ARTIFACT_FILE), "{not json").unwrap();
        assert!(matches!(
            ArtifactLoader::load(dir.path()),
            Err(CheckpointError::Deserialization(_))
        ));

        fs::write(dir.path().join(ARTIFACT_FILE), r#"{"format_version": 7}"#).unwrap();
        assert!(matches!(
            ArtifactLoader::load(dir.path()),
            Err(CheckpointError::VersionMismatch {
                expected: 1,
                found: 7
            })
        ));

        fs::write(dir.path().join(ARTIFACT_FILE), r#"{"format_version": 1}"#).unwrap();
        assert!(matches!(
            ArtifactLoader::load(dir.path()),
            Err(CheckpointError::Deserialization(_))
        ));
    }
}
