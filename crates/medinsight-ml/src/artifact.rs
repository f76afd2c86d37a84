//! Reading and writing the model artifact on disk.
//!
//! The artifact is a single JSON document. Writes land in a temporary file
//! beside the target and are renamed into place, so a reader never sees a
//! partially written model.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::ModelError;
use crate::model::NoShowModel;

/// Serialize `model` to `path`, replacing any existing artifact.
pub fn write(path: &Path, model: &NoShowModel) -> Result<(), ModelError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, model)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ModelError::Io(e.error))?;

    info!(path = %path.display(), trees = model.header.n_trees, "wrote model artifact");
    Ok(())
}

/// Deserialize the artifact at `path`.
pub fn read(path: &Path) -> Result<NoShowModel, ModelError> {
    let reader = BufReader::new(File::open(path)?);
    let model: NoShowModel = serde_json::from_reader(reader)?;

    if model.header.format_version != NoShowModel::FORMAT_VERSION {
        return Err(ModelError::UnsupportedArtifact {
            found: model.header.format_version,
            expected: NoShowModel::FORMAT_VERSION,
        });
    }

    info!(
        path = %path.display(),
        trees = model.header.n_trees,
        trained_at = %model.header.trained_at,
        "loaded model artifact"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestConfig;
    use medinsight_core::FeatureVector;

    fn model() -> NoShowModel {
        NoShowModel::train_fallback(ForestConfig {
            n_trees: 20,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn reloaded_model_predicts_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let original = model();
        write(&path, &original).unwrap();
        let reloaded = read(&path).unwrap();

        for fv in [
            FeatureVector::new(25, 5.0, 2, 0),
            FeatureVector::new(33, 9.3, 12, 1),
            FeatureVector::new(61, 14.0, 28, 3),
        ] {
            let before = original.no_show_probability(&fv).unwrap();
            let after = reloaded.no_show_probability(&fv).unwrap();
            assert!((before - after).abs() < 1e-12, "{fv:?}: {before} vs {after}");
        }
        assert_eq!(reloaded.header.trained_at, original.header.trained_at);
    }

    #[test]
    fn write_replaces_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"stale").unwrap();

        write(&path, &model()).unwrap();
        assert_eq!(read(&path).unwrap().header.n_trees, 20);
        // Only the artifact itself is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn missing_directory_fails_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/model.json");
        assert!(matches!(write(&path, &model()), Err(ModelError::Io(_))));
    }

    #[test]
    fn corrupt_artifact_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(read(&path), Err(ModelError::Json(_))));
    }

    #[test]
    fn newer_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut m = model();
        m.header.format_version = 99;
        write(&path, &m).unwrap();
        assert!(matches!(
            read(&path),
            Err(ModelError::UnsupportedArtifact {
                found: 99,
                expected: 1
            })
        ));
    }
}
