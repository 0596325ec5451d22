use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::features::FeatureArtifacts;
use crate::types::Result;

/// Persists the three derived records as pretty-printed JSON documents in
/// the output directory.
pub fn write_artifacts(output_dir: &Path, artifacts: &FeatureArtifacts) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    write_json(&output_dir.join("features_prediction.json"), &artifacts.prediction)?;
    write_json(&output_dir.join("features_founder.json"), &artifacts.founder)?;
    write_json(&output_dir.join("features_external.json"), &artifacts.external)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path = %path.display(), "wrote feature artifact");
    Ok(())
}
