use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::roles::Role;
use crate::trainer::RoleWeightVector;

/// Role name to published weights. This is the whole on-disk artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightArtifact {
    pub roles: BTreeMap<Role, RoleWeightVector>,
}

impl WeightArtifact {
    pub fn get(&self, role: Role) -> Option<&RoleWeightVector> {
        self.roles.get(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }
}

impl FromIterator<(Role, RoleWeightVector)> for WeightArtifact {
    fn from_iter<I: IntoIterator<Item = (Role, RoleWeightVector)>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

pub fn render_artifact(artifact: &WeightArtifact) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

/// Replaces `path` with the artifact. The file is written beside the target
/// and renamed over it, so readers see either the old or the new content.
pub fn write_artifact(artifact: &WeightArtifact, path: &Path) -> Result<(), PipelineError> {
    let raw = render_artifact(artifact)?;
    let export_err = |source| PipelineError::Export {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(export_err)?;
    }
    let tmp = tmp_path(path);
    if let Err(err) = fs::write(&tmp, raw) {
        let _ = fs::remove_file(&tmp);
        return Err(export_err(err));
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(export_err(err));
    }
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<WeightArtifact> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse weight artifact {}", path.display()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::{FixedWeights, normalize_coefficients};

    fn vector(coeffs: [f64; 5]) -> RoleWeightVector {
        RoleWeightVector {
            derived: normalize_coefficients(&coeffs).unwrap(),
            fixed: FixedWeights::default(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("legend_weights_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn renders_two_space_indented_role_map() {
        let artifact = [(Role::Top, vector([1.0, 1.0, 1.0, 1.0, 4.0]))]
            .into_iter()
            .collect::<WeightArtifact>();
        let raw = render_artifact(&artifact).unwrap();
        let expected = r#"{
  "TOP": {
    "kda": 0.125,
    "damage": 0.125,
    "gold": 0.125,
    "vision": 0.125,
    "cs": 0.5,
    "objective": 0.1,
    "utility": 0.05
  }
}"#;
        assert_eq!(raw, expected);
    }

    #[test]
    fn write_replaces_and_loads_back() {
        let dir = scratch_dir("write");
        let path = dir.join("nested").join("scoring_weights.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale content that is longer than the new artifact body ......").unwrap();

        let artifact = [
            (Role::Support, vector([0.2, 0.1, 0.1, 0.5, 0.1])),
            (Role::Adc, vector([0.3, 0.4, 0.2, 0.05, 0.05])),
        ]
        .into_iter()
        .collect::<WeightArtifact>();
        write_artifact(&artifact, &path).unwrap();

        let loaded = load_artifact(&path).unwrap();
        assert_eq!(loaded, artifact);
        assert!(!tmp_path(&path).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = scratch_dir("parents");
        let path = dir.join("a").join("b").join("w.json");
        write_artifact(&WeightArtifact::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_rename_reports_export_and_removes_tmp() {
        let dir = scratch_dir("rename_fail");
        let path = dir.join("scoring_weights.json");
        // A directory at the target makes the rename fail after the tmp write.
        fs::create_dir_all(path.join("occupied")).unwrap();

        let err = write_artifact(&WeightArtifact::default(), &path).unwrap_err();
        assert!(matches!(err, PipelineError::Export { .. }));
        assert!(path.join("occupied").is_dir());
        assert!(!tmp_path(&path).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_rejects_incomplete_vectors() {
        let dir = scratch_dir("incomplete");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("w.json");
        fs::write(&path, r#"{"MID": {"kda": 1.0}}"#).unwrap();
        assert!(load_artifact(&path).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
