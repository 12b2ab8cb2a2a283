//! Persisted identifier of this host instance

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// File name of the instance state inside the state directory
pub const INSTANCE_FILE: &str = "instance.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceState {
    #[serde(default)]
    instance_id: Option<String>,
}

/// Identifier generated once per host and reused for every publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceId(String);

impl InstanceId {
    /// Load the identifier from `state_dir`, generating and saving one if absent
    pub fn load_or_create(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(INSTANCE_FILE);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| state_error(&path, e))?;
            let state: InstanceState =
                serde_json::from_str(&content).map_err(|e| state_error(&path, e))?;
            if let Some(id) = state.instance_id.filter(|id| !id.trim().is_empty()) {
                debug!(path = %path.display(), "loaded instance id");
                return Ok(Self(id));
            }
        }

        let id = Uuid::new_v4().to_string();
        std::fs::create_dir_all(state_dir).map_err(|e| state_error(&path, e))?;
        let state = InstanceState {
            instance_id: Some(id.clone()),
        };
        let content = serde_json::to_string_pretty(&state)?;
        std::fs::write(&path, content).map_err(|e| state_error(&path, e))?;
        info!(path = %path.display(), "generated new instance id");

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn state_error(path: &Path, err: impl std::fmt::Display) -> CoreError {
    CoreError::State {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_created_once_and_reused() {
        let temp = TempDir::new().unwrap();
        let state_dir = temp.path().join("state");

        let first = InstanceId::load_or_create(&state_dir).unwrap();
        assert!(Uuid::parse_str(first.as_str()).is_ok());
        assert!(state_dir.join(INSTANCE_FILE).exists());

        let second = InstanceId::load_or_create(&state_dir).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_id_is_kept() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(INSTANCE_FILE),
            r#"{"instanceId":"legacy-instance"}"#,
        )
        .unwrap();

        let id = InstanceId::load_or_create(temp.path()).unwrap();
        assert_eq!(id.as_str(), "legacy-instance");
    }

    #[test]
    fn test_empty_id_is_regenerated() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(INSTANCE_FILE), r#"{"instanceId":""}"#).unwrap();

        let id = InstanceId::load_or_create(temp.path()).unwrap();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(INSTANCE_FILE), "{").unwrap();

        assert!(matches!(
            InstanceId::load_or_create(temp.path()),
            Err(CoreError::State { .. })
        ));
    }
}
