//! Configuration for the query engine
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Engine configuration
///
/// Passed explicitly at construction time; there is no global state. The
/// model directory only matters for `load_model` calls that pass a bare file
/// name instead of a full path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory searched for model files given by relative name.
    ///
    /// When unset, relative names fall back to `~/.lexiq/models/`.
    pub model_dir: Option<PathBuf>,

    /// Capacity of the word-vector lookup cache (number of entries).
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            cache_capacity: 10_000,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        if let Some(dir) = &self.model_dir {
            if dir.as_os_str().is_empty() {
                return Err("model_dir cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Resolve a requested model path against the configured locations.
    ///
    /// An existing path is used as given. A relative name that does not exist
    /// on its own is searched in `model_dir`, or in `~/.lexiq/models/` when
    /// no directory is configured.
    pub fn resolve_model_path(&self, requested: &Path) -> io::Result<PathBuf> {
        if requested.exists() {
            return Ok(requested.to_path_buf());
        }

        if requested.is_relative() {
            let base = match &self.model_dir {
                Some(dir) => Some(dir.clone()),
                None => dirs::home_dir().map(|home| home.join(".lexiq").join("models")),
            };
            if let Some(base) = base {
                let candidate = base.join(requested);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("model file not found: {}", requested.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.model_dir.is_none());
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        // Valid config
        assert!(config.validate().is_ok());

        // Invalid: zero cache capacity
        config.cache_capacity = 0;
        assert!(config.validate().is_err());

        // Invalid: empty model directory
        config.cache_capacity = 100;
        config.model_dir = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.bin");
        std::fs::write(&model, b"stub").unwrap();

        let config = EngineConfig::default();
        let resolved = config.resolve_model_path(&model).unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn test_resolve_against_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.bin"), b"stub").unwrap();

        let config = EngineConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };
        let resolved = config.resolve_model_path(Path::new("model.bin")).unwrap();
        assert_eq!(resolved, dir.path().join("model.bin"));
    }

    #[test]
    fn test_resolve_missing_path() {
        let config = EngineConfig::default();
        let err = config
            .resolve_model_path(Path::new("/nonexistent/model.bin"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
