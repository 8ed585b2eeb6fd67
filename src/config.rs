//! Configuration file (`ijahshop.yaml`)
//!
//! Every key is optional:
//!
//! ```yaml
//! database: files/ijahshop.db
//! export_dir: files/data
//! import_dir: files
//! unresolved_reference: zero_id   # zero_id | skip_row | fail
//! ```

use crate::error::{IjahError, IjahResult};
use crate::interchange::UnresolvedReference;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// Directory export files are written to
    pub export_dir: PathBuf,
    /// Directory relative import paths are resolved against
    pub import_dir: PathBuf,
    pub unresolved_reference: UnresolvedReference,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("files/ijahshop.db"),
            export_dir: PathBuf::from("files/data"),
            import_dir: PathBuf::from("files"),
            unresolved_reference: UnresolvedReference::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> IjahResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            IjahError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    /// Relative workbook paths are looked up under `import_dir`
    pub fn resolve_import_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            file.to_path_buf()
        } else {
            self.import_dir.join(file)
        }
    }
}
