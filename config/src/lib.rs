//! Evaluation settings and security-policy selection for a run (§4.9).
//!
//! Grounded on the teacher's `forge-config`/`ForgeConfig::load` shape: a
//! best-effort TOML file under the user's home directory, deserialized into
//! an `Option<Self>` rather than failing the caller when no file exists.
//! Policy *resolution* (turning the configured name into a concrete
//! [`camel_tools::SecurityPolicyEngine`]) is strict, since an unknown name
//! is a configuration mistake worth surfacing rather than silently denying
//! every call at run time.

pub mod errors;

use std::path::{Path, PathBuf};

use camel_tools::SecurityPolicyEngine;
pub use errors::ConfigError;
use serde::Deserialize;

/// The settings a host reads before starting a run: which demo policy
/// engine to gate tool calls with, and whether to run in strict evaluation
/// mode (§6.5).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    pub policy: Option<String>,
    pub strict: Option<bool>,
}

impl RunConfig {
    /// Load `~/.camel/config.toml`, if present and well-formed. A missing
    /// file is not an error — callers fall back to defaults — but a
    /// present-and-malformed one is logged and treated as absent, matching
    /// the teacher's `ForgeConfig::load`.
    #[must_use]
    pub fn load() -> Option<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("failed to load config at {path:?}: {err}");
                None
            }
        }
    }

    /// Load a specific TOML file, surfacing read/parse failures instead of
    /// swallowing them — used by the CLI's explicit `--config` flag and by
    /// tests, where a bad path should be reported rather than silently
    /// falling back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn policy_name(&self) -> &str {
        self.policy.as_deref().unwrap_or("none")
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    /// Resolve this config's policy name to a concrete engine (§4.9).
    pub fn policy_engine(&self) -> Result<SecurityPolicyEngine, ConfigError> {
        resolve_policy(self.policy_name())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".camel").join("config.toml"))
}

/// Resolve a policy name to its concrete engine (§4.8, §4.9).
pub fn resolve_policy(name: &str) -> Result<SecurityPolicyEngine, ConfigError> {
    match name {
        "none" => Ok(camel_tools::policies::none::engine()),
        "banking" => Ok(camel_tools::policies::banking::engine()),
        "document-sharing" => Ok(camel_tools::policies::document_sharing::engine()),
        other => Err(ConfigError::UnknownPolicy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_no_op_policy() {
        let config = RunConfig::default();
        assert_eq!(config.policy_name(), "none");
        assert!(!config.is_strict());
        assert_eq!(config.policy_engine().unwrap().name, "none");
    }

    #[test]
    fn resolves_each_known_policy_name() {
        assert_eq!(resolve_policy("none").unwrap().name, "none");
        assert_eq!(resolve_policy("banking").unwrap().name, "banking");
        assert_eq!(resolve_policy("document-sharing").unwrap().name, "document-sharing");
    }

    #[test]
    fn unknown_policy_name_is_an_error() {
        assert!(matches!(
            resolve_policy("travel"),
            Err(ConfigError::UnknownPolicy(name)) if name == "travel"
        ));
    }

    #[test]
    fn load_from_parses_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "policy = \"banking\"\nstrict = true\n").unwrap();
        let config = RunConfig::load_from(&path).unwrap();
        assert_eq!(config.policy_name(), "banking");
        assert!(config.is_strict());
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(RunConfig::load_from(&path).is_err());
    }
}
