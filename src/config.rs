//! Configuration loader for repair runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::reference::{DEFAULT_PLACEHOLDER_PATTERN, PlaceholderFilter};
use crate::selection::DEFAULT_SELECTION_FILE;

/// File name looked up in the working directory when no explicit config is given.
pub const DEFAULT_CONFIG_FILE: &str = "thumbnail-repair.config.json";

/// Environment variable naming the episode export to repair.
pub const STORE_ENV_VAR: &str = "THUMBNAIL_REPAIR_STORE";

/// Discoverable configuration for repair runs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepairConfig {
    /// JSON export of the episodes collection. Overridden by the CLI and environment.
    pub store_path: Option<PathBuf>,
    /// Static asset root containing the `uploads/` directory.
    pub uploads_dir: PathBuf,
    /// Image source rendered when an episode has nothing displayable.
    pub placeholder: String,
    /// Regular expressions identifying placeholder references.
    pub placeholder_patterns: Vec<String>,
    /// Optional selection file restricting which episodes are repaired.
    pub selection_file: Option<PathBuf>,
    /// Re-encode existing local uploads as data URIs before falling back.
    pub inline_uploads: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            uploads_dir: PathBuf::from("public"),
            placeholder: "/logo.jpg".into(),
            placeholder_patterns: vec![DEFAULT_PLACEHOLDER_PATTERN.into()],
            selection_file: None,
            inline_uploads: false,
        }
    }
}

/// Errors raised while loading or applying configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },
    /// Failed to parse the configuration file.
    Parse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
    /// A placeholder pattern is not a valid regular expression.
    Pattern(regex::Error),
    /// No store location was supplied anywhere.
    MissingStore,
}

impl RepairConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing or unreadable discovered file falls back to defaults.
    pub fn discover(dir: &Path) -> Self {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pick the store location: explicit argument, then environment, then config file.
    ///
    /// Fails with [`ConfigError::MissingStore`] when none of them is set.
    pub fn resolve_store_path(
        &self,
        explicit: Option<&Path>,
        env_value: Option<&str>,
    ) -> Result<PathBuf, ConfigError> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| {
                env_value
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .or_else(|| self.store_path.clone())
            .ok_or(ConfigError::MissingStore)
    }

    /// Compile the configured placeholder patterns.
    pub fn placeholder_filter(&self) -> Result<PlaceholderFilter, ConfigError> {
        PlaceholderFilter::new(&self.placeholder_patterns).map_err(ConfigError::Pattern)
    }

    /// Selection file for batch runs: `selectionFile` when set, otherwise
    /// [`DEFAULT_SELECTION_FILE`] in `config_dir`.
    pub fn selection_path(&self, config_dir: &Path) -> PathBuf {
        self.selection_file
            .clone()
            .unwrap_or_else(|| config_dir.join(DEFAULT_SELECTION_FILE))
    }

    /// Uploads root when inlining is enabled.
    pub fn inline_root(&self) -> Option<&Path> {
        self.inline_uploads.then_some(self.uploads_dir.as_path())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
            Self::Pattern(source) => write!(f, "invalid placeholder pattern: {source}"),
            Self::MissingStore => write!(
                f,
                "no episode store configured; pass --store, set {STORE_ENV_VAR} \
                 or add storePath to {DEFAULT_CONFIG_FILE}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Pattern(source) => Some(source),
            Self::MissingStore => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discover_falls_back_to_defaults() {
        let temp = tempdir().unwrap();
        assert_eq!(RepairConfig::discover(temp.path()), RepairConfig::default());

        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "not json").unwrap();
        assert_eq!(RepairConfig::discover(temp.path()), RepairConfig::default());
    }

    #[test]
    fn reads_partial_configuration() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            r#"{"storePath": "data/episodes.json", "inlineUploads": true}"#,
        )
        .unwrap();

        let config = RepairConfig::discover(temp.path());
        assert_eq!(config.store_path, Some(PathBuf::from("data/episodes.json")));
        assert!(config.inline_uploads);
        assert_eq!(config.placeholder, "/logo.jpg");
        assert_eq!(config.inline_root(), Some(Path::new("public")));
    }

    #[test]
    fn from_path_reports_errors() {
        let temp = tempdir().unwrap();
        let err = RepairConfig::from_path(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn store_path_precedence() {
        let config = RepairConfig {
            store_path: Some(PathBuf::from("from-config.json")),
            ..RepairConfig::default()
        };

        let explicit = config
            .resolve_store_path(Some(Path::new("cli.json")), Some("env.json"))
            .unwrap();
        assert_eq!(explicit, PathBuf::from("cli.json"));

        let env = config.resolve_store_path(None, Some("env.json")).unwrap();
        assert_eq!(env, PathBuf::from("env.json"));

        let configured = config.resolve_store_path(None, Some("  ")).unwrap();
        assert_eq!(configured, PathBuf::from("from-config.json"));
    }

    #[test]
    fn missing_store_is_an_error() {
        let err = RepairConfig::default()
            .resolve_store_path(None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingStore));
        assert!(err.to_string().contains(STORE_ENV_VAR));
    }

    #[test]
    fn selection_file_defaults_next_to_config() {
        let dir = Path::new("site");
        assert_eq!(
            RepairConfig::default().selection_path(dir),
            dir.join(DEFAULT_SELECTION_FILE)
        );

        let config = RepairConfig {
            selection_file: Some(PathBuf::from("custom.json")),
            ..RepairConfig::default()
        };
        assert_eq!(config.selection_path(dir), PathBuf::from("custom.json"));
    }

    #[test]
    fn compiles_placeholder_patterns() {
        let config = RepairConfig {
            placeholder_patterns: vec!["(".into()],
            ..RepairConfig::default()
        };
        assert!(matches!(
            config.placeholder_filter(),
            Err(ConfigError::Pattern(_))
        ));
        assert!(RepairConfig::default().placeholder_filter().is_ok());
    }
}
