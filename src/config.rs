// Retention configuration (retention.toml) and built-in defaults

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Registry path prepended to every component name
pub const DEFAULT_REPOSITORY_PREFIX: &str = "878239241975.dkr.ecr.us-east-2.amazonaws.com/";

/// Image families tracked when no config file overrides them
pub const DEFAULT_COMPONENTS: &[&str] = &[
    "omnilife-tonguecapture-dummy",
    "reportautomationbackend-dummy",
    "theomnilifecoreapi-dummy",
    "theomnilife-frontend-dummy",
    "activity-dashboard",
];

/// Number of timestamp tags kept per component
pub const DEFAULT_KEEP: usize = 6;

pub const DEFAULT_CONTAINER_CLI: &str = "docker";

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "retention.toml";

/// Environment variable overriding the container CLI
pub const CONTAINER_CLI_ENV: &str = "RETENTION_CONTAINER_CLI";

/// Read an environment variable, treating empty strings as if the variable is not set.
pub(crate) fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// On-disk representation of retention.toml
#[derive(Debug, Deserialize, Default)]
pub struct RetentionFile {
    /// Optional version (must be 1 if present)
    pub version: Option<u32>,

    /// Registry path prefix, e.g. "registry.example.com/team/"
    pub repository_prefix: Option<String>,

    /// Component names (image families) to retag and prune
    pub components: Option<Vec<String>>,

    /// Number of timestamp tags to keep per component
    pub keep: Option<usize>,

    /// Container CLI to use (docker or podman)
    pub container_cli: Option<String>,
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub container_cli: Option<String>,
    pub keep: Option<usize>,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    pub repository_prefix: String,
    pub components: Vec<String>,
    pub keep: usize,
    pub container_cli: String,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            repository_prefix: DEFAULT_REPOSITORY_PREFIX.to_string(),
            components: DEFAULT_COMPONENTS.iter().map(|c| c.to_string()).collect(),
            keep: DEFAULT_KEEP,
            container_cli: DEFAULT_CONTAINER_CLI.to_string(),
        }
    }
}

impl RetentionConfig {
    /// Merge config file, environment and CLI overrides.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Built-in defaults
    pub fn resolve(file: Option<RetentionFile>, overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with_env(file, overrides, env_var_non_empty(CONTAINER_CLI_ENV))
    }

    fn resolve_with_env(
        file: Option<RetentionFile>,
        overrides: &ConfigOverrides,
        env_container_cli: Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let file = file.unwrap_or_default();

        let config = Self {
            repository_prefix: file
                .repository_prefix
                .unwrap_or(defaults.repository_prefix),
            components: file.components.unwrap_or(defaults.components),
            keep: overrides.keep.or(file.keep).unwrap_or(defaults.keep),
            container_cli: overrides
                .container_cli
                .clone()
                .or(env_container_cli)
                .or(file.container_cli)
                .unwrap_or(defaults.container_cli),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.keep == 0 {
            bail!("keep must be at least 1");
        }
        if self.components.is_empty() {
            bail!("At least one component must be configured");
        }
        if let Some(empty) = self.components.iter().position(|c| c.trim().is_empty()) {
            bail!("Component #{} has an empty name", empty + 1);
        }
        if self.container_cli.trim().is_empty() {
            bail!("container_cli must not be empty");
        }
        Ok(())
    }
}

/// Load retention.toml.
///
/// With an explicit path the file must exist. Without one, `retention.toml` in
/// the working directory is used if present and Ok(None) is returned otherwise.
/// Returns Err if the file cannot be read or parsed, or if version is unsupported.
pub fn load_retention_file(explicit: Option<&Path>) -> Result<Option<RetentionFile>> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file '{}' does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                return Ok(None);
            }
            path.to_path_buf()
        }
    };

    info!("Loading retention config from {}", path.display());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_retention_file(&content, &path).map(Some)
}

fn parse_retention_file(content: &str, path: &Path) -> Result<RetentionFile> {
    // Deserialize and collect any unused fields
    let mut unused_fields = Vec::new();
    let deserializer = toml::Deserializer::new(content);
    let file: RetentionFile = serde_ignored::deserialize(deserializer, |field| {
        unused_fields.push(field.to_string());
    })
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    for field in &unused_fields {
        warn!(
            "Unknown configuration field in {}: {}",
            path.display(),
            field
        );
    }

    if let Some(version) = file.version {
        if version != 1 {
            bail!(
                "Unsupported retention.toml version: {}. This tool supports version 1.",
                version
            );
        }
    } else {
        debug!("No version specified in {}, using latest", path.display());
    }

    Ok(file)
}
