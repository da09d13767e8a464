//! Configuration for playgate.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PLAYGATE_SECRET_KEY, PLAYGATE_TOKEN_SALT,
//!    PLAYGATE_TOKEN_TTL_SECONDS, PLAYGATE_CATALOG)
//! 2. Config file (.playgate/config.yaml)
//! 3. Defaults (salt "playback", TTL 900s, ~/.playgate/catalog.json)
//!
//! The signing secret has no default. Startup fails without one.
//!
//! Config file discovery:
//! - Searches current directory and parents for .playgate/config.yaml
//! - The catalog path in the config file is relative to the project root

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{SigningContext, DEFAULT_SALT, DEFAULT_TTL_SECONDS};

pub const ENV_SECRET_KEY: &str = "PLAYGATE_SECRET_KEY";
pub const ENV_TOKEN_SALT: &str = "PLAYGATE_TOKEN_SALT";
pub const ENV_TOKEN_TTL: &str = "PLAYGATE_TOKEN_TTL_SECONDS";
pub const ENV_CATALOG: &str = "PLAYGATE_CATALOG";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub signing: SigningConfig,
    /// Catalog JSON path (relative to the project root)
    #[serde(default)]
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigningConfig {
    pub secret_key: Option<String>,
    pub salt: Option<String>,
    pub ttl_seconds: Option<u64>,
}

/// Resolved settings
#[derive(Clone)]
pub struct Settings {
    /// Signing secret (never printed)
    pub secret_key: String,
    /// Purpose salt
    pub salt: String,
    /// Default token lifetime in seconds
    pub ttl_seconds: u64,
    /// Catalog JSON path
    pub catalog: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("secret_key", &"<redacted>")
            .field("salt", &self.salt)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("catalog", &self.catalog)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl Settings {
    /// Load settings from the environment, config file and defaults
    pub fn load() -> Result<Self> {
        let config_file = find_config_file();
        let file = match config_file {
            Some(ref path) => Some(load_config_file(path)?),
            None => None,
        };

        Self::resolve(file, config_file, |key| std::env::var(key).ok())
    }

    /// Merge sources. `env` is injected so resolution is testable.
    pub fn resolve(
        file: Option<ConfigFile>,
        config_file: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();

        // An empty value counts as unset at every layer
        let secret_key = non_empty(env(ENV_SECRET_KEY))
            .or(non_empty(file.signing.secret_key))
            .with_context(|| {
                format!(
                    "Signing secret is not set. Set {} or signing.secret_key in config.yaml",
                    ENV_SECRET_KEY
                )
            })?;

        let salt = non_empty(env(ENV_TOKEN_SALT))
            .or(non_empty(file.signing.salt))
            .unwrap_or_else(|| DEFAULT_SALT.to_string());

        let ttl_seconds = match env(ENV_TOKEN_TTL) {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("{} must be a positive integer, got '{}'", ENV_TOKEN_TTL, raw)
            })?,
            None => file.signing.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS),
        };
        if ttl_seconds == 0 {
            anyhow::bail!("Token TTL must be a positive integer");
        }

        let catalog = resolve_catalog(file.catalog.as_deref(), config_file.as_deref(), &env)?;

        Ok(Self {
            secret_key,
            salt,
            ttl_seconds,
            catalog,
            config_file,
        })
    }

    /// Build the immutable signing context
    pub fn signing_context(&self) -> Result<SigningContext> {
        SigningContext::new(&self.secret_key, self.salt.clone(), self.ttl_seconds)
            .context("Failed to initialize signing context")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Catalog path only. Catalog maintenance does not need the signing secret.
pub fn load_catalog_path() -> Result<PathBuf> {
    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    resolve_catalog(file.catalog.as_deref(), config_file.as_deref(), |key| {
        std::env::var(key).ok()
    })
}

fn resolve_catalog(
    catalog: Option<&str>,
    config_file: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf> {
    if let Some(env_catalog) = non_empty(env(ENV_CATALOG)) {
        Ok(PathBuf::from(env_catalog))
    } else if let Some(catalog_path) = catalog {
        // Base directory is the parent of .playgate/ (i.e., grandparent of config.yaml)
        let base_dir = config_file
            .and_then(Path::parent)
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        Ok(resolve_path(base_dir, catalog_path))
    } else {
        Ok(default_home()?.join("catalog.json"))
    }
}

/// Default state directory (~/.playgate)
fn default_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".playgate"))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".playgate").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
