use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::graph::BuildOptions;
use crate::layout::{ForceConfig, TreeConfig};

/// Everything the CLI, server and watcher read from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub vault: VaultConfig,
    #[serde(default)]
    pub graph: BuildOptions,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub force: ForceConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Where the notes live
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Root directory of the note collection.
    pub root: PathBuf,
    /// File extensions (without dot) that count as documents.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// JSON surface bind port and CORS allow-list.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Hard cap on `tree.max_depth`; tree size can double per level.
const MAX_TREE_DEPTH: usize = 16;

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_http_port() -> u16 {
    8080
}

fn default_allowed_origins() -> Vec<String> {
    // Empty allows any origin (local renderer)
    vec![]
}

impl Config {
    /// Read `$NOTEGRAPH_CONFIG`, falling back to `./config.toml`. A `.env` file,
    /// if present, is applied first so it can set `NOTEGRAPH_CONFIG`.
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("NOTEGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_path(&config_path)
    }

    /// Load and validate a specific config file.
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Reject values the layouts cannot work with.
    fn validate(&self) -> Result<()> {
        if !self.vault.root.exists() {
            anyhow::bail!(
                "vault.root path does not exist: {}. Set vault.root in config.toml to your notes directory.",
                self.vault.root.display()
            );
        }

        if !self.vault.root.is_dir() {
            anyhow::bail!(
                "vault.root must be a directory, not a file: {}",
                self.vault.root.display()
            );
        }

        if self.vault.extensions.is_empty() {
            anyhow::bail!("vault.extensions must list at least one extension");
        }

        if self.tree.max_depth == 0 || self.tree.max_depth > MAX_TREE_DEPTH {
            anyhow::bail!("tree.max_depth must be between 1 and {}", MAX_TREE_DEPTH);
        }

        self.tree
            .validate()
            .map_err(|e| anyhow::anyhow!("[tree] {}", e))?;

        if self.force.damping <= 0.0 || self.force.damping >= 1.0 {
            anyhow::bail!("force.damping must be between 0.0 and 1.0 (exclusive)");
        }

        if self.force.max_ticks == 0 {
            anyhow::bail!("force.max_ticks must be greater than 0");
        }

        if self.force.rest_length <= 0.0 || self.force.node_radius <= 0.0 {
            anyhow::bail!("force.rest_length and force.node_radius must be positive");
        }

        Ok(())
    }

    /// Get the vault root
    pub fn vault_root(&self) -> &Path {
        &self.vault.root
    }
}
