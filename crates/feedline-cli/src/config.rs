use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};

/// File name looked up inside the data directory when `--config` is absent.
pub const CONFIG_FILE: &str = "feedline.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub format: OutputFormat,
    pub color: bool,
    pub feed_limit: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".feedline"),
            format: OutputFormat::Text,
            color: true,
            feed_limit: 20,
        }
    }
}

impl CliConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    /// Config for one invocation: the file named by `--config` (or the one in
    /// the data directory), with command-line flags taking precedence.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => {
                let dir = cli
                    .data_dir
                    .clone()
                    .unwrap_or_else(|| Self::default().data_dir);
                Self::load(&dir.join(CONFIG_FILE))?
            }
        };
        if let Some(dir) = &cli.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(format) = cli.format {
            config.format = format;
        }
        Ok(config)
    }
}
