//! Command line handling for `notify-listen`
//!
//! ```text
//! notify-listen [--config <path>] [message-type ...]
//! ```
//!
//! The config path comes from `--config`, then `NOTIFY_CONFIG_PATH`, then
//! `config/notify.yaml`. Remaining arguments are message types to log.

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/notify.yaml";
pub const CONFIG_PATH_VAR: &str = "NOTIFY_CONFIG_PATH";

/// Parsed listener arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenArgs {
    /// Explicit `--config` path
    pub config: Option<PathBuf>,
    /// Message types whose payloads are logged
    pub kinds: Vec<String>,
}

impl ListenArgs {
    /// Parse from the process arguments
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse from an argument list without the program name
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            if arg == "--config" {
                let Some(path) = args.next() else {
                    bail!("--config requires a path");
                };
                parsed.config = Some(path.into());
            } else if let Some(path) = arg.strip_prefix("--config=") {
                parsed.config = Some(path.into());
            } else if arg.starts_with("--") {
                bail!("unknown option: {}", arg);
            } else {
                parsed.kinds.push(arg);
            }
        }

        Ok(parsed)
    }

    /// Resolved configuration path
    pub fn config_path(&self) -> PathBuf {
        resolve_config_path(self.config.clone(), std::env::var(CONFIG_PATH_VAR).ok())
    }
}

fn resolve_config_path(explicit: Option<PathBuf>, from_env: Option<String>) -> PathBuf {
    explicit
        .or_else(|| from_env.filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
