//! CLI configuration: an optional TOML file overlaid with `PAWLOG_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite database file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Recorded as `created_by` / `owner_id` / `fed_by` on new entries.
  #[serde(default = "default_owner")]
  pub owner:      String,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/pawlog/pawlog.db") }

fn default_owner() -> String { "local".to_owned() }

/// Load `path` (missing file is fine) and the environment.
pub fn load(path: &Path) -> anyhow::Result<CliConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("PAWLOG"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
