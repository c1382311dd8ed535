//! Configuration for the `crm` binary.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! and `CRM_`-prefixed environment variables (`CRM_DATABASE_URL`,
//! `CRM_PASSWORD__MEMORY_KIB`, ...). A `.env` file is folded into the
//! environment by `main` before loading.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use crm_core::password::PasswordParams;
use serde::Deserialize;

const MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  /// Filesystem path of the database, optionally `sqlite://`-prefixed, or
  /// `:memory:`.
  pub database_url: String,
  /// Argon2 cost for passwords set from the command line.
  pub password:     PasswordParams,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self { database_url: "crm.db".into(), password: PasswordParams::default() }
  }
}

/// Where the store lives, resolved from `database_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  Memory,
  File(PathBuf),
}

impl CliConfig {
  /// Load from `path` (which need not exist) and the environment.
  pub fn load(path: &Path) -> Result<Self> {
    Self::from_source(config::File::from(path.to_path_buf()).required(false))
  }

  fn from_source<S>(file: S) -> Result<Self>
  where
    S: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(
        config::Environment::with_prefix("CRM")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn location(&self) -> Location {
    let raw = self.database_url.trim();
    let raw = raw.strip_prefix("sqlite://").unwrap_or(raw);
    if raw == MEMORY {
      Location::Memory
    } else {
      Location::File(expand_tilde(Path::new(raw)))
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
