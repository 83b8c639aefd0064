//! Layered settings: TOML file, then environment, then flags.
//!
//! `clap` folds environment variables into the flag values, so the layering
//! here is just "flag or env if given, else file, else default".

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use portal_client::ApiConfig;
use portal_core::{resume::DEFAULT_MAX_RESUME_BYTES, session::ViewerRole};
use portal_dashboard::{DashboardConfig, projection::DEFAULT_PAGE_SIZE};
use serde::Deserialize;

use crate::Args;

const DEFAULT_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ConfigFile {
  pub url:              Option<String>,
  pub username:         Option<String>,
  pub password:         Option<String>,
  pub token:            Option<String>,
  pub role:             Option<ViewerRole>,
  pub timeout_secs:     Option<u64>,
  pub page_size:        Option<usize>,
  pub max_resume_bytes: Option<usize>,
}

impl ConfigFile {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
  }
}

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
  pub api:       ApiConfig,
  pub username:  Option<String>,
  pub password:  Option<String>,
  pub token:     Option<String>,
  pub role:      Option<ViewerRole>,
  pub page_size: usize,
  pub dashboard: DashboardConfig,
}

impl Settings {
  pub fn resolve(args: &Args, file: ConfigFile) -> Self {
    let timeout = args
      .timeout
      .or(file.timeout_secs)
      .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Self {
      api:       ApiConfig {
        base_url: args
          .url
          .clone()
          .or(file.url)
          .unwrap_or_else(|| DEFAULT_URL.to_string()),
        timeout:  Duration::from_secs(timeout),
      },
      username:  args.user.clone().or(file.username),
      password:  args.password.clone().or(file.password),
      token:     args.token.clone().or(file.token),
      role:      args.role.or(file.role),
      page_size: file.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
      dashboard: DashboardConfig {
        max_resume_bytes: file.max_resume_bytes.unwrap_or(DEFAULT_MAX_RESUME_BYTES),
      },
    }
  }
}
