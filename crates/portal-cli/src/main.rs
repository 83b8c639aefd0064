//! `portal`: command-line client for the job portal.
//!
//! # Usage
//!
//! ```
//! portal --user rita --password secret applications --search engineer
//! portal --token "$PORTAL_TOKEN" --role recruiter status 12 interviewed
//! portal --config ~/.config/portal/config.toml apply 7 ./cv.pdf
//! ```

mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::{ConfigFile, Settings};
use portal_client::{HttpBackend, auth::decode_claims};
use portal_core::{
  application::ApplicationStatus,
  session::{Session, ViewerRole},
};
use portal_dashboard::Dashboard;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "portal", version, about = "Command-line client for the job portal")]
pub struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the portal (default: http://localhost:8000).
  #[arg(long, env = "PORTAL_URL", global = true)]
  url: Option<String>,

  /// Username to log in with.
  #[arg(long, env = "PORTAL_USER", global = true)]
  user: Option<String>,

  /// Password to log in with.
  #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true, global = true)]
  password: Option<String>,

  /// Pre-issued access token; skips login.
  #[arg(long, env = "PORTAL_TOKEN", hide_env_values = true, global = true)]
  token: Option<String>,

  /// Role for a pre-issued token. Read from the token when omitted.
  #[arg(long, env = "PORTAL_ROLE", global = true)]
  role: Option<ViewerRole>,

  /// Request timeout in seconds.
  #[arg(long, value_name = "SECS", global = true)]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load, score and list applications.
  Applications {
    /// Filter on job title (and candidate, for recruiters).
    #[arg(long, default_value = "")]
    search:    String,
    /// Zero-based page number.
    #[arg(long, default_value_t = 0)]
    page:      usize,
    /// Rows per page (5, 10 or 25).
    #[arg(long)]
    page_size: Option<usize>,
  },
  /// Move an application to a new status (recruiters).
  Status {
    id:     u64,
    /// Interviewed, Selected, Rejected or "On Hold".
    status: ApplicationStatus,
  },
  /// Apply to a job with a PDF resume (candidates).
  Apply { job: String, resume: PathBuf },
  /// List job postings.
  Jobs,
  /// Stop a posting from accepting applications (recruiters).
  CloseJob { job: String },
  /// Create an account from --user, --password and --role (default:
  /// candidate). Does not log in.
  Register {
    #[arg(long)]
    email: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let file = match &args.config {
    Some(path) => ConfigFile::load(path)?,
    None => ConfigFile::default(),
  };
  let settings = Settings::resolve(&args, file);

  // Registration is anonymous.
  let command = match args.command {
    Command::Register { email } => return commands::register(&settings, &email).await,
    command => command,
  };

  let backend = connect(&settings).await?;
  let session = backend.session().clone();
  let dashboard = Dashboard::new(Arc::new(backend), session, settings.dashboard.clone());

  match command {
    Command::Applications {
      search,
      page,
      page_size,
    } => {
      let page_size = page_size.unwrap_or(settings.page_size);
      commands::applications(&dashboard, search, page, page_size).await
    }
    Command::Status { id, status } => commands::status(&dashboard, id, status).await,
    Command::Apply { job, resume } => commands::apply(&dashboard, job, &resume).await,
    Command::Jobs => commands::jobs(&dashboard).await,
    Command::CloseJob { job } => commands::close_job(&dashboard, job).await,
    Command::Register { .. } => Ok(()),
  }
}

/// Use a pre-issued token if there is one, otherwise log in.
async fn connect(settings: &Settings) -> Result<HttpBackend> {
  if let Some(token) = &settings.token {
    let role = match settings.role {
      Some(role) => role,
      None => {
        decode_claims(token)
          .context("no role given and the token does not carry one")?
          .role
      }
    };
    let username = settings.username.clone().unwrap_or_default();
    let session = Session::new(username, role, token.clone());
    return HttpBackend::new(settings.api.clone(), session).context("building HTTP client");
  }

  match (&settings.username, &settings.password) {
    (Some(user), Some(password)) => HttpBackend::login(settings.api.clone(), user, password)
      .await
      .with_context(|| format!("logging in as {user}")),
    _ => bail!("no credentials: pass --token, or --user and --password"),
  }
}
