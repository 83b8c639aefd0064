//! Subcommand bodies. Output goes to stdout; diagnostics go through `tracing`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use portal_client::{HttpBackend, auth::Registration};
use portal_core::{
  application::{ApplicationId, ApplicationStatus},
  posting::PostingId,
  resume::{PDF_CONTENT_TYPE, ResumeUpload},
  session::ViewerRole,
};
use portal_dashboard::{
  Dashboard, LoadError,
  aggregate::BatchOutcome,
  projection::{PAGE_SIZES, ViewState},
};
use tracing::warn;

use crate::config::Settings;

type Portal = Dashboard<HttpBackend>;

async fn load_and_score(dashboard: &Portal) -> Result<()> {
  match dashboard.reload().await {
    Ok(BatchOutcome::Applied(_)) => Ok(()),
    Ok(BatchOutcome::Stale { .. }) | Err(LoadError::Superseded { .. }) => Ok(()),
    Err(e) => Err(e).context("loading applications"),
  }
}

pub async fn applications(
  dashboard: &Portal,
  search: String,
  page: usize,
  page_size: usize,
) -> Result<()> {
  if !PAGE_SIZES.contains(&page_size) {
    warn!(page_size, supported = ?PAGE_SIZES, "unusual page size");
  }
  load_and_score(dashboard).await?;

  let metrics = dashboard.metrics();
  println!(
    "{} applications across {} postings, average score {} ({} pending, {} unavailable)",
    metrics.total,
    metrics.distinct_postings,
    metrics.average_label(),
    metrics.pending,
    metrics.unavailable,
  );

  let mut view = ViewState::new(page_size);
  view.set_search(search);
  view.set_page(page);
  let page = dashboard.page(&view);

  let recruiter = dashboard.role() == ViewerRole::Recruiter;
  for row in &page.rows {
    let app = &row.application;
    let who = if recruiter {
      format!("  {:<16}", app.candidate)
    } else {
      String::new()
    };
    println!(
      "{:>6}  {:<28}{}  {:<11}  {:>14}  {:>3}%  {}",
      app.id.to_string(),
      app.job_title,
      who,
      app.status.to_string(),
      row.score.to_string(),
      row.progress,
      row.band,
    );
  }
  println!(
    "page {} of {} ({} matching)",
    page.page + 1,
    page.page_count().max(1),
    page.total_matches
  );
  Ok(())
}

pub async fn status(dashboard: &Portal, id: u64, status: ApplicationStatus) -> Result<()> {
  // The row only needs to be present; scores are irrelevant here.
  match dashboard.load().await {
    Ok(_) | Err(LoadError::Superseded { .. }) => {}
    Err(e) => return Err(e).context("loading applications"),
  }
  let app = dashboard
    .change_status(ApplicationId(id), status)
    .await
    .with_context(|| format!("changing application {id} to {status}"))?;
  println!("application {} is now {}", app.id, app.status);
  Ok(())
}

pub async fn apply(dashboard: &Portal, job: String, resume: &Path) -> Result<()> {
  let bytes = tokio::fs::read(resume)
    .await
    .with_context(|| format!("reading {}", resume.display()))?;
  let filename = resume
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let content_type = resume
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    .then(|| PDF_CONTENT_TYPE.to_string());

  let upload = ResumeUpload::new(filename, content_type, bytes);
  let id = dashboard
    .apply(PostingId(job.clone()), upload)
    .await
    .with_context(|| format!("applying to job {job}"))?;
  println!("submitted application {id} for job {job}");
  Ok(())
}

pub async fn jobs(dashboard: &Portal) -> Result<()> {
  let postings = dashboard
    .postings()
    .list()
    .await
    .context("listing postings")?;
  for p in postings {
    println!(
      "{:>6}  {:<6}  {}  ({}, {})",
      p.id.to_string(),
      p.status.to_string(),
      p.title,
      p.company,
      p.location
    );
  }
  Ok(())
}

pub async fn close_job(dashboard: &Portal, job: String) -> Result<()> {
  let posting = dashboard
    .postings()
    .close(PostingId(job.clone()))
    .await
    .with_context(|| format!("closing job {job}"))?;
  println!("job {} is now {}", posting.id, posting.status);
  Ok(())
}

pub async fn register(settings: &Settings, email: &str) -> Result<()> {
  let (Some(username), Some(password)) = (&settings.username, &settings.password) else {
    bail!("registering needs --user and --password");
  };
  let form = Registration {
    username: username.clone(),
    email:    email.to_string(),
    password: password.clone(),
    role:     settings.role.unwrap_or(ViewerRole::Candidate),
  };
  let user = HttpBackend::register(&settings.api, &form)
    .await
    .with_context(|| format!("registering {username}"))?;
  println!("registered {} as {}", user.username, user.role);
  Ok(())
}
