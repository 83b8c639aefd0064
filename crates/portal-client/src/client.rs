//! Async HTTP backend wrapping the portal JSON API.

use std::time::Duration;

use portal_core::{
  application::{Application, ApplicationId, ApplicationStatus},
  backend::PortalBackend,
  posting::{JobPosting, NewPosting, PostingId},
  resume::{PDF_CONTENT_TYPE, ResumeUpload},
  score::ScoreReport,
  session::{Session, ViewerRole},
};
use reqwest::{
  Client, RequestBuilder, Response, StatusCode,
  multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{ClientError, Result};

/// Connection settings for the portal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout enforced by the HTTP client.
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000".to_string(),
      timeout:  Duration::from_secs(30),
    }
  }
}

pub(crate) fn build_client(config: &ApiConfig) -> Result<Client> {
  Client::builder()
    .timeout(config.timeout)
    .build()
    .map_err(ClientError::Build)
}

pub(crate) fn api_url(config: &ApiConfig, path: &str) -> String {
  format!("{}/api{}", config.base_url.trim_end_matches('/'), path)
}

/// HTTP implementation of [`PortalBackend`] for one authenticated session.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client:        Client,
  config:        ApiConfig,
  session:       Session,
  /// Present when the session came from [`HttpBackend::login`].
  refresh_token: Option<String>,
}

impl HttpBackend {
  pub fn new(config: ApiConfig, session: Session) -> Result<Self> {
    let client = build_client(&config)?;
    Ok(Self::with_client(client, config, session))
  }

  pub(crate) fn with_client(client: Client, config: ApiConfig, session: Session) -> Self {
    Self {
      client,
      config,
      session,
      refresh_token: None,
    }
  }

  pub fn session(&self) -> &Session { &self.session }

  pub(crate) fn with_refresh_token(mut self, token: String) -> Self {
    self.refresh_token = Some(token);
    self
  }

  pub(crate) fn refresh_token(&self) -> Option<&str> { self.refresh_token.as_deref() }

  pub(crate) fn client(&self) -> &Client { &self.client }

  pub(crate) fn config(&self) -> &ApiConfig { &self.config }

  pub(crate) fn replace_access_token(&mut self, token: String) { self.session.token = token; }

  /// End the session, keeping only the connection settings.
  pub fn logout(self) -> ApiConfig { self.config }

  fn url(&self, path: &str) -> String { api_url(&self.config, path) }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req.bearer_auth(&self.session.token)
  }

  async fn send(
    &self,
    method: &'static str,
    path: String,
    req: RequestBuilder,
  ) -> Result<Response> {
    debug!(method, %path, "portal request");
    let resp = self
      .auth(req)
      .send()
      .await
      .map_err(|source| ClientError::Transport {
        method,
        path: path.clone(),
        source,
      })?;
    ensure_success(method, path, resp).await
  }

  async fn get_json<T: DeserializeOwned>(&self, path: String, what: &'static str) -> Result<T> {
    let req = self.client.get(self.url(&path));
    let resp = self.send("GET", path, req).await?;
    decode(resp, what).await
  }
}

/// Turn a non-2xx response into [`ClientError::Status`], keeping the server's
/// `{"error": ...}` message when there is one.
pub(crate) async fn ensure_success(
  method: &'static str,
  path: String,
  resp: Response,
) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  #[derive(Deserialize)]
  struct ErrorBody {
    #[serde(alias = "detail")]
    error: String,
  }

  let body = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<ErrorBody>(&body)
    .map(|b| b.error)
    .unwrap_or(body);
  Err(ClientError::Status {
    method,
    path,
    status,
    message,
  })
}

pub(crate) async fn decode<T: DeserializeOwned>(resp: Response, what: &'static str) -> Result<T> {
  resp
    .json()
    .await
    .map_err(|source| ClientError::Decode { what, source })
}

// ─── Wire bodies ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusBody {
  status: ApplicationStatus,
}

#[derive(Deserialize)]
struct StatusConfirmation {
  status: ApplicationStatus,
}

#[derive(Deserialize)]
struct SubmitConfirmation {
  application_id: ApplicationId,
}

impl PortalBackend for HttpBackend {
  type Error = ClientError;

  // ── Applications ──────────────────────────────────────────────────────────

  /// `GET /api/candidate/applications/` or `GET /api/recruiter/applications/`
  async fn list_applications(&self, role: ViewerRole) -> Result<Vec<Application>> {
    let path = match role {
      ViewerRole::Candidate => "/candidate/applications/",
      ViewerRole::Recruiter => "/recruiter/applications/",
    };
    self.get_json(path.to_string(), "applications").await
  }

  /// `GET /api/applications/<id>/score/`
  async fn fetch_score(&self, id: ApplicationId) -> Result<ScoreReport> {
    self
      .get_json(format!("/applications/{id}/score/"), "score")
      .await
  }

  /// `PATCH /api/applications/<id>/status/`
  async fn update_status(
    &self,
    id: ApplicationId,
    status: ApplicationStatus,
  ) -> Result<ApplicationStatus> {
    let path = format!("/applications/{id}/status/");
    let req = self
      .client
      .patch(self.url(&path))
      .json(&StatusBody { status });
    let resp = self.send("PATCH", path, req).await?;
    let confirmation: StatusConfirmation = decode(resp, "status confirmation").await?;
    Ok(confirmation.status)
  }

  /// `POST /api/applications/` (multipart: `job`, `resume`)
  async fn submit_application(
    &self,
    posting: PostingId,
    resume: ResumeUpload,
  ) -> Result<ApplicationId> {
    let mime = resume
      .content_type
      .clone()
      .unwrap_or_else(|| PDF_CONTENT_TYPE.to_string());
    let part = Part::bytes(resume.bytes.to_vec())
      .file_name(resume.filename.clone())
      .mime_str(&mime)
      .map_err(ClientError::Multipart)?;
    let form = Form::new().text("job", posting.0).part("resume", part);

    let path = "/applications/".to_string();
    let req = self.client.post(self.url(&path)).multipart(form);
    let resp = self.send("POST", path, req).await?;
    let confirmation: SubmitConfirmation = decode(resp, "submission confirmation").await?;
    Ok(confirmation.application_id)
  }

  // ── Postings ──────────────────────────────────────────────────────────────

  /// `GET /api/jobs/`
  async fn list_postings(&self) -> Result<Vec<JobPosting>> {
    self.get_json("/jobs/".to_string(), "postings").await
  }

  /// `GET /api/jobs/<id>/`. A 404 maps to `None`.
  async fn get_posting(&self, id: PostingId) -> Result<Option<JobPosting>> {
    match self.get_json(format!("/jobs/{id}/"), "posting").await {
      Ok(posting) => Ok(Some(posting)),
      Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// `POST /api/jobs/`
  async fn create_posting(&self, posting: NewPosting) -> Result<JobPosting> {
    let path = "/jobs/".to_string();
    let req = self.client.post(self.url(&path)).json(&posting);
    let resp = self.send("POST", path, req).await?;
    decode(resp, "posting").await
  }

  /// `PUT /api/jobs/<id>/`
  async fn update_posting(&self, id: PostingId, posting: NewPosting) -> Result<JobPosting> {
    let path = format!("/jobs/{id}/");
    let req = self.client.put(self.url(&path)).json(&posting);
    let resp = self.send("PUT", path, req).await?;
    decode(resp, "posting").await
  }

  /// `DELETE /api/jobs/<id>/`
  async fn delete_posting(&self, id: PostingId) -> Result<()> {
    let path = format!("/jobs/{id}/");
    let req = self.client.delete(self.url(&path));
    self.send("DELETE", path, req).await?;
    Ok(())
  }
}
