//! Session establishment.
//!
//! The portal issues a JWT pair from `POST /api/auth/login/`. The access token
//! carries a custom `role` claim, which is read here without verifying the
//! signature; verification is the server's job. The refresh token is kept on
//! the backend so the access token can be renewed with
//! `POST /api/auth/refresh/`. Accounts are created anonymously through
//! `POST /api/auth/register/`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use portal_core::{
  ValidationError,
  session::{Session, ViewerRole},
};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::info;

use crate::{
  ClientError, HttpBackend, Result,
  client::{ApiConfig, api_url, build_client, decode, ensure_success},
};

#[derive(Serialize)]
struct Credentials<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
  access:  String,
  refresh: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
  refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshedToken {
  access: String,
}

/// The subset of access-token claims the client cares about.
#[derive(Debug, Deserialize)]
pub struct AccessClaims {
  pub role:     ViewerRole,
  #[serde(default)]
  pub username: Option<String>,
}

/// Decode the payload segment of a JWT.
pub fn decode_claims(token: &str) -> Result<AccessClaims> {
  let payload = token
    .split('.')
    .nth(1)
    .ok_or_else(|| ClientError::Token("expected three dot-separated segments".into()))?;
  let raw = URL_SAFE_NO_PAD
    .decode(payload.trim_end_matches('='))
    .map_err(|e| ClientError::Token(e.to_string()))?;
  serde_json::from_slice(&raw).map_err(|e| ClientError::Token(e.to_string()))
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Body of `POST /api/auth/register/`.
#[derive(Clone, Serialize)]
pub struct Registration {
  pub username: String,
  pub email:    String,
  pub password: String,
  pub role:     ViewerRole,
}

impl Registration {
  /// Reject blank fields before anything is sent. Password strength and
  /// uniqueness are checked by the server.
  pub fn validate(&self) -> std::result::Result<(), ValidationError> {
    if self.username.trim().is_empty() {
      return Err(ValidationError::MissingField("username"));
    }
    if !self.email.contains('@') {
      return Err(ValidationError::MissingField("email"));
    }
    if self.password.is_empty() {
      return Err(ValidationError::MissingField("password"));
    }
    Ok(())
  }
}

/// The account the server created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
  pub username: String,
  #[serde(default)]
  pub email:    String,
  pub role:     ViewerRole,
}

async fn post_json<B: Serialize, T: DeserializeOwned>(
  client: &Client,
  config: &ApiConfig,
  path: &str,
  body: &B,
  what: &'static str,
) -> Result<T> {
  let resp = client
    .post(api_url(config, path))
    .json(body)
    .send()
    .await
    .map_err(|source| ClientError::Transport {
      method: "POST",
      path: path.to_string(),
      source,
    })?;
  let resp = ensure_success("POST", path.to_string(), resp).await?;
  decode(resp, what).await
}

impl HttpBackend {
  /// `POST /api/auth/register/`. Does not log in.
  pub async fn register(config: &ApiConfig, registration: &Registration) -> Result<RegisteredUser> {
    registration.validate()?;
    let client = build_client(config)?;
    let user: RegisteredUser =
      post_json(&client, config, "/auth/register/", registration, "registration").await?;
    info!(username = %user.username, role = %user.role, "account registered");
    Ok(user)
  }

  /// `POST /api/auth/login/` and build a backend bound to the new session.
  pub async fn login(config: ApiConfig, username: &str, password: &str) -> Result<Self> {
    let client = build_client(&config)?;
    let pair: TokenPair = post_json(
      &client,
      &config,
      "/auth/login/",
      &Credentials { username, password },
      "token pair",
    )
    .await?;

    let claims = decode_claims(&pair.access)?;
    let username = claims.username.unwrap_or_else(|| username.to_string());
    info!(%username, role = %claims.role, "session established");

    let session = Session::new(username, claims.role, pair.access);
    Ok(Self::with_client(client, config, session).with_refresh_token(pair.refresh))
  }

  /// `POST /api/auth/refresh/`: swap the refresh token for a new access
  /// token. The role must not change across a refresh.
  pub async fn refresh(&mut self) -> Result<()> {
    let refresh = self
      .refresh_token()
      .ok_or_else(|| ClientError::Token("session has no refresh token".into()))?
      .to_string();
    let token: RefreshedToken = post_json(
      self.client(),
      self.config(),
      "/auth/refresh/",
      &RefreshRequest { refresh: &refresh },
      "refreshed token",
    )
    .await?;

    let claims = decode_claims(&token.access)?;
    if claims.role != self.session().role {
      return Err(ClientError::Token(format!(
        "refreshed token is for role {}, session is {}",
        claims.role,
        self.session().role
      )));
    }
    self.replace_access_token(token.access);
    info!(username = %self.session().username, "access token refreshed");
    Ok(())
  }
}
