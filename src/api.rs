use crate::config::ClientConfig;
use crate::redact::redact_secrets;
use crate::state::Session;
use crate::store::StoreError;
use crate::types::{RefreshRequest, RefreshResponse};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const REFRESH_PATH: &str = "auth/refresh";

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("network error")]
  Network(#[from] reqwest::Error),
  #[error("invalid json")]
  Json(#[from] serde_json::Error),
  #[error("request failed with status {status}")]
  Http { status: u16, message: Option<String> },
  #[error("unauthorized")]
  Unauthorized { message: Option<String> },
  #[error("no refresh token available")]
  NoRefreshToken,
  #[error(transparent)]
  Store(#[from] StoreError),
}

impl ClientError {
  /// The `message` field of the server's error body, when it sent one.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      Self::Http { message, .. } | Self::Unauthorized { message } => message.as_deref(),
      _ => None,
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Http { status, .. } => Some(*status),
      Self::Unauthorized { .. } => Some(401),
      Self::Network(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }

  /// Alert text for the UI, falling back to `fallback` when the server gave
  /// no reason.
  pub fn user_message(&self, fallback: &str) -> String {
    self
      .server_message()
      .map(str::to_string)
      .unwrap_or_else(|| fallback.to_string())
  }
}

fn build_headers(access_token: Option<&str>) -> HeaderMap {
  let mut headers = HeaderMap::new();
  headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
  headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
  if let Some(token) = access_token {
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
      headers.insert(AUTHORIZATION, value);
    }
  }
  headers
}

fn read_message(body: &str) -> Option<String> {
  let json: Value = serde_json::from_str(body).ok()?;
  let s = json.get("message")?.as_str()?.trim();
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

fn map_http_status(status: StatusCode, body: &str) -> ClientError {
  let message = read_message(body);
  match status {
    StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
    _ => ClientError::Http {
      status: status.as_u16(),
      message,
    },
  }
}

async fn read_json<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
  let status = res.status();
  let text = res.text().await?;
  if !status.is_success() {
    debug!(status = status.as_u16(), body = %redact_secrets(&text), "request failed");
    return Err(map_http_status(status, &text));
  }
  Ok(serde_json::from_str(&text)?)
}

/// HTTP client for the job board API.
///
/// Requests made through [`ApiClient::get`] and [`ApiClient::post`] carry the
/// session's access token. A 401 is answered with one refresh-token exchange
/// and one retry of the original request; if the exchange fails the session
/// keys are discarded and the error is returned.
pub struct ApiClient {
  http: reqwest::Client,
  config: ClientConfig,
  session: Session,
}

impl ApiClient {
  pub fn new(config: ClientConfig, session: Session) -> Result<Self, ClientError> {
    let http = reqwest::Client::builder()
      .timeout(config.timeout)
      .connect_timeout(config.connect_timeout)
      .build()?;
    Ok(Self {
      http,
      config,
      session,
    })
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
    self.send(Method::GET, path, None).await
  }

  pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let body = serde_json::to_value(body)?;
    self.send(Method::POST, path, Some(body)).await
  }

  /// Plain GET of an absolute URL, no credentials attached.
  pub async fn get_public<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
    let res = self
      .http
      .get(url)
      .headers(build_headers(None))
      .send()
      .await?;
    read_json(res).await
  }

  fn request(
    &self,
    method: &Method,
    url: &str,
    body: Option<&Value>,
    access_token: Option<&str>,
  ) -> reqwest::RequestBuilder {
    let builder = self
      .http
      .request(method.clone(), url)
      .headers(build_headers(access_token));
    match body {
      Some(body) => builder.json(body),
      None => builder,
    }
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
  ) -> Result<T, ClientError> {
    let url = self.config.auth_url(path);
    let token = self.session.access_token().await?;

    let res = self
      .request(&method, &url, body.as_ref(), token.as_deref())
      .send()
      .await?;
    if res.status() != StatusCode::UNAUTHORIZED {
      return read_json(res).await;
    }

    debug!(%method, %url, "got 401, refreshing access token");
    let access_token = match self.exchange_refresh_token().await {
      Ok(token) => token,
      Err(e) => {
        warn!(error = %redact_secrets(&e.to_string()), "token refresh failed, discarding session");
        if let Err(store_err) = self.session.expire().await {
          warn!(error = %store_err, "failed to clear session after refresh failure");
        }
        return Err(e);
      }
    };

    let retried = self
      .request(&method, &url, body.as_ref(), Some(&access_token))
      .send()
      .await?;
    read_json(retried).await
  }

  /// Trades the stored refresh token for a new pair and persists it. Sent
  /// outside [`ApiClient::send`] so a 401 here never triggers another refresh.
  pub(crate) async fn exchange_refresh_token(&self) -> Result<String, ClientError> {
    let refresh_token = self
      .session
      .refresh_token()
      .await?
      .ok_or(ClientError::NoRefreshToken)?;

    let body = RefreshRequest {
      refresh_token: &refresh_token,
      expires_in_mins: self.config.refresh_expires_in_mins,
    };
    let res = self
      .http
      .post(self.config.auth_url(REFRESH_PATH))
      .headers(build_headers(None))
      .json(&body)
      .send()
      .await?;
    let tokens: RefreshResponse = read_json(res).await?;

    self
      .session
      .save_tokens(&tokens.access_token, tokens.refresh_token.as_deref())
      .await?;
    debug!("access token refreshed");
    Ok(tokens.access_token)
  }
}
