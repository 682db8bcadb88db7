//! Authenticated session against the repository's entity API
//!
//! A [`Session`] owns the HTTP connection pool, the credential set, and the
//! derived token state. It is either fully authenticated or unusable: a
//! failed token renewal poisons the session and every later call fails with
//! [`Error::Auth`] without touching the network.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Tokens are renewed this far ahead of their declared expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(rename = "validFor")]
    valid_for: u64,
}

#[derive(Debug)]
enum TokenState {
    Active { token: String, expires_at: Instant },
    Poisoned,
}

/// An authenticated connection to a repository service
///
/// Opened from a validated [`Config`] and owned exclusively by the client
/// process; the credential set and token are never persisted. A session is
/// intended for one in-flight operation at a time — interleaving concurrent
/// traversals or downloads on a shared session is not supported.
#[derive(Debug)]
pub struct Session {
    http: Client,
    base: String,
    config: Config,
    token: Mutex<TokenState>,
}

impl Session {
    /// Open a session: validate the configuration, then authenticate
    ///
    /// Validation failures surface as [`Error::Validation`] before any
    /// network I/O. Login transport faults are retried within the
    /// configured budget; credential rejection and an unreachable server
    /// both surface as [`Error::Auth`].
    pub async fn open(config: &Config) -> Result<Session> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("dpres-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let session = Session {
            http,
            base: config.server_address().trim_end_matches('/').to_string(),
            config: config.clone(),
            token: Mutex::new(TokenState::Poisoned),
        };

        let (token, expires_at) = session.login().await?;
        *session.lock_token() = TokenState::Active { token, expires_at };
        tracing::info!(server = %session.base, "session opened");
        Ok(session)
    }

    /// Close the session, releasing pooled connections
    ///
    /// Dropping the session has the same effect; this method exists to make
    /// the release explicit at the end of a run.
    pub fn close(self) {}

    /// Retry budget shared by every operation on this session
    pub(crate) fn retry(&self) -> &crate::config::RetryConfig {
        &self.config.retry
    }

    /// Child records requested per traversal page
    pub(crate) fn page_size(&self) -> usize {
        self.config.page_size()
    }

    /// Issue an authenticated GET against the entity API
    ///
    /// Renews the access token when it is within [`REFRESH_MARGIN`] of
    /// expiry. Responses with 5xx/429 statuses are converted to retryable
    /// [`Error::Network`] values; 401/403 surface as [`Error::Auth`].
    /// 404 and other client statuses are passed through for the caller to
    /// interpret in context.
    pub(crate) async fn get(&self, path_and_query: &str) -> Result<Response> {
        let token = self.bearer().await?;
        let url = format!("{}{}", self.base, path_and_query);
        let response = self.http.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("access token rejected (status {status})")));
        }
        check_retryable_status(response)
    }

    /// Current bearer token, renewing it first when near expiry
    async fn bearer(&self) -> Result<String> {
        {
            let guard = self.lock_token();
            match &*guard {
                TokenState::Poisoned => {
                    return Err(Error::Auth(
                        "session is no longer usable after a failed renewal".to_string(),
                    ));
                }
                TokenState::Active { token, expires_at } => {
                    if Instant::now() + REFRESH_MARGIN < *expires_at {
                        return Ok(token.clone());
                    }
                }
            }
        }

        tracing::debug!("access token near expiry, renewing");
        match self.login().await {
            Ok((token, expires_at)) => {
                *self.lock_token() = TokenState::Active {
                    token: token.clone(),
                    expires_at,
                };
                Ok(token)
            }
            Err(e) => {
                *self.lock_token() = TokenState::Poisoned;
                Err(Error::Auth(format!("token renewal failed: {e}")))
            }
        }
    }

    /// Log in and return the fresh token with its expiry instant
    async fn login(&self) -> Result<(String, Instant)> {
        with_retry(&self.config.retry, || self.login_once())
            .await
            .map_err(|e| match e {
                Error::Auth(_) => e,
                other => Error::Auth(format!("could not reach login endpoint: {other}")),
            })
    }

    async fn login_once(&self) -> Result<(String, Instant)> {
        let url = format!("{}/api/accesstoken/login", self.base);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", self.config.credentials.username.as_str()),
                ("password", self.config.credentials.password.as_str()),
                ("tenant", self.config.credentials.tenant.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(
                "credentials rejected by the repository".to_string(),
            ));
        }
        let response = check_retryable_status(response)?;
        if !response.status().is_success() {
            return Err(Error::Auth(format!("login failed with status {status}")));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed login response: {e}")))?;
        tracing::debug!(valid_for_secs = login.valid_for, "obtained access token");
        Ok((
            login.token,
            Instant::now() + Duration::from_secs(login.valid_for),
        ))
    }

    fn lock_token(&self) -> MutexGuard<'_, TokenState> {
        match self.token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Convert 5xx/429 responses into retryable [`Error::Network`] values
///
/// Other statuses pass through untouched so callers can interpret 404 and
/// friends in context.
fn check_retryable_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => Err(Error::Network(e)),
        }
    } else {
        Ok(response)
    }
}
