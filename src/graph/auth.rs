//! OAuth 2.0 device authorization grant.
//!
//! The user is shown a short code and a verification URL, signs in on any
//! browser, and the client polls the token endpoint until the sign-in
//! completes, is declined, or the code expires.
use crate::config::Settings;
use crate::graph::GraphError;
use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;
use tracing::info;
use url::Url;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Bearer token for the drive API.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        let lifetime = TimeDelta::from_std(expires_in).unwrap_or(TimeDelta::zero());
        Self {
            secret: secret.to_owned(),
            expires_at: Utc::now() + lifetime,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Device code issued by the authority.
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until the device code expires
    pub expires_in: u64,
    /// Seconds to wait between token requests
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Ready-made instructions for the user
    #[serde(default)]
    pub message: String,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenErrorResponse {
    error: String,
    error_description: String,
}

/// What to do after an unsuccessful token request.
#[derive(Debug, PartialEq)]
enum PollAction {
    /// Sign-in not finished yet; ask again after the delay
    Retry(Duration),
    /// Sign-in can no longer succeed
    Fail { code: String, message: String },
}

fn next_poll_action(response: TokenErrorResponse, interval: Duration) -> PollAction {
    match response.error.as_str() {
        "authorization_pending" => PollAction::Retry(interval),
        "slow_down" => PollAction::Retry(interval + Duration::from_secs(5)),
        _ => PollAction::Fail {
            code: response.error,
            message: response.error_description,
        },
    }
}

/// Device-code sign-in against `{authority}/{tenant}/oauth2/v2.0/`.
pub struct DeviceCodeAuth {
    client: Client,
    authority: Url,
    tenant: String,
    client_id: String,
    scopes: Vec<String>,
}

impl DeviceCodeAuth {
    pub fn new(settings: &Settings) -> Result<Self, GraphError> {
        Ok(Self {
            client: Client::builder().timeout(settings.timeout()).build()?,
            authority: Url::parse(&settings.authority)?,
            tenant: settings.tenant.to_owned(),
            client_id: settings.app_id.to_owned(),
            scopes: settings.scopes.to_owned(),
        })
    }

    fn endpoint(&self, leaf: &str) -> Url {
        let mut url = self.authority.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([self.tenant.as_str(), "oauth2", "v2.0", leaf]);
        }
        url
    }

    /// Asks the authority for a new device code.
    pub fn request_device_code(&self) -> Result<DeviceCode, GraphError> {
        let scope = self.scopes.join(" ");
        let response = self
            .client
            .post(self.endpoint("devicecode"))
            .form(&[("client_id", self.client_id.as_str()), ("scope", scope.as_str())])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorResponse = response.json().unwrap_or_default();
            return Err(GraphError::SignInFailed {
                code: if body.error.is_empty() { status.to_string() } else { body.error },
                message: body.error_description,
            });
        }
        Ok(response.json()?)
    }

    /// Polls the token endpoint until the user completes sign-in for `code`.
    pub fn poll_token(&self, code: &DeviceCode) -> Result<AccessToken, GraphError> {
        let deadline = Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = Duration::from_secs(code.interval);
        loop {
            thread::sleep(interval);
            if Instant::now() >= deadline {
                return Err(GraphError::DeviceCodeExpired);
            }
            let response = self
                .client
                .post(self.endpoint("token"))
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", code.device_code.as_str()),
                ])
                .send()?;
            if response.status().is_success() {
                let token: TokenResponse = response.json()?;
                return Ok(AccessToken::new(&token.access_token, Duration::from_secs(token.expires_in)));
            }
            match next_poll_action(response.json().unwrap_or_default(), interval) {
                PollAction::Retry(delay) => {
                    debug!(seconds = delay.as_secs(), "Waiting for sign-in");
                    interval = delay;
                }
                PollAction::Fail { code, .. } if code == "expired_token" => {
                    return Err(GraphError::DeviceCodeExpired)
                }
                PollAction::Fail { code, message } => return Err(GraphError::SignInFailed { code, message }),
            }
        }
    }

    /// Runs the whole flow, handing the device code to `prompt` for display.
    pub fn authenticate<F>(&self, prompt: F) -> Result<AccessToken, GraphError>
    where
        F: FnOnce(&DeviceCode),
    {
        let code = self.request_device_code()?;
        prompt(&code);
        let token = self.poll_token(&code)?;
        info!(expires_at = %token.expires_at(), "Signed in");
        Ok(token)
    }
}
