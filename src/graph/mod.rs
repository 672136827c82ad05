//! # Remote Drive Access
//!
//! Blocking client for the cloud drive and workbook REST API, plus the
//! device-code sign-in used to obtain its access token.
use crate::graph::model::Drive;
use crate::graph::model::DriveItem;
use crate::spreadsheet::SourceError;
use glob::MatchOptions;
use glob::Pattern;
use thiserror::Error;

pub mod auth;
pub mod client;
pub mod model;

/// Errors of the remote drive client and sign-in.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with a non-success status
    #[error("Server error ({status}) {code}: {message}")]
    ServerError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Sign-in failed ({code}): {message}")]
    SignInFailed { code: String, message: String },

    #[error("Device code expired before sign-in completed")]
    DeviceCodeExpired,
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ServerError { status: 404, .. })
    }
}

impl From<GraphError> for SourceError {
    fn from(error: GraphError) -> Self {
        if error.is_not_found() {
            SourceError::NotFound(error.to_string())
        } else {
            SourceError::ServiceUnavailable(error.to_string())
        }
    }
}

/// Read access to the user's drive.
pub trait DriveBrowser {
    fn drive(&self) -> Result<Drive, GraphError>;

    /// Items directly under the drive root.
    fn root_children(&self) -> Result<Vec<DriveItem>, GraphError>;

    /// Root files whose name matches the pattern, ignoring case.
    fn spreadsheet_files(&self, pattern: &Pattern) -> Result<Vec<DriveItem>, GraphError> {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        Ok(self
            .root_children()?
            .into_iter()
            .filter(|item| item.is_file() && pattern.matches_with(&item.name, options))
            .collect())
    }
}
