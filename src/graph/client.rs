use crate::graph::auth::AccessToken;
use crate::graph::model::Collection;
use crate::graph::model::Drive;
use crate::graph::model::DriveItem;
use crate::graph::model::ErrorResponse;
use crate::graph::model::User;
use crate::graph::DriveBrowser;
use crate::graph::GraphError;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::RawRange;
use crate::spreadsheet::SourceError;
use crate::spreadsheet::WorkbookSource;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use tracing::warn;
use url::Url;

/// Default API root; the workbook range endpoints used here live on the beta surface.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/beta";

/// Blocking client for the drive and workbook endpoints of the signed-in user.
#[derive(Debug, Clone)]
pub struct GraphClient {
    base_url: Url,
    client: Client,
    token: AccessToken,
}

impl GraphClient {
    /// Creates a client rooted at `base_url` that authenticates with `token`.
    pub fn new(base_url: &str, token: AccessToken, timeout: Duration) -> Result<Self, GraphError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            client: Client::builder().timeout(timeout).build()?,
            token,
        })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// The signed-in user (`GET /me`).
    pub fn me(&self) -> Result<User, GraphError> {
        self.get_json(endpoint(&self.base_url, &["me"]))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GraphError> {
        if self.token.is_expired() {
            warn!(expires_at = %self.token.expires_at(), "Access token has expired");
        }
        debug!(%url, "GET");
        let response = self.client.get(url).bearer_auth(self.token.secret()).send()?;
        Ok(check_status(response)?.json()?)
    }

    /// Reads every page of an OData collection.
    fn get_collection<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, GraphError> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: Collection<T> = self.get_json(url)?;
            items.extend(page.value);
            next = page.next_link.as_deref().map(Url::parse).transpose()?;
        }
        Ok(items)
    }
}

impl DriveBrowser for GraphClient {
    fn drive(&self) -> Result<Drive, GraphError> {
        self.get_json(endpoint(&self.base_url, &["me", "drive"]))
    }

    fn root_children(&self) -> Result<Vec<DriveItem>, GraphError> {
        self.get_collection(endpoint(&self.base_url, &["me", "drive", "root", "children"]))
    }
}

impl WorkbookSource for GraphClient {
    fn list_worksheets(&self, document_id: &str) -> Result<Vec<Worksheet>, SourceError> {
        Ok(self.get_collection(worksheets_url(&self.base_url, document_id, &[]))?)
    }

    fn used_range(&self, document_id: &str, worksheet_id: &str) -> Result<RawRange, SourceError> {
        Ok(self.get_json(worksheets_url(&self.base_url, document_id, &[worksheet_id, "usedRange"]))?)
    }

    fn range(&self, document_id: &str, worksheet_id: &str, address: &str) -> Result<RawRange, SourceError> {
        let segment = range_segment(address);
        Ok(self.get_json(worksheets_url(&self.base_url, document_id, &[worksheet_id, &segment]))?)
    }
}

/// Parses the API root, rejecting URLs that cannot carry a path.
fn parse_base_url(base_url: &str) -> Result<Url, GraphError> {
    let url = Url::parse(base_url.trim_end_matches('/'))?;
    if url.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
    }
    Ok(url)
}

/// Appends percent-encoded path segments to the API root.
fn endpoint(base_url: &Url, segments: &[&str]) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// `/me/drive/items/{document}/workbook/worksheets[/...]`
fn worksheets_url(base_url: &Url, document_id: &str, rest: &[&str]) -> Url {
    let mut segments = vec!["me", "drive", "items", document_id, "workbook", "worksheets"];
    segments.extend_from_slice(rest);
    endpoint(base_url, &segments)
}

/// `range(address='A1:C3')`, with quotes doubled as OData string literals require.
fn range_segment(address: &str) -> String {
    format!("range(address='{}')", address.replace('\'', "''"))
}

/// Turns a non-success response into [`GraphError::ServerError`].
fn check_status(response: Response) -> Result<Response, GraphError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(server_error(status.as_u16(), &body))
}

fn server_error(status: u16, body: &str) -> GraphError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|response| response.error)
        .unwrap_or_default();
    GraphError::ServerError {
        status,
        code: detail.code,
        message: if detail.message.is_empty() {
            body.to_owned()
        } else {
            detail.message
        },
    }
}
