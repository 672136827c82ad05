//! Response shapes of the drive and identity endpoints.
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;

/// OData collection wrapper: `{"value": [...], "@odata.nextLink": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub(crate) value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub(crate) next_link: Option<String>,
}

/// Error body returned by the service on non-success status codes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorDetail {
    pub(crate) code: String,
    pub(crate) message: String,
}

/// The signed-in user.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Identity {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdentitySet {
    pub user: Option<Identity>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Quota {
    pub total: Option<u64>,
    pub used: Option<u64>,
    pub remaining: Option<u64>,
}

/// The user's drive.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Drive {
    pub id: String,
    pub name: Option<String>,
    pub drive_type: Option<String>,
    pub owner: Option<IdentitySet>,
    pub quota: Option<Quota>,
}

impl Drive {
    pub fn owner_name(&self) -> Option<&str> {
        self.owner.as_ref()?.user.as_ref()?.display_name.as_deref()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileFacet {
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderFacet {
    pub child_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AudioFacet {
    pub title: Option<String>,
}

/// File, folder or other item of a drive.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub size: Option<u64>,
    pub web_url: Option<String>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub file: Option<FileFacet>,
    pub folder: Option<FolderFacet>,
    pub audio: Option<AudioFacet>,
}

impl DriveItem {
    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }
}
