//! Wire types for the music library API

use cadence_core::{Role, Session, User};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::client::request::FormField;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// The Go backend serializes empty slices as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Playlist timestamps are rendered with Go's `time.Time.String()`
/// (`2024-03-01 10:00:00.123 +0000 UTC`); RFC 3339 is accepted as well.
fn go_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_go_time(&raw).ok_or_else(|| D::Error::custom(format!("unrecognized timestamp '{raw}'")))
}

fn parse_go_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    // Drop the monotonic clock reading and the zone abbreviation
    let raw = raw.split(" m=").next()?;
    let (stamp, _zone) = raw.rsplit_once(' ')?;
    DateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

// Auth

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Server-side key that grants the admin role on registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_key: Option<String>,
}

/// Body of a successful login, registration or refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.access_token, response.user)
    }
}

// Pagination

/// Page selector with the server's defaults and limits applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Non-positive values fall back to the defaults; `limit` is capped at 100
    pub fn new(page: i64, limit: i64) -> Self {
        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE));
        Self { page, limit }
    }

    pub(crate) fn query(self) -> [(String, String); 2] {
        [
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
}

// Tracks

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub release_year: i32,
    /// Length in seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub file_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub playlist_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A file attached to a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first()
            .map(|mime| mime.to_string());
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

/// Upload form for a new track
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub title: Option<String>,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub file: UploadFile,
    pub playlist_ids: Vec<String>,
}

impl NewTrack {
    pub(crate) fn into_fields(self) -> Vec<FormField> {
        let mut fields = Vec::new();
        if let Some(title) = self.title {
            fields.push(FormField::text("title", title));
        }
        fields.push(FormField::text("artist", self.artist));
        if let Some(album) = self.album {
            fields.push(FormField::text("album", album));
        }
        if let Some(genre) = self.genre {
            fields.push(FormField::text("genre", genre));
        }
        if let Some(year) = self.release_year {
            fields.push(FormField::text("release_year", year.to_string()));
        }
        fields.extend(
            self.playlist_ids
                .into_iter()
                .map(|id| FormField::text("playlist_ids", id)),
        );
        fields.push(FormField::file("file", self.file));
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUpdate {
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
}

// Playlists

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub album_cover: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub track_ids: Vec<String>,
    #[serde(deserialize_with = "go_time")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "go_time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub title: String,
    pub album_cover: Option<UploadFile>,
    pub track_ids: Vec<String>,
}

impl NewPlaylist {
    pub(crate) fn into_fields(self) -> Vec<FormField> {
        let mut fields = vec![FormField::text("title", self.title)];
        fields.extend(
            self.track_ids
                .into_iter()
                .map(|id| FormField::text("track_ids", id)),
        );
        if let Some(cover) = self.album_cover {
            fields.push(FormField::file("album_cover", cover));
        }
        fields
    }
}

/// How `track_ids` in a playlist update combine with the existing list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    #[default]
    Append,
    Overwrite,
}

impl TrackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Overwrite => "overwrite",
        }
    }
}

/// Partial playlist update; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct PlaylistUpdate {
    pub title: Option<String>,
    pub album_cover: Option<UploadFile>,
    pub track_ids: Vec<String>,
    pub mode: TrackMode,
}

impl PlaylistUpdate {
    pub(crate) fn into_fields(self) -> Vec<FormField> {
        let mut fields = Vec::new();
        if let Some(title) = self.title {
            fields.push(FormField::text("title", title));
        }
        if !self.track_ids.is_empty() {
            fields.extend(
                self.track_ids
                    .into_iter()
                    .map(|id| FormField::text("track_ids", id)),
            );
            fields.push(FormField::text("mode", self.mode.as_str()));
        }
        if let Some(cover) = self.album_cover {
            fields.push(FormField::file("album_cover", cover));
        }
        fields
    }
}

// Users (admin)

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub favorite_track_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub playlist_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
