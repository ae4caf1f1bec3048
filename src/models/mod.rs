use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A movie as the service reports it. `id == 0` means the record came from a
/// lookup and is not in the library yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tmdb_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub downloaded: bool,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(default)]
    pub quality_profile_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<DateTime<Utc>>,
    /// Everything else the service sent, echoed back on update.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaItem {
    pub fn in_library(&self) -> bool {
        self.id != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedFolder {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    pub id: i64,
    pub path: String,
    #[serde(default)]
    pub free_space: u64,
    #[serde(default)]
    pub total_space: u64,
    #[serde(default)]
    pub unmapped_folders: Vec<UnmappedFolder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadProtocol {
    Usenet,
    Torrent,
    #[serde(other)]
    Unknown,
}

/// Download job tracked by the service. `E` carries the service-specific
/// fields, e.g. the owning movie id for Radarr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem<E> {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub sizeleft: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeleft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_download_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_download_state: Option<String>,
    pub protocol: DownloadProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_id: Option<String>,
    #[serde(flatten)]
    pub ext: E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrQueueExt {
    pub movie_id: i64,
}

pub type RadarrQueueItem = QueueItem<RadarrQueueExt>;

/// Paginated envelope returned by `/queue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage<T> {
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub sort_key: String,
    #[serde(default)]
    pub sort_direction: String,
    pub total_records: u32,
    pub records: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

/// Background command understood by `/command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_ids: Option<Vec<i64>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            movie_ids: None,
        }
    }

    pub fn movies_search(ids: Vec<i64>) -> Self {
        Self {
            name: "MoviesSearch".to_string(),
            movie_ids: Some(ids),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStatus {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// When the service should consider a movie available for download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimumAvailability {
    #[serde(rename = "announced")]
    Announced,
    #[serde(rename = "inCinemas")]
    InCinemas,
    #[default]
    #[serde(rename = "released")]
    Released,
    #[serde(rename = "preDB")]
    PreDb,
}

impl MinimumAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimumAvailability::Announced => "announced",
            MinimumAvailability::InCinemas => "inCinemas",
            MinimumAvailability::Released => "released",
            MinimumAvailability::PreDb => "preDB",
        }
    }
}

impl fmt::Display for MinimumAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinimumAvailability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "announced" => Ok(MinimumAvailability::Announced),
            "incinemas" | "in_cinemas" | "in-cinemas" => Ok(MinimumAvailability::InCinemas),
            "released" => Ok(MinimumAvailability::Released),
            "predb" => Ok(MinimumAvailability::PreDb),
            other => Err(format!("unknown minimum availability '{other}'")),
        }
    }
}

/// What the caller wants added to the library.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub title: String,
    pub quality_profile_id: i64,
    pub minimum_availability: MinimumAvailability,
    pub tmdb_id: i64,
    pub year: Option<i32>,
    pub root_folder_path: String,
    pub monitored: bool,
    pub search_now: bool,
    pub tags: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_result_without_id_is_not_in_library() {
        let item: MediaItem = serde_json::from_value(json!({
            "title": "The Matrix",
            "tmdbId": 603,
            "year": 1999,
            "images": [],
        }))
        .unwrap();

        assert!(!item.in_library());
        assert!(!item.monitored);
        assert!(!item.downloaded);
        assert_eq!(item.extra.get("images"), Some(&json!([])));
    }

    #[test]
    fn unknown_fields_are_echoed_back() {
        let item: MediaItem = serde_json::from_value(json!({
            "id": 7,
            "title": "Heat",
            "tmdbId": 949,
            "monitored": true,
            "added": "2023-01-02T03:04:05Z",
            "ratings": {"imdb": {"value": 8.3}},
        }))
        .unwrap();

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["ratings"]["imdb"]["value"], json!(8.3));
        assert_eq!(value["added"], json!("2023-01-02T03:04:05Z"));
        assert!(value.get("imdbId").is_none());
    }

    #[test]
    fn queue_item_reads_radarr_extension() {
        let item: RadarrQueueItem = serde_json::from_value(json!({
            "id": 11,
            "movieId": 42,
            "size": 1000.0,
            "sizeleft": 250.0,
            "timeleft": "00:10:00",
            "estimatedCompletionTime": "2024-05-01T12:00:00Z",
            "status": "downloading",
            "trackedDownloadState": "downloading",
            "protocol": "torrent",
            "downloadClient": "qBittorrent",
            "indexer": "Example",
            "downloadId": "ABC"
        }))
        .unwrap();

        assert_eq!(item.ext.movie_id, 42);
        assert_eq!(item.protocol, DownloadProtocol::Torrent);
        assert_eq!(item.download_client.as_deref(), Some("qBittorrent"));
    }

    #[test]
    fn unexpected_protocol_is_unknown() {
        let protocol: DownloadProtocol = serde_json::from_value(json!("ftp")).unwrap();
        assert_eq!(protocol, DownloadProtocol::Unknown);
    }

    #[test]
    fn minimum_availability_parses_cli_spellings() {
        assert_eq!("inCinemas".parse::<MinimumAvailability>(), Ok(MinimumAvailability::InCinemas));
        assert_eq!("preDB".parse::<MinimumAvailability>(), Ok(MinimumAvailability::PreDb));
        assert!("soon".parse::<MinimumAvailability>().is_err());
        assert_eq!(
            serde_json::to_value(MinimumAvailability::PreDb).unwrap(),
            json!("preDB")
        );
    }
}
