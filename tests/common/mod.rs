#![allow(dead_code)]

use requestarr::cache::CacheStore;
use requestarr::http::HttpClient;
use requestarr::models::{CreateRequest, MinimumAvailability};
use requestarr::RadarrClient;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

pub fn base_url(server: &MockServer) -> String {
    format!("{}/api/v3", server.uri())
}

pub fn client(server: &MockServer) -> RadarrClient {
    RadarrClient::new(HttpClient::new().unwrap(), &base_url(server), API_KEY).unwrap()
}

pub fn cached_client(server: &MockServer) -> (RadarrClient, Arc<CacheStore>) {
    let cache = Arc::new(CacheStore::new("radarr", 100));
    let client = client(server).with_cache(Arc::clone(&cache));
    (client, cache)
}

pub fn matrix_request() -> CreateRequest {
    CreateRequest {
        title: "The Matrix".to_string(),
        quality_profile_id: 4,
        minimum_availability: MinimumAvailability::Released,
        tmdb_id: 603,
        year: Some(1999),
        root_folder_path: "/movies".to_string(),
        monitored: true,
        search_now: true,
        tags: vec![],
    }
}

/// A movie record shaped like Radarr's, with the given id and flags.
pub fn movie(id: i64, monitored: bool, downloaded: bool) -> Value {
    json!({
        "id": id,
        "title": "The Matrix",
        "tmdbId": 603,
        "imdbId": "tt0133093",
        "titleSlug": "the-matrix-603",
        "year": 1999,
        "monitored": monitored,
        "downloaded": downloaded,
        "hasFile": downloaded,
        "isAvailable": true,
        "qualityProfileId": 1,
        "path": "/movies/The Matrix (1999)",
        "added": "2021-06-01T10:00:00Z",
        "images": [{"coverType": "poster", "url": "/poster.jpg"}]
    })
}
