mod common;

use common::{cached_client, client};
use pretty_assertions::assert_eq;
use requestarr::cache::CacheManager;
use requestarr::config::Configuration;
use requestarr::http::HttpClient;
use requestarr::ArrError;
use requestarr::RadarrClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_profiles(server: &MockServer, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v3/qualityProfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Any"},
            {"id": 4, "name": "HD-1080p"},
        ])))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn second_profile_read_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_profiles(&server, 1).await;
    let (radarr, cache) = cached_client(&server);

    let first = radarr.get_quality_profiles().await.unwrap();
    let second = radarr.get_quality_profiles().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second[1].name, "HD-1080p");

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.keys), (1, 1, 1));
}

#[tokio::test]
async fn expired_profiles_are_fetched_again() {
    let server = MockServer::start().await;
    mount_profiles(&server, 2).await;
    let (radarr, _cache) = cached_client(&server);
    let radarr = radarr.with_cache_ttl(Duration::from_millis(100));

    radarr.get_quality_profiles().await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    radarr.get_quality_profiles().await.unwrap();
}

#[tokio::test]
async fn root_folders_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/rootfolder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "path": "/movies",
            "freeSpace": 1000,
            "totalSpace": 5000,
            "unmappedFolders": [{"name": "Old", "path": "/movies/Old"}]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    let (radarr, _cache) = cached_client(&server);

    for _ in 0..3 {
        let folders = radarr.get_root_folders().await.unwrap();
        assert_eq!(folders[0].unmapped_folders[0].path, "/movies/Old");
        assert_eq!(folders[0].free_space, 1000);
    }
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/qualityProfile"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_profiles(&server, 1).await;
    let (radarr, cache) = cached_client(&server);

    let err = radarr.get_quality_profiles().await.unwrap_err();
    assert!(matches!(
        err,
        ArrError::Transport {
            operation: "retrieve quality profiles",
            ..
        }
    ));
    assert_eq!(cache.stats().keys, 0);

    let profiles = radarr.get_quality_profiles().await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(cache.stats().keys, 1);
}

#[tokio::test]
async fn without_cache_every_read_hits_the_network() {
    let server = MockServer::start().await;
    mount_profiles(&server, 2).await;
    let radarr = client(&server);

    radarr.get_quality_profiles().await.unwrap();
    radarr.get_quality_profiles().await.unwrap();
}

#[tokio::test]
async fn clients_sharing_a_manager_share_entries() {
    let server = MockServer::start().await;
    mount_profiles(&server, 1).await;

    let address = server.address();
    let config = Configuration::from_yaml(&format!(
        "radarr:\n  hostname: {}\n  port: {}\n  apiKey: k\n",
        address.ip(),
        address.port()
    ))
    .unwrap();
    let caches = CacheManager::new();

    for _ in 0..2 {
        let radarr =
            RadarrClient::from_config(HttpClient::new().unwrap(), config.radarr().unwrap(), &caches)
                .unwrap();
        radarr.get_quality_profiles().await.unwrap();
    }

    let radarr_stats = caches
        .stats()
        .into_iter()
        .find(|s| s.name == "radarr")
        .unwrap();
    assert_eq!(radarr_stats.hits, 1);
}
