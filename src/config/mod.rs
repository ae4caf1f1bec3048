use crate::http::DEFAULT_TIMEOUT;
use crate::models::{CreateRequest, MinimumAvailability};
use crate::servarr::LOOKUP_CACHE_TTL;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const API_PATH: &str = "/api/v3";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Configuration {
    pub http: Option<HttpConfig>,
    pub radarr: Option<RadarrConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadarrConfig {
    pub hostname: String,
    pub port: u16,
    #[serde(rename = "useSsl", default)]
    pub use_ssl: bool,
    /// Path prefix when the service sits behind a reverse proxy.
    #[serde(rename = "baseUrl")]
    pub url_base: Option<String>,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "activeProfileId")]
    pub active_profile_id: Option<i64>,
    #[serde(rename = "activeDirectory")]
    pub active_directory: Option<String>,
    #[serde(rename = "minimumAvailability")]
    pub minimum_availability: Option<MinimumAvailability>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(rename = "cacheTtlSeconds")]
    pub cache_ttl_seconds: Option<u64>,
}

impl Configuration {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Configuration =
            serde_yaml::from_str(content).context("failed to parse configuration")?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        self.http
            .as_ref()
            .and_then(|h| h.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn radarr(&self) -> anyhow::Result<&RadarrConfig> {
        self.radarr
            .as_ref()
            .context("no radarr section in configuration")
    }
}

impl RadarrConfig {
    /// `{scheme}://{hostname}:{port}{prefix}/api/v3`
    pub fn base_url(&self) -> anyhow::Result<String> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let prefix = match self.url_base.as_deref().map(|p| p.trim_matches('/')) {
            Some(p) if !p.is_empty() => format!("/{p}"),
            _ => String::new(),
        };

        let url = format!(
            "{}://{}:{}{}{}",
            scheme, self.hostname, self.port, prefix, API_PATH
        );
        Url::parse(&url).with_context(|| format!("invalid Radarr URL {url}"))?;
        Ok(url)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(LOOKUP_CACHE_TTL)
    }

    /// Builds a create request, falling back to the configured profile and
    /// root folder when none is given.
    pub fn create_request(
        &self,
        tmdb_id: i64,
        title: String,
        year: Option<i32>,
        quality_profile_id: Option<i64>,
        root_folder_path: Option<String>,
    ) -> anyhow::Result<CreateRequest> {
        let quality_profile_id = quality_profile_id
            .or(self.active_profile_id)
            .context("no quality profile given and activeProfileId is not configured")?;
        let root_folder_path = root_folder_path
            .or_else(|| self.active_directory.clone())
            .context("no root folder given and activeDirectory is not configured")?;

        Ok(CreateRequest {
            title,
            quality_profile_id,
            minimum_availability: self.minimum_availability.unwrap_or_default(),
            tmdb_id,
            year,
            root_folder_path,
            monitored: true,
            search_now: true,
            tags: self.tags.clone(),
        })
    }
}
