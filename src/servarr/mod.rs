//! Endpoints shared by every *arr service (Radarr, Sonarr): profiles, root
//! folders, the download queue, tags, system status and commands.

use crate::api::ExternalApi;
use crate::cache::CacheStore;
use crate::error::{ArrError, HttpError, Result};
use crate::models::{
    Command, CommandStatus, QualityProfile, QueueItem, QueuePage, RootFolder, SystemStatus, Tag,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// How long profile and root-folder lookups stay cached.
pub const LOOKUP_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct ServarrBase {
    api: ExternalApi,
    service: &'static str,
    cache_ttl: Duration,
}

impl ServarrBase {
    pub fn new(api: ExternalApi, service: &'static str) -> Self {
        Self {
            api,
            service,
            cache_ttl: LOOKUP_CACHE_TTL,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.api = self.api.with_cache(cache);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn api(&self) -> &ExternalApi {
        &self.api
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    #[instrument(skip(self), fields(service = self.service))]
    pub async fn get_system_status(&self) -> Result<SystemStatus> {
        self.api
            .get("/system/status", &[])
            .await
            .map_err(|e| self.transport("retrieve status", e))
    }

    #[instrument(skip(self), fields(service = self.service))]
    pub async fn get_quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.api
            .get_rolling("/qualityProfile", &[], self.cache_ttl)
            .await
            .map_err(|e| self.transport("retrieve quality profiles", e))
    }

    #[instrument(skip(self), fields(service = self.service))]
    pub async fn get_root_folders(&self) -> Result<Vec<RootFolder>> {
        self.api
            .get_rolling("/rootfolder", &[], self.cache_ttl)
            .await
            .map_err(|e| self.transport("retrieve root folders", e))
    }

    /// Current download queue. Only the records are returned; the page
    /// metadata of the envelope is dropped.
    #[instrument(skip(self), fields(service = self.service))]
    pub async fn get_queue<E: DeserializeOwned>(&self) -> Result<Vec<QueueItem<E>>> {
        let page: QueuePage<QueueItem<E>> = self
            .api
            .get("/queue", &[])
            .await
            .map_err(|e| self.transport("retrieve queue", e))?;

        Ok(page.records)
    }

    #[instrument(skip(self), fields(service = self.service))]
    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        self.api
            .get("/tag", &[])
            .await
            .map_err(|e| self.transport("retrieve tags", e))
    }

    #[instrument(skip(self), fields(service = self.service))]
    pub async fn create_tag(&self, label: &str) -> Result<Tag> {
        self.api
            .post("/tag", &json!({ "label": label }))
            .await
            .map_err(|e| self.transport("create tag", e))
    }

    #[instrument(skip(self, command), fields(service = self.service, command = %command.name))]
    pub async fn run_command(&self, command: &Command) -> Result<CommandStatus> {
        let status: CommandStatus = self
            .api
            .post("/command", command)
            .await
            .map_err(|e| self.transport("run command", e))?;

        info!("Queued {} command #{}", status.name, status.id);
        Ok(status)
    }

    pub async fn refresh_monitored_downloads(&self) -> Result<CommandStatus> {
        self.run_command(&Command::new("RefreshMonitoredDownloads"))
            .await
    }

    pub(crate) fn transport(&self, operation: &'static str, source: HttpError) -> ArrError {
        error!("[{}] Failed to {}: {}", self.service, operation, source);
        ArrError::transport(self.service, operation, source)
    }
}
