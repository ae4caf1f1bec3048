use crate::api::{ApiAuth, ExternalApi};
use crate::cache::{CacheManager, CacheStore, RADARR_CACHE};
use crate::config::RadarrConfig;
use crate::error::{ArrError, HttpError, Result};
use crate::http::HttpClient;
use crate::models::{
    Command, CommandStatus, CreateRequest, MediaItem, MinimumAvailability, QualityProfile,
    RadarrQueueExt, RadarrQueueItem, RootFolder, SystemStatus, Tag,
};
use crate::servarr::ServarrBase;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const SERVICE: &str = "Radarr";

#[derive(Debug, Clone)]
pub struct RadarrClient {
    base: ServarrBase,
}

/// How `add_item` settled the request.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The movie is already on disk; nothing was written.
    AlreadyDownloaded(MediaItem),
    /// The movie is already monitored; nothing was written.
    AlreadyMonitored(MediaItem),
    /// An unmonitored movie was updated and is now monitored.
    Updated(MediaItem),
    /// The movie was added to the library.
    Created(MediaItem),
}

impl AddOutcome {
    pub fn item(&self) -> &MediaItem {
        match self {
            AddOutcome::AlreadyDownloaded(item)
            | AddOutcome::AlreadyMonitored(item)
            | AddOutcome::Updated(item)
            | AddOutcome::Created(item) => item,
        }
    }

    pub fn into_item(self) -> MediaItem {
        match self {
            AddOutcome::AlreadyDownloaded(item)
            | AddOutcome::AlreadyMonitored(item)
            | AddOutcome::Updated(item)
            | AddOutcome::Created(item) => item,
        }
    }

    /// Whether the service was written to.
    pub fn wrote(&self) -> bool {
        matches!(self, AddOutcome::Updated(_) | AddOutcome::Created(_))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie<'a> {
    title: &'a str,
    quality_profile_id: i64,
    profile_id: i64,
    title_slug: String,
    minimum_availability: MinimumAvailability,
    tmdb_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    root_folder_path: &'a str,
    monitored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [i64]>,
    add_options: RadarrAddOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RadarrAddOptions {
    search_for_movie: bool,
}

impl<'a> RadarrMovie<'a> {
    fn from_request(request: &'a CreateRequest) -> Self {
        Self {
            title: &request.title,
            quality_profile_id: request.quality_profile_id,
            profile_id: request.quality_profile_id,
            title_slug: request.tmdb_id.to_string(),
            minimum_availability: request.minimum_availability,
            tmdb_id: request.tmdb_id,
            year: request.year,
            root_folder_path: &request.root_folder_path,
            monitored: request.monitored,
            tags: Some(&request.tags),
            add_options: RadarrAddOptions {
                search_for_movie: request.search_now,
            },
        }
    }
}

/// The existing record with the requested attributes written over it. Tags
/// are left as the service has them.
fn update_payload(movie: &MediaItem, request: &CreateRequest) -> Map<String, Value> {
    let mut payload = match serde_json::to_value(movie) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let overrides = RadarrMovie {
        tags: None,
        ..RadarrMovie::from_request(request)
    };
    if let Ok(Value::Object(overrides)) = serde_json::to_value(&overrides) {
        payload.extend(overrides);
    }

    payload
}

impl RadarrClient {
    pub fn new(http: HttpClient, base_url: &str, api_key: &str) -> std::result::Result<Self, HttpError> {
        let auth = ApiAuth::new()
            .param("apikey", api_key)
            .header("X-Api-Key", api_key)?;
        let api = ExternalApi::new(http, base_url, auth);

        Ok(Self {
            base: ServarrBase::new(api, SERVICE),
        })
    }

    /// Builds a client from config, sharing the process-wide `radarr` cache.
    pub fn from_config(
        http: HttpClient,
        config: &RadarrConfig,
        caches: &CacheManager,
    ) -> anyhow::Result<Self> {
        let mut client = Self::new(http, &config.base_url()?, &config.api_key)?
            .with_cache_ttl(config.cache_ttl());
        if let Some(cache) = caches.get(RADARR_CACHE) {
            client = client.with_cache(cache);
        }
        Ok(client)
    }

    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.base = self.base.with_cache(cache);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.base = self.base.with_cache_ttl(ttl);
        self
    }

    fn api(&self) -> &ExternalApi {
        self.base.api()
    }

    #[instrument(skip(self), fields(service = SERVICE))]
    pub async fn list_items(&self) -> Result<Vec<MediaItem>> {
        self.api()
            .get("/movie", &[])
            .await
            .map_err(|e| self.base.transport("retrieve movies", e))
    }

    #[instrument(skip(self), fields(service = SERVICE))]
    pub async fn get_item(&self, id: i64) -> Result<MediaItem> {
        self.api()
            .get(&format!("/movie/{id}"), &[])
            .await
            .map_err(|e| self.base.transport("retrieve movie", e))
    }

    /// Resolves a TMDB id through the service's lookup endpoint and returns
    /// the first candidate. Any failure, including an empty result, is
    /// reported as [`ArrError::LookupNotFound`].
    #[instrument(skip(self), fields(service = SERVICE))]
    pub async fn find_item_by_external_id(&self, tmdb_id: i64) -> Result<MediaItem> {
        let term = format!("tmdb:{tmdb_id}");
        let result: std::result::Result<Vec<MediaItem>, HttpError> =
            self.api().get("/movie/lookup", &[("term", term.as_str())]).await;

        match result.map(|movies| movies.into_iter().next()) {
            Ok(Some(movie)) => Ok(movie),
            Ok(None) => {
                error!("[{}] Lookup for TMDB ID {} returned no results", SERVICE, tmdb_id);
                Err(self.not_found(tmdb_id))
            }
            Err(e) => {
                error!("[{}] Error retrieving movie by TMDB ID {}: {}", SERVICE, tmdb_id, e);
                Err(self.not_found(tmdb_id))
            }
        }
    }

    /// Makes sure the movie is in the library and monitored.
    ///
    /// A movie that is already downloaded or already monitored is returned as
    /// is. An unmonitored movie is updated in place; a movie the service does
    /// not know is created. Writes are checked against the returned record:
    /// an update must come back monitored and a create must come back with an
    /// id, otherwise [`ArrError::UpstreamRejected`] is returned. Transport
    /// failures on the write collapse into [`ArrError::AddFailed`].
    #[instrument(skip(self, request), fields(service = SERVICE, tmdb_id = request.tmdb_id, title = %request.title))]
    pub async fn add_item(&self, request: &CreateRequest) -> Result<AddOutcome> {
        let movie = self.find_item_by_external_id(request.tmdb_id).await?;

        if movie.downloaded {
            info!(
                "[{}] Title already exists and is available. Skipping add",
                SERVICE
            );
            return Ok(AddOutcome::AlreadyDownloaded(movie));
        }

        if movie.in_library() && !movie.monitored {
            let payload = update_payload(&movie, request);
            let updated: MediaItem = self
                .api()
                .put("/movie", &payload)
                .await
                .map_err(|e| self.add_failed(request, e))?;

            if updated.monitored {
                info!(
                    "[{}] Updated existing movie '{}' to monitored",
                    SERVICE, updated.title
                );
                return Ok(AddOutcome::Updated(updated));
            }

            error!(options = ?request, response = ?updated, "[{}] Update returned a movie that is still unmonitored", SERVICE);
            return Err(ArrError::UpstreamRejected {
                service: SERVICE,
                message: "Failed to update existing movie".to_string(),
            });
        }

        if movie.in_library() {
            info!("[{}] Movie is already monitored. Skipping add", SERVICE);
            return Ok(AddOutcome::AlreadyMonitored(movie));
        }

        let payload = RadarrMovie::from_request(request);
        let created: MediaItem = self
            .api()
            .post("/movie", &payload)
            .await
            .map_err(|e| self.add_failed(request, e))?;

        if created.in_library() {
            info!(
                "[{}] Added movie '{}' with id {}",
                SERVICE, created.title, created.id
            );
            return Ok(AddOutcome::Created(created));
        }

        error!(options = ?request, response = ?created, "[{}] Create returned a movie without an id", SERVICE);
        Err(ArrError::UpstreamRejected {
            service: SERVICE,
            message: "Failed to add movie".to_string(),
        })
    }

    /// Deletes the movie and its files from the library.
    #[instrument(skip(self), fields(service = SERVICE))]
    pub async fn remove_item(&self, tmdb_id: i64) -> Result<()> {
        let movie = self.find_item_by_external_id(tmdb_id).await?;

        if !movie.in_library() {
            warn!("[{}] Movie '{}' is not in the library", SERVICE, movie.title);
            return Err(ArrError::RemoveFailed {
                service: SERVICE,
                external_id: tmdb_id,
            });
        }

        self.api()
            .delete(
                &format!("/movie/{}", movie.id),
                &[("deleteFiles", "true"), ("addImportExclusion", "false")],
            )
            .await
            .map_err(|e| {
                error!("[{}] Failed to remove movie '{}': {}", SERVICE, movie.title, e);
                ArrError::RemoveFailed {
                    service: SERVICE,
                    external_id: tmdb_id,
                }
            })?;

        info!("[{}] Removed movie '{}'", SERVICE, movie.title);
        Ok(())
    }

    /// Asks the service to search indexers for the movie now.
    pub async fn search_item(&self, id: i64) -> Result<CommandStatus> {
        self.base.run_command(&Command::movies_search(vec![id])).await
    }

    pub async fn get_quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.base.get_quality_profiles().await
    }

    pub async fn get_root_folders(&self) -> Result<Vec<RootFolder>> {
        self.base.get_root_folders().await
    }

    pub async fn get_queue(&self) -> Result<Vec<RadarrQueueItem>> {
        self.base.get_queue::<RadarrQueueExt>().await
    }

    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        self.base.get_tags().await
    }

    pub async fn create_tag(&self, label: &str) -> Result<Tag> {
        self.base.create_tag(label).await
    }

    pub async fn get_system_status(&self) -> Result<SystemStatus> {
        self.base.get_system_status().await
    }

    pub async fn refresh_monitored_downloads(&self) -> Result<CommandStatus> {
        self.base.refresh_monitored_downloads().await
    }

    fn not_found(&self, tmdb_id: i64) -> ArrError {
        ArrError::LookupNotFound {
            service: SERVICE,
            external_id: tmdb_id,
        }
    }

    fn add_failed(&self, request: &CreateRequest, e: HttpError) -> ArrError {
        error!(
            options = ?request,
            response = e.response_body().unwrap_or_default(),
            "[{}] Failed to add movie, it may already exist: {}",
            SERVICE,
            e
        );
        ArrError::AddFailed {
            service: SERVICE,
            title: request.title.clone(),
        }
    }
}
