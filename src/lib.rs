//! Radarr integration for a media request manager.
//!
//! [`radarr::RadarrClient`] maps request-workflow operations (list, look up,
//! add, remove movies; read profiles, root folders and the download queue)
//! onto Radarr's v3 REST API. It is built on [`api::ExternalApi`], which
//! merges the API key into every call and serves configuration lookups from a
//! shared [`cache::CacheStore`].

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod radarr;
pub mod servarr;

pub use error::{ArrError, HttpError};
pub use radarr::{AddOutcome, RadarrClient};
