//! Generic client for one external service: a base URL, fixed auth merged
//! into every request, and an optional read-through cache for GETs.

use crate::cache::CacheStore;
use crate::error::HttpError;
use crate::http::HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Query parameters and headers attached to every request.
#[derive(Debug, Clone, Default)]
pub struct ApiAuth {
    params: Vec<(String, String)>,
    headers: HeaderMap,
}

impl ApiAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Result<Self, HttpError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidHeader { name })?;
        let value =
            HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader { name })?;
        self.headers.insert(header_name, value);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ExternalApi {
    http: HttpClient,
    base_url: String,
    auth: ApiAuth,
    cache: Option<Arc<CacheStore>>,
}

impl ExternalApi {
    pub fn new(http: HttpClient, base_url: impl Into<String>, auth: ApiAuth) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            auth,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> Option<&Arc<CacheStore>> {
        self.cache.as_ref()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let query = self.query(params);
        self.http
            .get_json(&self.url(path), &query, &self.auth.headers)
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let query = self.query(&[]);
        self.http
            .post_json(&self.url(path), &query, &self.auth.headers, body)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let query = self.query(&[]);
        self.http
            .put_json(&self.url(path), &query, &self.auth.headers, body)
            .await
    }

    pub async fn delete(&self, path: &str, params: &[(&str, &str)]) -> Result<(), HttpError> {
        let query = self.query(params);
        self.http
            .delete(&self.url(path), &query, &self.auth.headers)
            .await
    }

    /// GET through the cache. A live entry is returned without touching the
    /// network; otherwise the response is fetched and stored for `ttl`.
    /// Failed fetches leave the cache untouched.
    #[instrument(skip(self, params), fields(base_url = %self.base_url))]
    pub async fn get_rolling<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        ttl: Duration,
    ) -> Result<T, HttpError> {
        let Some(cache) = &self.cache else {
            return self.get(path, params).await;
        };

        let key = self.cache_key(path, params);
        if let Some(value) = cache.get(&key).await {
            return T::deserialize(value.as_ref()).map_err(|source| HttpError::Decode {
                url: key.clone(),
                source,
            });
        }

        let value: serde_json::Value = self.get(path, params).await?;
        let typed = T::deserialize(&value).map_err(|source| HttpError::Decode {
            url: key.clone(),
            source,
        })?;

        debug!(key = %key, ttl_secs = ttl.as_secs(), "Caching response");
        cache.insert(key, value, ttl).await;

        Ok(typed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn query<'a>(&'a self, params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        self.auth
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(params.iter().copied())
            .collect()
    }

    /// Auth params are left out so keys never carry credentials.
    fn cache_key(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut key = self.url(path);
        if !params.is_empty() {
            let encoded: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            key.push('?');
            key.push_str(&encoded.join("&"));
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ExternalApi {
        ExternalApi::new(
            HttpClient::new().unwrap(),
            "http://localhost:7878/api/v3/",
            ApiAuth::new().param("apikey", "secret"),
        )
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(api().base_url(), "http://localhost:7878/api/v3");
    }

    #[test]
    fn cache_key_includes_params_but_not_auth() {
        let api = api();
        assert_eq!(
            api.cache_key("/qualityProfile", &[]),
            "http://localhost:7878/api/v3/qualityProfile"
        );
        assert_eq!(
            api.cache_key("/movie/lookup", &[("term", "tmdb:603")]),
            "http://localhost:7878/api/v3/movie/lookup?term=tmdb%3A603"
        );
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let auth = ApiAuth::new().header("X-Api-Key", "secret").unwrap();
        assert_eq!(auth.headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn invalid_header_is_an_error() {
        assert!(matches!(
            ApiAuth::new().header("X Api Key", "secret"),
            Err(HttpError::InvalidHeader { name: "X Api Key" })
        ));
        assert!(matches!(
            ApiAuth::new().header("x-api-key", "line\nbreak"),
            Err(HttpError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn auth_params_come_first() {
        let api = api();
        assert_eq!(
            api.query(&[("term", "x")]),
            vec![("apikey", "secret"), ("term", "x")]
        );
    }
}
