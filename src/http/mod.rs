use crate::error::HttpError;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper over a shared reqwest client. Every call checks the status
/// and keeps the response body around for diagnostics.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("requestarr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self { client })
    }

    #[instrument(skip(self, query, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &HeaderMap,
    ) -> Result<T, HttpError> {
        debug!("Making GET request");
        let request = self.request(Method::GET, url, query, headers);
        let body = self.execute(request, Method::GET, url).await?;
        decode(url, &body)
    }

    #[instrument(skip(self, query, headers, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &HeaderMap,
        body: &B,
    ) -> Result<T, HttpError> {
        debug!("Making POST request");
        let request = self.request(Method::POST, url, query, headers).json(body);
        let text = self.execute(request, Method::POST, url).await?;
        decode(url, &text)
    }

    #[instrument(skip(self, query, headers, body), fields(url = %url))]
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &HeaderMap,
        body: &B,
    ) -> Result<T, HttpError> {
        debug!("Making PUT request");
        let request = self.request(Method::PUT, url, query, headers).json(body);
        let text = self.execute(request, Method::PUT, url).await?;
        decode(url, &text)
    }

    #[instrument(skip(self, query, headers), fields(url = %url))]
    pub async fn delete(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &HeaderMap,
    ) -> Result<(), HttpError> {
        debug!("Making DELETE request");
        let request = self.request(Method::DELETE, url, query, headers);
        self.execute(request, Method::DELETE, url).await?;
        Ok(())
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        headers: &HeaderMap,
    ) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(headers.clone())
            .query(query)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: Method,
        url: &str,
    ) -> Result<String, HttpError> {
        let response = request.send().await.map_err(|source| HttpError::Request {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| HttpError::Request {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            error!("HTTP {} failed with status: {}", method, status);
            return Err(HttpError::Status {
                method,
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, HttpError> {
    serde_json::from_str(body).map_err(|source| HttpError::Decode {
        url: url.to_string(),
        source,
    })
}
