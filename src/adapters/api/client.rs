//! Paginated REST source client
//!
//! Walks `<base_url>/<endpoint>?page=N` from page 1 until the source reports no
//! next page. There is no retry: the first transport error, non-2xx status or
//! undecodable body aborts the walk for that endpoint.

use super::models::PageResponse;
use crate::config::SourceConfig;
use crate::domain::{FetchError, RawEntity, Result, StrataError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

/// Source of entity records that arrive a page at a time
#[async_trait]
pub trait PaginatedFetcher: Send + Sync {
    /// Fetches every record of an endpoint, all pages concatenated in page order
    ///
    /// # Arguments
    ///
    /// * `entity_type` - Entity type name, used for record validation and logs
    /// * `endpoint` - Path below the source base URL, e.g. `character`
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` if any page fails, and `MalformedRecord` if a record
    /// has no integer `id`.
    async fn fetch(&self, entity_type: &str, endpoint: &str) -> Result<Vec<RawEntity>>;
}

/// reqwest-backed [`PaginatedFetcher`]
pub struct RestApiClient {
    base_url: String,
    max_pages: u32,
    client: Client,
}

impl RestApiClient {
    /// Creates a client from the `[source]` configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use strata::adapters::api::{PaginatedFetcher, RestApiClient};
    /// use strata::config::SourceConfig;
    ///
    /// # async fn example() -> strata::domain::Result<()> {
    /// let client = RestApiClient::new(&SourceConfig::default())?;
    /// let episodes = client.fetch("Episode", "episode").await?;
    /// println!("{} episodes", episodes.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("strata/", env!("CARGO_PKG_VERSION")));

        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| StrataError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_pages: config.max_pages,
            client,
        })
    }

    /// Base URL of the source API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one page of an endpoint
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL and endpoint do not form a
    /// valid URL.
    pub fn page_url(&self, endpoint: &str, page: u32) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| StrataError::Configuration(format!("Invalid source URL '{raw}': {e}")))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<PageResponse> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            FetchError::Transient {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transient {
                url: url.to_string(),
                message: format!("status {status}: {body}"),
            }
            .into());
        }

        response.json::<PageResponse>().await.map_err(|e| {
            FetchError::InvalidResponse {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl PaginatedFetcher for RestApiClient {
    async fn fetch(&self, entity_type: &str, endpoint: &str) -> Result<Vec<RawEntity>> {
        let mut entities = Vec::new();
        let mut page = 1;

        loop {
            if page > self.max_pages {
                return Err(FetchError::PageLimitExceeded {
                    endpoint: endpoint.to_string(),
                    max_pages: self.max_pages,
                }
                .into());
            }

            let url = self.page_url(endpoint, page)?;
            tracing::debug!(entity = %entity_type, page = page, url = %url, "Extracting page");

            let response = self.fetch_page(&url).await?;
            let has_next = response.has_next();

            for record in response.results {
                entities.push(RawEntity::from_value(entity_type, record)?);
            }

            if !has_next {
                break;
            }
            page += 1;
        }

        tracing::info!(
            entity = %entity_type,
            endpoint = %endpoint,
            pages = page,
            records = entities.len(),
            "Fetched entity collection"
        );

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> SourceConfig {
        SourceConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_page_url() {
        let client = RestApiClient::new(&config("https://rickandmortyapi.com/api/")).unwrap();
        assert_eq!(
            client.page_url("character", 3).unwrap().as_str(),
            "https://rickandmortyapi.com/api/character?page=3"
        );
        assert_eq!(
            client.page_url("/episode/", 1).unwrap().as_str(),
            "https://rickandmortyapi.com/api/episode?page=1"
        );
    }

    #[tokio::test]
    async fn test_page_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/location")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"info": {"next": "more"}, "results": [{"id": 1}]}"#)
            .expect(2)
            .create_async()
            .await;

        let client = RestApiClient::new(&SourceConfig {
            max_pages: 2,
            ..config(&server.url())
        })
        .unwrap();

        let err = client.fetch("Location", "location").await.unwrap_err();
        assert!(matches!(
            err,
            StrataError::Fetch(FetchError::PageLimitExceeded { max_pages: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/episode")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = RestApiClient::new(&config(&server.url())).unwrap();
        let err = client.fetch("Episode", "episode").await.unwrap_err();
        assert!(matches!(err, StrataError::Fetch(FetchError::Transient { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/episode")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = RestApiClient::new(&config(&server.url())).unwrap();
        let err = client.fetch("Episode", "episode").await.unwrap_err();
        assert!(matches!(err, StrataError::Fetch(FetchError::InvalidResponse { .. })));
    }
}
