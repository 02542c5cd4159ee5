//! HTTP implementation of the content, search and view collaborators.
//!
//! Talks to the content server's JSON endpoints. One client is built at
//! startup and injected wherever a `Base*` collaborator is needed.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{FeedError, Result};
use crate::traits::{BaseContentSource, BaseSearchSource, BaseViewTracker, SearchRequest};
use crate::types::{ContentId, ContentItem, ContentType, Page};

/// Body of `POST /{content_type}/{id}/view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCountResponse {
    pub new_count: u64,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON client for the content server.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    http: Client,
    base_url: Url,
}

impl HttpContentClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Base URL joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::InvalidInput {
                reason: format!("base URL cannot hold a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Map 404 to `NotFound`, other failures to `TransientFetch`.
    fn check(response: Response, content_type: ContentType, key: &str) -> Result<Response> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FeedError::not_found(content_type, key));
        }
        Ok(response.error_for_status()?)
    }
}

#[async_trait]
impl BaseContentSource for HttpContentClient {
    async fn fetch_page(&self, content_type: ContentType, page: u32, page_size: u32) -> Result<Page> {
        let url = self.endpoint(&[content_type.as_str()])?;
        let response = self
            .http
            .get(url)
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await?;
        let response = Self::check(response, content_type, &format!("page {}", page))?;
        Ok(response.json::<Page>().await?)
    }

    async fn fetch_by_slug(&self, content_type: ContentType, slug: &str) -> Result<ContentItem> {
        let url = self.endpoint(&[content_type.as_str(), "by-slug", slug])?;
        let response = self.http.get(url).send().await?;
        let response = Self::check(response, content_type, slug)?;
        Ok(response.json::<ContentItem>().await?)
    }
}

#[async_trait]
impl BaseSearchSource for HttpContentClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ContentItem>> {
        let url = self.endpoint(&["search"])?;
        let response = self
            .http
            .get(url)
            .query(&search_params(request))
            .send()
            .await?;
        Ok(response.error_for_status()?.json::<Vec<ContentItem>>().await?)
    }
}

/// Query pairs for `GET /search`, one pair per filter value.
///
/// Categories are free text and may contain commas, so values are never joined.
fn search_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", request.query.clone())];
    params.extend(
        request
            .content_types
            .iter()
            .map(|content_type| ("content_type", content_type.as_str().to_string())),
    );
    params.extend(
        request
            .categories
            .iter()
            .map(|category| ("category", category.clone())),
    );
    params
}

#[async_trait]
impl BaseViewTracker for HttpContentClient {
    async fn increment_view(&self, content_type: ContentType, id: ContentId) -> Result<u64> {
        let id_segment = id.to_string();
        let url = self.endpoint(&[content_type.as_str(), &id_segment, "view"])?;
        let response = self.http.post(url).send().await?;
        let response = Self::check(response, content_type, &id_segment)?;
        Ok(response.json::<ViewCountResponse>().await?.new_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpContentClient {
        HttpContentClient::new(ClientConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = client("http://localhost:8080/api/").endpoint(&["video", "by-slug", "intro"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/video/by-slug/intro");
    }

    #[test]
    fn search_params_repeat_keys_instead_of_joining() {
        let request = SearchRequest::new("law")
            .with_content_type(ContentType::Article)
            .with_content_type(ContentType::Responsa)
            .with_category("law, modern");

        assert_eq!(
            search_params(&request),
            vec![
                ("q", "law".to_string()),
                ("content_type", "article".to_string()),
                ("content_type", "responsa".to_string()),
                ("category", "law, modern".to_string()),
            ]
        );
    }

    #[test]
    fn endpoint_encodes_slugs() {
        let url = client("http://localhost:8080").endpoint(&["term", "by-slug", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/term/by-slug/a%20b%2Fc");
    }
}
