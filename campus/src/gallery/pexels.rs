//! Pexels image search, used by the gallery proxy.

use reqwest::header;
use serde::Deserialize;
use tracing::{debug, warn};

use super::GalleryError;
use crate::models::Photo;

pub const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";

/// Category given to search results.
const SEARCH_CATEGORY: &str = "Search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    #[serde(default)]
    alt: String,
    src: PexelsSources,
}

#[derive(Debug, Deserialize)]
struct PexelsSources {
    large: Option<String>,
    original: String,
}

impl From<PexelsPhoto> for Photo {
    fn from(photo: PexelsPhoto) -> Self {
        Self {
            id: photo.id,
            title: photo.alt,
            image: photo.src.large.unwrap_or(photo.src.original),
            category: SEARCH_CATEGORY.to_string(),
        }
    }
}

/// Holds the Pexels key. Lives only in the proxy process.
#[derive(Clone)]
pub struct PexelsClient {
    http: reqwest::Client,
    search_url: String,
    key: String,
}

impl std::fmt::Debug for PexelsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PexelsClient")
            .field("search_url", &self.search_url)
            .finish_non_exhaustive()
    }
}

impl PexelsClient {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_search_url(key, PEXELS_SEARCH_URL)
    }

    pub fn with_search_url(key: impl Into<String>, search_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            search_url: search_url.into(),
            key: key.into(),
        }
    }

    pub async fn search(&self, query: &str, per_page: u32) -> Result<Vec<Photo>, GalleryError> {
        let per_page = per_page.to_string();
        debug!(query, per_page, "Searching Pexels");

        let response = self
            .http
            .get(&self.search_url)
            .header(header::AUTHORIZATION, &self.key)
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Pexels search rejected");
            return Err(GalleryError::Search(format!("Pexels returned {status}")));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.photos.into_iter().map(Photo::from).collect())
    }
}
