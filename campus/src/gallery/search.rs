//! Client side of the gallery proxy.

use reqwest::StatusCode;
use tracing::debug;

use super::GalleryError;
use crate::models::Photo;

/// Talks to a running `campus serve` instance.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search images by keyword.
    pub async fn search(&self, query: &str, per_page: u32) -> Result<Vec<Photo>, GalleryError> {
        let url = format!(
            "{}/search?query={}&per_page={per_page}",
            self.base_url,
            urlencoding::encode(query.trim())
        );
        debug!(%url, "Gallery search");

        let response = self.http.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::SERVICE_UNAVAILABLE => Err(GalleryError::Unavailable(
                response.text().await.unwrap_or_default(),
            )),
            status => Err(GalleryError::Search(format!("proxy returned {status}"))),
        }
    }
}
