//! Curated photo gallery.
//!
//! The catalogue is a JSON array of [`Photo`] records. A copy is compiled
//! into the binary and used unless another file is configured. Image search goes through the local proxy (see [`SearchClient`]),
//! which in turn talks to Pexels.

mod pexels;
mod search;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::{Category, Photo};

pub use pexels::PexelsClient;
pub use search::SearchClient;

/// Catalogue compiled into the binary.
const BUNDLED_GALLERY: &str = include_str!("../../assets/galleryData.json");

/// Results per search page when none is requested.
pub const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Failed to read gallery {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Gallery {} is not a list of photos: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bundled gallery is not a list of photos: {0}")]
    Bundled(#[source] serde_json::Error),

    #[error("Image search failed: {0}")]
    Search(String),

    #[error("Image search is unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// The curated photos.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    photos: Vec<Photo>,
}

impl Catalog {
    pub const fn new(photos: Vec<Photo>) -> Self {
        Self { photos }
    }

    /// Read the catalogue file.
    pub fn load(path: &Path) -> Result<Self, GalleryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| GalleryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let photos: Vec<Photo> =
            serde_json::from_str(&raw).map_err(|source| GalleryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(count = photos.len(), path = %path.display(), "Gallery loaded");
        Ok(Self { photos })
    }

    /// The catalogue shipped with the app.
    pub fn bundled() -> Result<Self, GalleryError> {
        let photos: Vec<Photo> =
            serde_json::from_str(BUNDLED_GALLERY).map_err(GalleryError::Bundled)?;
        debug!(count = photos.len(), "Bundled gallery loaded");
        Ok(Self { photos })
    }

    /// Load `path` when given, otherwise the bundled catalogue.
    pub fn open(path: Option<&Path>) -> Result<Self, GalleryError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn get(&self, id: u64) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Photos in `category` whose title contains `query`.
    ///
    /// The query is trimmed and compared case-insensitively; a blank query
    /// matches every title.
    pub fn filter(&self, category: Category, query: &str) -> Vec<&Photo> {
        let needle = query.trim().to_lowercase();
        self.photos
            .iter()
            .filter(|p| category.matches(&p.category))
            .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Open a photo's full-size image in the system viewer.
pub fn open_photo(photo: &Photo) -> std::io::Result<()> {
    debug!(url = %photo.image, "Opening photo");
    open::that(&photo.image)
}
