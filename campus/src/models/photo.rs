//! Gallery photo model.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A photo in the curated gallery or in image search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: u64,
    pub title: String,
    /// Full-size image URL.
    pub image: String,
    #[serde(default)]
    pub category: String,
}

/// Gallery categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Category {
    /// Every photo.
    #[default]
    All,
    Activities,
    Facilities,
    #[value(name = "collage-photography", alias = "collagephotography")]
    CollagePhotography,
}

impl Category {
    /// Name as it appears in the gallery data.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Activities => "Activities",
            Self::Facilities => "Facilities",
            Self::CollagePhotography => "CollagePhotography",
        }
    }

    /// Parse a category as named in gallery data or on the command line,
    /// ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::value_variants().iter().copied().find(|category| {
            category.as_str().eq_ignore_ascii_case(name)
                || category
                    .to_possible_value()
                    .is_some_and(|value| value.matches(name, true))
        })
    }

    /// Whether a photo's category belongs to this one.
    pub fn matches(self, category: &str) -> bool {
        self == Self::All || self.as_str().eq_ignore_ascii_case(category)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
