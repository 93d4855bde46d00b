//! Data model types for the game catalog.
//!
//! A [`GameRecord`] is the canonical unit of the catalog: created by the
//! normalizer, validated by the dedup engine, and immutable once merged.
//! Field names serialize in camelCase because the catalog document is
//! consumed directly by the site frontend.

use serde::{Deserialize, Serialize};

/// Fixed category taxonomy for catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Action,
    Adventure,
    Arcade,
    Puzzle,
    Racing,
    Shooter,
    Sports,
    Strategy,
    Casual,
    Io,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Adventure => "adventure",
            Self::Arcade => "arcade",
            Self::Puzzle => "puzzle",
            Self::Racing => "racing",
            Self::Shooter => "shooter",
            Self::Sports => "sports",
            Self::Strategy => "strategy",
            Self::Casual => "casual",
            Self::Io => "io",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "action" => Some(Self::Action),
            "adventure" => Some(Self::Adventure),
            "arcade" | "classic" => Some(Self::Arcade),
            "puzzle" | "puzzles" => Some(Self::Puzzle),
            "racing" | "driving" => Some(Self::Racing),
            "shooter" | "shooting" => Some(Self::Shooter),
            "sports" | "sport" => Some(Self::Sports),
            "strategy" => Some(Self::Strategy),
            "casual" => Some(Self::Casual),
            "io" | ".io" => Some(Self::Io),
            _ => None,
        }
    }

    /// All categories, in display order.
    pub fn all() -> &'static [Category] {
        &[
            Self::Action,
            Self::Adventure,
            Self::Arcade,
            Self::Puzzle,
            Self::Racing,
            Self::Shooter,
            Self::Sports,
            Self::Strategy,
            Self::Casual,
            Self::Io,
        ]
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Arcade
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail: String,
    pub embed_url: String,
    pub source_url: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    pub rating: f64,
    pub plays: u64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
    pub created_at: String,
    pub provider: String,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl GameRecord {
    /// Title normalized for duplicate comparison: lowercased and trimmed.
    pub fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

/// Derive a URL-safe slug from a title: lowercase, runs of
/// non-alphanumeric characters collapsed to a single hyphen, no leading or
/// trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
