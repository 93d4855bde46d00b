//! Deduplication engine.
//!
//! Partitions candidate records into unique vs. duplicate against four
//! indices built from the existing catalog: id, normalized title, embed
//! URL, and slug. Unique candidates are added to the in-run sets as they
//! pass, so duplicates *within the same batch* are caught too - without
//! that second level, one run could insert the same game twice.

use std::collections::HashSet;

use arcade_catalog::GameRecord;

/// Why a candidate was classified as a duplicate. Checks run in this
/// order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicateReason {
    Id,
    Title,
    EmbedUrl,
    Slug,
}

impl DuplicateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::EmbedUrl => "embedUrl",
            Self::Slug => "slug",
        }
    }

    pub fn all() -> &'static [DuplicateReason] {
        &[Self::Id, Self::Title, Self::EmbedUrl, Self::Slug]
    }
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected candidate with its rejection reason.
#[derive(Debug, Clone)]
pub struct Duplicate {
    pub record: GameRecord,
    pub reason: DuplicateReason,
}

/// Result of partitioning a candidate batch.
#[derive(Debug, Default)]
pub struct Partition {
    pub unique: Vec<GameRecord>,
    pub duplicates: Vec<Duplicate>,
}

/// Split `candidates` into records safe to merge and duplicates.
///
/// Every candidate lands in exactly one of the two lists:
/// `unique.len() + duplicates.len() == candidates.len()`.
pub fn partition(existing: &[GameRecord], candidates: Vec<GameRecord>) -> Partition {
    let mut ids: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
    let mut titles: HashSet<String> = existing.iter().map(|r| r.normalized_title()).collect();
    let mut embeds: HashSet<String> = existing.iter().map(|r| r.embed_url.clone()).collect();
    let mut slugs: HashSet<String> = existing.iter().map(|r| r.slug.clone()).collect();

    let mut result = Partition::default();

    for candidate in candidates {
        let reason = if ids.contains(&candidate.id) {
            Some(DuplicateReason::Id)
        } else if titles.contains(&candidate.normalized_title()) {
            Some(DuplicateReason::Title)
        } else if embeds.contains(&candidate.embed_url) {
            Some(DuplicateReason::EmbedUrl)
        } else if slugs.contains(&candidate.slug) {
            Some(DuplicateReason::Slug)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::debug!(
                    "Duplicate ({}) rejected: '{}' [{}]",
                    reason,
                    candidate.title,
                    candidate.id
                );
                result.duplicates.push(Duplicate {
                    record: candidate,
                    reason,
                });
            }
            None => {
                ids.insert(candidate.id.clone());
                titles.insert(candidate.normalized_title());
                embeds.insert(candidate.embed_url.clone());
                slugs.insert(candidate.slug.clone());
                result.unique.push(candidate);
            }
        }
    }

    result
}
