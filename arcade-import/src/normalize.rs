//! Candidate normalization.
//!
//! [`normalize`] turns a raw [`CandidateItem`] into a canonical
//! [`GameRecord`], synthesizing whatever the source did not provide.
//! Synthesis only ever fills gaps: a rating or play count delivered by the
//! source is kept (the rating clamped into bounds), never overwritten.

use arcade_catalog::{Category, GameRecord, slugify};
use arcade_scraper::CandidateItem;

/// Longest description kept from a source before truncation.
const MAX_DESCRIPTION_LEN: usize = 300;
/// Source descriptions shorter than this are replaced by a template.
const MIN_DESCRIPTION_LEN: usize = 20;
/// Length of the short display blurb.
const SHORT_DESCRIPTION_LEN: usize = 80;
/// Cap on the tag list.
const MAX_TAGS: usize = 8;

/// Rating bounds for both clamping and synthesis.
const RATING_MIN: f64 = 3.0;
const RATING_MAX: f64 = 5.0;

/// Play-count buckets: (cumulative probability, low, high). Small counts
/// are far more likely than huge ones; the long-tail shape is part of the
/// catalog's contract.
const PLAYS_BUCKETS: &[(f64, u64, u64)] = &[
    (0.50, 500, 5_000),
    (0.80, 5_000, 50_000),
    (0.95, 50_000, 500_000),
    (1.00, 500_000, 5_000_000),
];

const FEATURED_PROBABILITY: f64 = 0.10;
const TRENDING_PROBABILITY: f64 = 0.15;

/// Ordered category keyword rules; the first rule with any hit wins.
/// Specific genres come before broad ones so "kart racing action" lands in
/// racing, not action.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (Category::Io, &[".io", "io game"]),
    (
        Category::Racing,
        &["racing", "race", "kart", "drift", "driving", "rally"],
    ),
    (
        Category::Shooter,
        &["shooter", "shooting", "sniper", "gun", "battle royale"],
    ),
    (
        Category::Puzzle,
        &["puzzle", "match 3", "match-3", "sudoku", "merge", "2048", "brain", "logic"],
    ),
    (
        Category::Sports,
        &["soccer", "football", "basketball", "golf", "tennis", "billiard", "sport"],
    ),
    (
        Category::Strategy,
        &["strategy", "tower defense", "defend", "chess", "empire", "conquer"],
    ),
    (
        Category::Adventure,
        &["adventure", "quest", "dungeon", "rpg", "explore"],
    ),
    (
        Category::Casual,
        &["idle", "clicker", "cooking", "farm", "dress up", "makeover"],
    ),
    (
        Category::Action,
        &["action", "ninja", "fight", "combat", "stickman", "zombie", "survival"],
    ),
];

/// Extra tags attached per category.
const CATEGORY_TAGS: &[(Category, &[&str])] = &[
    (Category::Action, &["fast-paced"]),
    (Category::Adventure, &["story"]),
    (Category::Arcade, &["classic"]),
    (Category::Puzzle, &["brain", "logic"]),
    (Category::Racing, &["cars", "speed"]),
    (Category::Shooter, &["aim"]),
    (Category::Sports, &["competitive"]),
    (Category::Strategy, &["thinking"]),
    (Category::Casual, &["relaxing"]),
    (Category::Io, &["multiplayer"]),
];

/// Tags detected from keywords in title/description.
const KEYWORD_TAGS: &[(&str, &str)] = &[
    ("multiplayer", "multiplayer"),
    ("2 player", "2-player"),
    ("two player", "2-player"),
    ("3d", "3d"),
    ("pixel", "pixel-art"),
    ("retro", "retro"),
    ("physics", "physics"),
    ("kids", "kids"),
];

/// Tags every record starts with.
const UNIVERSAL_TAGS: &[&str] = &["free", "online"];

/// Description templates used when the source text is missing or too
/// short. Chosen at random so synthesized entries do not all read alike.
const DESCRIPTION_TEMPLATES: &[&str] = &[
    "Play {title} online for free! No download required - jump straight into the action in your browser.",
    "{title} is a free browser game you can play instantly. Challenge yourself and beat your high score!",
    "Enjoy {title} right in your browser. Free to play, easy to learn, and hard to master.",
    "{title} - play it free online! One of the most addictive games in its genre.",
];

/// Per-source normalization context: provider tag, URL templates, and the
/// source's own category labels mapped into the taxonomy.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub source: String,
    /// Embed URL template with an `{id}` placeholder.
    pub embed_template: String,
    /// Thumbnail URL template with an `{id}` placeholder.
    pub thumbnail_template: String,
}

impl SourceContext {
    pub fn new(
        source: impl Into<String>,
        embed_template: impl Into<String>,
        thumbnail_template: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            embed_template: embed_template.into(),
            thumbnail_template: thumbnail_template.into(),
        }
    }
}

/// Convert a candidate into a canonical record.
///
/// Returns `None` when the item has no usable title or link - a skip, not
/// a failure.
pub fn normalize(item: &CandidateItem, ctx: &SourceContext) -> Option<GameRecord> {
    let title = item.title.trim();
    let url = item.url.trim();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let id = derive_id(&ctx.source, url);
    let category = detect_category(title, item.description.as_deref(), item.category_hint.as_deref());
    let description = build_description(title, item.description.as_deref());
    let short_description = truncate_chars(&description, SHORT_DESCRIPTION_LEN);
    let tags = build_tags(title, item.description.as_deref(), category);

    let rating = match item.rating {
        Some(r) => round1(r.clamp(RATING_MIN, RATING_MAX)),
        None => synth_rating(),
    };
    let plays = item.plays.unwrap_or_else(synth_plays);

    let slug = {
        let s = slugify(title);
        if s.is_empty() { id.clone() } else { s }
    };

    let embed_url = ctx.embed_template.replace("{id}", &id);
    let thumbnail = item
        .thumbnail
        .clone()
        .unwrap_or_else(|| ctx.thumbnail_template.replace("{id}", &id));

    let created_at = item
        .published_at
        .as_deref()
        .and_then(parse_publish_date)
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    Some(GameRecord {
        id,
        title: title.to_string(),
        slug,
        description,
        short_description,
        category,
        tags,
        thumbnail,
        embed_url,
        source_url: url.to_string(),
        width: 800,
        height: 600,
        rating,
        plays,
        featured: fastrand::f64() < FEATURED_PROBABILITY,
        trending: fastrand::f64() < TRENDING_PROBABILITY,
        created_at,
        provider: ctx.source.clone(),
    })
}

/// Derive a stable id from the last URL path segment, prefixed with the
/// source tag. Falls back to a timestamp + random suffix when the segment
/// has no usable characters.
pub fn derive_id(source: &str, url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');
    let segment = path.rsplit('/').next().unwrap_or("");
    let cleaned: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if cleaned.is_empty() {
        format!(
            "{}-{}{:04}",
            source,
            chrono::Utc::now().timestamp_millis(),
            fastrand::u32(0..10_000)
        )
    } else {
        format!("{source}-{cleaned}")
    }
}

/// Assign a category: ordered keyword rules over title+description first,
/// then the source's own category label, then the default.
pub fn detect_category(title: &str, description: Option<&str>, hint: Option<&str>) -> Category {
    let text = format!("{} {}", title, description.unwrap_or("")).to_lowercase();

    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return *category;
        }
    }

    if let Some(mapped) = hint.and_then(Category::from_str_loose) {
        return mapped;
    }

    Category::default()
}

fn build_description(title: &str, source_text: Option<&str>) -> String {
    match source_text.map(str::trim) {
        Some(text) if text.chars().count() >= MIN_DESCRIPTION_LEN => {
            truncate_chars(text, MAX_DESCRIPTION_LEN)
        }
        _ => {
            let template =
                DESCRIPTION_TEMPLATES[fastrand::usize(0..DESCRIPTION_TEMPLATES.len())];
            template.replace("{title}", title)
        }
    }
}

fn build_tags(title: &str, description: Option<&str>, category: Category) -> Vec<String> {
    let text = format!("{} {}", title, description.unwrap_or("")).to_lowercase();
    let mut tags: Vec<String> = UNIVERSAL_TAGS.iter().map(|t| t.to_string()).collect();
    tags.push(category.as_str().to_string());

    if let Some((_, extra)) = CATEGORY_TAGS.iter().find(|(c, _)| *c == category) {
        tags.extend(extra.iter().map(|t| t.to_string()));
    }

    for (keyword, tag) in KEYWORD_TAGS {
        if text.contains(keyword) {
            tags.push(tag.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags.truncate(MAX_TAGS);
    tags
}

fn synth_rating() -> f64 {
    round1(RATING_MIN + fastrand::f64() * (RATING_MAX - RATING_MIN))
}

fn synth_plays() -> u64 {
    let roll = fastrand::f64();
    for (cumulative, low, high) in PLAYS_BUCKETS {
        if roll <= *cumulative {
            return fastrand::u64(*low..*high);
        }
    }
    // roll == 1.0 edge; the last bucket covers it anyway.
    let (_, low, high) = PLAYS_BUCKETS[PLAYS_BUCKETS.len() - 1];
    fastrand::u64(low..high)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Truncate at a character boundary, appending an ellipsis when text was
/// dropped.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out = out.trim_end().to_string();
    out.push('\u{2026}');
    out
}

/// Parse a source publish date: RSS uses RFC 2822, JSON APIs RFC 3339.
fn parse_publish_date(raw: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc2822(raw)
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.to_rfc3339())
}
