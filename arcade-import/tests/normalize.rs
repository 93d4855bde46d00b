use arcade_catalog::Category;
use arcade_import::{SourceContext, normalize};
use arcade_scraper::CandidateItem;

fn ctx() -> SourceContext {
    SourceContext::new(
        "feed",
        "https://games.example.com/embed/{id}/",
        "https://games.example.com/thumbs/{id}.jpg",
    )
}

fn candidate(title: &str, url: &str) -> CandidateItem {
    CandidateItem {
        title: title.to_string(),
        url: url.to_string(),
        source: "feed".to_string(),
        ..Default::default()
    }
}

#[test]
fn full_normalization_of_a_feed_item() {
    let mut item = candidate("Bubble Pop", "https://games.example.com/play/bubble-pop/");
    item.description =
        Some("Pop all the bubbles before the timer runs out in this colorful puzzle.".to_string());
    item.published_at = Some("Mon, 03 Aug 2026 09:30:00 +0000".to_string());

    let record = normalize(&item, &ctx()).expect("usable item");
    assert_eq!(record.id, "feed-bubblepop");
    assert_eq!(record.slug, "bubble-pop");
    assert_eq!(record.category, Category::Puzzle);
    assert_eq!(record.embed_url, "https://games.example.com/embed/feed-bubblepop/");
    assert_eq!(record.thumbnail, "https://games.example.com/thumbs/feed-bubblepop.jpg");
    assert_eq!(record.source_url, "https://games.example.com/play/bubble-pop/");
    assert_eq!(record.provider, "feed");
    assert_eq!(record.width, 800);
    assert_eq!(record.height, 600);
    assert!(record.created_at.starts_with("2026-08-03"));
    assert!((3.0..=5.0).contains(&record.rating));
    assert!(record.plays >= 500);
}

#[test]
fn items_without_title_or_link_are_skipped() {
    assert!(normalize(&candidate("", "https://x.example.com/game/a/"), &ctx()).is_none());
    assert!(normalize(&candidate("A Game", ""), &ctx()).is_none());
    assert!(normalize(&candidate("   ", "   "), &ctx()).is_none());
}

#[test]
fn provided_metrics_are_kept_not_overwritten() {
    let mut item = candidate("Tower Siege", "https://games.example.com/play/tower-siege/");
    item.rating = Some(4.6);
    item.plays = Some(88_231);

    let record = normalize(&item, &ctx()).unwrap();
    assert_eq!(record.rating, 4.6);
    assert_eq!(record.plays, 88_231);
}

#[test]
fn out_of_range_provided_rating_is_clamped() {
    let mut item = candidate("Overrated", "https://games.example.com/play/overrated/");
    item.rating = Some(9.7);
    assert_eq!(normalize(&item, &ctx()).unwrap().rating, 5.0);

    item.rating = Some(0.5);
    assert_eq!(normalize(&item, &ctx()).unwrap().rating, 3.0);
}

#[test]
fn category_assignment_is_deterministic() {
    let mut item = candidate("Kart Mayhem", "https://games.example.com/play/kart-mayhem/");
    item.description = Some("Drift around tight corners and win the grand prix.".to_string());

    let first = normalize(&item, &ctx()).unwrap().category;
    for _ in 0..20 {
        assert_eq!(normalize(&item, &ctx()).unwrap().category, first);
    }
    assert_eq!(first, Category::Racing);
}

#[test]
fn category_hint_applies_when_no_keyword_matches() {
    let mut item = candidate("Zorbulon", "https://games.example.com/play/zorbulon/");
    item.category_hint = Some("shooting".to_string());
    assert_eq!(normalize(&item, &ctx()).unwrap().category, Category::Shooter);

    item.category_hint = None;
    assert_eq!(normalize(&item, &ctx()).unwrap().category, Category::Arcade);
}

#[test]
fn short_description_is_a_prefix_of_description() {
    let mut item = candidate("Maze Mind", "https://games.example.com/play/maze-mind/");
    item.description = Some(
        "Navigate the shifting maze, collect every orb, and escape before the walls close in. \
         Each level adds new traps and tighter corridors to master."
            .to_string(),
    );

    let record = normalize(&item, &ctx()).unwrap();
    assert!(record.short_description.chars().count() <= 80);
    let prefix: String = record
        .short_description
        .trim_end_matches('\u{2026}')
        .chars()
        .take(20)
        .collect();
    assert!(record.description.starts_with(&prefix));
}

#[test]
fn tags_start_with_universals_and_stay_capped() {
    let mut item = candidate(
        "3D Multiplayer Pixel Soccer",
        "https://games.example.com/play/pixel-soccer/",
    );
    item.description = Some("Retro physics football for two players and kids alike.".to_string());

    let record = normalize(&item, &ctx()).unwrap();
    assert_eq!(&record.tags[..2], &["free".to_string(), "online".to_string()]);
    assert!(record.tags.len() <= 8);
    let unique: std::collections::HashSet<_> = record.tags.iter().collect();
    assert_eq!(unique.len(), record.tags.len());
}

#[test]
fn missing_publish_date_falls_back_to_now() {
    let item = candidate("Fresh Game", "https://games.example.com/play/fresh-game/");
    let record = normalize(&item, &ctx()).unwrap();
    // RFC 3339 shape, parseable back.
    assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
}
