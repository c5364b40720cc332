use serde::Serialize;

/// A category pitches are filed under.
///
/// `category_id` is the scraper's identifier and never changes; `slug` is
/// derived from the name once, suffixed `-1`, `-2`, ... on collision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub slug: String,
    pub created_at_us: i64,
}

/// A category with the number of pitches filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub pitch_count: u64,
}

/// Category reference carried by an ingest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub category_id: String,
    /// Display name; the ID doubles as the name when none is supplied.
    pub name: String,
}
