//! Keyword tables for intent detection and parameter extraction
//!
//! All matching is plain substring search on the lower-cased message.

/// Priority 1
pub const TALLEST_KEYWORDS: &[&str] = &["tallest", "highest", "maximum height"];

/// Priority 2
pub const SHORTEST_KEYWORDS: &[&str] = &["shortest", "lowest", "minimum height"];

/// Priority 3 requires "top" plus one of these
pub const TOP_KEYWORDS: &[&str] = &["buildings", "tallest"];

/// Priority 4
pub const COMPARE_KEYWORDS: &[&str] = &["compare", "difference", "vs", "versus"];

/// Priority 5
pub const HEIGHT_RANGE_KEYWORDS: &[&str] =
    &["height range", "between", "tall buildings", "skyscrapers"];

/// Priority 6 requires "type" plus one of these
pub const DISTRIBUTION_KEYWORDS: &[&str] = &["distribution", "breakdown", "category"];

/// Priority 7
pub const SEARCH_KEYWORDS: &[&str] = &["search", "find", "show", "list"];

/// Priority 8
pub const STATISTICS_KEYWORDS: &[&str] = &["statistics", "stats", "summary", "overview"];

/// Priority 9
pub const NEARBY_KEYWORDS: &[&str] = &["near", "around", "within", "distance"];

/// Priority 11
pub const ADDRESS_KEYWORDS: &[&str] = &["address", "location", "street"];

/// Priority 12
pub const COUNT_KEYWORDS: &[&str] = &["how many", "count", "total number"];

/// Landmarks the chatbot recognizes by name (priority 4 and 10)
pub const KNOWN_BUILDINGS: &[&str] = &[
    "empire state building",
    "one world trade center",
    "chrysler building",
    "burj khalifa",
    "abraj al bait",
    "masjid al haram",
    "kingdom centre",
    "jabal omar",
];

/// Streets recognized by the address search (priority 11)
pub const STREET_KEYWORDS: &[&str] = &[
    "ibrahim al khalil",
    "ajyad",
    "king abdul aziz",
    "umm al qura",
    "al haram",
    "al masjid al haram",
    "fifth avenue",
    "broadway",
    "wall street",
];

/// Message keyword → stored `building_type` value
pub const BUILDING_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("office", "office"),
    ("residential", "residential"),
    ("apartment", "apartments"),
    ("house", "house"),
    ("hotel", "hotel"),
    ("religious", "religious"),
    ("mosque", "mosque"),
    ("commercial", "commercial"),
    ("retail", "retail"),
    ("industrial", "industrial"),
    ("hospital", "hospital"),
    ("school", "school"),
    ("university", "university"),
    ("government", "government"),
];

/// True if the (already lower-cased) text contains any of the keywords
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Keywords present in the text, in table order
pub fn matching<'a>(text: &str, keywords: &[&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|keyword| text.contains(keyword))
        .collect()
}
