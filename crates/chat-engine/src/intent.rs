//! Query intent classification
//!
//! Classification walks [`RULES`] in order and takes the first rule whose
//! predicate matches the lower-cased message. The order is part of the
//! chatbot's observable behavior: a message mentioning both "tallest" and
//! "how many" is a tallest query.

use crate::extractors::{
    extract_building_types, extract_compare_names, extract_height_comparator,
    extract_known_building, extract_street, extract_top_count, height_range_or_default,
    HeightComparator,
};
use crate::patterns::*;

/// Search parameters extracted from a search message
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchCriteria {
    pub building_types: Vec<String>,
    pub height: Option<HeightComparator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Tallest,
    Shortest,
    TopN { count: u32 },
    Compare { names: Vec<String> },
    HeightRange { min: f64, max: f64 },
    TypeDistribution,
    Search(SearchCriteria),
    Statistics,
    Nearby,
    SpecificBuilding { name: String },
    AddressSearch { street: Option<String> },
    Count { building_types: Vec<String> },
    Help,
}

/// Discriminant of [`Intent`], used to name rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Tallest,
    Shortest,
    TopN,
    Compare,
    HeightRange,
    TypeDistribution,
    Search,
    Statistics,
    Nearby,
    SpecificBuilding,
    AddressSearch,
    Count,
    Help,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Tallest => IntentKind::Tallest,
            Intent::Shortest => IntentKind::Shortest,
            Intent::TopN { .. } => IntentKind::TopN,
            Intent::Compare { .. } => IntentKind::Compare,
            Intent::HeightRange { .. } => IntentKind::HeightRange,
            Intent::TypeDistribution => IntentKind::TypeDistribution,
            Intent::Search(_) => IntentKind::Search,
            Intent::Statistics => IntentKind::Statistics,
            Intent::Nearby => IntentKind::Nearby,
            Intent::SpecificBuilding { .. } => IntentKind::SpecificBuilding,
            Intent::AddressSearch { .. } => IntentKind::AddressSearch,
            Intent::Count { .. } => IntentKind::Count,
            Intent::Help => IntentKind::Help,
        }
    }
}

/// One entry of the decision list
pub struct Rule {
    pub kind: IntentKind,
    pub matches: fn(&str) -> bool,
    pub extract: fn(&str) -> Intent,
}

/// Decision list in priority order. Help is the fallback, not a rule.
pub const RULES: &[Rule] = &[
    Rule {
        kind: IntentKind::Tallest,
        matches: |t| contains_any(t, TALLEST_KEYWORDS),
        extract: |_| Intent::Tallest,
    },
    Rule {
        kind: IntentKind::Shortest,
        matches: |t| contains_any(t, SHORTEST_KEYWORDS),
        extract: |_| Intent::Shortest,
    },
    Rule {
        kind: IntentKind::TopN,
        matches: |t| t.contains("top") && contains_any(t, TOP_KEYWORDS),
        extract: |t| Intent::TopN {
            count: extract_top_count(t),
        },
    },
    Rule {
        kind: IntentKind::Compare,
        matches: |t| contains_any(t, COMPARE_KEYWORDS),
        extract: |t| Intent::Compare {
            names: extract_compare_names(t),
        },
    },
    Rule {
        kind: IntentKind::HeightRange,
        matches: |t| contains_any(t, HEIGHT_RANGE_KEYWORDS),
        extract: |t| {
            let (min, max) = height_range_or_default(t);
            Intent::HeightRange { min, max }
        },
    },
    Rule {
        kind: IntentKind::TypeDistribution,
        matches: |t| t.contains("type") && contains_any(t, DISTRIBUTION_KEYWORDS),
        extract: |_| Intent::TypeDistribution,
    },
    Rule {
        kind: IntentKind::Search,
        matches: |t| contains_any(t, SEARCH_KEYWORDS),
        extract: |t| {
            Intent::Search(SearchCriteria {
                building_types: extract_building_types(t),
                height: extract_height_comparator(t),
            })
        },
    },
    Rule {
        kind: IntentKind::Statistics,
        matches: |t| contains_any(t, STATISTICS_KEYWORDS),
        extract: |_| Intent::Statistics,
    },
    Rule {
        kind: IntentKind::Nearby,
        matches: |t| contains_any(t, NEARBY_KEYWORDS),
        extract: |_| Intent::Nearby,
    },
    Rule {
        kind: IntentKind::SpecificBuilding,
        matches: |t| contains_any(t, KNOWN_BUILDINGS),
        extract: |t| Intent::SpecificBuilding {
            name: extract_known_building(t).unwrap_or_default(),
        },
    },
    Rule {
        kind: IntentKind::AddressSearch,
        matches: |t| contains_any(t, ADDRESS_KEYWORDS),
        extract: |t| Intent::AddressSearch {
            street: extract_street(t),
        },
    },
    Rule {
        kind: IntentKind::Count,
        matches: |t| contains_any(t, COUNT_KEYWORDS),
        extract: |t| Intent::Count {
            building_types: extract_building_types(t),
        },
    },
];

/// Classify a raw chat message
pub fn classify(message: &str) -> Intent {
    let text = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| (rule.extract)(&text))
        .unwrap_or(Intent::Help)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kind_of(message: &str) -> IntentKind {
        classify(message).kind()
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let order: Vec<IntentKind> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(
            order,
            vec![
                IntentKind::Tallest,
                IntentKind::Shortest,
                IntentKind::TopN,
                IntentKind::Compare,
                IntentKind::HeightRange,
                IntentKind::TypeDistribution,
                IntentKind::Search,
                IntentKind::Statistics,
                IntentKind::Nearby,
                IntentKind::SpecificBuilding,
                IntentKind::AddressSearch,
                IntentKind::Count,
            ]
        );
    }

    #[test]
    fn test_tallest_beats_count() {
        assert_eq!(
            kind_of("How many buildings are taller than the tallest?"),
            IntentKind::Tallest
        );
    }

    #[test]
    fn test_each_intent_has_a_trigger() {
        assert_eq!(kind_of("What is the highest building?"), IntentKind::Tallest);
        assert_eq!(kind_of("What is the shortest building?"), IntentKind::Shortest);
        assert_eq!(kind_of("top 3 buildings"), IntentKind::TopN);
        assert_eq!(kind_of("Compare A versus B"), IntentKind::Compare);
        assert_eq!(kind_of("show skyscrapers"), IntentKind::HeightRange);
        assert_eq!(kind_of("building type breakdown"), IntentKind::TypeDistribution);
        assert_eq!(kind_of("find hotels"), IntentKind::Search);
        assert_eq!(kind_of("give me some stats"), IntentKind::Statistics);
        assert_eq!(kind_of("what is near me"), IntentKind::Nearby);
        assert_eq!(kind_of("Tell me about Burj Khalifa"), IntentKind::SpecificBuilding);
        assert_eq!(kind_of("which street is it on"), IntentKind::AddressSearch);
        assert_eq!(kind_of("How many hotels are there?"), IntentKind::Count);
        assert_eq!(kind_of("hello"), IntentKind::Help);
    }

    #[test]
    fn test_top_n_parsing() {
        assert_eq!(
            classify("show me top 12 buildings"),
            Intent::TopN { count: 12 }
        );
        assert_eq!(classify("top buildings"), Intent::TopN { count: 5 });
    }

    #[test]
    fn test_compare_extracts_two_names() {
        assert_eq!(
            classify("Compare Empire State Building vs One World Trade Center"),
            Intent::Compare {
                names: vec![
                    "empire state building".to_string(),
                    "one world trade center".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_height_range_parsing() {
        assert_eq!(
            classify("buildings between 150 to 300 meters"),
            Intent::HeightRange {
                min: 150.0,
                max: 300.0
            }
        );
        assert_eq!(
            classify("list tall buildings"),
            Intent::HeightRange {
                min: 100.0,
                max: 500.0
            }
        );
    }

    #[test]
    fn test_search_extracts_types_and_height() {
        assert_eq!(
            classify("Find office buildings over 200m"),
            Intent::Search(SearchCriteria {
                building_types: vec!["office".to_string()],
                height: Some(HeightComparator::Over(200.0)),
            })
        );
    }

    #[test]
    fn test_specific_building_name() {
        assert_eq!(
            classify("Tell me about the Chrysler Building"),
            Intent::SpecificBuilding {
                name: "chrysler building".to_string()
            }
        );
    }

    #[test]
    fn test_address_search_street() {
        assert_eq!(
            classify("What is on Ajyad street?"),
            Intent::AddressSearch {
                street: Some("ajyad".to_string())
            }
        );
    }

    #[test]
    fn test_count_types() {
        assert_eq!(
            classify("How many residential buildings?"),
            Intent::Count {
                building_types: vec!["residential".to_string()]
            }
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(kind_of("TALLEST"), IntentKind::Tallest);
    }

    proptest! {
        /// Any message mentioning "tallest" classifies as tallest regardless of the rest
        #[test]
        fn tallest_always_wins(prefix in "[a-z ]{0,30}", suffix in "[a-z ]{0,30}") {
            let message = format!("{} tallest {}", prefix, suffix);
            prop_assert_eq!(classify(&message).kind(), IntentKind::Tallest);
        }

        /// Classification never panics on arbitrary input
        #[test]
        fn classify_total(message in ".{0,200}") {
            let _ = classify(&message);
        }

        /// "top N buildings" yields N for any N in range
        #[test]
        fn top_n_roundtrip(n in 1u32..=100) {
            let message = format!("top {} buildings", n);
            prop_assert_eq!(classify(&message), Intent::TopN { count: n });
        }
    }
}
