// Name, street and building-type extraction for chat messages
use crate::patterns::{matching, BUILDING_TYPE_KEYWORDS, KNOWN_BUILDINGS, STREET_KEYWORDS};

/// Known landmark names mentioned in the text, in list order, at most two
pub fn extract_compare_names(text: &str) -> Vec<String> {
    matching(text, KNOWN_BUILDINGS)
        .into_iter()
        .take(2)
        .map(str::to_string)
        .collect()
}

/// First known landmark mentioned in the text
pub fn extract_known_building(text: &str) -> Option<String> {
    matching(text, KNOWN_BUILDINGS)
        .first()
        .map(|name| name.to_string())
}

/// First street keyword mentioned in the text
pub fn extract_street(text: &str) -> Option<String> {
    matching(text, STREET_KEYWORDS)
        .first()
        .map(|street| street.to_string())
}

/// Stored building-type values for every type keyword in the text, deduplicated
pub fn extract_building_types(text: &str) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for (keyword, building_type) in BUILDING_TYPE_KEYWORDS {
        if text.contains(keyword) && !types.iter().any(|t| t == building_type) {
            types.push(building_type.to_string());
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_compare_names() {
        assert_eq!(
            extract_compare_names("compare empire state building vs one world trade center"),
            vec!["empire state building", "one world trade center"]
        );
        assert_eq!(
            extract_compare_names("compare burj khalifa"),
            vec!["burj khalifa"]
        );
    }

    #[test]
    fn test_extract_compare_names_caps_at_two() {
        let text = "chrysler building, burj khalifa and empire state building";
        assert_eq!(extract_compare_names(text).len(), 2);
    }

    #[test]
    fn test_extract_known_building() {
        assert_eq!(
            extract_known_building("tell me about abraj al bait"),
            Some("abraj al bait".to_string())
        );
        assert_eq!(extract_known_building("tell me about my house"), None);
    }

    #[test]
    fn test_extract_street() {
        assert_eq!(
            extract_street("buildings on ajyad street"),
            Some("ajyad".to_string())
        );
        assert_eq!(extract_street("what is the address"), None);
    }

    #[test]
    fn test_extract_building_types() {
        assert_eq!(
            extract_building_types("find hotels and offices"),
            vec!["office", "hotel"]
        );
        assert_eq!(
            extract_building_types("list apartment and apartments"),
            vec!["apartments"]
        );
        assert!(extract_building_types("find buildings").is_empty());
    }
}
