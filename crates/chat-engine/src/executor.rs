//! Query execution and response formatting
//!
//! Each intent makes at most one store call. Store failures never reach the
//! caller: they are logged and answered with an apology.

use building_store::{BuildingStore, SearchFilter, StoreError};
use shared_types::{Building, ChatResponse};
use tracing::{debug, error};

use crate::intent::{Intent, SearchCriteria};
use crate::patterns::{KNOWN_BUILDINGS, STREET_KEYWORDS};

/// Maximum number of buildings returned by list-style answers
pub const RESULT_LIMIT: i64 = 50;

/// Number of buildings spelled out in a list answer
const LISTED_IN_TEXT: usize = 10;

pub const APOLOGY: &str =
    "Sorry, I encountered an error while looking that up. Please try again in a moment.";

pub const NEARBY_PROMPT: &str = "To find buildings near a location I need coordinates. \
     Click a spot on the map or provide a latitude and longitude, for example \
     \"21.4225, 39.8262\".";

pub const HELP_TEXT: &str = "I can answer questions about the buildings on the map. Try:\n\
     - \"What is the tallest building?\"\n\
     - \"Show me the top 10 buildings\"\n\
     - \"Compare Empire State Building vs One World Trade Center\"\n\
     - \"Buildings between 100 to 300 meters\"\n\
     - \"Find hotels over 150m\"\n\
     - \"Building type distribution\"\n\
     - \"How many office buildings are there?\"\n\
     - \"Give me a summary\"";

/// Run a classified intent against the store
pub async fn execute(store: &dyn BuildingStore, intent: &Intent) -> ChatResponse {
    debug!("Executing intent: {:?}", intent);
    match try_execute(store, intent).await {
        Ok(response) => response,
        Err(e) => {
            error!("Chat query failed for {:?}: {}", intent.kind(), e);
            ChatResponse::text(APOLOGY)
        }
    }
}

async fn try_execute(
    store: &dyn BuildingStore,
    intent: &Intent,
) -> Result<ChatResponse, StoreError> {
    let response = match intent {
        Intent::Tallest => match store.tallest().await? {
            Some(b) => highlight(
                format!(
                    "The tallest building is {} at {:.1} meters ({}).",
                    b.name, b.height, b.building_type
                ),
                b,
            ),
            None => empty_database(),
        },
        Intent::Shortest => match store.shortest().await? {
            Some(b) => highlight(
                format!(
                    "The shortest building is {} at {:.1} meters ({}).",
                    b.name, b.height, b.building_type
                ),
                b,
            ),
            None => empty_database(),
        },
        Intent::TopN { count } => {
            let buildings = store.top_by_height(i64::from(*count)).await?;
            if buildings.is_empty() {
                empty_database()
            } else {
                let content = format!(
                    "Here are the top {} tallest buildings:\n{}",
                    buildings.len(),
                    numbered_list(&buildings, buildings.len())
                );
                results(content, buildings)
            }
        }
        Intent::Compare { names } => compare(store, names).await?,
        Intent::HeightRange { min, max } => {
            let buildings = store.in_height_range(*min, *max, RESULT_LIMIT).await?;
            let header = format!(
                "Found {} buildings between {}m and {}m",
                buildings.len(),
                min,
                max
            );
            results(with_list(header, &buildings), buildings)
        }
        Intent::TypeDistribution => {
            let stats = store.statistics().await?;
            if stats.is_empty() {
                empty_database()
            } else {
                let lines: Vec<String> = stats
                    .iter()
                    .map(|s| {
                        format!(
                            "- {}: {} buildings (avg {:.1}m, tallest {:.1}m)",
                            s.building_type, s.count, s.avg_height, s.max_height
                        )
                    })
                    .collect();
                ChatResponse::text(format!("Building type distribution:\n{}", lines.join("\n")))
            }
        }
        Intent::Search(criteria) => {
            let buildings = store.search(&search_filter(criteria)).await?;
            let header = format!(
                "Found {} {}",
                buildings.len(),
                describe_search(criteria)
            );
            results(with_list(header, &buildings), buildings)
        }
        Intent::Statistics => {
            let summary = store.summary().await?;
            if summary.total_buildings == 0 {
                empty_database()
            } else {
                ChatResponse::text(format!(
                    "Database overview:\n\
                     - Total buildings: {}\n\
                     - Building types: {}\n\
                     - Average height: {:.1}m\n\
                     - Tallest: {:.1}m\n\
                     - Shortest: {:.1}m",
                    summary.total_buildings,
                    summary.building_types,
                    summary.avg_height,
                    summary.max_height,
                    summary.min_height
                ))
            }
        }
        Intent::Nearby => ChatResponse::text(NEARBY_PROMPT),
        Intent::SpecificBuilding { name } => match store.find_by_name(name).await? {
            Some(b) => {
                let address = b
                    .address
                    .as_deref()
                    .map(|a| format!(", located at {}", a))
                    .unwrap_or_default();
                highlight(
                    format!(
                        "{} is {:.1} meters tall ({}){}.",
                        b.name, b.height, b.building_type, address
                    ),
                    b,
                )
            }
            None => ChatResponse::text(format!(
                "I couldn't find \"{}\" in the database.",
                title_case(name)
            )),
        },
        Intent::AddressSearch { street: None } => ChatResponse::text(format!(
            "Which street are you interested in? I know about: {}.",
            STREET_KEYWORDS
                .iter()
                .map(|s| title_case(s))
                .collect::<Vec<_>>()
                .join(", ")
        )),
        Intent::AddressSearch {
            street: Some(street),
        } => {
            let buildings = store.search_address(street, RESULT_LIMIT).await?;
            let header = format!(
                "Found {} buildings on {}",
                buildings.len(),
                title_case(street)
            );
            results(with_list(header, &buildings), buildings)
        }
        Intent::Count { building_types } => {
            let count = store.count(building_types).await?;
            let label = if building_types.is_empty() {
                String::new()
            } else {
                format!("{} ", building_types.join("/"))
            };
            ChatResponse::text(format!(
                "There are {} {}buildings in the database.",
                count, label
            ))
        }
        Intent::Help => ChatResponse::text(HELP_TEXT),
    };
    Ok(response)
}

async fn compare(store: &dyn BuildingStore, names: &[String]) -> Result<ChatResponse, StoreError> {
    if names.len() < 2 {
        let known: Vec<String> = KNOWN_BUILDINGS.iter().map(|n| title_case(n)).collect();
        return Ok(ChatResponse::text(format!(
            "Please name two buildings to compare. I know about: {}.",
            known.join(", ")
        )));
    }

    let candidates = store.find_by_names(names).await?;
    // Candidates arrive tallest first; take the first row per requested name
    let picked: Vec<Option<&Building>> = names
        .iter()
        .map(|name| {
            let name = name.to_lowercase();
            candidates
                .iter()
                .find(|b| b.name.to_lowercase().contains(&name))
        })
        .collect();

    let (a, b) = match (picked[0], picked[1]) {
        (Some(a), Some(b)) => (a.clone(), b.clone()),
        _ => {
            let missing: Vec<String> = names
                .iter()
                .zip(&picked)
                .filter(|(_, found)| found.is_none())
                .map(|(name, _)| title_case(name))
                .collect();
            return Ok(ChatResponse::text(format!(
                "I couldn't find {} in the database.",
                missing.join(" or ")
            )));
        }
    };

    let difference = (a.height - b.height).abs();
    let verdict = if difference == 0.0 {
        "They are the same height.".to_string()
    } else {
        let taller = if a.height > b.height { &a } else { &b };
        format!("{} is taller by {:.1} meters.", taller.name, difference)
    };
    let content = format!(
        "{} is {:.1}m tall and {} is {:.1}m tall. Height difference: {:.1} meters. {}",
        a.name, a.height, b.name, b.height, difference, verdict
    );

    Ok(results(content, vec![a, b]))
}

fn highlight(content: String, building: Building) -> ChatResponse {
    ChatResponse::BuildingHighlight { content, building }
}

fn results(content: String, buildings: Vec<Building>) -> ChatResponse {
    ChatResponse::SearchResults { content, buildings }
}

fn empty_database() -> ChatResponse {
    ChatResponse::text("No buildings found in the database.")
}

fn search_filter(criteria: &SearchCriteria) -> SearchFilter {
    let (min_height, max_height) = criteria
        .height
        .map(|h| h.bounds())
        .unwrap_or((None, None));
    SearchFilter {
        building_types: criteria.building_types.clone(),
        min_height,
        max_height,
        limit: RESULT_LIMIT,
    }
}

fn describe_search(criteria: &SearchCriteria) -> String {
    let mut description = if criteria.building_types.is_empty() {
        "buildings".to_string()
    } else {
        format!("{} buildings", criteria.building_types.join("/"))
    };
    if let Some(height) = &criteria.height {
        description.push(' ');
        description.push_str(&height.describe());
    }
    description
}

fn numbered_list(buildings: &[Building], max: usize) -> String {
    buildings
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, b)| {
            format!(
                "{}. {} - {:.1}m ({})",
                i + 1,
                b.name,
                b.height,
                b.building_type
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `header` followed by the first few buildings, or a period when there are none
fn with_list(header: String, buildings: &[Building]) -> String {
    if buildings.is_empty() {
        return format!("{}.", header);
    }
    let mut content = format!("{}:\n{}", header, numbered_list(buildings, LISTED_IN_TEXT));
    if buildings.len() > LISTED_IN_TEXT {
        content.push_str(&format!(
            "\n...and {} more",
            buildings.len() - LISTED_IN_TEXT
        ));
    }
    content
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
