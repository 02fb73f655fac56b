//! Example questions offered by `GET /api/chat/suggestions`

pub const SUGGESTIONS: &[&str] = &[
    "What is the tallest building?",
    "What is the shortest building?",
    "Show me the top 10 buildings",
    "Compare Empire State Building vs One World Trade Center",
    "Buildings between 100 to 300 meters",
    "What is the building type distribution?",
    "Find hotels over 100m",
    "Give me a statistics summary",
    "How many office buildings are there?",
    "Tell me about Abraj Al Bait",
];
