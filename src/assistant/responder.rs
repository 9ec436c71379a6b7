//! Keyword responder for the chat-style assistant
//!
//! Maps free text to one of a fixed set of canned replies. Keyword groups
//! are checked in declaration order and the first group with any keyword
//! contained in the lower-cased input wins.

use serde::Serialize;

/// Greeting the conversation is seeded with
pub const WELCOME_MESSAGE: &str = "Hello! I'm your parking assistant. I can help you find parking spots, check availability, and provide directions. How can I assist you today?";

/// Prompts offered on the landing screen
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "I need parking at Tech Square",
    "Find me a spot near ATDC",
    "GT campus, avoiding game traffic",
];

/// Topic a request was classified into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyTopic {
    Pricing,
    Parking,
    Availability,
    Reservation,
    Directions,
    /// No keyword group matched
    Fallback,
}

impl ReplyTopic {
    /// Canned reply for this topic
    pub fn reply(&self) -> &'static str {
        match self {
            ReplyTopic::Pricing => "Parking rates are: $2.50/hour for regular spots, $3.00/hour for premium spots near entrances. Daily maximum is $15. Premium spots are marked in blue on the map.",
            ReplyTopic::Parking => "I can see several available parking spots on the map. The closest ones are in zones A and B. Zone A has 5 available spots and Zone B has 3 spots. Would you like directions to either zone?",
            ReplyTopic::Availability => "Currently showing 12 available parking spots across different zones. The green markers on the map indicate free spaces. Hourly rate is $2.50. Would you like me to reserve a spot for you?",
            ReplyTopic::Reservation => "I can help you reserve a parking spot! Please let me know which zone you prefer and for how long you'll need it. Reservations can be made up to 24 hours in advance.",
            ReplyTopic::Directions => "I can provide turn-by-turn directions to any available parking spot. Which zone would you like directions to? You can also click on any green marker on the map for quick directions.",
            ReplyTopic::Fallback => "I'm here to help with all your parking needs! You can ask me about available spots, pricing, reservations, or directions. What would you like to know?",
        }
    }
}

struct KeywordGroup {
    topic: ReplyTopic,
    keywords: &'static [&'static str],
}

/// Priority order is total: earlier groups win over later ones
const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        topic: ReplyTopic::Pricing,
        keywords: &["price", "cost", "rate"],
    },
    KeywordGroup {
        topic: ReplyTopic::Parking,
        keywords: &["parking", "spot"],
    },
    KeywordGroup {
        topic: ReplyTopic::Availability,
        keywords: &["available", "free"],
    },
    KeywordGroup {
        topic: ReplyTopic::Reservation,
        keywords: &["reserve", "book"],
    },
    KeywordGroup {
        topic: ReplyTopic::Directions,
        keywords: &["directions", "navigate"],
    },
];

/// Classify free text into a reply topic
///
/// Matching is substring-based on the lower-cased input, so "spots"
/// matches the "spot" keyword.
pub fn classify(input: &str) -> ReplyTopic {
    let normalized = input.to_lowercase();

    KEYWORD_GROUPS
        .iter()
        .find(|group| group.keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|group| group.topic)
        .unwrap_or(ReplyTopic::Fallback)
}

/// Canned reply for free text
pub fn respond(input: &str) -> &'static str {
    classify(input).reply()
}
