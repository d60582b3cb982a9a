//! Public tourist safety assistant for the Yogyakarta region.
//!
//! Answers free-form visitor questions using a built-in knowledge base of
//! nine tourist areas, folded into the system prompt when the question or
//! an explicit location hint names one of them. The assistant never
//! errors toward the visitor: if the model is unreachable it degrades to
//! a canned reply, flagged only by its `public_fallback_` query id.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::providers::{CompletionRequest, LlmProvider};

const SAFETY_TEMPERATURE: f64 = 0.7;
const SAFETY_MAX_TOKENS: u32 = 500;

/// Location name reported when no specific area was matched.
const GENERAL_LOCATION: &str = "Greater Yogyakarta";

/// Safety level reported when no specific area was matched.
const GENERAL_SAFETY_LEVEL: &str = "General";

/// Safety profile for one tourist area.
#[derive(Debug, Clone, Copy)]
pub struct AreaProfile {
    /// Lookup key, also matched as a substring of the question text.
    pub key: &'static str,
    /// Display name of the area.
    pub name: &'static str,
    /// Qualitative safety level shown to the visitor.
    pub safety_level: &'static str,
    /// Crime types commonly reported in the area.
    pub common_crimes: &'static [&'static str],
    /// Hours when incidents concentrate.
    pub peak_times: &'static str,
    /// Area-specific advice folded into the prompt.
    pub tips: &'static [&'static str],
}

/// Built-in safety knowledge for the region's main tourist areas.
///
/// Order matters: when a question mentions several areas, the earliest
/// entry wins, so the specific sights come before the city and regencies.
static AREA_PROFILES: &[AreaProfile] = &[
    AreaProfile {
        key: "malioboro",
        name: "Jalan Malioboro",
        safety_level: "Moderate",
        common_crimes: &["pickpocketing", "scams", "bag snatching"],
        peak_times: "19:00-22:00",
        tips: &[
            "Keep a tight hold on your valuables",
            "Avoid showing off expensive gadgets",
            "Buy from licensed vendors",
            "Watch out for ticket touts",
        ],
    },
    AreaProfile {
        key: "borobudur",
        name: "Candi Borobudur",
        safety_level: "Low",
        common_crimes: &["ticket scams", "extortion"],
        peak_times: "10:00-15:00",
        tips: &[
            "Buy tickets from the official counters",
            "Use a licensed tour guide",
            "Bring water and sun protection",
            "Follow the temple area rules",
        ],
    },
    AreaProfile {
        key: "kraton",
        name: "Keraton Yogyakarta",
        safety_level: "Low",
        common_crimes: &["petty pickpocketing"],
        peak_times: "11:00-14:00",
        tips: &[
            "Respect the palace rules",
            "Carry bags in front of your body",
            "Stay on the designated routes",
            "Ask the staff when unsure",
        ],
    },
    AreaProfile {
        key: "parangtritis",
        name: "Pantai Parangtritis",
        safety_level: "Moderate",
        common_crimes: &["pickpocketing", "extortion"],
        peak_times: "16:00-19:00",
        tips: &[
            "Beware of the strong surf",
            "Do not swim out too far",
            "Use official services",
            "Avoid deserted areas after dark",
        ],
    },
    AreaProfile {
        key: "yogyakarta",
        name: "Kota Yogyakarta",
        safety_level: "Moderate",
        common_crimes: &["pickpocketing", "vehicle theft", "scams"],
        peak_times: "18:00-22:00",
        tips: &[
            "Use official transportation",
            "Avoid quiet streets late at night",
            "Keep important documents separately",
            "Stay alert in crowded areas",
        ],
    },
    AreaProfile {
        key: "sleman",
        name: "Kabupaten Sleman",
        safety_level: "Moderate",
        common_crimes: &["tour scams", "theft", "pickpocketing"],
        peak_times: "10:00-15:00",
        tips: &[
            "Take care around the tourist sites",
            "Use licensed guides",
            "Watch out for ticket fraud",
            "Keep valuables secure",
        ],
    },
    AreaProfile {
        key: "bantul",
        name: "Kabupaten Bantul",
        safety_level: "Moderate",
        common_crimes: &["scams", "theft", "pickpocketing"],
        peak_times: "16:00-19:00",
        tips: &[
            "Stay alert around the beaches",
            "Use official tour services",
            "Avoid deserted areas",
            "Keep personal belongings close",
        ],
    },
    AreaProfile {
        key: "kulonprogo",
        name: "Kabupaten Kulon Progo",
        safety_level: "Low",
        common_crimes: &["petty theft", "scams"],
        peak_times: "12:00-17:00",
        tips: &[
            "The area is relatively safe",
            "Stay aware at tourist spots",
            "Use official services",
            "Keep valuables stored securely",
        ],
    },
    AreaProfile {
        key: "gunungkidul",
        name: "Kabupaten Gunung Kidul",
        safety_level: "Low",
        common_crimes: &["tour scams", "petty theft"],
        peak_times: "11:00-16:00",
        tips: &[
            "Take care along the beaches",
            "Use licensed local guides",
            "Carry a water supply",
            "Avoid remote roads alone",
        ],
    },
];

/// A suggested question shown to visitors before they type their own.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PopularQuery {
    /// Stable id for the suggestion.
    pub id: u32,
    /// The suggested question text.
    pub question: &'static str,
    /// Rough topic of the question.
    pub category: &'static str,
    /// Area key the question concerns, or `"general"`.
    pub location: &'static str,
}

static POPULAR_QUERIES: &[PopularQuery] = &[
    PopularQuery {
        id: 1,
        question: "Is Malioboro safe to visit at night?",
        category: "safety",
        location: "malioboro",
    },
    PopularQuery {
        id: 2,
        question: "Safety tips for solo female travelers in Yogyakarta?",
        category: "safety",
        location: "general",
    },
    PopularQuery {
        id: 3,
        question: "What is the safest time to visit Candi Borobudur?",
        category: "timing",
        location: "borobudur",
    },
    PopularQuery {
        id: 4,
        question: "What is the safest transport from the airport to the city center?",
        category: "transport",
        location: "general",
    },
    PopularQuery {
        id: 5,
        question: "Is street food safe to eat?",
        category: "food",
        location: "general",
    },
    PopularQuery {
        id: 6,
        question: "Which areas should tourists avoid in Yogyakarta?",
        category: "safety",
        location: "general",
    },
];

/// Printable safety sheet for an area, with local emergency contacts.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSafetySheet {
    /// Lookup key.
    #[serde(skip)]
    pub key: &'static str,
    /// Display name of the area.
    pub name: &'static str,
    /// Detailed safety advice for the area.
    pub tips: &'static [&'static str],
    /// Local emergency contacts, formatted as `"name: number"`.
    pub emergency_contacts: &'static [&'static str],
}

/// Areas that have a dedicated safety sheet. Smaller than
/// [`AREA_PROFILES`]: only the sights with their own security posts.
static SAFETY_SHEETS: &[AreaSafetySheet] = &[
    AreaSafetySheet {
        key: "malioboro",
        name: "Jalan Malioboro",
        tips: &[
            "Watch for pickpockets in the crowds",
            "Do not trust offers of suspiciously cheap tours",
            "Buy from vendors holding an official permit",
            "Split your cash across separate places",
            "Avoid walking alone late at night",
        ],
        emergency_contacts: &[
            "Malioboro police post: (0274) 562853",
            "Tourism help post: (0274) 566000",
        ],
    },
    AreaSafetySheet {
        key: "borobudur",
        name: "Candi Borobudur",
        tips: &[
            "Buy tickets from the official counters only",
            "Use a licensed official guide",
            "Bring protection from the sun",
            "Follow the rules and staff directions",
            "Keep a safe distance from the temple edges",
        ],
        emergency_contacts: &[
            "Borobudur site office: (0293) 788266",
            "Borobudur health center: (0293) 788118",
        ],
    },
    AreaSafetySheet {
        key: "kraton",
        name: "Keraton Yogyakarta",
        tips: &[
            "Respect the palace rules and customs",
            "Follow the designated routes",
            "Do not touch the historical objects",
            "Ask the staff if you need help",
            "Carry bags in front of you where you can see them",
        ],
        emergency_contacts: &[
            "Kraton office: (0274) 373721",
            "Kraton security post: (0274) 375757",
        ],
    },
];

/// Canned reply used when the model is unreachable.
const FALLBACK_REPLY: &str = "Thank you for your question about safety in Yogyakarta.\n\n\
    Yogyakarta is generally a safe city for tourists. Some universal safety tips:\n\n\
    - Keep important documents (passport, ID) somewhere secure\n\
    - Avoid openly displaying valuables\n\
    - Use official transportation such as TransJogja or licensed taxis\n\
    - Watch for pickpockets in crowded areas such as Malioboro\n\
    - Use licensed guides at tourist sites\n\n\
    For emergency help:\n\
    - Police: 110\n\
    - Tourist police: (0274) 566000\n\n\
    If you have a question about a specific place, mention it by name.";

/// Reply produced by the safety assistant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReply {
    /// The assistant's answer text.
    pub reply: String,
    /// Name of the matched area, or the regional default.
    pub location: String,
    /// Safety level of the matched area, or `"General"`.
    pub safety_level: String,
    /// When the reply was produced.
    pub timestamp: DateTime<Utc>,
    /// Correlation id; canned replies carry a `public_fallback_` prefix.
    pub query_id: String,
}

/// Picks the area profile for a query.
///
/// An explicit `location` hint wins when it names a known area key;
/// otherwise the lowercased question text is scanned for area keys and
/// display names.
#[must_use]
pub fn match_area(location: Option<&str>, question: &str) -> Option<&'static AreaProfile> {
    if let Some(location) = location {
        let key = location.trim().to_lowercase();
        if let Some(profile) = AREA_PROFILES.iter().find(|p| p.key == key) {
            return Some(profile);
        }
    }

    let question = question.to_lowercase();
    AREA_PROFILES
        .iter()
        .find(|p| question.contains(p.key) || question.contains(&p.name.to_lowercase()))
}

/// Builds the system prompt, appending the area block when one matched.
fn system_prompt(area: Option<&AreaProfile>) -> String {
    let mut prompt = "You are a tourism safety assistant for Yogyakarta, Indonesia. Give \
        informative, practical answers that help visitors stay safe.\n\n\
        General information about Yogyakarta:\n\
        - A relatively safe city for tourists\n\
        - Crime levels are generally low to moderate\n\
        - Main tourist areas: Malioboro, Borobudur, Kraton, Parangtritis\n\
        - Busy hours: 10:00-15:00 and 18:00-21:00\n\
        - High season: June-August and December-January\n\n\
        General safety tips:\n\
        - Keep important documents secure\n\
        - Use official transportation\n\
        - Avoid displaying valuables\n\
        - Always stay alert in crowds\n\
        - Use licensed guides and services\n\n\
        Emergency numbers:\n\
        - Police: 110\n\
        - Ambulance: 118\n\
        - Fire brigade: 113\n\
        - Tourist police: (0274) 566000"
        .to_string();

    if let Some(area) = area {
        prompt.push_str(&format!(
            "\n\nArea information for {}:\n\
             - Safety level: {}\n\
             - Common crimes: {}\n\
             - Peak hours: {}\n\
             - Specific tips: {}",
            area.name,
            area.safety_level,
            area.common_crimes.join(", "),
            area.peak_times,
            area.tips.join(", "),
        ));
    }

    prompt
}

/// Answers a public safety question.
///
/// This never fails toward the visitor: a provider error produces the
/// canned [`FALLBACK_REPLY`] with a `public_fallback_` query id instead.
pub async fn answer_query(
    provider: &dyn LlmProvider,
    question: &str,
    location: Option<&str>,
) -> SafetyReply {
    let area = match_area(location, question);
    let request = CompletionRequest {
        system_prompt: system_prompt(area),
        user_prompt: question.to_string(),
        temperature: SAFETY_TEMPERATURE,
        max_tokens: SAFETY_MAX_TOKENS,
        json_response: false,
    };

    let now = Utc::now();
    match provider.complete(&request).await {
        Ok(reply) => SafetyReply {
            reply,
            location: area.map_or(GENERAL_LOCATION, |a| a.name).to_string(),
            safety_level: area.map_or(GENERAL_SAFETY_LEVEL, |a| a.safety_level).to_string(),
            timestamp: now,
            query_id: format!("public_{}", now.timestamp_millis()),
        },
        Err(e) => {
            log::warn!("Safety assistant request failed: {e}; using canned reply");
            SafetyReply {
                reply: FALLBACK_REPLY.to_string(),
                location: location.unwrap_or(GENERAL_LOCATION).to_string(),
                safety_level: GENERAL_SAFETY_LEVEL.to_string(),
                timestamp: now,
                query_id: format!("public_fallback_{}", now.timestamp_millis()),
            }
        }
    }
}

/// Suggested questions for the public query box.
#[must_use]
pub fn popular_queries() -> &'static [PopularQuery] {
    POPULAR_QUERIES
}

/// Looks up the safety sheet for an area, case-insensitively.
#[must_use]
pub fn safety_sheet(location: &str) -> Option<&'static AreaSafetySheet> {
    let key = location.trim().to_lowercase();
    SAFETY_SHEETS.iter().find(|sheet| sheet.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AiError;

    struct FixedProvider {
        reply: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, AiError> {
            self.reply
                .map(ToString::to_string)
                .ok_or_else(|| AiError::Provider {
                    message: "unreachable".to_string(),
                })
        }
    }

    #[test]
    fn explicit_location_hint_wins() {
        let area = match_area(Some("Malioboro"), "is it safe anywhere?").unwrap();
        assert_eq!(area.name, "Jalan Malioboro");
    }

    #[test]
    fn unknown_hint_falls_back_to_question_scan() {
        let area = match_area(Some("paris"), "visiting the kraton tomorrow").unwrap();
        assert_eq!(area.key, "kraton");
    }

    #[test]
    fn matches_area_by_display_name_in_question() {
        let area = match_area(None, "Is Candi Borobudur crowded in the morning?").unwrap();
        assert_eq!(area.key, "borobudur");
    }

    #[test]
    fn earlier_area_wins_over_the_city() {
        let area = match_area(None, "Is Malioboro in Yogyakarta safe?").unwrap();
        assert_eq!(area.key, "malioboro");
    }

    #[test]
    fn no_area_for_generic_question() {
        assert!(match_area(None, "Is tap water drinkable?").is_none());
    }

    #[test]
    fn prompt_includes_area_block_when_matched() {
        let area = match_area(None, "malioboro at night").unwrap();
        let prompt = system_prompt(Some(area));

        assert!(prompt.contains("Area information for Jalan Malioboro"));
        assert!(prompt.contains("pickpocketing, scams, bag snatching"));
        assert!(prompt.contains("Police: 110"));
    }

    #[test]
    fn prompt_without_area_keeps_general_block_only() {
        let prompt = system_prompt(None);

        assert!(!prompt.contains("Area information"));
        assert!(prompt.contains("Tourist police: (0274) 566000"));
    }

    #[tokio::test]
    async fn reply_carries_matched_area_metadata() {
        let provider = FixedProvider {
            reply: Some("Stay in the well-lit parts of the street."),
        };

        let reply = answer_query(&provider, "Is malioboro safe at night?", None).await;

        assert_eq!(reply.reply, "Stay in the well-lit parts of the street.");
        assert_eq!(reply.location, "Jalan Malioboro");
        assert_eq!(reply.safety_level, "Moderate");
        assert!(reply.query_id.starts_with("public_"));
        assert!(!reply.query_id.starts_with("public_fallback_"));
    }

    #[tokio::test]
    async fn unmatched_query_reports_general_region() {
        let provider = FixedProvider {
            reply: Some("Generally yes."),
        };

        let reply = answer_query(&provider, "Is tap water drinkable?", None).await;

        assert_eq!(reply.location, "Greater Yogyakarta");
        assert_eq!(reply.safety_level, "General");
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_canned_reply() {
        let provider = FixedProvider { reply: None };

        let reply = answer_query(&provider, "Is malioboro safe?", Some("malioboro")).await;

        assert!(reply.reply.contains("Police: 110"));
        assert_eq!(reply.location, "malioboro");
        assert_eq!(reply.safety_level, "General");
        assert!(reply.query_id.starts_with("public_fallback_"));
    }

    #[test]
    fn popular_queries_are_stable() {
        let queries = popular_queries();

        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0].location, "malioboro");
        assert!(queries.iter().enumerate().all(|(i, q)| {
            let expected = u32::try_from(i).unwrap() + 1;
            q.id == expected
        }));
    }

    #[test]
    fn safety_sheet_lookup_is_case_insensitive() {
        let sheet = safety_sheet("MALIOBORO").unwrap();

        assert_eq!(sheet.name, "Jalan Malioboro");
        assert_eq!(sheet.tips.len(), 5);
        assert_eq!(sheet.emergency_contacts.len(), 2);
        assert!(safety_sheet("atlantis").is_none());
    }
}
