//! Narrative analysis generation for aggregated crime summaries.
//!
//! Turns an [`AggregatedSummary`] into a structured security analysis via
//! two LLM calls: one for the narrative itself (requested as JSON) and one
//! for a recommendation list. If either call fails, a deterministic
//! fallback is produced from the summary instead, so the surrounding
//! report never fails just because the model is unreachable.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crimewatch_analytics_models::{
    AggregatedSummary, NarrativeAnalysis, NarrativeOutcome, SubjectInfo,
};

use crate::providers::{CompletionRequest, LlmProvider};

const NARRATIVE_TEMPERATURE: f64 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 1500;
const RECOMMENDATION_MAX_TOKENS: u32 = 800;

/// Canned recommendations used when the model is unreachable.
const FALLBACK_RECOMMENDATIONS: [&str; 6] = [
    "Improve lighting around the premises and nearby walkways",
    "Install or service CCTV coverage at entrances and parking areas",
    "Coordinate with local security services and the neighborhood watch",
    "Brief staff on the most common incident types in the area",
    "Review alarm and early-warning procedures with your team",
    "Schedule routine patrols during high-activity hours",
];

/// Matches `1. ` style ordinal prefixes on recommendation lines.
static NUMBERED_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

/// Matches `- ` style bullet prefixes on recommendation lines.
static BULLET_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*").expect("valid regex"));

/// Requests narrative analyses from an LLM provider.
pub struct NarrativeRequester {
    provider: Arc<dyn LlmProvider>,
}

impl NarrativeRequester {
    /// Creates a requester backed by the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Produces a narrative for the given subject and crime summary.
    ///
    /// Returns [`NarrativeOutcome::Generated`] when both LLM calls succeed
    /// and [`NarrativeOutcome::Fallback`] otherwise. This never fails:
    /// callers can always render the result.
    pub async fn request(
        &self,
        subject: &SubjectInfo,
        summary: &AggregatedSummary,
    ) -> NarrativeOutcome {
        let analysis_raw = match self.provider.complete(&analysis_prompt(subject, summary)).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Narrative analysis request failed: {e}; using fallback analysis");
                return build_fallback(subject, summary);
            }
        };

        let recommendations_raw = match self
            .provider
            .complete(&recommendations_prompt(subject, summary))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Recommendation request failed: {e}; using fallback analysis");
                return build_fallback(subject, summary);
            }
        };

        NarrativeOutcome::Generated {
            analysis: parse_narrative(&analysis_raw),
            recommendations: extract_recommendations(&recommendations_raw),
        }
    }
}

/// Serializes the summary into the JSON payload embedded in both prompts.
fn summary_payload(subject: &SubjectInfo, summary: &AggregatedSummary) -> serde_json::Value {
    serde_json::json!({
        "manager": subject.name,
        "organization": subject.organization,
        "totalCrimes": summary.total_crimes,
        "radiusKm": summary.radius_km,
        "categories": summary.categories,
        "monthlyTrends": summary.monthly_trends,
        "nearbyLocations": summary
            .locations
            .iter()
            .map(|location| {
                serde_json::json!({
                    "name": location.name,
                    "distanceKm": location.distance_km,
                    "crimeCount": location.crimes.len(),
                })
            })
            .collect::<Vec<_>>(),
    })
}

fn analysis_prompt(subject: &SubjectInfo, summary: &AggregatedSummary) -> CompletionRequest {
    let system_prompt = "You are a security analyst for tourism businesses. You are given \
        aggregated crime report data collected around a business location. Write a professional \
        security analysis grounded strictly in that data.\n\n\
        Respond with a single JSON object of exactly this shape:\n\
        {\n\
          \"overview\": \"...\",\n\
          \"risk\": { \"level\": \"...\", \"detail\": \"...\" },\n\
          \"patterns\": { \"trend\": \"...\", \"peakTimes\": \"...\", \"hotspots\": \"...\" },\n\
          \"impact\": { \"direct\": \"...\", \"indirect\": \"...\" },\n\
          \"conclusion\": \"...\"\n\
        }\n\n\
        Keep each field to a few sentences."
        .to_string();

    CompletionRequest {
        system_prompt,
        user_prompt: format!(
            "Crime data around {}:\n{}",
            subject.organization,
            summary_payload(subject, summary)
        ),
        temperature: NARRATIVE_TEMPERATURE,
        max_tokens: ANALYSIS_MAX_TOKENS,
        json_response: true,
    }
}

fn recommendations_prompt(subject: &SubjectInfo, summary: &AggregatedSummary) -> CompletionRequest {
    CompletionRequest {
        system_prompt: "You are a security consultant for tourism businesses. Based on the crime \
            report data you are given, provide concrete, actionable security recommendations for \
            the business. Return a numbered list with one recommendation per line and no other \
            text."
            .to_string(),
        user_prompt: format!(
            "Crime data around {}:\n{}",
            subject.organization,
            summary_payload(subject, summary)
        ),
        temperature: NARRATIVE_TEMPERATURE,
        max_tokens: RECOMMENDATION_MAX_TOKENS,
        json_response: false,
    }
}

/// Strips a surrounding Markdown code fence (```` ```json ... ``` ````),
/// which models sometimes wrap JSON responses in despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = after.split_once('\n').map_or(after, |(_, rest)| rest);
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the model's analysis response, keeping the raw text as the
/// overview when it is not the requested JSON shape.
fn parse_narrative(raw: &str) -> NarrativeAnalysis {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).unwrap_or_else(|e| {
        log::warn!("Narrative response was not valid JSON ({e}); keeping raw text as overview");
        NarrativeAnalysis {
            overview: cleaned.to_string(),
            ..NarrativeAnalysis::default()
        }
    })
}

/// Extracts recommendation lines from a free-form list response.
///
/// Keeps lines that look like list entries (contain a `.` or `-`), strips
/// ordinal and bullet prefixes, drops fragments of ten characters or
/// fewer, and caps the list at eight entries.
fn extract_recommendations(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.contains('.') || line.contains('-'))
        .map(|line| {
            let line = NUMBERED_PREFIX_RE.replace(line, "");
            BULLET_PREFIX_RE.replace(&line, "").trim().to_string()
        })
        .filter(|line| line.len() > 10)
        .take(8)
        .collect()
}

/// Builds the deterministic fallback narrative from the summary alone.
fn build_fallback(subject: &SubjectInfo, summary: &AggregatedSummary) -> NarrativeOutcome {
    let mut top_category: Option<(&str, u64)> = None;
    for (category, count) in &summary.categories {
        match top_category {
            // Ties keep the earlier (alphabetically first) category.
            Some((_, best)) if best >= *count => {}
            _ => top_category = Some((category, *count)),
        }
    }

    let nearest = summary
        .locations
        .iter()
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut analysis = format!(
        "Security analysis for {}: {} crime reports were found within {} km.",
        subject.organization, summary.total_crimes, summary.radius_km
    );
    if let Some((category, count)) = top_category {
        analysis.push_str(&format!(" Dominant category: {category} ({count} reports)."));
    }
    if let Some(location) = nearest {
        analysis.push_str(&format!(
            " Nearest affected location: {} ({} km away).",
            location.name, location.distance_km
        ));
    }

    NarrativeOutcome::Fallback {
        analysis,
        recommendations: FALLBACK_RECOMMENDATIONS
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crimewatch_analytics_models::NearbyLocation;

    use super::*;
    use crate::AiError;

    /// Provider that replays a fixed script of responses; `None` entries
    /// (and an exhausted script) produce provider errors.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(ToString::to_string))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.lock().unwrap().pop_front() {
                Some(Some(text)) => Ok(text),
                _ => Err(AiError::Provider {
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn sample_subject() -> SubjectInfo {
        SubjectInfo {
            name: "Budi Santoso".to_string(),
            organization: "Hotel Nusantara".to_string(),
        }
    }

    fn sample_summary() -> AggregatedSummary {
        AggregatedSummary {
            total_crimes: 5,
            categories: BTreeMap::from([
                ("fraud".to_string(), 2),
                ("theft".to_string(), 3),
            ]),
            monthly_trends: BTreeMap::from([("January 2025".to_string(), 5)]),
            recent_crimes: Vec::new(),
            locations: vec![
                NearbyLocation {
                    name: "Alun-Alun Kidul".to_string(),
                    latitude: -7.81,
                    longitude: 110.36,
                    distance_km: 1.2,
                    crimes: Vec::new(),
                },
                NearbyLocation {
                    name: "Malioboro".to_string(),
                    latitude: -7.79,
                    longitude: 110.37,
                    distance_km: 0.4,
                    crimes: Vec::new(),
                },
            ],
            radius_km: 5.0,
        }
    }

    const ANALYSIS_JSON: &str = r#"{
        "overview": "Five incidents nearby.",
        "risk": { "level": "medium", "detail": "Mostly theft." },
        "patterns": { "trend": "stable", "peakTimes": "evenings", "hotspots": "Malioboro" },
        "impact": { "direct": "guest safety", "indirect": "reputation" },
        "conclusion": "Stay alert."
    }"#;

    #[test]
    fn parses_well_formed_analysis_json() {
        let analysis = parse_narrative(ANALYSIS_JSON);

        assert_eq!(analysis.overview, "Five incidents nearby.");
        assert_eq!(analysis.risk.level, "medium");
        assert_eq!(analysis.patterns.peak_times, "evenings");
        assert_eq!(analysis.impact.indirect, "reputation");
        assert_eq!(analysis.conclusion, "Stay alert.");
    }

    #[test]
    fn strips_code_fences_before_parsing() {
        let fenced = format!("```json\n{ANALYSIS_JSON}\n```");
        let analysis = parse_narrative(&fenced);

        assert_eq!(analysis.overview, "Five incidents nearby.");
        assert_eq!(analysis.risk.detail, "Mostly theft.");
    }

    #[test]
    fn keeps_raw_text_as_overview_when_not_json() {
        let analysis = parse_narrative("The area sees moderate theft in the evenings.");

        assert_eq!(
            analysis.overview,
            "The area sees moderate theft in the evenings."
        );
        assert_eq!(analysis.risk.level, "");
        assert_eq!(analysis.conclusion, "");
    }

    #[test]
    fn tolerates_missing_fields_in_analysis_json() {
        let analysis = parse_narrative(r#"{"overview": "Short.", "conclusion": "Fine."}"#);

        assert_eq!(analysis.overview, "Short.");
        assert_eq!(analysis.conclusion, "Fine.");
        assert_eq!(analysis.patterns.hotspots, "");
    }

    #[test]
    fn extracts_numbered_recommendations() {
        let raw = "1. Install better lighting around the entrance.\n\
                   2. Hire a night security guard.\n\
                   3. ok\n";
        let recommendations = extract_recommendations(raw);

        assert_eq!(
            recommendations,
            vec![
                "Install better lighting around the entrance.",
                "Hire a night security guard.",
            ]
        );
    }

    #[test]
    fn extracts_bulleted_recommendations_and_skips_prose() {
        let raw = "Here are my suggestions\n\
                   - Coordinate with the local police post\n\
                   - Keep valuables in the safe\n";
        let recommendations = extract_recommendations(raw);

        assert_eq!(
            recommendations,
            vec![
                "Coordinate with the local police post",
                "Keep valuables in the safe",
            ]
        );
    }

    #[test]
    fn caps_recommendations_at_eight() {
        let raw = (1..=12)
            .map(|i| format!("{i}. Recommendation number {i} with enough length."))
            .collect::<Vec<_>>()
            .join("\n");
        let recommendations = extract_recommendations(&raw);

        assert_eq!(recommendations.len(), 8);
        assert_eq!(
            recommendations[7],
            "Recommendation number 8 with enough length."
        );
    }

    #[test]
    fn fallback_names_top_category_and_nearest_location() {
        let outcome = build_fallback(&sample_subject(), &sample_summary());

        let NarrativeOutcome::Fallback {
            analysis,
            recommendations,
        } = outcome
        else {
            panic!("expected fallback outcome");
        };
        assert!(analysis.contains("Hotel Nusantara"));
        assert!(analysis.contains("5 crime reports"));
        assert!(analysis.contains("theft (3 reports)"));
        assert!(analysis.contains("Malioboro (0.4 km away)"));
        assert_eq!(recommendations.len(), 6);
    }

    #[test]
    fn fallback_breaks_category_ties_alphabetically() {
        let mut summary = sample_summary();
        summary.categories =
            BTreeMap::from([("burglary".to_string(), 2), ("assault".to_string(), 2)]);

        let NarrativeOutcome::Fallback { analysis, .. } =
            build_fallback(&sample_subject(), &summary)
        else {
            panic!("expected fallback outcome");
        };
        assert!(analysis.contains("assault (2 reports)"));
    }

    #[tokio::test]
    async fn generates_narrative_when_both_calls_succeed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Some(ANALYSIS_JSON),
            Some("1. Review CCTV placement around the lobby."),
        ]));
        let requester = NarrativeRequester::new(provider.clone());

        let outcome = requester
            .request(&sample_subject(), &sample_summary())
            .await;

        assert_eq!(provider.call_count(), 2);
        let NarrativeOutcome::Generated {
            analysis,
            recommendations,
        } = outcome
        else {
            panic!("expected generated outcome");
        };
        assert_eq!(analysis.overview, "Five incidents nearby.");
        assert_eq!(
            recommendations,
            vec!["Review CCTV placement around the lobby."]
        );
    }

    #[tokio::test]
    async fn falls_back_when_analysis_call_fails() {
        let provider = Arc::new(ScriptedProvider::new(vec![None]));
        let requester = NarrativeRequester::new(provider.clone());

        let outcome = requester
            .request(&sample_subject(), &sample_summary())
            .await;

        assert_eq!(provider.call_count(), 1);
        assert!(matches!(outcome, NarrativeOutcome::Fallback { .. }));
    }

    #[tokio::test]
    async fn falls_back_when_recommendation_call_fails() {
        let provider = Arc::new(ScriptedProvider::new(vec![Some(ANALYSIS_JSON), None]));
        let requester = NarrativeRequester::new(provider.clone());

        let outcome = requester
            .request(&sample_subject(), &sample_summary())
            .await;

        assert_eq!(provider.call_count(), 2);
        assert!(matches!(outcome, NarrativeOutcome::Fallback { .. }));
    }
}
