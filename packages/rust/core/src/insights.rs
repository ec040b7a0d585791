//! Keyword-derived insight signals.
//!
//! All matching is substring search over lowercased text, not word-boundary
//! matching: "api" matches inside "capital". Downstream filters were tuned
//! against this behavior, so it stays.

use orgingest_shared::{ComplexityLevel, InsightSignals, TeamProfile};

const PAIN_POINT_KEYWORDS: &[&str] = &[
    "problem",
    "issue",
    "challenge",
    "difficult",
    "pain",
    "struggle",
    "frustrating",
    "blocking",
    "slow",
    "expensive",
    "complex",
    "confusing",
    "broken",
    "not working",
    "error",
    "bug",
    "crash",
    "failing",
];

const VALUE_KEYWORDS: &[&str] = &[
    "solved",
    "improved",
    "better",
    "faster",
    "easier",
    "saved",
    "increased",
    "reduced",
    "helped",
    "enabled",
    "streamlined",
    "love",
    "amazing",
    "great",
    "perfect",
    "exactly what we needed",
];

const CUSTOMER_CONTEXT_KEYWORDS: &[&str] = &[
    "customer",
    "user",
    "client",
    "company",
    "startup",
    "enterprise",
    "use case",
    "implementation",
    "migration",
    "adoption",
    "customer request",
    "customer feedback",
    "customer wants",
    "customer needs",
];

/// Complexity tiers, highest priority first. The first tier with a hit wins.
const COMPLEXITY_TIERS: &[(ComplexityLevel, &[&str])] = &[
    (ComplexityLevel::Beginner, &["beginner", "getting started"]),
    (ComplexityLevel::Advanced, &["advanced", "enterprise"]),
    (ComplexityLevel::Technical, &["api", "technical"]),
];

/// Extracts [`InsightSignals`] from a piece of text.
#[derive(Debug, Clone)]
pub struct InsightExtractor {
    teams: Vec<TeamProfile>,
}

impl InsightExtractor {
    pub fn new(teams: Vec<TeamProfile>) -> Self {
        Self { teams }
    }

    pub fn extract(&self, content: &str) -> InsightSignals {
        let lower = content.to_lowercase();

        let mentions_teams = self
            .teams
            .iter()
            .filter(|team| contains_any_owned(&lower, &team.keywords))
            .map(|team| team.name.clone())
            .collect();

        InsightSignals {
            has_pain_points: contains_any(&lower, PAIN_POINT_KEYWORDS),
            has_value_proposition: contains_any(&lower, VALUE_KEYWORDS),
            mentions_teams,
            customer_context: contains_any(&lower, CUSTOMER_CONTEXT_KEYWORDS),
            complexity_level: complexity_of(&lower),
        }
    }
}

fn complexity_of(lower: &str) -> ComplexityLevel {
    COMPLEXITY_TIERS
        .iter()
        .find(|(_, markers)| contains_any(lower, markers))
        .map(|(level, _)| *level)
        .unwrap_or(ComplexityLevel::Intermediate)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub(crate) fn contains_any_owned(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}
