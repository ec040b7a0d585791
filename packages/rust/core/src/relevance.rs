//! Goal relevance: whether a document serves the configured knowledge goals.

const HIGH_PRIORITY_CATEGORIES: &[&str] = &[
    "company_culture",
    "team_documentation",
    "customer_stories",
    "product_strategy",
];

const FOCUS_AREA_KEYWORDS: &[(&str, &[&str])] = &[
    ("company_culture", &["culture", "values", "mission", "principles"]),
    ("team_dynamics", &["team", "collaboration", "process", "structure"]),
    ("customer_insights", &["customer", "user", "feedback", "problem"]),
    ("product_strategy", &["strategy", "roadmap", "competitive", "priorities"]),
];

#[derive(Debug, Clone, Default)]
pub struct GoalRelevance {
    focus_areas: Vec<String>,
}

impl GoalRelevance {
    pub fn new(focus_areas: Vec<String>) -> Self {
        Self { focus_areas }
    }

    /// High-priority categories are always relevant. Otherwise a configured
    /// focus area with a fixed keyword list must hit the content. Unknown
    /// focus area names never match.
    pub fn is_relevant(&self, category: &str, content: &str) -> bool {
        if HIGH_PRIORITY_CATEGORIES.contains(&category) {
            return true;
        }

        let lower = content.to_lowercase();
        self.focus_areas.iter().any(|area| {
            FOCUS_AREA_KEYWORDS
                .iter()
                .find(|(name, _)| *name == area.as_str())
                .is_some_and(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        })
    }
}
