//! Single-owner team attribution.

use orgingest_shared::{Metadata, TeamProfile, UNKNOWN_TEAM};

use crate::insights::contains_any_owned;

/// Result of attributing a document to a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamAttribution {
    /// Winning team name, or `"unknown"`.
    pub owner: String,
    /// One `(flag_key, is_owner)` pair per configured team, in config order.
    pub flags: Vec<(String, bool)>,
}

impl TeamAttribution {
    pub fn merge_into(&self, metadata: &mut Metadata) {
        metadata.insert("team_ownership".into(), self.owner.clone().into());
        for (key, value) in &self.flags {
            metadata.insert(key.clone(), (*value).into());
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamAttributor {
    teams: Vec<TeamProfile>,
}

impl TeamAttributor {
    pub fn new(teams: Vec<TeamProfile>) -> Self {
        Self { teams }
    }

    /// Pick the first configured team matched by a scoped label
    /// (`team-<name>` or `team/<name>`) or by a keyword in `content`.
    pub fn attribute(&self, content: &str, labels: &[String]) -> TeamAttribution {
        let lower = content.to_lowercase();
        let labels: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();

        let owner = self
            .teams
            .iter()
            .find(|team| label_matches(&labels, &team.name) || contains_any_owned(&lower, &team.keywords))
            .map(|team| team.name.clone())
            .unwrap_or_else(|| UNKNOWN_TEAM.to_string());

        let flags = self
            .teams
            .iter()
            .map(|team| (team.flag_key(), team.name == owner))
            .collect();

        TeamAttribution { owner, flags }
    }
}

fn label_matches(labels: &[String], team_name: &str) -> bool {
    let name = team_name.to_lowercase();
    let dashed = format!("team-{name}");
    let slashed = format!("team/{name}");
    labels
        .iter()
        .any(|label| label.contains(&dashed) || label.contains(&slashed))
}
