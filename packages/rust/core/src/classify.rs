//! Content categorization from path and content signals.

use orgingest_shared::{CATEGORY_GENERAL_DOCS, CATEGORY_GITHUB_ISSUE, CategoryRule};

/// Path fragments that mark an issue-tracker export.
const ISSUE_MARKERS: [&str; 2] = ["github", "issue"];

/// Assigns one category per document, first configured match wins.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    categories: Vec<CategoryRule>,
}

impl CategoryClassifier {
    pub fn new(categories: Vec<CategoryRule>) -> Self {
        Self { categories }
    }

    /// Classify a document.
    ///
    /// Categories are tried in declaration order. A category matches when any
    /// keyword is a substring of the lowercased path or of the lowercased
    /// content. Categories are not mutually exclusive, so order decides.
    /// Without a match, issue-looking paths become `github_issue`, everything
    /// else `general_docs`.
    pub fn classify(&self, path: &str, content: &str) -> String {
        let path = path.to_lowercase();
        let content = content.to_lowercase();

        let matched = self.categories.iter().find(|category| {
            category
                .keywords
                .iter()
                .any(|kw| path.contains(kw.as_str()) || content.contains(kw.as_str()))
        });
        if let Some(category) = matched {
            return category.name.clone();
        }

        if ISSUE_MARKERS.iter().any(|marker| path.contains(marker)) {
            CATEGORY_GITHUB_ISSUE.to_string()
        } else {
            CATEGORY_GENERAL_DOCS.to_string()
        }
    }
}
