//! Source file discovery for documentation trees and issue exports.
//!
//! Documentation files are yielded priority paths first, then the rest of
//! the tree, each file exactly once. Traversal is sorted by file name so two
//! runs over the same tree produce the same order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use orgingest_shared::{DocumentationSource, IngestError, Result};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Files discovered for one run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    /// Documentation files, priority paths first.
    pub docs: Vec<PathBuf>,
    /// Issue export files.
    pub issues: Vec<PathBuf>,
}

impl DiscoveredFiles {
    pub fn total(&self) -> usize {
        self.docs.len() + self.issues.len()
    }
}

/// Discover documentation files and, when configured, issue files.
pub fn discover(docs: &DocumentationSource, issues_path: Option<&Path>) -> Result<DiscoveredFiles> {
    let docs = discover_documentation(docs)?;
    let issues = match issues_path {
        Some(path) => discover_issues(path)?,
        None => Vec::new(),
    };
    Ok(DiscoveredFiles { docs, issues })
}

/// List documentation files under `source.base_path`.
///
/// Files under each priority path come first (in priority order), followed
/// by every other matching file in the tree.
#[instrument(skip_all, fields(base = %source.base_path.display()))]
pub fn discover_documentation(source: &DocumentationSource) -> Result<Vec<PathBuf>> {
    if !source.base_path.is_dir() {
        return Err(IngestError::io(
            &source.base_path,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "documentation base path is not a directory",
            ),
        ));
    }

    let patterns = compile_patterns(&source.file_patterns)?;
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for priority in &source.priority_paths {
        let dir = source.base_path.join(priority);
        if !dir.is_dir() {
            debug!(path = %dir.display(), "priority path missing, skipping");
            continue;
        }
        for path in walk_matching(&dir, &patterns) {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    let priority_count = files.len();

    for path in walk_matching(&source.base_path, &patterns) {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    }

    info!(
        total = files.len(),
        priority = priority_count,
        "documentation files discovered"
    );
    Ok(files)
}

/// List `*.md` files directly inside `dir`. A missing directory yields nothing.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn discover_issues(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!(path = %dir.display(), "issue directory does not exist");
        return Ok(Vec::new());
    }

    let pattern = compile_patterns(&["*.md".to_string()])?;
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && matches_any(e.path(), &pattern))
        .map(|e| e.into_path())
        .collect();

    info!(total = files.len(), "issue files discovered");
    Ok(files)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| IngestError::config(format!("invalid file pattern '{p}': {e}")))
        })
        .collect()
}

/// Recursively collect files under `root` whose file name matches a pattern.
fn walk_matching(root: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && matches_any(e.path(), patterns))
        .map(|e| e.into_path())
        .collect()
}

fn matches_any(path: &Path, patterns: &[Pattern]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    patterns.iter().any(|p| p.matches(name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "# doc\n").expect("write");
    }

    fn source(root: &Path, priority: &[&str], patterns: &[&str]) -> DocumentationSource {
        DocumentationSource {
            base_path: root.to_path_buf(),
            priority_paths: priority.iter().map(PathBuf::from).collect(),
            file_patterns: patterns.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn priority_paths_come_first_without_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "a.md");
        touch(root, "guides/setup.md");
        touch(root, "handbook/culture.md");
        touch(root, "handbook/values.md");

        let files = discover_documentation(&source(root, &["handbook"], &["*.md"])).expect("discover");
        assert_eq!(
            relative(root, &files),
            ["handbook/culture.md", "handbook/values.md", "a.md", "guides/setup.md"]
        );
    }

    #[test]
    fn filters_by_pattern() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "keep.md");
        touch(root, "keep.mdx");
        touch(root, "skip.txt");

        let files = discover_documentation(&source(root, &[], &["*.md", "*.mdx"])).expect("discover");
        assert_eq!(relative(root, &files), ["keep.md", "keep.mdx"]);
    }

    #[test]
    fn missing_priority_path_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "a.md");
        let files =
            discover_documentation(&source(dir.path(), &["nope"], &["*.md"])).expect("discover");
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_base_path_errors() {
        let src = source(Path::new("/definitely/not/here"), &[], &["*.md"]);
        assert!(discover_documentation(&src).is_err());
    }

    #[test]
    fn issues_are_not_recursive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        touch(root, "issue-2.md");
        touch(root, "issue-1.md");
        touch(root, "nested/issue-3.md");
        touch(root, "notes.txt");

        let files = discover_issues(root).expect("discover");
        assert_eq!(relative(root, &files), ["issue-1.md", "issue-2.md"]);
    }

    #[test]
    fn missing_issue_dir_yields_nothing() {
        let files = discover_issues(Path::new("/definitely/not/here")).expect("discover");
        assert!(files.is_empty());
    }
}
