//! Leading `---` metadata block separation.
//!
//! Only flat `key: value` lines are understood; this is not a YAML parser.
//! Anything unrecognized degrades to "no frontmatter" instead of an error.

/// Frontmatter delimiter.
const DELIMITER: &str = "---";

/// Ordered `key -> value` pairs from a frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: Vec<(String, String)>,
}

impl Frontmatter {
    /// Insert a pair. A repeated key keeps its first position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a leading frontmatter block from the body.
///
/// When `text` starts with `---` and a closing `---` follows, the enclosed
/// `key: value` lines are parsed (surrounding quotes stripped) and the
/// trimmed remainder is returned as the body. Otherwise the result is an
/// empty [`Frontmatter`] and the original text, untouched.
pub fn split_frontmatter(text: &str) -> (Frontmatter, &str) {
    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return (Frontmatter::default(), text);
    };
    let Some(close) = rest.find(DELIMITER) else {
        tracing::debug!("unterminated frontmatter block, treating as body");
        return (Frontmatter::default(), text);
    };

    let block = &rest[..close];
    let body = &rest[close + DELIMITER.len()..];

    let mut frontmatter = Frontmatter::default();
    for line in block.trim().lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        frontmatter.insert(key, strip_quotes(value.trim()));
    }

    (frontmatter, body.trim())
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}
