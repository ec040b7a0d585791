//! Frontmatter separation and Markdown-to-plain-text normalization.
//!
//! Normalization renders Markdown to HTML with `pulldown-cmark`, drops every
//! tag by collecting the text nodes with `scraper`, then collapses whitespace.
//! The transform is deterministic and stateless.

mod frontmatter;

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use scraper::Html;
use tracing::{debug, instrument};

pub use frontmatter::{Frontmatter, split_frontmatter};

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Reduce Markdown to flat, markup-free text.
///
/// 1. Render Markdown to HTML
/// 2. Strip all tags (entities are decoded along the way)
/// 3. Collapse runs of whitespace to one space and trim the ends
#[instrument(skip_all, fields(input_len = markdown.len()))]
pub fn markdown_to_text(markdown: &str) -> String {
    let rendered = render_html(markdown);
    let stripped = strip_tags(&rendered);
    let text = collapse_whitespace(&stripped);

    debug!(output_len = text.len(), "normalized markdown");
    text
}

/// Render Markdown to HTML (the intermediate form).
fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Keep only text nodes of an HTML fragment.
fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}

/// Collapse whitespace runs to a single space and trim.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
