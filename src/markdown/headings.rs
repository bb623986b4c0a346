//! Heading anchor ids.
//!
//! Ids are derived only from heading text and are not de-duplicated: two
//! headings with the same text share an id.

/// Slugifies heading text for use as an anchor id.
///
/// Lowercases, collapses every run of characters outside `[A-Za-z0-9_]`
/// into a single dash, and trims dashes from both ends. Slugifying a slug
/// returns it unchanged.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_separator = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            in_separator = false;
        } else if !in_separator {
            slug.push('-');
            in_separator = true;
        }
    }

    slug.trim_matches('-').to_string()
}

/// Renders heading with id derived from its text.
///
/// The visible text keeps its casing; only the id is normalized.
///
/// # Arguments
///
/// * `text`: Heading content, already HTML
/// * `level`: Heading level (1-6)
pub fn render_heading(text: &str, level: u8) -> String {
    heading_html(level, &slugify(text), text)
}

pub(crate) fn heading_html(level: u8, id: &str, content: &str) -> String {
    format!("<h{level} id=\"{id}\">{content}</h{level}>")
}
