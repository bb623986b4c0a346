//! Link resolution against an optional base URL.

use anyhow::{Context, Result, bail};
use url::Url;

/// Per-render state threaded through link and footnote body rendering.
///
/// Created for one render call and never shared across calls, so renders
/// with different base URLs cannot interfere.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    base: Base,
}

#[derive(Debug, Clone, Default)]
enum Base {
    #[default]
    Absent,
    Parsed(Url),
    Malformed(String),
}

impl RenderContext {
    /// Creates context with optional base URL.
    ///
    /// A base URL that fails to parse is kept as malformed: links then stay
    /// exactly as authored.
    pub fn new(base_url: Option<&str>) -> Self {
        base_url.map_or_else(Self::default, Self::with_base_url)
    }

    /// Creates context resolving relative links against `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = match Url::parse(base_url) {
            Ok(url) => Base::Parsed(url),
            Err(e) => {
                log::warn!("Invalid base URL '{base_url}': {e}, links stay unresolved");
                Base::Malformed(base_url.to_string())
            }
        };
        Self { base }
    }

    /// Returns parsed base URL, if one was configured and valid.
    pub fn base_url(&self) -> Option<&Url> {
        match &self.base {
            Base::Parsed(url) => Some(url),
            Base::Absent | Base::Malformed(_) => None,
        }
    }
}

/// Resolves link destination for rendering.
///
/// Handles different destination types:
/// - Fragments (#section) are lowercased to match generated heading ids
/// - Everything else is resolved against the base URL
/// - Destinations that fail to resolve are returned as authored
///
/// # Arguments
///
/// * `href`: Link destination from markdown
/// * `context`: Render context carrying the base URL
pub fn resolve_href(href: &str, context: &RenderContext) -> String {
    if href.starts_with('#') {
        return href.to_lowercase();
    }

    join(href, context).unwrap_or_else(|e| {
        log::debug!("Keeping link unresolved: {e:#}");
        href.to_string()
    })
}

/// Joins destination onto base URL with WHATWG URL semantics.
///
/// # Errors
///
/// Returns error if the base URL is malformed, or the destination is
/// relative without a base, or the join itself fails
fn join(href: &str, context: &RenderContext) -> Result<String> {
    let url = match &context.base {
        Base::Absent => Url::parse(href),
        Base::Parsed(base) => base.join(href),
        Base::Malformed(base) => bail!("Base URL is malformed: {base}"),
    }
    .with_context(|| format!("Failed to resolve link: {href}"))?;

    Ok(url.into())
}
