//! Markdown rendering with pluggable syntax extensions.
//!
//! This module renders markdown using comrak with GFM extensions (tables,
//! strikethrough, autolinks, task lists, math), applies emoji, footnote and
//! anchor extensions, resolves links against a base URL, assigns heading ids
//! and sanitizes the final HTML.

mod extensions;
mod headings;
mod links;
mod renderer;
mod sanitize;
mod token;

pub use extensions::{
    Emoji, EmojiMap, Extension, FOOTNOTE_PREFIX, FootnoteDefinition, FootnoteReference,
    REFERENCE_PREFIX, SanitizedAnchor, default_extensions,
};
pub use headings::{render_heading, slugify};
pub use links::{RenderContext, resolve_href};
pub use renderer::{MarkdownRenderer, RenderScope};
pub use sanitize::{FORBIDDEN_TAGS, Sanitizer};
pub use token::{Level, Token, TokenKind};
