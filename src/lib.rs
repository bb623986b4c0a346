//! Safe markdown to HTML rendering with marked-style extensions.

mod config;
mod markdown;

pub use config::Config;
pub use markdown::{
    Emoji, EmojiMap, Extension, FORBIDDEN_TAGS, FOOTNOTE_PREFIX, FootnoteDefinition,
    FootnoteReference, Level, MarkdownRenderer, REFERENCE_PREFIX, RenderContext, RenderScope,
    SanitizedAnchor, Sanitizer, Token, TokenKind, default_extensions, render_heading,
    resolve_href, slugify,
};
