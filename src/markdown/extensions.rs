//! Syntax extensions layered on top of the CommonMark engine.
//!
//! Each extension pairs a cheap `recognize` hint with a strict `tokenize`
//! step and a `render` step producing an HTML fragment. The engine only
//! consults `tokenize` at offsets reported by some extension's hint, and
//! tries extensions in registration order at each offset.

mod anchor;
mod emoji;
mod footnote;

use maud::html;
use regex::Regex;

use super::{Level, RenderScope, Token};

pub use anchor::SanitizedAnchor;
pub use emoji::{Emoji, EmojiMap};
pub use footnote::{FOOTNOTE_PREFIX, FootnoteDefinition, FootnoteReference, REFERENCE_PREFIX};

/// Self contained syntax unit plugged into the renderer.
///
/// Implementations are stateless beyond construction and shared across
/// renders, so they must not keep per-render state.
pub trait Extension: Send + Sync {
    /// Stable name, also used in logs.
    fn name(&self) -> &'static str;

    /// Whether the extension matches inside text or at line starts.
    fn level(&self) -> Level;

    /// Returns byte offset of the earliest position in `src` where a token
    /// may start, or `None` when nothing can match.
    ///
    /// The hint may be loose; `tokenize` decides.
    fn recognize(&self, src: &str) -> Option<usize>;

    /// Consumes a token anchored at offset zero of `src`.
    fn tokenize<'s>(&self, src: &'s str) -> Option<Token<'s>>;

    /// Renders a token produced by this extension's `tokenize`.
    fn render(&self, token: &Token<'_>, scope: &RenderScope<'_>) -> String;
}

/// Builds the default extension set in dispatch order.
///
/// Inline: emoji, footnote reference. Block: footnote definition, sanitized
/// anchor.
pub fn default_extensions(emojis: EmojiMap) -> Vec<Box<dyn Extension>> {
    vec![
        Box::new(Emoji::new(emojis)),
        Box::new(FootnoteDefinition),
        Box::new(FootnoteReference),
        Box::new(SanitizedAnchor),
    ]
}

/// Compiles an extension pattern, logging instead of panicking.
///
/// A pattern that fails to compile disables its extension.
pub(crate) fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| log::error!("Failed to compile extension pattern {pattern:?}: {e}"))
        .ok()
}

/// Escapes plain text for inclusion in HTML.
pub(crate) fn escape_text(text: &str) -> String {
    html! { (text) }.into_string()
}
