//! Footnote references (`[^label]`) and definitions (`[^label]: body`).
//!
//! A reference renders as a superscript link to the definition and the
//! definition links back, so each label yields a pair of complementary ids.

use maud::{PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

use super::{Extension, compile, escape_text};
use crate::markdown::{Level, RenderScope, Token, TokenKind};

/// Id prefix of footnote definitions.
pub const FOOTNOTE_PREFIX: &str = "marked-fn";

/// Id prefix of footnote references.
pub const REFERENCE_PREFIX: &str = "marked-fnref";

static REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"^\[\^([^\]]+)\]"));

// Body is a single non-whitespace run; multi-word bodies are not supported.
static DEFINITION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^\[\^([^\]]+)\]:\s(\S*)"));

/// Matches `[^label]` at offset zero, unless followed by `(`.
fn reference(src: &str) -> Option<(&str, &str)> {
    let caps = REFERENCE.as_ref()?.captures(src)?;
    let raw = caps.get(0)?.as_str();

    // `[^label](dest)` is link syntax
    if src.get(raw.len()..).is_some_and(|rest| rest.starts_with('(')) {
        return None;
    }

    Some((raw, caps.get(1)?.as_str().trim()))
}

/// Inline extension for footnote references.
#[derive(Debug, Clone, Copy, Default)]
pub struct FootnoteReference;

impl Extension for FootnoteReference {
    fn name(&self) -> &'static str {
        "footnote-ref"
    }

    fn level(&self) -> Level {
        Level::Inline
    }

    // Loose hint; the `(` check is left to `tokenize`
    fn recognize(&self, src: &str) -> Option<usize> {
        src.find("[^")
    }

    fn tokenize<'s>(&self, src: &'s str) -> Option<Token<'s>> {
        let (raw, label) = reference(src)?;
        Some(Token::new(raw, TokenKind::FootnoteReference { label }))
    }

    fn render(&self, token: &Token<'_>, _scope: &RenderScope<'_>) -> String {
        let TokenKind::FootnoteReference { label } = token.kind else {
            return escape_text(token.raw);
        };

        html! {
            sup class="txt-tiny footnote-ref" id=(format!("{REFERENCE_PREFIX}:{label}")) {
                a href=(format!("#{FOOTNOTE_PREFIX}:{label}")) { "[" (label) "]" }
            }
        }
        .into_string()
    }
}

/// Block extension for footnote definitions.
///
/// The body is rendered through the inline pipeline, so it may carry emoji,
/// links or math of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct FootnoteDefinition;

impl Extension for FootnoteDefinition {
    fn name(&self) -> &'static str {
        "footnote"
    }

    fn level(&self) -> Level {
        Level::Block
    }

    fn recognize(&self, src: &str) -> Option<usize> {
        DEFINITION.as_ref()?.is_match(src).then_some(0)
    }

    fn tokenize<'s>(&self, src: &'s str) -> Option<Token<'s>> {
        let caps = DEFINITION.as_ref()?.captures(src)?;
        let raw = caps.get(0)?.as_str();
        let label = caps.get(1)?.as_str().trim();
        let body = caps.get(2)?.as_str().trim();
        Some(Token::new(raw, TokenKind::FootnoteDefinition { label, body }))
    }

    fn render(&self, token: &Token<'_>, scope: &RenderScope<'_>) -> String {
        let TokenKind::FootnoteDefinition { label, body } = token.kind else {
            return escape_text(token.raw);
        };

        html! {
            p class="txt-small footnote" id=(format!("{FOOTNOTE_PREFIX}:{label}")) {
                span class="marker" { (label) "." }
                " "
                (PreEscaped(scope.render_inline(body)))
                " "
                a class="txt-tiny ref-arrow no-underline" href=(format!("#{REFERENCE_PREFIX}:{label}")) {
                    "↩"
                }
            }
        }
        .into_string()
    }
}
