//! Normalizes `<a name="ident"/>` into `<a name="ident"></a>`.
//!
//! HTML parsers treat the self closing form as an open tag and wrap the
//! following content in the anchor.

use maud::html;
use regex::Regex;
use std::sync::LazyLock;

use super::{Extension, compile, escape_text};
use crate::markdown::{Level, RenderScope, Token, TokenKind};

static ANCHOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r#"^<a name="([A-Za-z0-9_]+)"/>"#));

/// Block extension rewriting self closing named anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizedAnchor;

impl Extension for SanitizedAnchor {
    fn name(&self) -> &'static str {
        "sanitizedAnchor"
    }

    fn level(&self) -> Level {
        Level::Block
    }

    fn recognize(&self, src: &str) -> Option<usize> {
        ANCHOR.as_ref()?.is_match(src).then_some(0)
    }

    fn tokenize<'s>(&self, src: &'s str) -> Option<Token<'s>> {
        let caps = ANCHOR.as_ref()?.captures(src)?;
        let raw = caps.get(0)?.as_str();
        let name = caps.get(1)?.as_str();
        Some(Token::new(raw, TokenKind::Anchor { name }))
    }

    fn render(&self, token: &Token<'_>, _scope: &RenderScope<'_>) -> String {
        let TokenKind::Anchor { name } = token.kind else {
            return escape_text(token.raw);
        };

        html! { a name=(name) {} }.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{MarkdownRenderer, RenderContext};

    #[test]
    fn test_tokenize_self_closing_anchor() {
        // Arrange
        let src = "<a name=\"install_guide\"/>\nText";

        // Act
        let token = SanitizedAnchor.tokenize(src).expect("Should match");

        // Assert
        assert_eq!(token.raw, "<a name=\"install_guide\"/>");
        assert_eq!(token.kind, TokenKind::Anchor { name: "install_guide" });
    }

    #[test]
    fn test_tokenize_rejects_other_forms() {
        // Arrange & Act & Assert
        assert!(SanitizedAnchor.tokenize("<a name=\"foo\"></a>").is_none());
        assert!(SanitizedAnchor.tokenize("<a name=\"foo-bar\"/>").is_none());
        assert!(SanitizedAnchor.tokenize(" <a name=\"foo\"/>").is_none());
        assert_eq!(SanitizedAnchor.recognize("x <a name=\"foo\"/>"), None);
    }

    #[test]
    fn test_render_explicit_close() {
        // Arrange
        let renderer = MarkdownRenderer::new();
        let context = RenderContext::default();
        let scope = RenderScope::new(&renderer, &context);
        let token = SanitizedAnchor.tokenize("<a name=\"foo\"/>").expect("Should match");

        // Act
        let html = SanitizedAnchor.render(&token, &scope);

        // Assert
        assert_eq!(html, "<a name=\"foo\"></a>");
    }
}
