//! Tokens produced by syntax extensions.

/// Where an extension may match.
///
/// Inline extensions are tried anywhere inside running text. Block extensions
/// are only tried at the start of a source line outside fenced code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Inline,
    Block,
}

/// Structured fragment recognized by an extension.
///
/// `raw` is the exact text consumed, always a non-empty prefix of the input
/// handed to the tokenizer. The engine advances its cursor by `raw.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'s> {
    pub raw: &'s str,
    pub kind: TokenKind<'s>,
}

/// Extension specific payload of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'s> {
    /// `:name:` shortcode
    Emoji { name: &'s str },
    /// `[^label]` reference inside running text
    FootnoteReference { label: &'s str },
    /// `[^label]: body` definition at the start of a line
    FootnoteDefinition { label: &'s str, body: &'s str },
    /// `<a name="ident"/>` self closing anchor
    Anchor { name: &'s str },
}

impl<'s> Token<'s> {
    /// Creates token for consumed text and parsed payload.
    pub fn new(raw: &'s str, kind: TokenKind<'s>) -> Self {
        Self { raw, kind }
    }

    /// Returns name of the extension kind that produced this token.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Checks the token consumed a non-empty prefix of `src`.
    ///
    /// Tokens failing this check would stall or desynchronize the engine's
    /// cursor and are discarded.
    pub fn is_anchored_in(&self, src: &str) -> bool {
        !self.raw.is_empty() && src.starts_with(self.raw)
    }
}

impl TokenKind<'_> {
    /// Returns stable extension name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Emoji { .. } => "emoji",
            Self::FootnoteReference { .. } => "footnote-ref",
            Self::FootnoteDefinition { .. } => "footnote",
            Self::Anchor { .. } => "sanitizedAnchor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_anchored_at_start() {
        // Arrange
        let src = ":smile: rest";
        let token = Token::new(&src[..7], TokenKind::Emoji { name: "smile" });

        // Act & Assert
        assert!(token.is_anchored_in(src), "Prefix token should be anchored");
        assert_eq!(token.kind_name(), "emoji");
    }

    #[test]
    fn test_token_rejects_empty_raw() {
        // Arrange
        let token = Token::new("", TokenKind::Anchor { name: "foo" });

        // Act & Assert
        assert!(
            !token.is_anchored_in("<a name=\"foo\"/>"),
            "Zero length token must be rejected"
        );
    }

    #[test]
    fn test_token_rejects_unanchored_raw() {
        // Arrange
        let token = Token::new(":smile:", TokenKind::Emoji { name: "smile" });

        // Act & Assert
        assert!(
            !token.is_anchored_in("hello :smile:"),
            "Token not at offset zero must be rejected"
        );
    }
}
