//! Emoji shortcodes (`:smile:`).

use anyhow::{Context, Result};
use maud::html;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use super::{Extension, compile, escape_text};
use crate::markdown::{Level, RenderScope, Token, TokenKind};

const BUNDLED_JSON: &str = include_str!("../../../assets/emojis.json");

static BUNDLED: LazyLock<EmojiMap> = LazyLock::new(|| {
    EmojiMap::from_json(BUNDLED_JSON).unwrap_or_else(|e| {
        log::error!("Failed to load bundled emoji map: {e:#}");
        EmojiMap::default()
    })
});

static SHORTCODE: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"^:([A-Za-z0-9_+-]+):"));

/// Mapping from shortcode name to glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiMap(HashMap<String, String>);

impl EmojiMap {
    /// Returns the map bundled with the crate, parsed on first use.
    pub fn bundled() -> &'static Self {
        &BUNDLED
    }

    /// Parses a JSON object of shortcode to glyph.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a JSON object of strings
    pub fn from_json(json: &str) -> Result<Self> {
        let map: HashMap<String, String> = serde_json::from_str(json)
            .context("Emoji map must be a JSON object of shortcode to glyph")?;
        Ok(Self(map))
    }

    /// Reads and parses an emoji map file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid map
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read emoji map: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid emoji map: {}", path.display()))
    }

    /// Looks up glyph for shortcode name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Merges `other` into this map; entries in `other` win.
    pub fn extend(&mut self, other: EmojiMap) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inline extension replacing `:name:` with its glyph.
///
/// Unknown names render as the bare name, without colons.
pub struct Emoji {
    glyphs: EmojiMap,
}

impl Emoji {
    pub fn new(glyphs: EmojiMap) -> Self {
        Self { glyphs }
    }
}

impl Default for Emoji {
    fn default() -> Self {
        Self::new(EmojiMap::bundled().clone())
    }
}

impl Extension for Emoji {
    fn name(&self) -> &'static str {
        "emoji"
    }

    fn level(&self) -> Level {
        Level::Inline
    }

    fn recognize(&self, src: &str) -> Option<usize> {
        src.find(':')
    }

    fn tokenize<'s>(&self, src: &'s str) -> Option<Token<'s>> {
        let caps = SHORTCODE.as_ref()?.captures(src)?;
        let raw = caps.get(0)?.as_str();
        let name = caps.get(1)?.as_str().trim();
        Some(Token::new(raw, TokenKind::Emoji { name }))
    }

    fn render(&self, token: &Token<'_>, _scope: &RenderScope<'_>) -> String {
        let TokenKind::Emoji { name } = token.kind else {
            return escape_text(token.raw);
        };

        html! { span { (self.glyphs.get(name).unwrap_or(name)) } }.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{MarkdownRenderer, RenderContext};

    fn render(extension: &Emoji, src: &str) -> String {
        let renderer = MarkdownRenderer::new();
        let context = RenderContext::default();
        let scope = RenderScope::new(&renderer, &context);
        let token = extension.tokenize(src).expect("Should tokenize shortcode");
        extension.render(&token, &scope)
    }

    #[test]
    fn test_tokenize_shortcode() {
        // Arrange
        let emoji = Emoji::default();

        // Act
        let token = emoji.tokenize(":smile: and more").expect("Should match");

        // Assert
        assert_eq!(token.raw, ":smile:");
        assert_eq!(token.kind, TokenKind::Emoji { name: "smile" });
    }

    #[test]
    fn test_tokenize_plus_one() {
        // Arrange
        let emoji = Emoji::default();

        // Act
        let token = emoji.tokenize(":+1:").expect("Should match plus sign");

        // Assert
        assert_eq!(token.kind, TokenKind::Emoji { name: "+1" });
    }

    #[test]
    fn test_tokenize_requires_offset_zero() {
        // Arrange
        let emoji = Emoji::default();

        // Act & Assert
        assert!(emoji.tokenize("say :smile:").is_none());
        assert!(emoji.tokenize(": smile:").is_none());
        assert!(emoji.tokenize("::").is_none(), "Empty name must not match");
    }

    #[test]
    fn test_recognize_is_colon_hint() {
        // Arrange
        let emoji = Emoji::default();

        // Act & Assert
        assert_eq!(emoji.recognize("time 12:30"), Some(7));
        assert_eq!(emoji.recognize("no colons here"), None);
    }

    #[test]
    fn test_render_known_glyph() {
        // Arrange
        let emoji = Emoji::default();

        // Act
        let html = render(&emoji, ":smile:");

        // Assert
        assert_eq!(html, "<span>😄</span>");
    }

    #[test]
    fn test_render_unknown_name_falls_back() {
        // Arrange
        let emoji = Emoji::default();

        // Act
        let html = render(&emoji, ":not_an_emoji:");

        // Assert
        assert_eq!(html, "<span>not_an_emoji</span>");
    }

    #[test]
    fn test_custom_map_overrides_bundled() {
        // Arrange
        let mut glyphs = EmojiMap::bundled().clone();
        glyphs.extend(EmojiMap::from_json(r#"{"smile": "S", "radicle": "🌱"}"#).expect("Valid"));
        let emoji = Emoji::new(glyphs);

        // Act & Assert
        assert_eq!(render(&emoji, ":smile:"), "<span>S</span>");
        assert_eq!(render(&emoji, ":radicle:"), "<span>🌱</span>");
    }

    #[test]
    fn test_bundled_map_loaded() {
        // Arrange & Act
        let bundled = EmojiMap::bundled();

        // Assert
        assert!(!bundled.is_empty(), "Bundled map should parse");
        assert_eq!(bundled.get("smile"), Some("😄"));
        assert_eq!(bundled.get("+1"), Some("👍"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        // Arrange & Act
        let result = EmojiMap::from_json("[\"smile\"]");

        // Assert
        assert!(result.is_err(), "Array is not a shortcode map");
    }
}
