//! Command line configuration.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use url::Url;

use crate::markdown::{EmojiMap, MarkdownRenderer};

/// Command line configuration for Marksafe.
#[derive(Debug, Clone, Parser)]
#[command(name = "marksafe", version, about, long_about = None)]
pub struct Config {
    /// Markdown file to render (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Output file (writes stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base URL relative links are resolved against
    #[arg(long)]
    pub base_url: Option<String>,

    /// JSON file of extra emoji shortcodes, merged over the bundled set
    #[arg(long)]
    pub emojis: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if input path does not exist or base URL is malformed.
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = self.input.as_ref().filter(|input| !input.exists()) {
            bail!("Input path does not exist: {}", input.display());
        }

        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        }

        Ok(())
    }

    /// Builds renderer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the extra emoji map cannot be loaded.
    pub fn renderer(&self) -> Result<MarkdownRenderer> {
        let Some(path) = &self.emojis else {
            return Ok(MarkdownRenderer::new());
        };

        let mut emojis = EmojiMap::bundled().clone();
        emojis.extend(EmojiMap::from_file(path)?);
        log::debug!("Loaded {} emoji shortcodes", emojis.len());

        Ok(MarkdownRenderer::with_emojis(emojis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::RenderContext;

    fn config() -> Config {
        Config {
            input: None,
            output: None,
            base_url: None,
            emojis: None,
            verbose: false,
        }
    }

    #[test]
    fn test_parse_all_arguments() {
        // Arrange
        let args = [
            "marksafe",
            "README.md",
            "-o",
            "out.html",
            "--base-url",
            "https://example.test/",
            "--emojis",
            "extra.json",
            "-v",
        ];

        // Act
        let config = Config::try_parse_from(args).expect("Should parse arguments");

        // Assert
        assert_eq!(config.input, Some(PathBuf::from("README.md")));
        assert_eq!(config.output, Some(PathBuf::from("out.html")));
        assert_eq!(config.base_url.as_deref(), Some("https://example.test/"));
        assert_eq!(config.emojis, Some(PathBuf::from("extra.json")));
        assert!(config.verbose);
    }

    #[test]
    fn test_parse_defaults_to_stdio() {
        // Arrange & Act
        let config = Config::try_parse_from(["marksafe"]).expect("Should parse arguments");

        // Assert
        assert!(config.input.is_none(), "Input should default to stdin");
        assert!(config.output.is_none(), "Output should default to stdout");
        assert!(!config.verbose);
    }

    #[test]
    fn test_validate_stdin_input() {
        // Arrange
        let config = config();

        // Act
        let result = config.validate();

        // Assert
        assert!(result.is_ok(), "Stdin input should be valid");
    }

    #[test]
    fn test_validate_missing_input() {
        // Arrange
        let config = Config {
            input: Some(PathBuf::from("/nonexistent/path/README.md")),
            ..config()
        };

        // Act
        let result = config.validate();

        // Assert
        assert!(result.is_err(), "Nonexistent input should fail validation");
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("does not exist"), "Error should mention missing path");
    }

    #[test]
    fn test_validate_malformed_base_url() {
        // Arrange
        let config = Config {
            base_url: Some("not a url".to_string()),
            ..config()
        };

        // Act
        let result = config.validate();

        // Assert
        assert!(result.is_err(), "Malformed base URL should fail validation");
        assert!(result.unwrap_err().to_string().contains("Invalid base URL"));
    }

    #[test]
    fn test_renderer_merges_extra_emojis() {
        // Arrange
        let dir = tempfile::TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("emojis.json");
        std::fs::write(&path, r#"{"ferris": "🦀", "smile": "🙂"}"#).expect("Should write map");
        let config = Config {
            emojis: Some(path),
            ..config()
        };

        // Act
        let renderer = config.renderer().expect("Should build renderer");
        let html = renderer.render_inline(":ferris: :smile: :rocket:", &RenderContext::default());

        // Assert
        assert_eq!(html, "<span>🦀</span> <span>🙂</span> <span>🚀</span>");
    }

    #[test]
    fn test_renderer_invalid_emoji_file() {
        // Arrange
        let dir = tempfile::TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("emojis.json");
        std::fs::write(&path, "[1, 2, 3]").expect("Should write map");
        let config = Config {
            emojis: Some(path),
            ..config()
        };

        // Act
        let result = config.renderer();

        // Assert
        assert!(result.is_err(), "Non-object emoji map should fail");
    }
}
