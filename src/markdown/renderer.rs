//! Markdown rendering with syntax extensions and sanitization.

use anyhow::{Context, Result};
use comrak::nodes::{AstNode, NodeCode, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};
use std::path::Path;

use super::extensions::{EmojiMap, Extension, default_extensions, escape_text};
use super::headings::{heading_html, slugify};
use super::links::{RenderContext, resolve_href};
use super::sanitize::Sanitizer;
use super::token::{Level, Token};

const PLACEHOLDER_PREFIX: &str = "<!--marksafe:block:";
const PLACEHOLDER_SUFFIX: &str = "-->";

/// Renders markdown to sanitized HTML with syntax extensions.
///
/// Wraps comrak with GFM tables, strikethrough, task lists, non-fuzzy
/// autolinks and dollar/code math. Registered extensions add their own
/// syntax: block extensions are matched at line starts before parsing,
/// inline extensions over text once the document is parsed. Link
/// destinations are resolved against the render's base URL and headings
/// receive ids derived from their text. Output always goes through the
/// sanitizer.
///
/// Built once and reused; all per-call state lives in [`RenderContext`].
pub struct MarkdownRenderer {
    options: Options<'static>,
    inline: Vec<Box<dyn Extension>>,
    block: Vec<Box<dyn Extension>>,
    sanitizer: Sanitizer,
}

/// Handle given to extensions while rendering a token.
///
/// Carries the caller's [`RenderContext`] and the re-entrant inline render
/// path, so an extension can render nested markdown under the same base URL.
pub struct RenderScope<'r> {
    renderer: &'r MarkdownRenderer,
    context: &'r RenderContext,
}

/// Block token found by the line-start pass, with its extension's index.
struct BlockToken<'s> {
    extension: usize,
    token: Token<'s>,
    /// Text inserted after the placeholder to keep the rest of the line
    /// inside its containers.
    separator: String,
}

/// Opening code fence tracked by the line-start pass.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
}

/// Blockquote and list nesting tracked by the line-start pass.
#[derive(Debug, Default)]
struct Containers {
    /// Content column of the innermost open list item.
    list_indent: Option<usize>,
}

impl MarkdownRenderer {
    /// Creates renderer with the default extensions and bundled emoji map.
    pub fn new() -> Self {
        Self::with_emojis(EmojiMap::bundled().clone())
    }

    /// Creates renderer with the default extensions and a custom emoji map.
    pub fn with_emojis(emojis: EmojiMap) -> Self {
        Self::with_extensions(default_extensions(emojis))
    }

    /// Creates renderer with an explicit extension set.
    ///
    /// Extensions are split by level; registration order within a level is
    /// the dispatch order.
    ///
    /// # Arguments
    ///
    /// * `extensions`: Extensions in dispatch order
    pub fn with_extensions(extensions: Vec<Box<dyn Extension>>) -> Self {
        let (inline, block): (Vec<_>, Vec<_>) = extensions
            .into_iter()
            .partition(|extension| extension.level() == Level::Inline);

        Self {
            options: comrak_options(),
            inline,
            block,
            sanitizer: Sanitizer::new(),
        }
    }

    /// Renders markdown to sanitized HTML.
    ///
    /// Never fails: malformed extension syntax stays text, unresolvable
    /// links keep their authored destination, unsafe markup is dropped.
    ///
    /// # Arguments
    ///
    /// * `markdown`: Markdown content to render
    /// * `base_url`: Base for relative link destinations
    pub fn render(&self, markdown: &str, base_url: Option<&str>) -> String {
        self.render_with_context(markdown, &RenderContext::new(base_url))
    }

    /// Renders markdown to sanitized HTML under an existing context.
    pub fn render_with_context(&self, markdown: &str, context: &RenderContext) -> String {
        self.sanitizer.clean(&self.render_html(markdown, context))
    }

    /// Renders a single line of inline markdown to sanitized HTML.
    ///
    /// Block extensions are not applied and no paragraph wraps the result.
    pub fn render_inline(&self, text: &str, context: &RenderContext) -> String {
        self.sanitizer.clean(&self.inline_html(text, context))
    }

    /// Renders markdown file at given path.
    ///
    /// # Arguments
    ///
    /// * `path`: Path to markdown file
    /// * `base_url`: Base for relative link destinations
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read
    pub fn render_file(&self, path: impl AsRef<Path>, base_url: Option<&str>) -> Result<String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markdown file: {}", path.display()))?;
        Ok(self.render(&content, base_url))
    }

    /// Runs the full pipeline up to, but not including, sanitization.
    fn render_html(&self, markdown: &str, context: &RenderContext) -> String {
        let (source, blocks) = self.tokenize_blocks(markdown);

        let arena = Arena::new();
        let root = parse_document(&arena, &source, &self.options);
        let scope = RenderScope::new(self, context);
        self.transform(root, &blocks, &scope);

        log::debug!(
            "Rendered {} bytes of markdown with {} block tokens",
            markdown.len(),
            blocks.len()
        );

        self.format(root)
    }

    /// Renders inline markdown without sanitizing or wrapping it.
    ///
    /// Input that parses to anything but one paragraph is emitted as
    /// escaped text, since block syntax has no inline meaning.
    fn inline_html(&self, text: &str, context: &RenderContext) -> String {
        let arena = Arena::new();
        let root = parse_document(&arena, text, &self.options);
        let scope = RenderScope::new(self, context);
        self.transform(root, &[], &scope);

        let single_paragraph = root.first_child().is_some_and(|child| {
            child.next_sibling().is_none()
                && matches!(child.data.borrow().value, NodeValue::Paragraph)
        });
        if !single_paragraph {
            return escape_text(text);
        }

        let html = self.format(root);
        html.strip_prefix("<p>")
            .and_then(|html| html.strip_suffix("</p>\n"))
            .map_or_else(|| escape_text(text), str::to_string)
    }

    /// Replaces block tokens at line starts with placeholder HTML blocks.
    ///
    /// Tokens are matched where a block may start: after blockquote markers,
    /// list markers and up to three spaces of indentation. Lines inside
    /// fenced code are never matched. Each placeholder keeps the line's
    /// container prefix and sits on its own line, so comrak parses it as a
    /// standalone HTML block and any text left on the line keeps parsing as
    /// markdown in the same container.
    fn tokenize_blocks<'s>(&self, markdown: &'s str) -> (String, Vec<BlockToken<'s>>) {
        let mut source = String::with_capacity(markdown.len());
        let mut blocks = Vec::new();
        let mut containers = Containers::default();
        let mut fence: Option<Fence> = None;
        let mut pos = 0;

        while let Some(rest) = markdown.get(pos..).filter(|rest| !rest.is_empty()) {
            let line_len = rest.find('\n').map_or(rest.len(), |i| i + 1);
            let line = &rest[..line_len];
            let base = containers.content_base(line);
            let content = &line[base..];

            if let Some(open) = fence {
                if open.closed_by(content) {
                    fence = None;
                }
            } else if let Some(open) = Fence::open(content) {
                fence = Some(open);
            } else if let Some((start, mut block)) = self.tokenize_block(rest, base) {
                let prefix = &rest[..start];
                pos += start + block.token.raw.len();
                if !markdown.get(pos..).is_some_and(|next| next.starts_with('\n')) {
                    block.separator = format!("\n{}", continuation(prefix));
                }

                source.push_str(prefix);
                source.push_str(&placeholder(blocks.len()));
                source.push_str(&block.separator);
                blocks.push(block);

                // The rest of the line is not a line start
                let tail = markdown.get(pos..).unwrap_or_default();
                let tail_len = tail.find('\n').map_or(tail.len(), |i| i + 1);
                source.push_str(&tail[..tail_len]);
                pos += tail_len;
                continue;
            }

            source.push_str(line);
            pos += line_len;
        }

        (source, blocks)
    }

    /// Tries block extensions on the content of the line opening `rest`.
    ///
    /// Returns the token's offset within `rest` along with the token.
    fn tokenize_block<'s>(&self, rest: &'s str, base: usize) -> Option<(usize, BlockToken<'s>)> {
        let content = rest.get(base..)?;
        let indent = leading_spaces(content);
        if indent > 3 {
            return None;
        }

        let start = base + indent;
        let src = rest.get(start..)?;
        self.block
            .iter()
            .enumerate()
            .filter(|(_, extension)| extension.recognize(src) == Some(0))
            .find_map(|(index, extension)| {
                let token = tokenize_at(extension.as_ref(), src)?;
                Some((
                    start,
                    BlockToken {
                        extension: index,
                        token,
                        separator: String::new(),
                    },
                ))
            })
    }

    /// Applies extensions and overrides to a parsed document.
    fn transform<'a>(
        &self,
        root: &'a AstNode<'a>,
        blocks: &[BlockToken<'_>],
        scope: &RenderScope<'_>,
    ) {
        // Ids come from the authored text, before extensions rewrite it
        let headings: Vec<_> = root
            .descendants()
            .filter(|node| matches!(node.data.borrow().value, NodeValue::Heading(_)))
            .map(|node| (node, slugify(&plain_text(node))))
            .collect();

        // Autolinked URLs are claimed whole, so their text is never expanded
        let autolinks: Vec<_> = root.descendants().filter(|node| is_autolink(node)).collect();

        let nodes: Vec<_> = root.descendants().collect();
        for &node in &nodes {
            if matches!(node.data.borrow().value, NodeValue::Text(_)) {
                self.expand_text_run(node, &autolinks, scope);
                continue;
            }

            match node.data.borrow_mut().value {
                NodeValue::Link(ref mut link) => {
                    link.url = resolve_href(&link.url, scope.context());
                    link.title.clear();
                }
                NodeValue::HtmlBlock(ref mut html) => {
                    if let Some(block) = placeholder_index(&html.literal).and_then(|i| blocks.get(i)) {
                        html.literal = self.render_block(block, scope);
                    } else if let Some(restored) = restore_placeholders(&html.literal, blocks) {
                        html.literal = restored;
                    }
                }
                NodeValue::CodeBlock(ref mut code) => {
                    if let Some(restored) = restore_placeholders(&code.literal, blocks) {
                        code.literal = restored;
                    }
                }
                NodeValue::HtmlInline(ref mut html) => {
                    if let Some(block) = placeholder_index(html.as_str()).and_then(|i| blocks.get(i)) {
                        *html = escape_text(block.token.raw);
                    }
                }
                _ => {}
            }
        }

        for &node in &nodes {
            unwrap_escaped(node);
        }

        for (heading, id) in headings {
            self.replace_heading(heading, &id);
        }
    }

    /// Merges a run of adjacent text nodes and expands inline extensions.
    ///
    /// The run collapses into its first node, which becomes raw HTML when
    /// at least one token matched. Backslash escaped characters end a run
    /// and are never expanded.
    fn expand_text_run<'a>(
        &self,
        node: &'a AstNode<'a>,
        autolinks: &[&'a AstNode<'a>],
        scope: &RenderScope<'_>,
    ) {
        let Some(parent) = node.parent() else {
            return;
        };
        if matches!(parent.data.borrow().value, NodeValue::Escaped)
            || autolinks.iter().any(|link| std::ptr::eq(*link, parent))
            || inside_image(node)
        {
            return;
        }

        let mut text = match node.data.borrow().value {
            NodeValue::Text(ref text) => text.clone(),
            _ => return,
        };

        while let Some(next) = node.next_sibling() {
            match next.data.borrow().value {
                NodeValue::Text(ref more) => text.push_str(more),
                _ => break,
            }
            next.detach();
        }

        let value = match self.expand_inline(&text, scope) {
            Some(html) => NodeValue::HtmlInline(html),
            None => NodeValue::Text(text),
        };
        node.data.borrow_mut().value = value;
    }

    /// Scans text for inline tokens, returning HTML if any matched.
    ///
    /// The cursor jumps to the earliest offset any extension recognizes;
    /// there every extension is tried in registration order and the first
    /// valid token wins. Text between tokens is escaped.
    ///
    /// Each extension's hint is kept as an absolute offset and only asked
    /// again once the cursor moves past it, so every extension scans the
    /// text once.
    fn expand_inline(&self, text: &str, scope: &RenderScope<'_>) -> Option<String> {
        let mut html = String::with_capacity(text.len());
        let mut plain = 0;
        let mut cursor = 0;
        let mut hints: Vec<Option<usize>> = self
            .inline
            .iter()
            .map(|extension| extension.recognize(text))
            .collect();

        while cursor < text.len() {
            for (hint, extension) in hints.iter_mut().zip(&self.inline) {
                if hint.is_some_and(|offset| offset < cursor) {
                    *hint = text
                        .get(cursor..)
                        .and_then(|rest| extension.recognize(rest))
                        .map(|offset| cursor + offset);
                }
            }

            let Some(start) = hints.iter().flatten().min().copied() else {
                break;
            };
            let Some(src) = text.get(start..) else {
                break;
            };

            let matched = self
                .inline
                .iter()
                .find_map(|extension| Some((extension, tokenize_at(extension.as_ref(), src)?)));

            match matched {
                Some((extension, token)) => {
                    html.push_str(&escape_text(&text[plain..start]));
                    html.push_str(&extension.render(&token, scope));
                    cursor = start + token.raw.len();
                    plain = cursor;
                }
                None => cursor = start + src.chars().next().map_or(1, char::len_utf8),
            }
        }

        // Tokens are never empty, so nothing matched while plain is zero
        if plain == 0 {
            return None;
        }

        html.push_str(&escape_text(&text[plain..]));
        Some(html)
    }

    fn render_block(&self, block: &BlockToken<'_>, scope: &RenderScope<'_>) -> String {
        let html = self.block.get(block.extension).map_or_else(
            || escape_text(block.token.raw),
            |extension| extension.render(&block.token, scope),
        );
        format!("{html}\n")
    }

    /// Re-emits heading as raw HTML carrying its id.
    fn replace_heading<'a>(&self, heading: &'a AstNode<'a>, id: &str) {
        let level = match heading.data.borrow().value {
            NodeValue::Heading(ref meta) => meta.level,
            _ => return,
        };

        let children: Vec<_> = heading.children().collect();
        let content: String = children.iter().map(|child| self.format(child)).collect();
        for child in children {
            child.detach();
        }

        heading.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 6,
            literal: format!("{}\n", heading_html(level, id, &content)),
        });
    }

    fn format<'a>(&self, node: &'a AstNode<'a>) -> String {
        let mut html = Vec::new();
        if let Err(e) = format_html(node, &self.options, &mut html) {
            log::error!("Failed to format HTML: {e}");
        }
        String::from_utf8_lossy(&html).into_owned()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> RenderScope<'r> {
    pub fn new(renderer: &'r MarkdownRenderer, context: &'r RenderContext) -> Self {
        Self { renderer, context }
    }

    pub fn context(&self) -> &RenderContext {
        self.context
    }

    /// Renders inline markdown through the full inline extension set.
    ///
    /// The result is not sanitized; the enclosing render sanitizes once.
    pub fn render_inline(&self, text: &str) -> String {
        self.renderer.inline_html(text, self.context)
    }
}

impl Containers {
    /// Returns offset where container markers end in `line`.
    ///
    /// Skips blockquote markers and list item markers, or the indentation
    /// of an open list item's content. Indentation past that is left to the
    /// caller.
    fn content_base(&mut self, line: &str) -> usize {
        if line.trim().is_empty() {
            return 0;
        }

        let mut pos = match self.list_indent {
            Some(indent) if leading_spaces(line) >= indent => indent,
            _ => 0,
        };
        let inside_list = pos > 0;
        let mut list_item = false;

        loop {
            let spaces = leading_spaces(&line[pos..]);
            if spaces > 3 {
                break;
            }

            let at = pos + spaces;
            if line[at..].starts_with('>') {
                pos = at + 1;
                if line[pos..].starts_with(' ') {
                    pos += 1;
                }
            } else if let Some(marker) = list_marker(&line[at..]) {
                pos = at + marker;
                list_item = true;
            } else {
                break;
            }
        }

        if list_item {
            self.list_indent = Some(pos);
        } else if !inside_list {
            self.list_indent = None;
        }

        pos
    }
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return None;
        }

        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }

        let len = trimmed.bytes().take_while(|&b| b == marker).count();
        // Backtick fences cannot carry backticks in their info string
        if len < 3 || (marker == b'`' && trimmed[len..].contains('`')) {
            return None;
        }

        Some(Self { marker, len })
    }

    fn closed_by(self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return false;
        }

        let len = trimmed.bytes().take_while(|&b| b == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();

    // Extension options (GFM features)
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;

    // Math is marked up for client side typesetting, malformed math stays text
    options.extension.math_dollars = true;
    options.extension.math_code = true;

    // Raw HTML passes through; the sanitizer decides what survives
    options.render.unsafe_ = true;

    // Keeps backslash escapes visible in the tree until extensions have run
    options.render.escaped_char_spans = true;

    options
}

/// Tokenizes and checks the token consumed a non-empty prefix of `src`.
fn tokenize_at<'s>(extension: &dyn Extension, src: &'s str) -> Option<Token<'s>> {
    let token = extension.tokenize(src)?;
    if token.is_anchored_in(src) {
        Some(token)
    } else {
        log::warn!(
            "Discarding {} token not anchored at cursor: {:?}",
            extension.name(),
            token.raw
        );
        None
    }
}

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}{PLACEHOLDER_SUFFIX}")
}

fn placeholder_index(literal: &str) -> Option<usize> {
    literal
        .trim_end()
        .strip_prefix(PLACEHOLDER_PREFIX)?
        .strip_suffix(PLACEHOLDER_SUFFIX)?
        .parse()
        .ok()
}

fn leading_spaces(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b' ').count()
}

/// Returns byte length of a list item marker and its trailing spaces.
fn list_marker(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let marker = match bytes.first()? {
        b'-' | b'*' | b'+' => 1,
        _ => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if !(1..=9).contains(&digits) || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
    };

    let spaces = leading_spaces(&text[marker..]);
    if spaces == 0 || text[marker + spaces..].trim().is_empty() {
        return None;
    }

    // Five or more spaces start indented code inside the item
    Some(marker + if spaces > 4 { 1 } else { spaces })
}

/// Turns a container prefix into the prefix of a continuation line.
///
/// Blockquote markers repeat, list markers become indentation.
fn continuation(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| if c == '>' { '>' } else { ' ' })
        .collect()
}

/// Puts authored text back where a placeholder landed inside a literal.
///
/// Placeholders nested in raw HTML or code are not blocks of their own,
/// so their tokens are kept as written.
fn restore_placeholders(literal: &str, blocks: &[BlockToken<'_>]) -> Option<String> {
    if !literal.contains(PLACEHOLDER_PREFIX) {
        return None;
    }

    let restored = blocks.iter().enumerate().fold(literal.to_string(), |text, (index, block)| {
        let marker = placeholder(index);
        text.replace(&format!("{marker}{}", block.separator), block.token.raw)
            .replace(&marker, block.token.raw)
    });
    Some(restored)
}

/// Checks whether link was produced from a bare URL or email address.
fn is_autolink<'a>(node: &'a AstNode<'a>) -> bool {
    let data = node.data.borrow();
    let NodeValue::Link(ref link) = data.value else {
        return false;
    };

    let mut children = node.children();
    let (Some(child), None) = (children.next(), children.next()) else {
        return false;
    };

    let child_data = child.data.borrow();
    let NodeValue::Text(ref text) = child_data.value else {
        return false;
    };

    link.url == *text
        || link.url.strip_prefix("http://") == Some(text.as_str())
        || link.url.strip_prefix("mailto:") == Some(text.as_str())
}

/// Replaces a backslash escape node with its literal character.
fn unwrap_escaped<'a>(node: &'a AstNode<'a>) {
    if !matches!(node.data.borrow().value, NodeValue::Escaped) {
        return;
    }

    let children: Vec<_> = node.children().collect();
    let mut text = String::new();
    for child in children {
        if let NodeValue::Text(ref literal) = child.data.borrow().value {
            text.push_str(literal);
        }
        child.detach();
    }

    node.data.borrow_mut().value = NodeValue::Text(text);
}

fn inside_image<'a>(node: &'a AstNode<'a>) -> bool {
    node.ancestors()
        .skip(1)
        .any(|ancestor| matches!(ancestor.data.borrow().value, NodeValue::Image(_)))
}

/// Collects heading text: literal text and inline code, breaks as spaces.
fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match node.data.borrow().value {
        NodeValue::Text(ref literal) | NodeValue::Code(NodeCode { ref literal, .. }) => {
            output.push_str(literal)
        }
        NodeValue::LineBreak | NodeValue::SoftBreak => output.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, output);
            }
        }
    }
}
