//! Final HTML sanitization pass.

use ammonia::Builder;

/// Tags removed from output together with their content.
pub const FORBIDDEN_TAGS: [&str; 2] = ["textarea", "style"];

/// Strips unsafe markup from rendered HTML.
///
/// Works on the HTML string alone, with no document or display context, so
/// the same pass runs in tests, CLIs and server side rendering. Starts from
/// ammonia's allow-list and opens it up for what the renderer emits: ids and
/// classes, named anchors, math markers and task list checkboxes.
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Sanitizer {
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .rm_tags(FORBIDDEN_TAGS)
            .add_clean_content_tags(FORBIDDEN_TAGS)
            .add_tags(["input"])
            .add_tag_attributes("input", ["type", "checked", "disabled"])
            .add_tag_attributes("a", ["name"])
            .add_generic_attributes(["id", "class"])
            .add_generic_attribute_prefixes(["data-"])
            .link_rel(None);

        Self { builder }
    }

    /// Returns `html` with disallowed tags and attributes removed.
    ///
    /// Removal is silent; nothing is reported to the caller.
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}
