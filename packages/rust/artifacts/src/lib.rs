//! Renderers that turn an aggregated context into an exportable bundle.
//!
//! Three formats share the [`Renderer`] contract:
//! - [`JsonRenderer`]: direct, order-preserving structural encoding
//! - [`XmlRenderer`]: one element per key, text in CDATA sections
//! - [`MarkdownRenderer`]: depth-based headings with title-cased labels
//!
//! Every renderer is pure: identical input always yields identical bytes.

mod json;
mod markdown;
mod xml;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use prompttree_shared::{AggregatedContext, ContextMetadata, PromptTreeError, Result};

pub use json::JsonRenderer;
pub use markdown::{EMPTY_ENTRY, MAX_HEADING_DEPTH, MarkdownRenderer, title_case};
pub use xml::{XmlRenderer, element_name};

// ---------------------------------------------------------------------------
// Options & format
// ---------------------------------------------------------------------------

/// Knobs shared by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the metadata block alongside the content.
    pub include_metadata: bool,
    /// Compact output. Only the JSON renderer honours it; content is unchanged.
    pub minify: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            minify: false,
        }
    }
}

/// Output format of a rendered bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    Markdown,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Markdown => "markdown",
        }
    }

    /// Conventional file extension for bundles in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Markdown => "md",
        }
    }

    /// The renderer implementing this format.
    pub fn renderer(&self) -> &'static dyn Renderer {
        match self {
            Self::Json => &JsonRenderer,
            Self::Xml => &XmlRenderer,
            Self::Markdown => &MarkdownRenderer,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = PromptTreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "structured-data" => Ok(Self::Json),
            "xml" | "markup" => Ok(Self::Xml),
            "markdown" | "md" | "prose" => Ok(Self::Markdown),
            _ => Err(PromptTreeError::config(format!(
                "unknown format '{s}': expected json, xml, or markdown"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Renders an aggregated context plus its metadata into text.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        context: &AggregatedContext,
        metadata: &ContextMetadata,
        options: &RenderOptions,
    ) -> Result<String>;

    /// Human-readable renderer name for tracing.
    fn name(&self) -> &str;
}

/// Render `context` in `format`.
#[instrument(skip(context, metadata), fields(leaves = metadata.total_prompts))]
pub fn render(
    format: Format,
    context: &AggregatedContext,
    metadata: &ContextMetadata,
    options: &RenderOptions,
) -> Result<String> {
    let renderer = format.renderer();
    let output = renderer.render(context, metadata, options)?;
    debug!(renderer = renderer.name(), bytes = output.len(), "rendered bundle");
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn format_parses_aliases() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("structured-data".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("markup".parse::<Format>().unwrap(), Format::Xml);
        assert_eq!("MD".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("prose".parse::<Format>().unwrap(), Format::Markdown);

        let err = "yaml".parse::<Format>().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn all_formats_are_deterministic() {
        let ctx = package_context();
        let meta = metadata_for(&ctx);
        let opts = RenderOptions::default();

        for format in [Format::Json, Format::Xml, Format::Markdown] {
            let a = render(format, &ctx, &meta, &opts).unwrap();
            let b = render(format, &ctx, &meta, &opts).unwrap();
            assert_eq!(a, b, "{format} output differs between runs");
        }
    }

    #[test]
    fn all_formats_surface_every_leaf_once() {
        let mut ctx = AggregatedContext::new();
        ctx.insert("system", branch(vec![("LEAF-one", text("LEAF-one body"))]));
        ctx.insert(
            "packages",
            branch(vec![
                ("a", branch(vec![("LEAF-two", text("LEAF-two body"))])),
                (
                    "b",
                    branch(vec![
                        ("LEAF-three", text("LEAF-three body")),
                        ("nested", branch(vec![("LEAF-four", text("LEAF-four body"))])),
                    ]),
                ),
                ("empty", branch(vec![])),
            ]),
        );
        ctx.insert("LEAF-five", text("LEAF-five body"));
        ctx.insert("LEAF-six", text(""));
        let meta = metadata_for(&ctx);
        let opts = RenderOptions {
            include_metadata: false,
            minify: false,
        };

        // How each format spells an empty leaf.
        let empty_leaf = |format: Format| match format {
            Format::Json => "\"LEAF-six\": \"\"",
            Format::Xml => "<LEAF-six><![CDATA[]]></LEAF-six>",
            Format::Markdown => EMPTY_ENTRY,
        };

        assert_eq!(ctx.leaf_count(), 6);
        for format in [Format::Json, Format::Xml, Format::Markdown] {
            let out = render(format, &ctx, &meta, &opts).unwrap();
            let leaves = out.matches(" body").count() + out.matches(empty_leaf(format)).count();
            assert_eq!(leaves, ctx.leaf_count(), "{format} leaf count mismatch");
        }
    }

    #[test]
    fn renderer_names() {
        assert_eq!(Format::Json.renderer().name(), "json");
        assert_eq!(Format::Xml.renderer().name(), "xml");
        assert_eq!(Format::Markdown.renderer().name(), "markdown");
        assert_eq!(Format::Markdown.extension(), "md");
    }
}
