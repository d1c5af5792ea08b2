//! JSON bundle renderer.

use serde::Serialize;

use prompttree_shared::{AggregatedContext, ContextMetadata, PromptTreeError, Result};

use crate::{RenderOptions, Renderer};

/// Encodes the context mapping directly, optionally wrapped with metadata.
pub struct JsonRenderer;

/// Top-level `{"metadata": ..., "context": ...}` split.
#[derive(Serialize)]
struct Envelope<'a> {
    metadata: &'a ContextMetadata,
    context: &'a AggregatedContext,
}

impl Renderer for JsonRenderer {
    fn render(
        &self,
        context: &AggregatedContext,
        metadata: &ContextMetadata,
        options: &RenderOptions,
    ) -> Result<String> {
        let mut out = if options.include_metadata {
            encode(&Envelope { metadata, context }, options.minify)?
        } else {
            encode(context, options.minify)?
        };
        out.push('\n');
        Ok(out)
    }

    fn name(&self) -> &str {
        "json"
    }
}

fn encode<T: Serialize + ?Sized>(value: &T, minify: bool) -> Result<String> {
    let encoded = if minify {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    encoded.map_err(|e| PromptTreeError::Serialization(format!("JSON encoding failed: {e}")))
}
