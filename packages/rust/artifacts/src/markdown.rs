//! Markdown bundle renderer.

use std::fmt::Write as _;

use chrono::SecondsFormat;

use prompttree_shared::{AggregatedContext, ContextMetadata, ContextNode, Result};

use crate::{RenderOptions, Renderer};

/// Deepest heading level emitted; deeper keys reuse it.
pub const MAX_HEADING_DEPTH: usize = 6;

/// Body written for an entry with no text.
pub const EMPTY_ENTRY: &str = "_(empty)_";

/// Emits a heading per key (level = nesting depth) followed by entry text.
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        context: &AggregatedContext,
        metadata: &ContextMetadata,
        options: &RenderOptions,
    ) -> Result<String> {
        let mut out = String::new();

        if options.include_metadata {
            write_metadata(&mut out, metadata);
        }

        for (key, node) in context.iter() {
            write_node(&mut out, key, node, 1);
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        Ok(out)
    }

    fn name(&self) -> &str {
        "markdown"
    }
}

fn write_metadata(out: &mut String, meta: &ContextMetadata) {
    let generated = meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    push_item(out, "Generated", &generated);
    push_item(out, "Scope", meta.scope.as_str());
    if let Some(target) = &meta.target {
        push_item(out, "Target", target);
    }
    push_item(out, "Total Prompts", &meta.total_prompts.to_string());
    push_item(out, "Packages", &join_or_none(&meta.packages));
    push_item(out, "Applications", &join_or_none(&meta.applications));
    push_item(out, "Workflows", &join_or_none(&meta.workflows));
    out.push_str("\n---\n\n");
}

fn push_item(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "- **{label}:** {value}");
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

fn write_node(out: &mut String, key: &str, node: &ContextNode, depth: usize) {
    let level = depth.min(MAX_HEADING_DEPTH);
    let _ = write!(out, "{} {}\n\n", "#".repeat(level), title_case(key));

    match node {
        ContextNode::Text(text) => {
            let body = text.trim_end_matches(['\n', '\r']);
            // Keep empty entries distinguishable from empty sections.
            out.push_str(if body.is_empty() { EMPTY_ENTRY } else { body });
            out.push_str("\n\n");
        }
        ContextNode::Branch(children) => {
            for (child_key, child) in children {
                write_node(out, child_key, child, depth + 1);
            }
        }
    }
}

/// Turn a key like `report-generation` into `Report Generation`.
pub fn title_case(key: &str) -> String {
    key.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
