//! XML bundle renderer.
//!
//! Entry text goes into CDATA sections so documentation can carry `<`, `&`
//! and friends untouched. Text holding characters XML 1.0 cannot represent at
//! all (C0 controls such as ANSI escapes) is emitted base64-encoded with
//! `encoding="base64"` instead. Only metadata values and attributes are escaped.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose};
use chrono::SecondsFormat;
use regex::Regex;

use prompttree_shared::{AggregatedContext, ContextMap, ContextMetadata, ContextNode, Result};

use crate::{RenderOptions, Renderer};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "  ";

/// Emits one element per mapping key, nested like the source mapping.
pub struct XmlRenderer;

impl Renderer for XmlRenderer {
    fn render(
        &self,
        context: &AggregatedContext,
        metadata: &ContextMetadata,
        options: &RenderOptions,
    ) -> Result<String> {
        let mut out = String::new();
        out.push_str(DECLARATION);
        out.push('\n');

        if options.include_metadata {
            out.push_str("<context>\n");
            write_metadata(&mut out, metadata, 1);
            write_branch(&mut out, "content", None, context.as_map(), 1);
            out.push_str("</context>\n");
        } else {
            write_branch(&mut out, "content", None, context.as_map(), 0);
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "xml"
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_node(out: &mut String, key: &str, node: &ContextNode, depth: usize) {
    let name = element_name(key);
    let attr = (name != key).then_some(key);
    match node {
        ContextNode::Text(text) if text.chars().all(is_xml_char) => {
            open_tag(out, &name, attr, depth);
            out.push_str(&cdata(text));
            let _ = writeln!(out, "</{name}>");
        }
        ContextNode::Text(text) => {
            indent(out, depth);
            let _ = write!(out, "<{name}");
            push_key_attr(out, attr);
            let _ = writeln!(
                out,
                " encoding=\"base64\">{}</{name}>",
                general_purpose::STANDARD.encode(text)
            );
        }
        ContextNode::Branch(children) => write_branch(out, &name, attr, children, depth),
    }
}

fn write_branch(
    out: &mut String,
    name: &str,
    key_attr: Option<&str>,
    children: &ContextMap,
    depth: usize,
) {
    if children.is_empty() {
        indent(out, depth);
        let _ = write!(out, "<{name}");
        push_key_attr(out, key_attr);
        out.push_str("/>\n");
        return;
    }

    open_tag(out, name, key_attr, depth);
    out.push('\n');
    for (key, child) in children {
        write_node(out, key, child, depth + 1);
    }
    indent(out, depth);
    let _ = writeln!(out, "</{name}>");
}

fn write_metadata(out: &mut String, meta: &ContextMetadata, depth: usize) {
    indent(out, depth);
    out.push_str("<metadata>\n");

    let generated = meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    write_value(out, "generated_at", &generated, depth + 1);
    write_value(out, "scope", meta.scope.as_str(), depth + 1);
    if let Some(target) = &meta.target {
        write_value(out, "target", target, depth + 1);
    }
    write_value(out, "total_prompts", &meta.total_prompts.to_string(), depth + 1);
    write_list(out, "packages", "package", &meta.packages, depth + 1);
    write_list(out, "applications", "application", &meta.applications, depth + 1);
    write_list(out, "workflows", "workflow", &meta.workflows, depth + 1);

    indent(out, depth);
    out.push_str("</metadata>\n");
}

fn write_value(out: &mut String, name: &str, value: &str, depth: usize) {
    indent(out, depth);
    let _ = writeln!(out, "<{name}>{}</{name}>", escape(value));
}

fn write_list(out: &mut String, name: &str, item: &str, values: &[String], depth: usize) {
    indent(out, depth);
    if values.is_empty() {
        let _ = writeln!(out, "<{name}/>");
        return;
    }
    let _ = writeln!(out, "<{name}>");
    for value in values {
        write_value(out, item, value, depth + 1);
    }
    indent(out, depth);
    let _ = writeln!(out, "</{name}>");
}

fn open_tag(out: &mut String, name: &str, key_attr: Option<&str>, depth: usize) {
    indent(out, depth);
    let _ = write!(out, "<{name}");
    push_key_attr(out, key_attr);
    out.push('>');
}

fn push_key_attr(out: &mut String, key_attr: Option<&str>) {
    if let Some(key) = key_attr {
        let _ = write!(out, " key=\"{}\"", escape_attr(key));
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Map an arbitrary mapping key to a valid XML element name.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`; a name not starting with
/// a letter or `_` is prefixed with `_`.
pub fn element_name(key: &str) -> Cow<'_, str> {
    static INVALID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

    let replaced = INVALID_RE.replace_all(key, "_");
    let starts_ok = replaced
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if starts_ok {
        replaced
    } else {
        Cow::Owned(format!("_{replaced}"))
    }
}

/// Wrap text in a CDATA section, splitting any embedded `]]>` terminator.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Whether `c` may appear anywhere in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape markup characters; characters XML cannot carry become U+FFFD.
fn escape(s: &str) -> String {
    s.chars()
        .map(|c| if is_xml_char(c) { c } else { char::REPLACEMENT_CHARACTER })
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn no_metadata() -> RenderOptions {
        RenderOptions {
            include_metadata: false,
            minify: false,
        }
    }

    #[test]
    fn content_stands_alone_without_metadata() {
        let ctx = package_context();
        let meta = metadata_for(&ctx);

        let out = XmlRenderer.render(&ctx, &meta, &no_metadata()).unwrap();
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<content>
  <package>
    <cache>
      <overview><![CDATA[# Cache

Stores <things> & more.]]></overview>
      <status><![CDATA[stable]]></status>
    </cache>
  </package>
</content>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn metadata_precedes_content_under_one_root() {
        let ctx = package_context();
        let meta = metadata_for(&ctx);

        let out = XmlRenderer
            .render(&ctx, &meta, &RenderOptions::default())
            .unwrap();

        assert!(out.starts_with(&format!("{DECLARATION}\n<context>\n  <metadata>\n")));
        assert!(out.ends_with("  </content>\n</context>\n"));
        assert!(out.find("</metadata>").unwrap() < out.find("<content>").unwrap());
        assert!(out.contains("    <generated_at>2026-10-19T12:00:00Z</generated_at>\n"));
        assert!(out.contains("    <target>cache</target>\n"));
        assert!(out.contains("    <total_prompts>2</total_prompts>\n"));
        assert!(out.contains("      <package>queue</package>\n"));
        assert!(out.contains("    <applications/>\n"));
        assert!(out.contains("      <workflow>report-generation</workflow>\n"));
    }

    #[test]
    fn cdata_terminator_is_split() {
        let mut ctx = AggregatedContext::new();
        ctx.insert("tricky", text("a ]]> b"));
        let meta = metadata_for(&ctx);

        let out = XmlRenderer.render(&ctx, &meta, &no_metadata()).unwrap();
        assert!(out.contains("<tricky><![CDATA[a ]]]]><![CDATA[> b]]></tricky>"));
    }

    #[test]
    fn invalid_keys_are_sanitised_and_kept_as_attribute() {
        let mut ctx = AggregatedContext::new();
        ctx.insert("2024 notes", text("x"));
        ctx.insert("report-generation", text("y"));
        ctx.insert("a&b", branch(vec![]));
        let meta = metadata_for(&ctx);

        let out = XmlRenderer.render(&ctx, &meta, &no_metadata()).unwrap();
        assert!(out.contains("<_2024_notes key=\"2024 notes\"><![CDATA[x]]></_2024_notes>"));
        assert!(out.contains("<report-generation><![CDATA[y]]></report-generation>"));
        assert!(out.contains("<a_b key=\"a&amp;b\"/>"));
    }

    fn assert_xml_chars_only(out: &str) {
        if let Some(bad) = out.chars().find(|c| !is_xml_char(*c)) {
            panic!("output carries {:?}", bad);
        }
    }

    #[test]
    fn control_characters_are_base64_encoded() {
        let ansi = "run \u{1b}[1mbold\u{1b}[0m";
        let mut ctx = AggregatedContext::new();
        ctx.insert("ansi", text(ansi));
        ctx.insert("plain", text("ok"));
        let meta = metadata_for(&ctx);

        let out = XmlRenderer.render(&ctx, &meta, &no_metadata()).unwrap();
        assert_xml_chars_only(&out);
        assert!(out.contains("<plain><![CDATA[ok]]></plain>"));

        let encoded = out
            .split_once("<ansi encoding=\"base64\">")
            .and_then(|(_, rest)| rest.split_once("</ansi>"))
            .map(|(body, _)| body)
            .expect("encoded ansi leaf");
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), ansi);
    }

    #[test]
    fn control_characters_in_metadata_and_keys_are_replaced() {
        let mut ctx = AggregatedContext::new();
        ctx.insert("bell\u{7}", text("x"));
        let mut meta = metadata_for(&ctx);
        meta.target = Some("a\u{0}b".into());

        let out = XmlRenderer
            .render(&ctx, &meta, &RenderOptions::default())
            .unwrap();
        assert_xml_chars_only(&out);
        assert!(out.contains("<target>a\u{FFFD}b</target>"));
        assert!(out.contains("<bell_ key=\"bell\u{FFFD}\"><![CDATA[x]]></bell_>"));
    }

    #[test]
    fn xml_char_ranges() {
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('\n'));
        assert!(is_xml_char('é'));
        assert!(is_xml_char('\u{1F600}'));
        assert!(!is_xml_char('\u{1b}'));
        assert!(!is_xml_char('\u{0}'));
        assert!(!is_xml_char('\u{FFFE}'));
    }

    #[test]
    fn element_name_rules() {
        assert_eq!(element_name("overview"), "overview");
        assert_eq!(element_name("api.v2"), "api.v2");
        assert_eq!(element_name("_private"), "_private");
        assert_eq!(element_name("-dash"), "_-dash");
        assert_eq!(element_name("9lives"), "_9lives");
        assert_eq!(element_name(""), "_");
    }

    #[test]
    fn metadata_values_are_escaped() {
        let ctx = AggregatedContext::new();
        let mut meta = metadata_for(&ctx);
        meta.target = Some("r&d <lab>".into());

        let out = XmlRenderer
            .render(&ctx, &meta, &RenderOptions::default())
            .unwrap();
        assert!(out.contains("<target>r&amp;d &lt;lab&gt;</target>"));
        assert!(out.contains("  <content/>\n"));
    }
}
