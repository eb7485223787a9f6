//! Minimal helpers for the tracker's rich-text document format (ADF).
//!
//! Only two things are needed by the engine: flattening a comment body to
//! plain text so audit markers can be found, and wrapping plain text into a
//! document the tracker accepts. Malformed bodies degrade to empty text.

use serde_json::{json, Value};

/// Flatten a rich-text body to plain text.
///
/// Accepts either an ADF document or a plain string body. Block nodes are
/// separated by newlines; unknown shapes contribute nothing.
#[must_use]
pub fn plain_text(body: &Value) -> String {
    let mut out = String::new();
    collect_text(body, &mut out);
    out.trim_end().to_string()
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::Object(map) => {
            match map.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = map.get("text").and_then(Value::as_str) {
                        out.push_str(text);
                    }
                    return;
                }
                Some("hardBreak") => {
                    out.push('\n');
                    return;
                }
                Some("mention") => {
                    if let Some(text) = node.pointer("/attrs/text").and_then(Value::as_str) {
                        out.push_str(text);
                    }
                    return;
                }
                _ => {}
            }

            if let Some(content) = map.get("content") {
                collect_text(content, out);
            }

            let is_block = matches!(
                map.get("type").and_then(Value::as_str),
                Some("paragraph" | "heading" | "listItem" | "codeBlock" | "blockquote")
            );
            if is_block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {}
    }
}

/// Wrap plain text into a document, one paragraph per non-empty line.
#[must_use]
pub fn document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }]
            })
        })
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs
    })
}
