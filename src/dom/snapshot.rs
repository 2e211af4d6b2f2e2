//! Page snapshot parsing.
//!
//! Snapshots are XHTML-style documents carrying the attributes the capture
//! core cares about (`id`, `class`, `style`, `bounds`, `data-testid`,
//! `aria-label`, ...). `bounds` uses the `[left,top][right,bottom]` form.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;

use super::node::{Document, Element, Position, Rect};

static DECIMAL_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());
static HEX_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#x([0-9A-Fa-f]+);").unwrap());
static POSITION_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"position\s*:\s*([a-z-]+)").unwrap());

/// Decode common HTML entities in a string
/// Handles: &amp; &lt; &gt; &quot; &apos; &nbsp; &#NNN; (decimal) &#xHHH; (hex)
fn decode_html_entities(s: &str) -> String {
    let mut result = s.to_string();

    result = result.replace("&lt;", "<");
    result = result.replace("&gt;", ">");
    result = result.replace("&quot;", "\"");
    result = result.replace("&apos;", "'");
    result = result.replace("&nbsp;", " ");

    result = DECIMAL_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    result = HEX_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    // Last so earlier replacements do not double-decode
    result.replace("&amp;", "&")
}

fn element_from_attrs(tag: &str, e: &quick_xml::events::BytesStart) -> Element {
    let mut element = Element::new(tag);

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = decode_html_entities(&String::from_utf8_lossy(&attr.value));

        match key.as_str() {
            "class" => {
                element.classes = value.split_whitespace().map(|c| c.to_string()).collect();
            }
            "style" => {
                if let Some(caps) = POSITION_DECL.captures(&value) {
                    element.position = Position::from_style(&caps[1]);
                }
                element.attrs.insert(key, value);
            }
            "bounds" => {
                if let Some(r) = Rect::from_string(&value) {
                    element.rect = r;
                }
            }
            _ => {
                element.attrs.insert(key, value);
            }
        }
    }

    element
}

/// Parse an XML page snapshot into a [`Document`] rooted at the outermost
/// element. `url` is the page URL the snapshot was taken from.
pub fn parse_snapshot(xml: &str, url: &str) -> Result<Document> {
    let mut doc = Document::new(url);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<crate::dom::NodeId> = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("invalid snapshot XML")?
        {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let element = element_from_attrs(&tag, e);
                let id = doc.append_node(stack.last().copied(), element);
                stack.push(id);
            }
            Event::Empty(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let element = element_from_attrs(&tag, e);
                doc.append_node(stack.last().copied(), element);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(ref t) => {
                if let Some(&current) = stack.last() {
                    let text = decode_html_entities(&String::from_utf8_lossy(t.as_ref()));
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        let el = doc.get_mut(current);
                        if el.text.is_empty() {
                            el.text = text;
                        } else {
                            el.text.push(' ');
                            el.text.push_str(&text);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if doc.root().is_none() {
        anyhow::bail!("snapshot contains no elements");
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_html_entities_named() {
        assert_eq!(decode_html_entities("Cats &amp; Dogs"), "Cats & Dogs");
        assert_eq!(decode_html_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_html_entities("&quot;quoted&quot;"), "\"quoted\"");
        assert_eq!(decode_html_entities("it&apos;s"), "it's");
    }

    #[test]
    fn test_decode_html_entities_numeric() {
        assert_eq!(decode_html_entities("a&#10;b"), "a\nb");
        assert_eq!(decode_html_entities("&#x41;&#x42;"), "AB");
    }

    #[test]
    fn test_parse_snapshot_tree() {
        let xml = r#"<html><body><div class="card featured" bounds="[0,0][300,120]">
            <h2>Title</h2>
            <a href="/item/1">Open</a>
        </div></body></html>"#;
        let doc = parse_snapshot(xml, "https://example.com/list?page=2").unwrap();

        let body = doc.body().unwrap();
        let div = doc.element_children(body)[0];
        assert_eq!(doc.get(div).tag, "div");
        assert!(doc.get(div).has_class("featured"));
        assert_eq!(doc.get(div).rect.width(), 300);

        let kids = doc.element_children(div);
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.get(kids[1]).attr("href"), Some("/item/1"));
        assert_eq!(doc.deep_text(div), "Title Open");
    }

    #[test]
    fn test_parse_snapshot_position_style() {
        let xml = r#"<html><body><div style="color: red; position: relative"/></body></html>"#;
        let doc = parse_snapshot(xml, "https://example.com/").unwrap();
        let div = doc.element_children(doc.body().unwrap())[0];
        assert_eq!(doc.get(div).position, Position::Relative);
    }

    #[test]
    fn test_parse_snapshot_rejects_garbage() {
        assert!(parse_snapshot("", "https://example.com/").is_err());
    }
}
