//! Stable selector generation.
//!
//! Priority ladder: data-testid > #id > aria-label > name > type+placeholder
//! > structural path. The first rule that matches the element uniquely wins;
//! a structural path is always available as the last resort, so generation
//! never fails. Robustness against re-renders that reorder siblings is
//! explicitly not guaranteed.

use crate::dom::{Document, NodeId};

use super::matcher::count_matches;

/// Class-name prefixes that mark framework/utility classes, useless as
/// stable hooks (CSS-in-JS hashes, state toggles).
const UTILITY_PREFIXES: &[&str] = &["css-", "js-", "is-", "has-", "sc-", "u-", "_"];

/// Whether a class name is worth using as a selector or field key.
pub fn is_qualifying_class(class: &str) -> bool {
    class.len() >= 3 && !UTILITY_PREFIXES.iter().any(|p| class.starts_with(p))
}

fn attr_shortcut(doc: &Document, value: &str, selector: String) -> Option<String> {
    // Quotes in the value would break the generated syntax; fall through.
    if value.contains('"') {
        return None;
    }
    if count_matches(doc, &selector) == 1 {
        Some(selector)
    } else {
        None
    }
}

/// Generate the most stable CSS selector available for `node`.
pub fn generate_selector(doc: &Document, node: NodeId) -> String {
    let el = doc.get(node);
    let tag = el.tag.clone();

    // 1. data-testid wins outright; uniqueness is a convention we trust.
    if let Some(testid) = el.attr("data-testid") {
        if !testid.is_empty() && !testid.contains('"') {
            return format!("[data-testid=\"{}\"]", testid);
        }
    }

    // 2. #id, verified unique.
    if let Some(id) = el.attr("id") {
        if !id.is_empty() && is_css_ident(id) {
            let selector = format!("#{}", id);
            if count_matches(doc, &selector) == 1 {
                return selector;
            }
        }
    }

    // 3. aria-label.
    if let Some(label) = el.attr("aria-label") {
        if !label.is_empty() {
            let selector = format!("{}[aria-label=\"{}\"]", tag, label);
            if let Some(s) = attr_shortcut(doc, label, selector) {
                return s;
            }
        }
    }

    // 4. name (form controls).
    if let Some(name) = el.attr("name") {
        if !name.is_empty() {
            let selector = format!("{}[name=\"{}\"]", tag, name);
            if let Some(s) = attr_shortcut(doc, name, selector) {
                return s;
            }
        }
    }

    // 5. type + placeholder for text-entry controls.
    if tag == "input" || tag == "textarea" {
        if let (Some(ty), Some(placeholder)) = (el.attr("type"), el.attr("placeholder")) {
            if !placeholder.is_empty() && !ty.contains('"') {
                let selector = format!("{}[type=\"{}\"][placeholder=\"{}\"]", tag, ty, placeholder);
                if let Some(s) = attr_shortcut(doc, placeholder, selector) {
                    return s;
                }
            }
        }
    }

    // 6. Structural path up to <body>.
    structural_path(doc, node)
}

fn is_css_ident(s: &str) -> bool {
    !s.is_empty()
        && !s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Path of `tag` / `tag:nth-of-type(k)` segments from just below `<body>`
/// down to the element; the index only appears where ≥2 same-tag siblings
/// exist.
pub fn structural_path(doc: &Document, node: NodeId) -> String {
    let body = doc.body();
    if Some(node) == body {
        return "body".to_string();
    }

    let mut segments = Vec::new();
    let mut cur = Some(node);
    while let Some(n) = cur {
        if Some(n) == body || doc.parent(n).is_none() {
            break;
        }
        segments.push(path_segment(doc, n));
        cur = doc.parent(n);
    }
    segments.reverse();
    segments.join(" > ")
}

fn path_segment(doc: &Document, node: NodeId) -> String {
    let tag = &doc.get(node).tag;
    if doc.same_tag_sibling_count(node) >= 2 {
        format!("{}:nth-of-type({})", tag, doc.nth_of_type_index(node))
    } else {
        tag.clone()
    }
}

/// Pure structural XPath from the document root. No attribute shortcuts.
pub fn generate_xpath(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut cur = Some(node);
    while let Some(n) = cur {
        let tag = &doc.get(n).tag;
        if doc.same_tag_sibling_count(n) >= 2 {
            segments.push(format!("{}[{}]", tag, doc.nth_of_type_index(n)));
        } else {
            segments.push(tag.clone());
        }
        cur = doc.parent(n);
    }
    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// Selector for a field element relative to its list item container:
/// a class unique within the item subtree, else a bare tag if unique, else
/// `tag:nth-of-type(k)`.
pub fn relative_selector(doc: &Document, item: NodeId, node: NodeId) -> String {
    // Overlay badges are present while field detection runs; they must not
    // count toward uniqueness.
    let subtree: Vec<NodeId> = doc
        .descendants(item)
        .into_iter()
        .filter(|n| *n != item && !doc.get(*n).synthetic)
        .collect();
    let el = doc.get(node);

    for class in &el.classes {
        if !is_qualifying_class(class) {
            continue;
        }
        let holders = subtree
            .iter()
            .filter(|n| doc.get(**n).has_class(class))
            .count();
        if holders == 1 {
            return format!(".{}", class);
        }
    }

    let same_tag = subtree
        .iter()
        .filter(|n| doc.get(**n).tag == el.tag)
        .count();
    if same_tag == 1 {
        return el.tag.clone();
    }

    format!(
        "{}:nth-of-type({})",
        el.tag,
        doc.nth_of_type_index(node)
    )
}

/// Short human-readable label for a step ("Search button", link text, ...).
pub fn element_label(doc: &Document, node: NodeId) -> String {
    let el = doc.get(node);
    if let Some(label) = el.attr("aria-label") {
        if !label.is_empty() {
            return label.to_string();
        }
    }
    let text = doc.deep_text(node);
    if !text.is_empty() {
        let mut label: String = text.chars().take(40).collect();
        if text.chars().count() > 40 {
            label.push('…');
        }
        return label;
    }
    if let Some(placeholder) = el.attr("placeholder") {
        if !placeholder.is_empty() {
            return placeholder.to_string();
        }
    }
    if let Some(name) = el.attr("name") {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    el.tag.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_snapshot;
    use crate::selector::matcher::{query_selector, query_selector_all};

    #[test]
    fn test_unique_id_wins_and_resolves_back() {
        let doc = parse_snapshot(
            r#"<html><body><div><button id="go">Go</button></div></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let button = query_selector(&doc, None, "button").unwrap();
        let selector = generate_selector(&doc, button);
        assert_eq!(selector, "#go");
        assert_eq!(query_selector(&doc, None, &selector), Some(button));
    }

    #[test]
    fn test_testid_beats_id() {
        let doc = parse_snapshot(
            r#"<html><body><button id="go" data-testid="submit-btn">Go</button></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let button = query_selector(&doc, None, "button").unwrap();
        assert_eq!(
            generate_selector(&doc, button),
            "[data-testid=\"submit-btn\"]"
        );
    }

    #[test]
    fn test_duplicate_id_falls_through() {
        let doc = parse_snapshot(
            r#"<html><body><span id="x">a</span><div><span id="x">b</span></div></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let spans = query_selector_all(&doc, None, "span");
        let selector = generate_selector(&doc, spans[1]);
        assert_ne!(selector, "#x");
        assert_eq!(query_selector_all(&doc, None, &selector), vec![spans[1]]);
    }

    #[test]
    fn test_structural_siblings_differ_by_nth_of_type() {
        let doc = parse_snapshot(
            r#"<html><body><div><p>one</p><p>two</p></div></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let ps = query_selector_all(&doc, None, "p");
        let s1 = generate_selector(&doc, ps[0]);
        let s2 = generate_selector(&doc, ps[1]);
        assert_eq!(s1, "div > p:nth-of-type(1)");
        assert_eq!(s2, "div > p:nth-of-type(2)");
        assert_eq!(query_selector_all(&doc, None, &s1), vec![ps[0]]);
        assert_eq!(query_selector_all(&doc, None, &s2), vec![ps[1]]);
    }

    #[test]
    fn test_placeholder_shortcut() {
        let doc = parse_snapshot(
            r#"<html><body><form><input type="text" placeholder="Search"/></form></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let input = query_selector(&doc, None, "input").unwrap();
        assert_eq!(
            generate_selector(&doc, input),
            r#"input[type="text"][placeholder="Search"]"#
        );
    }

    #[test]
    fn test_xpath_is_structural_only() {
        let doc = parse_snapshot(
            r#"<html><body><div id="a"><span/><span/></div></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let spans = query_selector_all(&doc, None, "span");
        assert_eq!(generate_xpath(&doc, spans[1]), "/html/body/div/span[2]");
    }

    #[test]
    fn test_relative_selector_prefers_unique_class() {
        let doc = parse_snapshot(
            r#"<html><body><li class="item"><span class="price">9</span><span>x</span></li></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let li = query_selector(&doc, None, "li").unwrap();
        let spans = query_selector_all(&doc, Some(li), "span");
        assert_eq!(relative_selector(&doc, li, spans[0]), ".price");
        assert_eq!(
            relative_selector(&doc, li, spans[1]),
            "span:nth-of-type(2)"
        );
    }

    #[test]
    fn test_relative_selector_ignores_synthetic_nodes() {
        use crate::dom::Element;

        let mut doc = parse_snapshot(
            r#"<html><body><li class="item"><span>only</span></li></body></html>"#,
            "https://example.com/",
        )
        .unwrap();
        let li = query_selector(&doc, None, "li").unwrap();
        let span = query_selector(&doc, None, "span").unwrap();

        let mut badge = Element::new("span");
        badge.synthetic = true;
        doc.append_node(Some(li), badge);

        // The injected badge span must not break the bare-tag shortcut.
        assert_eq!(relative_selector(&doc, li, span), "span");
    }
}
