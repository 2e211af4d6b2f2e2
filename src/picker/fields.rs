//! Automatic field detection inside a picked item.
//!
//! Walks the representative item looking for leaf-ish value carriers
//! (links, images, form controls, short text nodes) and turns each into
//! an extraction field with an item-relative selector and a readable key.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::schema::{ExtractionField, FieldType};
use crate::selector::{is_qualifying_class, relative_selector};

/// Direct children with these tags force recursion instead of a leaf.
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "table", "section", "article",
];

/// Detect extraction fields for one representative item. Keys are unique
/// within the result; selectors are relative to the item.
pub fn detect_fields(doc: &Document, item: NodeId) -> Vec<ExtractionField> {
    let mut candidates = Vec::new();
    for child in doc.element_children(item) {
        collect_candidates(doc, child, &mut candidates);
    }

    let mut fields: Vec<ExtractionField> = Vec::new();
    let mut taken: HashMap<String, usize> = HashMap::new();
    for node in candidates {
        let el = doc.get(node);
        let selector = relative_selector(doc, item, node);
        let (field_type, attribute) = match el.tag.as_str() {
            "input" | "textarea" | "select" => (FieldType::Value, None),
            "a" => (FieldType::Attribute, Some("href".to_string())),
            "img" => (FieldType::Attribute, Some("src".to_string())),
            _ => (FieldType::Text, None),
        };
        let key = unique_key(derive_key(doc, node, fields.len()), &mut taken);

        // Links get a companion field for their visible text.
        let link_text = (el.tag == "a").then(|| doc.deep_text(node)).filter(|t| !t.is_empty());

        fields.push(ExtractionField {
            key: key.clone(),
            selector: selector.clone(),
            field_type,
            attribute,
        });
        if link_text.is_some() {
            fields.push(ExtractionField {
                key: unique_key(format!("{key}_text"), &mut taken),
                selector,
                field_type: FieldType::Text,
                attribute: None,
            });
        }
    }
    fields
}

/// Build one field for an explicitly clicked element (single-mode field
/// picking). The key is deduplicated against the fields picked so far.
pub(crate) fn manual_field(
    doc: &Document,
    item: NodeId,
    node: NodeId,
    existing: &[ExtractionField],
) -> ExtractionField {
    let el = doc.get(node);
    let (field_type, attribute) = match el.tag.as_str() {
        "input" | "textarea" | "select" => (FieldType::Value, None),
        "a" => (FieldType::Attribute, Some("href".to_string())),
        "img" => (FieldType::Attribute, Some("src".to_string())),
        _ => (FieldType::Text, None),
    };
    let base = derive_key(doc, node, existing.len());
    let mut key = base.clone();
    let mut suffix = 2;
    while existing.iter().any(|f| f.key == key) {
        key = format!("{base}_{suffix}");
        suffix += 1;
    }
    ExtractionField {
        key,
        selector: relative_selector(doc, item, node),
        field_type,
        attribute,
    }
}

fn collect_candidates(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    let el = doc.get(node);
    if el.synthetic || el.rect.area() == 0 {
        return;
    }

    // Links with a target, images with a source and form controls are
    // always value carriers, regardless of structure.
    let always_leaf = match el.tag.as_str() {
        "a" => el.attr("href").is_some(),
        "img" => el.attr("src").is_some(),
        _ => el.is_form_control(),
    };
    if always_leaf {
        out.push(node);
        return;
    }

    let children = doc.element_children(node);
    let has_block_child = children
        .iter()
        .any(|c| BLOCK_TAGS.contains(&doc.get(*c).tag.as_str()));
    if !has_block_child && children.len() <= 3 && !doc.deep_text(node).is_empty() {
        out.push(node);
        return;
    }
    for child in children {
        collect_candidates(doc, child, out);
    }
}

/// Key ladder: aria-label, name attribute, first qualifying class,
/// slugified text, positional fallback.
fn derive_key(doc: &Document, node: NodeId, index: usize) -> String {
    let el = doc.get(node);
    if let Some(label) = el.attr("aria-label").and_then(slugify) {
        return label;
    }
    if let Some(name) = el.attr("name").and_then(slugify) {
        return name;
    }
    if let Some(class) = el.classes.iter().find(|c| is_qualifying_class(c)) {
        if let Some(slug) = slugify(class) {
            return slug;
        }
    }
    if let Some(slug) = slugify(&doc.deep_text(node)) {
        return slug;
    }
    format!("field_{index}")
}

fn unique_key(base: String, taken: &mut HashMap<String, usize>) -> String {
    let count = {
        let count = taken.entry(base.clone()).or_insert(0);
        *count += 1;
        *count
    };
    if count == 1 {
        return base;
    }
    // The suffixed name can itself be taken (a natural `tag_2` key next to
    // a second `tag`); keep counting until it is free.
    let mut suffix = count;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !taken.contains_key(&candidate) {
            taken.insert(candidate.clone(), 1);
            return candidate;
        }
        suffix += 1;
    }
}

/// Lowercase snake_case slug from arbitrary text, capped at a few words.
fn slugify(text: &str) -> Option<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(3)
        .map(|w| w.to_lowercase())
        .collect();
    if words.is_empty() {
        return None;
    }
    let mut slug = words.join("_");
    slug.truncate(24);
    let slug = slug.trim_end_matches('_').to_string();
    if slug.starts_with(|c: char| c.is_ascii_digit()) {
        Some(format!("f_{slug}"))
    } else {
        Some(slug)
    }
}
