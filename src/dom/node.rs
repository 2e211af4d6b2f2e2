use std::collections::HashMap;

/// Handle into a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Rendered bounding box of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    /// Parse bounds from string like "[0,0][1080,1920]"
    pub fn from_string(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split("][").collect();
        if parts.len() != 2 {
            return None;
        }

        let left_top = parts[0].trim_start_matches('[');
        let right_bottom = parts[1].trim_end_matches(']');

        let lt: Vec<i32> = left_top.split(',').filter_map(|s| s.parse().ok()).collect();
        let rb: Vec<i32> = right_bottom
            .split(',')
            .filter_map(|s| s.parse().ok())
            .collect();

        if lt.len() == 2 && rb.len() == 2 {
            Some(Rect {
                left: lt[0],
                top: lt[1],
                right: rb[0],
                bottom: rb[1],
            })
        } else {
            None
        }
    }
}

/// CSS `position` value, as far as the overlay cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn from_style(value: &str) -> Self {
        match value.trim() {
            "relative" => Position::Relative,
            "absolute" => Position::Absolute,
            "fixed" => Position::Fixed,
            "sticky" => Position::Sticky,
            _ => Position::Static,
        }
    }
}

/// One element in the page snapshot.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub classes: Vec<String>,
    /// Own text content (not including descendants).
    pub text: String,
    pub rect: Rect,
    /// Position from the author stylesheet / style attribute.
    pub position: Position,
    /// Inline override injected by the picker overlay, if any.
    pub inline_position: Option<Position>,
    /// True for nodes injected by the overlay (badges).
    pub synthetic: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) detached: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: HashMap::new(),
            classes: Vec::new(),
            text: String::new(),
            rect: Rect::default(),
            position: Position::Static,
            inline_position: None,
            synthetic: false,
            parent: None,
            children: Vec::new(),
            detached: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Effective position after any overlay override.
    pub fn effective_position(&self) -> Position {
        self.inline_position.unwrap_or(self.position)
    }

    pub fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select" | "button")
    }
}

/// In-memory page snapshot the capture core operates on.
///
/// Stand-in for the live browser DOM: a node arena with parent/child links,
/// the query surface the selector engine needs, and the handful of mutations
/// the picker overlay performs (classes, inline position, badge nodes).
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub scroll_y: i32,
    nodes: Vec<Element>,
    root: Option<NodeId>,
    body: Option<NodeId>,
}

impl Document {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            scroll_y: 0,
            nodes: Vec::new(),
            root: None,
            body: None,
        }
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| !self.nodes[c.0].detached)
            .collect()
    }

    /// Child elements excluding overlay-injected nodes.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|c| !self.nodes[c.0].synthetic)
            .collect()
    }

    pub fn append_node(&mut self, parent: Option<NodeId>, mut element: Element) -> NodeId {
        element.parent = parent;
        let id = NodeId(self.nodes.len());
        self.nodes.push(element);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        } else if self.root.is_none() {
            self.root = Some(id);
        }
        if self.nodes[id.0].tag == "body" && self.body.is_none() {
            self.body = Some(id);
        }
        id
    }

    /// Detach a node (and its subtree) from the tree. Used to remove badges.
    pub fn detach(&mut self, id: NodeId) {
        self.nodes[id.0].detached = true;
    }

    /// Ancestor chain from the node's parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if self.nodes[n.0].detached {
                continue;
            }
            out.push(n);
            for c in self.children(n).into_iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// All live elements, document order.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self.descendants(root),
            None => Vec::new(),
        }
    }

    /// Text of the node and all of its non-synthetic descendants.
    pub fn deep_text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        for n in self.descendants(id) {
            let el = self.get(n);
            if el.synthetic {
                continue;
            }
            let t = el.text.trim();
            if !t.is_empty() {
                parts.push(t.to_string());
            }
        }
        parts.join(" ")
    }

    /// 1-based index among same-tag element siblings (what `:nth-of-type` counts).
    pub fn nth_of_type_index(&self, id: NodeId) -> usize {
        let tag = &self.get(id).tag;
        match self.parent(id) {
            Some(p) => {
                let mut index = 0;
                for sib in self.element_children(p) {
                    if &self.get(sib).tag == tag {
                        index += 1;
                        if sib == id {
                            return index;
                        }
                    }
                }
                1
            }
            None => 1,
        }
    }

    /// Number of element siblings (including the node) sharing its tag.
    pub fn same_tag_sibling_count(&self, id: NodeId) -> usize {
        let tag = &self.get(id).tag;
        match self.parent(id) {
            Some(p) => self
                .element_children(p)
                .iter()
                .filter(|s| &self.get(**s).tag == tag)
                .count(),
            None => 1,
        }
    }

    /// Walk up from `id` (inclusive) looking for the first node matching `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if pred(self, n) {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Whether the node or one of its ancestors carries the given class.
    pub fn in_subtree_with_class(&self, id: NodeId, class: &str) -> bool {
        self.closest(id, |d, n| d.get(n).has_class(class)).is_some()
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let el = self.get_mut(id);
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        self.get_mut(id).classes.retain(|c| c != class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_string() {
        let r = Rect::from_string("[10,20][110,80]").unwrap();
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 60);
        assert_eq!(r.area(), 6000);
        assert!(Rect::from_string("bogus").is_none());
    }

    #[test]
    fn test_nth_of_type_counts_same_tag_only() {
        let mut doc = Document::new("https://example.com/");
        let html = doc.append_node(None, Element::new("html"));
        let body = doc.append_node(Some(html), Element::new("body"));
        let _h1 = doc.append_node(Some(body), Element::new("h1"));
        let p1 = doc.append_node(Some(body), Element::new("p"));
        let p2 = doc.append_node(Some(body), Element::new("p"));

        assert_eq!(doc.nth_of_type_index(p1), 1);
        assert_eq!(doc.nth_of_type_index(p2), 2);
        assert_eq!(doc.same_tag_sibling_count(p2), 2);
    }

    #[test]
    fn test_detach_hides_subtree() {
        let mut doc = Document::new("https://example.com/");
        let html = doc.append_node(None, Element::new("html"));
        let body = doc.append_node(Some(html), Element::new("body"));
        let div = doc.append_node(Some(body), Element::new("div"));
        let mut badge = Element::new("span");
        badge.synthetic = true;
        let badge = doc.append_node(Some(div), badge);

        assert_eq!(doc.children(div), vec![badge]);
        assert!(doc.element_children(div).is_empty());
        doc.detach(badge);
        assert!(doc.children(div).is_empty());
    }

    #[test]
    fn test_deep_text_skips_synthetic() {
        let mut doc = Document::new("https://example.com/");
        let html = doc.append_node(None, Element::new("html"));
        let body = doc.append_node(Some(html), Element::new("body"));
        let div = doc.append_node(Some(body), Element::new("div"));
        let mut span = Element::new("span");
        span.text = "hello".to_string();
        doc.append_node(Some(div), span);
        let mut badge = Element::new("span");
        badge.synthetic = true;
        badge.text = "Select · 1/3".to_string();
        doc.append_node(Some(div), badge);

        assert_eq!(doc.deep_text(div), "hello");
    }
}
