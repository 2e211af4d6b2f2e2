//! Scoped overlay decorations.
//!
//! The injected classes, badges and inline style overrides are the only
//! shared mutable DOM state the core touches. They are owned by one
//! [`OverlaySession`], acquired when picking starts and released by
//! `cleanup` on exactly one exit path (finalize or cancel) — the picker
//! enforces that by consuming the session.

use crate::dom::{Document, Element, NodeId, Position};

/// Marker class carried by every injected tooling node; the recorder uses
/// it to keep tooling clicks out of the step list.
pub const TOOLING_UI_CLASS: &str = "wm-ui";
/// Outline applied to detected list members and picked containers.
pub const OUTLINE_CLASS: &str = "wm-pick-outline";
/// Hover highlight used while picking fields in single mode.
pub const HOVER_CLASS: &str = "wm-pick-hover";
/// Class on injected numbered badges.
pub const BADGE_CLASS: &str = "wm-pick-badge";

#[derive(Debug, Default)]
pub struct OverlaySession {
    outlined: Vec<NodeId>,
    badges: Vec<NodeId>,
    /// Members whose `position: static` we flipped to `relative` so the
    /// badge can anchor; restored on cleanup.
    position_flipped: Vec<NodeId>,
    hovered: Option<NodeId>,
}

impl OverlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outline a node without a badge (single-mode container).
    pub fn outline(&mut self, doc: &mut Document, node: NodeId) {
        doc.add_class(node, OUTLINE_CLASS);
        self.outlined.push(node);
    }

    /// Outline a list member and inject its `Select · i/N` badge.
    /// Returns the badge node so clicks on it can be routed back.
    pub fn decorate_member(
        &mut self,
        doc: &mut Document,
        member: NodeId,
        index: usize,
        total: usize,
    ) -> NodeId {
        self.outline(doc, member);

        if doc.get(member).effective_position() == Position::Static {
            doc.get_mut(member).inline_position = Some(Position::Relative);
            self.position_flipped.push(member);
        }

        let mut badge = Element::new("span");
        badge.classes = vec![TOOLING_UI_CLASS.to_string(), BADGE_CLASS.to_string()];
        badge.text = format!("Select · {}/{}", index + 1, total);
        badge.synthetic = true;
        let badge_id = doc.append_node(Some(member), badge);
        self.badges.push(badge_id);
        badge_id
    }

    pub fn highlight(&mut self, doc: &mut Document, node: NodeId) {
        if self.hovered == Some(node) {
            return;
        }
        self.clear_highlight(doc);
        doc.add_class(node, HOVER_CLASS);
        self.hovered = Some(node);
    }

    pub fn clear_highlight(&mut self, doc: &mut Document) {
        if let Some(old) = self.hovered.take() {
            doc.remove_class(old, HOVER_CLASS);
        }
    }

    /// Revert every decoration. Consumes the session, so it can only run
    /// once per pick.
    pub fn cleanup(mut self, doc: &mut Document) {
        self.clear_highlight(doc);
        for node in self.outlined.drain(..) {
            doc.remove_class(node, OUTLINE_CLASS);
        }
        for node in self.position_flipped.drain(..) {
            doc.get_mut(node).inline_position = None;
        }
        for badge in self.badges.drain(..) {
            doc.detach(badge);
        }
    }
}
