//! Repeating-structure detection for list mode.
//!
//! Scans the page for parents whose children repeat (same tag, usually a
//! shared class) and surfaces each repetition as a candidate group the
//! user can pick with one click.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::config::CaptureConfig;
use crate::dom::{Document, NodeId};
use crate::selector::is_qualifying_class;

/// One detected repetition: a parent and its repeating same-tag children.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    pub parent: NodeId,
    pub tag: String,
    /// Class carried by every member, if one qualifies.
    pub shared_class: Option<String>,
    pub members: Vec<NodeId>,
}

impl CandidateGroup {
    /// Key used to collapse visually duplicate repetitions.
    fn dedup_key(&self, doc: &Document) -> String {
        match &self.shared_class {
            Some(class) => format!("{}.{}", self.tag, class),
            None => format!("{}>{}", doc.get(self.parent).tag, self.tag),
        }
    }
}

/// Scan the body subtree for candidate groups, document order. Each parent
/// is visited once; duplicate repetitions (same tag + shared class, or same
/// parent shape) collapse to the first occurrence.
pub fn detect_list_groups(doc: &Document, config: &CaptureConfig) -> Vec<CandidateGroup> {
    let body = match doc.body() {
        Some(b) => b,
        None => return Vec::new(),
    };

    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    for parent in doc.descendants(body) {
        if parent == body {
            continue;
        }
        let children = doc.element_children(parent);
        if children.len() < config.min_group_size {
            continue;
        }

        // Bucket children by tag, preserving document order per bucket.
        let mut by_tag: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut tag_order: Vec<String> = Vec::new();
        for child in children {
            let tag = doc.get(child).tag.clone();
            if !by_tag.contains_key(&tag) {
                tag_order.push(tag.clone());
            }
            by_tag.entry(tag).or_default().push(child);
        }

        for tag in tag_order {
            let members = &by_tag[&tag];
            if members.len() < config.min_group_size {
                continue;
            }

            let shared_class = shared_qualifying_class(doc, members);
            if shared_class.is_none() && members.len() < config.loose_group_min {
                continue;
            }

            let members: Vec<NodeId> = members
                .iter()
                .copied()
                .filter(|m| {
                    let rect = doc.get(*m).rect;
                    rect.width() >= config.min_item_width
                        && rect.height() >= config.min_item_height
                })
                .collect();
            if members.is_empty() {
                continue;
            }

            let group = CandidateGroup {
                parent,
                tag,
                shared_class,
                members,
            };
            if !seen_keys.insert(group.dedup_key(doc)) {
                continue;
            }
            debug!(
                "list candidate: {} ({} members)",
                group.dedup_key(doc),
                group.members.len()
            );
            groups.push(group);
        }
    }

    groups
}

/// First class present on every member, skipping utility/short classes.
pub(crate) fn shared_qualifying_class(doc: &Document, members: &[NodeId]) -> Option<String> {
    let first = doc.get(members[0]);
    first
        .classes
        .iter()
        .find(|class| {
            is_qualifying_class(class)
                && members[1..].iter().all(|m| doc.get(*m).has_class(class))
        })
        .cloned()
}
