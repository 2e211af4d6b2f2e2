//! Interactive element picking.
//!
//! Drives the pick flow for both extraction modes: list mode detects
//! repeating groups up front and finalizes on the first group selection;
//! single mode takes a container click followed by any number of field
//! clicks and a done call. Every exit path (completed or cancelled) tears
//! the overlay down exactly once and publishes exactly one event.

use std::collections::HashMap;

use anyhow::{bail, Result};
use log::debug;
use serde_json::Value;

use crate::config::CaptureConfig;
use crate::dom::{Document, NodeId};
use crate::events::EventEmitter;
use crate::picker::detect::{detect_list_groups, shared_qualifying_class, CandidateGroup};
use crate::picker::fields::{detect_fields, manual_field};
use crate::picker::overlay::{OverlaySession, TOOLING_UI_CLASS};
use crate::schema::{ActionStep, ExtractMode, ExtractionField, FieldType};
use crate::selector::{generate_selector, query_selector, query_selector_all};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    List,
    Single,
}

#[derive(Debug, Clone)]
pub enum PickerEvent {
    /// The pick produced an extract step, with a best-effort data preview
    /// re-queried from the live page.
    Completed { step: ActionStep, preview: Value },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingGroup,
    AwaitingContainer,
    PickingFields { container: NodeId },
}

pub struct ElementPicker {
    config: CaptureConfig,
    emitter: EventEmitter<PickerEvent>,
    phase: Phase,
    overlay: Option<OverlaySession>,
    groups: Vec<CandidateGroup>,
    /// Injected badge node to the index of the group it selects.
    badge_groups: HashMap<NodeId, usize>,
    fields: Vec<ExtractionField>,
}

impl ElementPicker {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            emitter: EventEmitter::new(),
            phase: Phase::Idle,
            overlay: None,
            groups: Vec::new(),
            badge_groups: HashMap::new(),
            fields: Vec::new(),
        }
    }

    pub fn emitter(&self) -> &EventEmitter<PickerEvent> {
        &self.emitter
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Begin a pick. In list mode this detects candidate groups and
    /// decorates their members with numbered badges. Returns the number of
    /// detected groups (always 0 in single mode).
    pub fn start(&mut self, doc: &mut Document, mode: PickerMode) -> Result<usize> {
        if self.is_active() {
            bail!("a pick is already in progress");
        }
        let mut overlay = OverlaySession::new();
        let detected = match mode {
            PickerMode::List => {
                self.groups = detect_list_groups(doc, &self.config);
                for (idx, group) in self.groups.iter().enumerate() {
                    let total = group.members.len();
                    for (i, member) in group.members.iter().enumerate() {
                        let badge = overlay.decorate_member(doc, *member, i, total);
                        self.badge_groups.insert(badge, idx);
                    }
                }
                self.phase = Phase::AwaitingGroup;
                self.groups.len()
            }
            PickerMode::Single => {
                self.phase = Phase::AwaitingContainer;
                0
            }
        };
        self.overlay = Some(overlay);
        Ok(detected)
    }

    pub fn hover(&mut self, doc: &mut Document, node: NodeId) {
        if !self.is_active() || doc.in_subtree_with_class(node, TOOLING_UI_CLASS) {
            return;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.highlight(doc, node);
        }
    }

    /// Route a click according to the current phase.
    pub fn click(&mut self, doc: &mut Document, target: NodeId) {
        match self.phase {
            Phase::Idle => {}
            Phase::AwaitingGroup => self.on_group_click(doc, target),
            Phase::AwaitingContainer => {
                if doc.in_subtree_with_class(target, TOOLING_UI_CLASS) {
                    return;
                }
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.clear_highlight(doc);
                    overlay.outline(doc, target);
                }
                self.phase = Phase::PickingFields { container: target };
            }
            Phase::PickingFields { container } => {
                if doc.in_subtree_with_class(target, TOOLING_UI_CLASS) {
                    return;
                }
                if target == container || !doc.ancestors(target).contains(&container) {
                    debug!("field click outside container, ignored");
                    return;
                }
                let field = manual_field(doc, container, target, &self.fields);
                debug!("picked field '{}' ({})", field.key, field.selector);
                self.fields.push(field);
            }
        }
    }

    /// Finish a single-mode pick with the fields gathered so far. A pick
    /// with no fields falls back to whole-container text.
    pub fn done(&mut self, doc: &mut Document) {
        if let Phase::PickingFields { container } = self.phase {
            let mut fields = std::mem::take(&mut self.fields);
            if fields.is_empty() {
                fields = vec![catch_all_field()];
            }
            let selector = generate_selector(doc, container);
            self.finalize(doc, ExtractMode::Single, selector, fields);
        }
    }

    /// Abort the pick. Tears down the overlay and emits `Cancelled`; a
    /// no-op when nothing is in progress.
    pub fn cancel(&mut self, doc: &mut Document) {
        if !self.is_active() {
            return;
        }
        self.reset(doc);
        self.emitter.emit(PickerEvent::Cancelled);
    }

    fn on_group_click(&mut self, doc: &mut Document, target: NodeId) {
        if let Some(idx) = self.badge_groups.get(&target).copied() {
            let group = self.groups[idx].clone();
            self.finalize_group(doc, group);
            return;
        }
        if doc.in_subtree_with_class(target, TOOLING_UI_CLASS) {
            return;
        }
        // Container click: walk up to the nearest repeating element and
        // recover its group, or assemble one from its siblings.
        let member = match doc.closest(target, |d, n| d.same_tag_sibling_count(n) >= 2) {
            Some(m) => m,
            None => {
                debug!("group click did not land on a repeating element");
                return;
            }
        };
        let group = self
            .groups
            .iter()
            .find(|g| g.members.contains(&member))
            .cloned()
            .unwrap_or_else(|| ad_hoc_group(doc, member));
        self.finalize_group(doc, group);
    }

    fn finalize_group(&mut self, doc: &mut Document, group: CandidateGroup) {
        let representative = group.members[0];
        let mut fields = detect_fields(doc, representative);
        if fields.is_empty() {
            fields = vec![catch_all_field()];
        }
        let selector = group_selector(doc, &group);
        self.finalize(doc, ExtractMode::List, selector, fields);
    }

    fn finalize(
        &mut self,
        doc: &mut Document,
        mode: ExtractMode,
        container_selector: String,
        fields: Vec<ExtractionField>,
    ) {
        // Overlay comes down before the count and preview so both reflect
        // the page as the tool will see it.
        self.reset(doc);

        let item_count = match mode {
            ExtractMode::List => {
                Some(query_selector_all(doc, None, &container_selector).len() as u32)
            }
            ExtractMode::Single => None,
        };
        let label = match mode {
            ExtractMode::List => Some(format!(
                "Extract {} items",
                item_count.unwrap_or_default()
            )),
            ExtractMode::Single => Some(format!("Extract {} fields", fields.len())),
        };
        let preview = build_preview(doc, &container_selector, &fields, mode, self.config.preview_items);
        let step = ActionStep::Extract {
            mode,
            container_selector,
            fields,
            item_count,
            label,
            continue_on_error: false,
        };
        self.emitter.emit(PickerEvent::Completed { step, preview });
    }

    fn reset(&mut self, doc: &mut Document) {
        if let Some(overlay) = self.overlay.take() {
            overlay.cleanup(doc);
        }
        self.phase = Phase::Idle;
        self.groups.clear();
        self.badge_groups.clear();
        self.fields.clear();
    }
}

fn catch_all_field() -> ExtractionField {
    ExtractionField {
        key: "text".to_string(),
        selector: "*".to_string(),
        field_type: FieldType::Text,
        attribute: None,
    }
}

/// Selector matching every member of the group.
fn group_selector(doc: &Document, group: &CandidateGroup) -> String {
    match &group.shared_class {
        Some(class) => format!("{}.{}", group.tag, class),
        None => format!("{} > {}", generate_selector(doc, group.parent), group.tag),
    }
}

fn ad_hoc_group(doc: &Document, member: NodeId) -> CandidateGroup {
    let parent = doc.parent(member).unwrap_or(member);
    let tag = doc.get(member).tag.clone();
    let members: Vec<NodeId> = doc
        .element_children(parent)
        .into_iter()
        .filter(|n| doc.get(*n).tag == tag)
        .collect();
    let shared_class = shared_qualifying_class(doc, &members);
    CandidateGroup {
        parent,
        tag,
        shared_class,
        members,
    }
}

/// Re-query the page and materialize the first few items the step would
/// extract. Fields whose selector no longer matches come back as null.
fn build_preview(
    doc: &Document,
    container_selector: &str,
    fields: &[ExtractionField],
    mode: ExtractMode,
    limit: usize,
) -> Value {
    let containers = query_selector_all(doc, None, container_selector);
    match mode {
        ExtractMode::List => Value::Array(
            containers
                .into_iter()
                .take(limit)
                .map(|c| preview_item(doc, c, fields))
                .collect(),
        ),
        ExtractMode::Single => containers
            .first()
            .map(|c| preview_item(doc, *c, fields))
            .unwrap_or(Value::Null),
    }
}

fn preview_item(doc: &Document, container: NodeId, fields: &[ExtractionField]) -> Value {
    let mut map = serde_json::Map::new();
    for field in fields {
        let value = query_selector(doc, Some(container), &field.selector)
            .and_then(|n| field_value(doc, n, field))
            .unwrap_or(Value::Null);
        map.insert(field.key.clone(), value);
    }
    Value::Object(map)
}

fn field_value(doc: &Document, node: NodeId, field: &ExtractionField) -> Option<Value> {
    match field.field_type {
        FieldType::Text | FieldType::Html => Some(Value::String(doc.deep_text(node))),
        FieldType::Value => Some(Value::String(
            doc.get(node).attr("value").unwrap_or_default().to_string(),
        )),
        FieldType::Attribute => field
            .attribute
            .as_deref()
            .and_then(|a| doc.get(node).attr(a))
            .map(|v| Value::String(v.to_string())),
    }
}
