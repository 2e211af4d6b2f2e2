//! Action recorder: turns live page interaction into an ordered step list.
//!
//! State machine `Idle → Recording ⇄ Paused → Idle`. Pausing detaches event
//! handling without clearing accumulated steps; pending debounce entries are
//! dropped on pause/stop, never flushed. Every committed step is published
//! synchronously on the recorder's event channel.

use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use tokio::sync::broadcast;
use url::Url;

use crate::config::CaptureConfig;
use crate::dom::{Document, NodeId, PageEvent};
use crate::events::EventEmitter;
use crate::picker::overlay::TOOLING_UI_CLASS;
use crate::schema::{ActionStep, ScrollDirection};
use crate::selector::{element_label, generate_selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

/// Events published by a running recorder.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// A step was committed at `index`.
    Step { step: ActionStep, index: usize },
    /// The session stopped; carries the full step list.
    Finished { steps: Vec<ActionStep> },
}

#[derive(Debug)]
struct PendingType {
    selector: String,
    label: String,
    value: String,
    deadline_ms: u64,
}

#[derive(Debug)]
struct PendingScroll {
    y: i32,
    deadline_ms: u64,
}

pub struct ActionRecorder {
    config: CaptureConfig,
    state: RecorderState,
    steps: Vec<ActionStep>,
    emitter: EventEmitter<RecorderEvent>,
    /// Debounced text edits, one slot per target element.
    pending_types: HashMap<NodeId, PendingType>,
    pending_scroll: Option<PendingScroll>,
    /// Last committed scroll position; deltas are measured against this.
    scroll_baseline: i32,
}

impl ActionRecorder {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            state: RecorderState::Idle,
            steps: Vec::new(),
            emitter: EventEmitter::new(),
            pending_types: HashMap::new(),
            pending_scroll: None,
            scroll_baseline: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.emitter.subscribe()
    }

    /// Begin a session: emits the initial `navigate` step for the current
    /// page and resets the scroll baseline.
    pub fn start(&mut self, doc: &Document) -> Result<()> {
        if self.state != RecorderState::Idle {
            anyhow::bail!("recorder already running");
        }

        // Parse before touching any state so a bad URL leaves the
        // recorder Idle and restartable.
        let parsed = Url::parse(&doc.url)?;
        let url = format!("{}{}", parsed.origin().ascii_serialization(), parsed.path());
        let url_params: HashMap<String, String> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        self.steps.clear();
        self.pending_types.clear();
        self.pending_scroll = None;
        self.scroll_baseline = doc.scroll_y;
        self.state = RecorderState::Recording;

        self.commit(ActionStep::Navigate {
            url,
            url_params: if url_params.is_empty() {
                None
            } else {
                Some(url_params)
            },
            label: Some("Open page".to_string()),
            continue_on_error: false,
        });
        Ok(())
    }

    /// Detach capture without resetting accumulated steps. Pending debounce
    /// entries are dropped, not flushed.
    pub fn pause(&mut self) {
        if self.state == RecorderState::Recording {
            self.pending_types.clear();
            self.pending_scroll = None;
            self.state = RecorderState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RecorderState::Paused {
            self.state = RecorderState::Recording;
        }
    }

    /// Stop the session and return a defensive copy of the step list.
    /// Uncommitted debounced edits are dropped.
    pub fn stop(&mut self) -> Vec<ActionStep> {
        let steps = self.steps.clone();
        if self.state == RecorderState::Idle {
            return steps;
        }
        self.pending_types.clear();
        self.pending_scroll = None;
        self.state = RecorderState::Idle;
        self.emitter.emit(RecorderEvent::Finished {
            steps: steps.clone(),
        });
        steps
    }

    /// Non-live copy of the steps committed so far.
    pub fn steps(&self) -> Vec<ActionStep> {
        self.steps.clone()
    }

    /// Delete a step by index; only meaningful before the session output is
    /// finalized into a tool definition.
    pub fn remove_step(&mut self, index: usize) -> Option<ActionStep> {
        if index < self.steps.len() {
            Some(self.steps.remove(index))
        } else {
            None
        }
    }

    /// Commit debounce entries whose window has elapsed. The host calls
    /// this from its timer; `handle_event` also runs it first so ordering
    /// is preserved.
    pub fn tick(&mut self, now_ms: u64) {
        if self.state == RecorderState::Recording {
            self.flush_due(now_ms);
        }
    }

    /// Feed one page event into the recorder.
    pub fn handle_event(&mut self, doc: &Document, event: PageEvent) {
        if self.state != RecorderState::Recording {
            return;
        }
        self.flush_due(event.at_ms());

        match event {
            PageEvent::Click { target, at_ms: _ } => self.on_click(doc, target),
            PageEvent::Input {
                target,
                value,
                at_ms,
            } => self.on_edit(doc, target, value, at_ms),
            PageEvent::Change {
                target,
                value,
                at_ms,
            } => {
                if doc.get(target).tag == "select" {
                    // Select changes bypass debouncing
                    let selector = generate_selector(doc, target);
                    let label = element_label(doc, target);
                    self.commit(ActionStep::Select {
                        selector,
                        value,
                        label: Some(label),
                        continue_on_error: false,
                    });
                } else {
                    self.on_edit(doc, target, value, at_ms);
                }
            }
            PageEvent::Scroll { y, at_ms } => {
                self.pending_scroll = Some(PendingScroll {
                    y,
                    deadline_ms: at_ms + self.config.scroll_debounce_ms,
                });
            }
            PageEvent::BeforeUnload { .. } => {
                // The next session's start() captures the destination.
            }
        }
    }

    fn on_click(&mut self, doc: &Document, target: NodeId) {
        if doc.in_subtree_with_class(target, TOOLING_UI_CLASS) {
            debug!("ignoring click inside tooling UI");
            return;
        }
        if doc.get(target).tag == "select" {
            // Handled via the change event instead.
            return;
        }
        let selector = generate_selector(doc, target);
        let label = element_label(doc, target);
        self.commit(ActionStep::Click {
            selector,
            label: Some(format!("Click {}", label)),
            continue_on_error: false,
        });
    }

    fn on_edit(&mut self, doc: &Document, target: NodeId, value: String, at_ms: u64) {
        let tag = doc.get(target).tag.clone();
        if tag != "input" && tag != "textarea" {
            return;
        }
        let selector = generate_selector(doc, target);
        let label = element_label(doc, target);
        // A newer edit to the same element replaces the queued step.
        self.pending_types.insert(
            target,
            PendingType {
                selector,
                label,
                value,
                deadline_ms: at_ms + self.config.input_debounce_ms,
            },
        );
    }

    fn flush_due(&mut self, now_ms: u64) {
        let mut due: Vec<(NodeId, u64)> = self
            .pending_types
            .iter()
            .filter(|(_, p)| p.deadline_ms <= now_ms)
            .map(|(id, p)| (*id, p.deadline_ms))
            .collect();
        due.sort_by_key(|(_, deadline)| *deadline);
        for (id, _) in due {
            if let Some(pending) = self.pending_types.remove(&id) {
                self.commit(ActionStep::Type {
                    selector: pending.selector,
                    text: pending.value,
                    label: Some(format!("Type into {}", pending.label)),
                    continue_on_error: false,
                });
            }
        }

        if let Some(pending) = &self.pending_scroll {
            if pending.deadline_ms <= now_ms {
                let y = pending.y;
                self.pending_scroll = None;
                let delta = y - self.scroll_baseline;
                if delta.unsigned_abs() < self.config.scroll_noise_px {
                    debug!("discarding {}px scroll as noise", delta);
                } else {
                    let direction = if delta > 0 {
                        ScrollDirection::Down
                    } else {
                        ScrollDirection::Up
                    };
                    self.scroll_baseline = y;
                    self.commit(ActionStep::Scroll {
                        direction,
                        amount: delta.unsigned_abs(),
                        label: None,
                        continue_on_error: false,
                    });
                }
            }
        }
    }

    fn commit(&mut self, step: ActionStep) {
        let index = self.steps.len();
        debug!("committed step {}: {}", index, step.action_name());
        self.steps.push(step.clone());
        self.emitter.emit(RecorderEvent::Step { step, index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_snapshot;
    use crate::selector::query_selector;

    fn form_page() -> Document {
        parse_snapshot(
            r#"<html><body>
                <input id="q" type="text" placeholder="Search"/>
                <select id="lang"><option>en</option><option>fr</option></select>
                <button id="go">Go</button>
            </body></html>"#,
            "https://example.com/search?tab=web&safe=on",
        )
        .unwrap()
    }

    fn recorder() -> ActionRecorder {
        ActionRecorder::new(CaptureConfig::default())
    }

    #[test]
    fn test_start_emits_navigate_with_url_params() {
        let doc = form_page();
        let mut rec = recorder();
        rec.start(&doc).unwrap();

        let steps = rec.steps();
        assert_eq!(steps.len(), 1);
        match &steps[0] {
            ActionStep::Navigate { url, url_params, .. } => {
                assert_eq!(url, "https://example.com/search");
                let params = url_params.as_ref().unwrap();
                assert_eq!(params.get("tab").map(String::as_str), Some("web"));
                assert_eq!(params.get("safe").map(String::as_str), Some("on"));
            }
            other => panic!("expected navigate, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_url_leaves_recorder_restartable() {
        let bad = parse_snapshot(r#"<html><body/></html>"#, "not a url").unwrap();
        let mut rec = recorder();
        assert!(rec.start(&bad).is_err());
        assert_eq!(rec.state(), RecorderState::Idle);
        assert!(rec.steps().is_empty());

        let good = form_page();
        rec.start(&good).unwrap();
        assert_eq!(rec.state(), RecorderState::Recording);
        assert_eq!(rec.steps().len(), 1);
    }

    #[test]
    fn test_edit_burst_yields_single_type_step() {
        let doc = form_page();
        let input = query_selector(&doc, None, "#q").unwrap();
        let mut rec = recorder();
        rec.start(&doc).unwrap();

        for (value, at) in [("a", 0), ("ab", 100), ("abc", 200)] {
            rec.handle_event(
                &doc,
                PageEvent::Input {
                    target: input,
                    value: value.to_string(),
                    at_ms: at,
                },
            );
        }
        rec.tick(800);

        let steps = rec.steps();
        assert_eq!(steps.len(), 2); // navigate + type
        match &steps[1] {
            ActionStep::Type { text, selector, .. } => {
                assert_eq!(text, "abc");
                assert_eq!(selector, "#q");
            }
            other => panic!("expected type, got {:?}", other),
        }
    }

    #[test]
    fn test_pending_edit_dropped_on_stop() {
        let doc = form_page();
        let input = query_selector(&doc, None, "#q").unwrap();
        let mut rec = recorder();
        rec.start(&doc).unwrap();
        rec.handle_event(
            &doc,
            PageEvent::Input {
                target: input,
                value: "abc".to_string(),
                at_ms: 0,
            },
        );
        let steps = rec.stop();
        assert_eq!(steps.len(), 1); // navigate only; pending edit dropped
    }

    #[test]
    fn test_scroll_noise_threshold() {
        let doc = form_page();
        let mut rec = recorder();
        rec.start(&doc).unwrap();

        rec.handle_event(&doc, PageEvent::Scroll { y: 30, at_ms: 0 });
        rec.tick(1000);
        assert_eq!(rec.steps().len(), 1); // 30px discarded

        rec.handle_event(&doc, PageEvent::Scroll { y: 80, at_ms: 2000 });
        rec.tick(3000);
        let steps = rec.steps();
        assert_eq!(steps.len(), 2);
        match &steps[1] {
            ActionStep::Scroll {
                direction, amount, ..
            } => {
                assert_eq!(*direction, ScrollDirection::Down);
                assert_eq!(*amount, 80);
            }
            other => panic!("expected scroll, got {:?}", other),
        }

        // Baseline rebased to 80: a move back to 60 is noise again.
        rec.handle_event(&doc, PageEvent::Scroll { y: 60, at_ms: 4000 });
        rec.tick(5000);
        assert_eq!(rec.steps().len(), 2);
    }

    #[test]
    fn test_select_change_bypasses_debounce() {
        let doc = form_page();
        let select = query_selector(&doc, None, "#lang").unwrap();
        let mut rec = recorder();
        rec.start(&doc).unwrap();

        rec.handle_event(&doc, PageEvent::Click { target: select, at_ms: 0 });
        assert_eq!(rec.steps().len(), 1); // click on <select> suppressed

        rec.handle_event(
            &doc,
            PageEvent::Change {
                target: select,
                value: "fr".to_string(),
                at_ms: 10,
            },
        );
        let steps = rec.steps();
        assert_eq!(steps.len(), 2); // committed immediately
        match &steps[1] {
            ActionStep::Select { value, .. } => assert_eq!(value, "fr"),
            other => panic!("expected select, got {:?}", other),
        }
    }

    #[test]
    fn test_pause_drops_pending_and_detaches() {
        let doc = form_page();
        let input = query_selector(&doc, None, "#q").unwrap();
        let button = query_selector(&doc, None, "#go").unwrap();
        let mut rec = recorder();
        rec.start(&doc).unwrap();

        rec.handle_event(
            &doc,
            PageEvent::Input {
                target: input,
                value: "abc".to_string(),
                at_ms: 0,
            },
        );
        rec.pause();
        rec.handle_event(&doc, PageEvent::Click { target: button, at_ms: 100 });
        rec.tick(1000);
        assert_eq!(rec.steps().len(), 1); // nothing captured while paused

        rec.resume();
        rec.handle_event(&doc, PageEvent::Click { target: button, at_ms: 2000 });
        assert_eq!(rec.steps().len(), 2);
    }

    #[test]
    fn test_beforeunload_emits_nothing() {
        let doc = form_page();
        let mut rec = recorder();
        rec.start(&doc).unwrap();
        rec.handle_event(&doc, PageEvent::BeforeUnload { at_ms: 0 });
        assert_eq!(rec.steps().len(), 1);
    }

    #[test]
    fn test_step_events_delivered_synchronously() {
        let doc = form_page();
        let button = query_selector(&doc, None, "#go").unwrap();
        let mut rec = recorder();
        let mut rx = rec.subscribe();
        rec.start(&doc).unwrap();
        rec.handle_event(&doc, PageEvent::Click { target: button, at_ms: 0 });

        match rx.try_recv().unwrap() {
            RecorderEvent::Step { index, .. } => assert_eq!(index, 0),
            other => panic!("expected step event, got {:?}", other),
        }
        match rx.try_recv().unwrap() {
            RecorderEvent::Step { step, index } => {
                assert_eq!(index, 1);
                assert_eq!(step.action_name(), "click");
            }
            other => panic!("expected step event, got {:?}", other),
        }

        let steps = rec.stop();
        match rx.try_recv().unwrap() {
            RecorderEvent::Finished { steps: finished } => assert_eq!(finished, steps),
            other => panic!("expected finished event, got {:?}", other),
        }
    }
}
