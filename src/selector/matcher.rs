//! CSS selector matching against a [`Document`].
//!
//! Covers the subset the selector engine generates and the picker consumes:
//! `*`, `tag`, `#id`, `.class`, `[attr="value"]`, `:nth-of-type(k)`, with
//! descendant (space) and child (`>`) combinators. Anything else is a parse
//! error, surfaced as "matches nothing" at the query helpers.

use log::warn;
use thiserror::Error;

use crate::dom::{Document, NodeId};

#[derive(Debug, Error)]
#[error("invalid selector '{selector}': {reason}")]
pub struct SelectorParseError {
    pub selector: String,
    pub reason: String,
}

/// One compound selector (`tag.class[attr="v"]:nth-of-type(2)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub nth_of_type: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector: compounds right-joined by combinators.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub parts: Vec<(Option<Combinator>, Compound)>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorParseError> {
        let err = |reason: &str| SelectorParseError {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts: Vec<(Option<Combinator>, Compound)> = Vec::new();
        let mut compound = Compound::default();
        // True once the current compound has consumed at least one token;
        // a universal '*' compound is "started" while structurally empty.
        let mut cur_started = false;
        let mut pending: Option<Combinator> = None;
        let mut chars = input.trim().chars().peekable();

        macro_rules! flush {
            () => {{
                parts.push((pending.take(), std::mem::take(&mut compound)));
                cur_started = false;
            }};
        }

        while let Some(&c) = chars.peek() {
            match c {
                '*' => {
                    chars.next();
                    // universal: leave tag as None
                    cur_started = true;
                }
                '#' => {
                    chars.next();
                    let name = take_ident(&mut chars);
                    if name.is_empty() {
                        return Err(err("empty id"));
                    }
                    compound.id = Some(name);
                    cur_started = true;
                }
                '.' => {
                    chars.next();
                    let name = take_ident(&mut chars);
                    if name.is_empty() {
                        return Err(err("empty class"));
                    }
                    compound.classes.push(name);
                    cur_started = true;
                }
                '[' => {
                    chars.next();
                    let name = take_ident(&mut chars);
                    if name.is_empty() || chars.next() != Some('=') || chars.next() != Some('"') {
                        return Err(err("expected [attr=\"value\"]"));
                    }
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some(ch) => value.push(ch),
                            None => return Err(err("unterminated attribute value")),
                        }
                    }
                    if chars.next() != Some(']') {
                        return Err(err("expected ']'"));
                    }
                    compound.attrs.push((name, value));
                    cur_started = true;
                }
                ':' => {
                    chars.next();
                    let name = take_ident(&mut chars);
                    if name != "nth-of-type" || chars.next() != Some('(') {
                        return Err(err("only :nth-of-type(k) is supported"));
                    }
                    let digits = take_while(&mut chars, |ch| ch.is_ascii_digit());
                    if chars.next() != Some(')') {
                        return Err(err("expected ')'"));
                    }
                    let k: usize = digits.parse().map_err(|_| err("bad nth-of-type index"))?;
                    if k == 0 {
                        return Err(err("nth-of-type index is 1-based"));
                    }
                    compound.nth_of_type = Some(k);
                    cur_started = true;
                }
                '>' => {
                    chars.next();
                    if cur_started {
                        flush!();
                        pending = Some(Combinator::Child);
                    } else if pending == Some(Combinator::Descendant) {
                        // "a > b": the whitespace pass already flushed
                        pending = Some(Combinator::Child);
                    } else {
                        return Err(err("combinator with no left-hand side"));
                    }
                    skip_spaces(&mut chars);
                }
                ch if ch.is_whitespace() => {
                    skip_spaces(&mut chars);
                    if chars.peek().is_some() && cur_started {
                        flush!();
                        pending = Some(Combinator::Descendant);
                    }
                }
                ch if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' => {
                    let name = take_ident(&mut chars);
                    if compound.tag.is_some() {
                        return Err(err("unexpected second tag in compound"));
                    }
                    compound.tag = Some(name.to_ascii_lowercase());
                    cur_started = true;
                }
                _ => return Err(err("unexpected character")),
            }
        }

        if !cur_started {
            return Err(err(if parts.is_empty() {
                "empty selector"
            } else {
                "trailing combinator"
            }));
        }
        flush!();
        Ok(Selector { parts })
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    take_while(chars, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    pred: impl Fn(char) -> bool,
) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if pred(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn skip_spaces(chars: &mut std::iter::Peekable<std::str::Chars>) {
    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
        chars.next();
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let el = doc.get(node);
    if el.synthetic {
        return false;
    }
    if let Some(ref tag) = compound.tag {
        if &el.tag != tag {
            return false;
        }
    }
    if let Some(ref id) = compound.id {
        if el.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    for class in &compound.classes {
        if !el.has_class(class) {
            return false;
        }
    }
    for (name, value) in &compound.attrs {
        if el.attr(name) != Some(value.as_str()) {
            return false;
        }
    }
    if let Some(k) = compound.nth_of_type {
        if doc.nth_of_type_index(node) != k {
            return false;
        }
    }
    true
}

/// Right-to-left chain matching with backtracking on descendant combinators.
fn matches_chain(doc: &Document, node: NodeId, parts: &[(Option<Combinator>, Compound)]) -> bool {
    let (last_comb, last) = match parts.last() {
        Some(p) => p,
        None => return false,
    };
    if !matches_compound(doc, node, last) {
        return false;
    }
    let rest = &parts[..parts.len() - 1];
    if rest.is_empty() {
        return true;
    }
    match last_comb {
        Some(Combinator::Child) => match doc.parent(node) {
            Some(p) => matches_chain(doc, p, rest),
            None => false,
        },
        Some(Combinator::Descendant) | None => {
            let mut cur = doc.parent(node);
            while let Some(p) = cur {
                if matches_chain(doc, p, rest) {
                    return true;
                }
                cur = doc.parent(p);
            }
            false
        }
    }
}

/// Whether `node` matches the parsed selector.
pub fn matches(doc: &Document, node: NodeId, selector: &Selector) -> bool {
    matches_chain(doc, node, &selector.parts)
}

/// All matches in document order. `scope` restricts the search to the
/// descendants of a node (excluding the node itself), mirroring
/// `element.querySelectorAll`.
pub fn query_selector_all(doc: &Document, scope: Option<NodeId>, selector: &str) -> Vec<NodeId> {
    let parsed = match Selector::parse(selector) {
        Ok(p) => p,
        Err(e) => {
            warn!("{}", e);
            return Vec::new();
        }
    };
    let candidates = match scope {
        Some(s) => {
            let mut d = doc.descendants(s);
            d.retain(|n| *n != s);
            d
        }
        None => doc.all_nodes(),
    };
    candidates
        .into_iter()
        .filter(|n| matches(doc, *n, &parsed))
        .collect()
}

/// First match, if any.
pub fn query_selector(doc: &Document, scope: Option<NodeId>, selector: &str) -> Option<NodeId> {
    query_selector_all(doc, scope, selector).into_iter().next()
}

/// Number of matches for a selector, used for uniqueness checks.
pub fn count_matches(doc: &Document, selector: &str) -> usize {
    query_selector_all(doc, None, selector).len()
}
