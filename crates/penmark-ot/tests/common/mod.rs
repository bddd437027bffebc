//! Reference document tree for exercising the OT properties.
//!
//! The real tree store lives outside the engine; this miniature one
//! exists so convergence and compose-equivalence can be asserted against
//! actual document states. Marks are stored per character, keyed by mark
//! kind, so two documents compare equal exactly when they would render
//! the same.

#![allow(dead_code)]

use std::collections::BTreeMap;

use penmark_ot::types::{Operation, Path};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    pub ch: char,
    pub marks: BTreeMap<String, Option<String>>,
}

impl TextChar {
    fn plain(ch: char) -> Self {
        Self {
            ch,
            marks: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element {
        properties: BTreeMap<String, Value>,
        children: Vec<Node>,
    },
    Text {
        chars: Vec<TextChar>,
    },
}

impl Node {
    pub fn text(s: &str) -> Node {
        Node::Text {
            chars: s.chars().map(TextChar::plain).collect(),
        }
    }

    pub fn element(children: Vec<Node>) -> Node {
        Node::Element {
            properties: BTreeMap::new(),
            children,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text { chars } => chars.iter().map(|c| c.ch).collect(),
            Node::Element { .. } => panic!("not a text node"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    pub children: Vec<Node>,
}

impl Doc {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    fn node_mut(&mut self, path: &Path) -> &mut Node {
        fn descend<'a>(children: &'a mut Vec<Node>, path: &[usize]) -> &'a mut Node {
            let (&step, rest) = path.split_first().expect("empty path does not address a node");
            let node = &mut children[step];
            if rest.is_empty() {
                return node;
            }
            match node {
                Node::Element { children, .. } => descend(children, rest),
                Node::Text { .. } => panic!("path descends through a text node"),
            }
        }
        descend(&mut self.children, path)
    }

    fn children_mut(&mut self, parent: &Path) -> &mut Vec<Node> {
        if parent.is_empty() {
            return &mut self.children;
        }
        match self.node_mut(parent) {
            Node::Element { children, .. } => children,
            Node::Text { .. } => panic!("parent path addresses a text node"),
        }
    }

    pub fn text_at(&self, path: &Path) -> String {
        let mut doc = self.clone();
        doc.node_mut(path).text_content()
    }
}

fn node_from_json(v: &Value) -> Node {
    if let Some(s) = v.get("text").and_then(Value::as_str) {
        return Node::text(s);
    }
    let children = v
        .get("children")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(node_from_json).collect())
        .unwrap_or_default();
    let mut properties = BTreeMap::new();
    if let Some(obj) = v.as_object() {
        for (k, val) in obj {
            if k != "children" && k != "text" {
                properties.insert(k.clone(), val.clone());
            }
        }
    }
    Node::Element {
        properties,
        children,
    }
}

/// Apply one operation, returning the new document.
pub fn apply(doc: &Doc, op: &Operation) -> Doc {
    let mut doc = doc.clone();
    match op {
        Operation::InsertText { path, offset, text } => {
            let Node::Text { chars } = doc.node_mut(path) else {
                panic!("insert_text on a non-text node");
            };
            for (i, ch) in text.chars().enumerate() {
                chars.insert(offset + i, TextChar::plain(ch));
            }
        }
        Operation::DeleteText {
            path,
            offset,
            count,
            ..
        } => {
            let Node::Text { chars } = doc.node_mut(path) else {
                panic!("delete_text on a non-text node");
            };
            chars.drain(*offset..*offset + *count);
        }
        Operation::ApplyMark { path, mark, range } => {
            let Node::Text { chars } = doc.node_mut(path) else {
                panic!("apply_mark on a non-text node");
            };
            let end = range.end.min(chars.len());
            for c in chars[range.start.min(end)..end].iter_mut() {
                c.marks.insert(mark.kind.clone(), mark.value.clone());
            }
        }
        Operation::RemoveMark { path, mark, range } => {
            let Node::Text { chars } = doc.node_mut(path) else {
                panic!("remove_mark on a non-text node");
            };
            let end = range.end.min(chars.len());
            for c in chars[range.start.min(end)..end].iter_mut() {
                c.marks.remove(&mark.kind);
            }
        }
        Operation::InsertNode { path, index, node } => {
            let children = doc.children_mut(path);
            children.insert(*index, node_from_json(node));
        }
        Operation::RemoveNode { path, index, .. } => {
            let children = doc.children_mut(path);
            children.remove(*index);
        }
        Operation::SetNode {
            path, properties, ..
        } => {
            let Node::Element {
                properties: props, ..
            } = doc.node_mut(path)
            else {
                panic!("set_node on a text node");
            };
            for (k, v) in properties {
                if v.is_null() {
                    props.remove(k);
                } else {
                    props.insert(k.clone(), v.clone());
                }
            }
        }
        Operation::MoveNode {
            path,
            index,
            new_path,
            new_index,
        } => {
            let node = doc.children_mut(path).remove(*index);
            doc.children_mut(new_path).insert(*new_index, node);
        }
        Operation::SplitNode { .. } | Operation::MergeNodes { .. } => {
            panic!("structural split/merge is not modeled by the reference tree");
        }
    }
    doc
}

/// Apply a sequence of operations left to right.
pub fn apply_all(doc: &Doc, ops: &[Operation]) -> Doc {
    ops.iter().fold(doc.clone(), |d, op| apply(&d, op))
}

/// Deterministic pseudo-random generator for the seeded tests.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub fn range(&mut self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.next_u64() % n
        }
    }

    /// Random value in `[lo, hi)`.
    pub fn between(&mut self, lo: usize, hi: usize) -> usize {
        lo + self.range((hi - lo) as u64) as usize
    }

    pub fn word(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| (b'a' + self.range(26) as u8) as char)
            .collect()
    }
}
