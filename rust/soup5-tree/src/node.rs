//! Node records
//!
//! This module defines the node identifier, the node payload variants and the
//! link fields every node carries for structural and document-order traversal.

use std::fmt;
use std::num::NonZeroU32;

/// Node identifier (1-indexed, 0 = none on the FFI boundary)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Build an id from a zero-based arena slot, `None` past the id range
    pub(crate) fn from_slot(slot: usize) -> Option<Self> {
        let raw = u32::try_from(slot.checked_add(1)?).ok()?;
        NonZeroU32::new(raw).map(Self)
    }

    /// Zero-based arena slot for this id
    pub(crate) fn slot(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Raw value for FFI consumers (never 0)
    pub fn to_raw(self) -> u32 {
        self.0.get()
    }

    /// Rebuild an id from its raw value; 0 means "no node"
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Document = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
    Doctype = 4,
}

/// Ordered attribute mapping
///
/// Keeps insertion order; inserting a name that already exists replaces the
/// value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

/// Element payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Attributes,
}

/// Doctype payload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl Doctype {
    /// Build a doctype, treating empty identifiers as absent
    pub fn new(name: &str, public_id: &str, system_id: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            name: name.to_string(),
            public_id: non_empty(public_id),
            system_id: non_empty(system_id),
        }
    }

    /// Render the declaration text, e.g. `<!DOCTYPE html PUBLIC ... sys>`
    pub fn declaration(&self) -> String {
        let mut out = format!("<!DOCTYPE {}", self.name);
        if let Some(public_id) = &self.public_id {
            out.push_str(" PUBLIC ");
            out.push_str(public_id);
            out.push(' ');
        }
        if let Some(system_id) = &self.system_id {
            out.push(' ');
            out.push_str(system_id);
        }
        out.push('>');
        out
    }
}

/// Node payload variants
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Document container (parent of the root element)
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(Doctype),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::Doctype(_) => NodeType::Doctype,
        }
    }

    /// Whether nodes of this kind may own children
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element(_))
    }
}

/// Non-owning links carried by every node
///
/// All fields are arena indices; ownership runs top-down through `contents`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Links {
    pub parent: Option<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub previous_element: Option<NodeId>,
    pub next_element: Option<NodeId>,
}

/// A single arena slot
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) links: Links,
    pub(crate) contents: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            links: Links::default(),
            contents: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Child sequence in append order
    pub fn contents(&self) -> &[NodeId] {
        &self.contents
    }

    /// Tag name for elements
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(el) => Some(&el.name),
            NodeKind::Doctype(dt) => Some(&dt.name),
            _ => None,
        }
    }

    /// Literal payload for text and comment leaves
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(s) | NodeKind::Comment(s) => Some(s),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attributes> {
        match &self.kind {
            NodeKind::Element(el) => Some(&el.attrs),
            _ => None,
        }
    }
}
