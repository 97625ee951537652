//! Arena tree and node factory
//!
//! All nodes of one parse live in a single `Tree`. Child sequences own their
//! nodes; every other link is an index back into the arena, so dropping the
//! tree frees everything at once and no reference cycles exist.

use crate::error::{TreeError, Violation};
use crate::node::{Attributes, Doctype, ElementData, Links, Node, NodeId, NodeKind};

/// Arena holding every node of a document
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Node factory
    // ========================================================================

    fn alloc(&mut self, kind: NodeKind) -> Result<NodeId, TreeError> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(Node::new(kind));
        Ok(id)
    }

    /// Create a detached document container
    pub fn create_document(&mut self) -> Result<NodeId, TreeError> {
        self.alloc(NodeKind::Document)
    }

    /// Create a detached element with no children and no links
    ///
    /// HTML semantics are not checked; only an empty tag name is rejected.
    pub fn create_element(&mut self, name: &str, attrs: Attributes) -> Result<NodeId, TreeError> {
        if name.is_empty() {
            return Err(Violation::EmptyTagName.into());
        }
        self.alloc(NodeKind::Element(ElementData {
            name: name.to_string(),
            attrs,
        }))
    }

    /// Create a detached text leaf
    pub fn create_text(&mut self, text: &str) -> Result<NodeId, TreeError> {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Create a detached comment leaf
    pub fn create_comment(&mut self, text: &str) -> Result<NodeId, TreeError> {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    /// Create a detached doctype leaf
    pub fn create_doctype(&mut self, doctype: Doctype) -> Result<NodeId, TreeError> {
        self.alloc(NodeKind::Doctype(doctype))
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(id.slot())
            .ok_or_else(|| Violation::UnknownNode(id).into())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.slot())
            .ok_or_else(|| Violation::UnknownNode(id).into())
    }

    pub(crate) fn links_mut(&mut self, id: NodeId) -> Result<&mut Links, TreeError> {
        Ok(&mut self.node_mut(id)?.links)
    }

    /// Links of a node, or default (all unset) for unknown ids
    pub fn links(&self, id: NodeId) -> Links {
        self.get(id).map(|n| n.links).unwrap_or_default()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(Node::kind)
    }

    /// Child sequence of a node (empty for leaves and unknown ids)
    pub fn contents(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::contents).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).parent
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).previous_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).next_sibling
    }

    pub fn previous_element(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).previous_element
    }

    pub fn next_element(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).next_element
    }

    /// Iterate all node ids in allocation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter_map(NodeId::from_slot)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Walk the threaded `next_element` list starting at `start`
    pub fn document_order(&self, start: NodeId) -> DocumentOrder<'_> {
        DocumentOrder {
            tree: self,
            next: self.get(start).map(|_| start),
        }
    }

    /// Structural pre-order traversal of the subtree rooted at `start`
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        let stack = match self.get(start) {
            Some(_) => vec![start],
            None => Vec::new(),
        };
        Preorder { tree: self, stack }
    }

    /// Last node of `id`'s subtree in document order
    ///
    /// Returns `id` itself when it has no children, otherwise descends along
    /// the last child until reaching a childless node.
    pub fn last_descendant(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(&last) = self.contents(current).last() {
            current = last;
        }
        current
    }

    /// Check every link in the subtree rooted at `root` against its structure
    ///
    /// `root`'s own parent, sibling and `previous_element` links are not
    /// inspected. The subtree must end the document: its last node may not
    /// have a `next_element`.
    pub fn verify_links(&self, root: NodeId) -> Result<(), TreeError> {
        fn broken(node: NodeId, link: &'static str) -> Result<(), TreeError> {
            Err(TreeError::BrokenLink { node, link })
        }

        let mut expected_prev: Option<NodeId> = None;

        for id in self.preorder(root) {
            let links = self.links(id);
            if id != root && links.previous_element != expected_prev {
                return broken(id, "previous_element");
            }
            if let Some(prev) = expected_prev {
                if self.next_element(prev) != Some(id) {
                    return broken(prev, "next_element");
                }
            }

            let contents = self.contents(id);
            for (i, &child) in contents.iter().enumerate() {
                let child_links = self.links(child);
                if child_links.parent != Some(id) {
                    return broken(child, "parent");
                }
                let prev = i.checked_sub(1).map(|p| contents[p]);
                if child_links.previous_sibling != prev {
                    return broken(child, "previous_sibling");
                }
                if child_links.next_sibling != contents.get(i + 1).copied() {
                    return broken(child, "next_sibling");
                }
            }
            expected_prev = Some(id);
        }

        match expected_prev {
            Some(last) if self.next_element(last).is_some() => broken(last, "next_element"),
            _ => Ok(()),
        }
    }
}

/// Id for the node stored at slot `len`
fn next_id(len: usize) -> Result<NodeId, TreeError> {
    NodeId::from_slot(len).ok_or(TreeError::ArenaFull { limit: len })
}

/// Iterator over the threaded document-order list
pub struct DocumentOrder<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for DocumentOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_element(current);
        Some(current)
    }
}

/// Iterator over a structural pre-order walk
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.contents(current).iter().rev().copied());
        Some(current)
    }
}
