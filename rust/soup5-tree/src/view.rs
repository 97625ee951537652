//! Generation-specific node views
//!
//! The two tree-library generations name the same links differently. These
//! borrowed views expose a finished tree with each generation's field names
//! so consumers written against either object model can walk it directly.

use crate::node::{NodeId, NodeKind, NodeType};
use crate::tree::Tree;

/// 4.x field layout: `previous_element`/`next_element`, ordered `attrs`
pub mod modern {
    use super::*;
    use crate::node::Attributes;

    /// Borrowed node with 4.x accessor names
    #[derive(Clone, Copy, Debug)]
    pub struct NodeRef<'a> {
        tree: &'a Tree,
        id: NodeId,
    }

    impl<'a> NodeRef<'a> {
        /// View `id`, or `None` if it is not in `tree`
        pub fn new(tree: &'a Tree, id: NodeId) -> Option<Self> {
            tree.get(id).map(|_| Self { tree, id })
        }

        fn wrap(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
            id.and_then(|id| NodeRef::new(self.tree, id))
        }

        pub fn id(&self) -> NodeId {
            self.id
        }

        pub fn node_type(&self) -> NodeType {
            self.tree
                .kind(self.id)
                .map(NodeKind::node_type)
                .unwrap_or(NodeType::Document)
        }

        pub fn name(&self) -> Option<&'a str> {
            self.tree.get(self.id).and_then(|n| n.name())
        }

        /// Text or comment payload
        pub fn string(&self) -> Option<&'a str> {
            self.tree.get(self.id).and_then(|n| n.text())
        }

        pub fn attrs(&self) -> Option<&'a Attributes> {
            self.tree.get(self.id).and_then(|n| n.attrs())
        }

        pub fn parent(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.parent(self.id))
        }

        pub fn contents(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
            let tree = self.tree;
            tree.contents(self.id).iter().map(move |&id| NodeRef { tree, id })
        }

        pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.previous_sibling(self.id))
        }

        pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.next_sibling(self.id))
        }

        pub fn previous_element(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.previous_element(self.id))
        }

        pub fn next_element(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.next_element(self.id))
        }

        /// Every node after this one in document order
        pub fn next_elements(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
            let tree = self.tree;
            tree.document_order(self.id)
                .skip(1)
                .map(move |id| NodeRef { tree, id })
        }
    }
}

/// 3.x field layout: `previous`/`next`, attribute pairs plus `attr_map`
pub mod legacy {
    use std::collections::HashMap;

    use super::*;

    /// Borrowed node with 3.x accessor names
    #[derive(Clone, Copy, Debug)]
    pub struct NodeRef<'a> {
        tree: &'a Tree,
        id: NodeId,
    }

    impl<'a> NodeRef<'a> {
        /// View `id`, or `None` if it is not in `tree`
        pub fn new(tree: &'a Tree, id: NodeId) -> Option<Self> {
            tree.get(id).map(|_| Self { tree, id })
        }

        fn wrap(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
            id.and_then(|id| NodeRef::new(self.tree, id))
        }

        pub fn id(&self) -> NodeId {
            self.id
        }

        pub fn name(&self) -> Option<&'a str> {
            self.tree.get(self.id).and_then(|n| n.name())
        }

        pub fn string(&self) -> Option<&'a str> {
            self.tree.get(self.id).and_then(|n| n.text())
        }

        pub fn is_tag(&self) -> bool {
            matches!(self.tree.kind(self.id), Some(NodeKind::Element(_)))
        }

        /// Attributes as `(name, value)` pairs in source order
        pub fn attrs(&self) -> Vec<(&'a str, &'a str)> {
            self.tree
                .get(self.id)
                .and_then(|n| n.attrs())
                .map(|attrs| attrs.iter().collect())
                .unwrap_or_default()
        }

        /// Attribute lookup map
        pub fn attr_map(&self) -> HashMap<&'a str, &'a str> {
            self.attrs().into_iter().collect()
        }

        pub fn parent(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.parent(self.id))
        }

        pub fn contents(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
            let tree = self.tree;
            tree.contents(self.id).iter().map(move |&id| NodeRef { tree, id })
        }

        pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.previous_sibling(self.id))
        }

        pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.next_sibling(self.id))
        }

        /// Previous node in document order
        pub fn previous(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.previous_element(self.id))
        }

        /// Next node in document order
        pub fn next(&self) -> Option<NodeRef<'a>> {
            self.wrap(self.tree.next_element(self.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attributes;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let attrs: Attributes = [("href", "/x"), ("title", "t")].into_iter().collect();
        let a = tree.create_element("a", attrs).unwrap();
        let text = tree.create_text("link").unwrap();
        tree.append(a, text).unwrap();
        let b = tree.create_element("b", Attributes::new()).unwrap();
        tree.append(a, b).unwrap();
        (tree, a, text, b)
    }

    #[test]
    fn test_modern_view_names() {
        let (tree, a, text, b) = sample();
        let view = modern::NodeRef::new(&tree, b).unwrap();
        assert_eq!(view.previous_element().map(|n| n.id()), Some(text));
        assert_eq!(view.previous_sibling().map(|n| n.id()), Some(text));
        assert_eq!(view.parent().map(|n| n.id()), Some(a));
        assert!(view.next_element().is_none());

        let root = modern::NodeRef::new(&tree, a).unwrap();
        assert_eq!(root.node_type(), NodeType::Element);
        assert_eq!(root.attrs().and_then(|at| at.get("title")), Some("t"));
        let order: Vec<_> = root.next_elements().map(|n| n.id()).collect();
        assert_eq!(order, vec![text, b]);
        assert_eq!(root.contents().next().and_then(|n| n.string()), Some("link"));
    }

    #[test]
    fn test_legacy_view_names() {
        let (tree, a, text, b) = sample();
        let view = legacy::NodeRef::new(&tree, text).unwrap();
        assert!(!view.is_tag());
        assert_eq!(view.previous().map(|n| n.id()), Some(a));
        assert_eq!(view.next().map(|n| n.id()), Some(b));

        let root = legacy::NodeRef::new(&tree, a).unwrap();
        assert_eq!(root.attrs(), vec![("href", "/x"), ("title", "t")]);
        assert_eq!(root.attr_map().get("href"), Some(&"/x"));
        assert_eq!(root.contents().count(), 2);
    }

    #[test]
    fn test_view_of_unknown_node() {
        let tree = Tree::new();
        let ghost = NodeId::from_raw(3).unwrap();
        assert!(modern::NodeRef::new(&tree, ghost).is_none());
        assert!(legacy::NodeRef::new(&tree, ghost).is_none());
    }
}
