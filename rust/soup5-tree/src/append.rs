//! Append adapter
//!
//! Inserts a node as the last child of a parent while keeping the sibling
//! chain and the threaded document-order list consistent in one step.

use log::trace;

use crate::error::{TreeError, Violation};
use crate::node::{NodeId, NodeKind};
use crate::tree::Tree;

impl Tree {
    /// Append `child` as the last child of `parent`
    ///
    /// `child` must be detached. Only `parent`, its previous last child, that
    /// child's last descendant and `child` itself are modified. The cost is
    /// constant except for the walk down the previous sibling's right spine.
    ///
    /// Appending a node that already owns a subtree (the finished root being
    /// attached to its document) keeps the subtree's internal threading: the
    /// node's `next_element` is reset to its first child rather than cleared.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_append(parent, child)?;

        let prev = self.node(parent)?.contents.last().copied();
        let previous_element = match prev {
            None => parent,
            Some(prev) => {
                self.links_mut(prev)?.next_sibling = Some(child);
                self.last_descendant(prev)
            }
        };
        self.links_mut(previous_element)?.next_element = Some(child);

        let first_child = self.node(child)?.contents.first().copied();
        let links = self.links_mut(child)?;
        links.parent = Some(parent);
        links.previous_sibling = prev;
        links.previous_element = Some(previous_element);
        links.next_sibling = None;
        links.next_element = first_child;

        self.node_mut(parent)?.contents.push(child);
        trace!("append {child} -> {parent} (after {previous_element})");
        Ok(())
    }

    fn check_append(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if !parent_node.kind.is_container() {
            return Err(Violation::NotAContainer(parent).into());
        }
        if matches!(child_node.kind, NodeKind::Document) {
            return Err(Violation::DocumentAppended(child).into());
        }
        if child_node.links.parent.is_some() {
            return Err(Violation::AlreadyAttached(child).into());
        }
        if parent == child {
            return Err(Violation::Cycle { parent, child }.into());
        }
        // A detached leaf cannot be an ancestor of anything, so the ancestor
        // walk is only needed for the rare subtree append.
        if !child_node.contents.is_empty() {
            let mut cursor = parent_node.links.parent;
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(Violation::Cycle { parent, child }.into());
                }
                cursor = self.parent(ancestor);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::node::Attributes;

    fn element(tree: &mut Tree, name: &str) -> NodeId {
        tree.create_element(name, Attributes::new()).unwrap()
    }

    fn names(tree: &Tree, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| {
            let node = tree.get(id).unwrap();
            node.name()
                .or(node.text())
                .unwrap_or("#document")
                .to_string()
        })
        .collect()
    }

    #[test]
    fn test_siblings_and_document_order() {
        // <a><b></b><c></c></a>
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        tree.append(a, b).unwrap();
        let c = element(&mut tree, "c");
        tree.append(a, c).unwrap();

        assert_eq!(names(&tree, tree.document_order(a)), vec!["a", "b", "c"]);
        assert_eq!(tree.contents(a), &[b, c]);
        assert_eq!(tree.next_sibling(b), Some(c));
        assert_eq!(tree.previous_sibling(c), Some(b));
        assert_eq!(tree.previous_element(c), Some(b));
        assert_eq!(tree.previous_element(b), Some(a));
        assert_eq!(tree.next_element(c), None);
        tree.verify_links(a).unwrap();
    }

    #[test]
    fn test_empty_element() {
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        assert!(tree.contents(a).is_empty());
        assert_eq!(tree.document_order(a).collect::<Vec<_>>(), vec![a]);
        tree.verify_links(a).unwrap();
    }

    #[test]
    fn test_rightmost_descendant_threading() {
        let mut tree = Tree::new();
        let p = element(&mut tree, "p");
        let c1 = element(&mut tree, "c1");
        tree.append(p, c1).unwrap();
        let g1 = tree.create_text("g1").unwrap();
        tree.append(c1, g1).unwrap();
        let c2 = element(&mut tree, "c2");
        tree.append(p, c2).unwrap();

        assert_eq!(tree.previous_element(c2), Some(g1));
        assert_eq!(tree.next_element(g1), Some(c2));
        assert_eq!(tree.previous_sibling(c2), Some(c1));
    }

    #[test]
    fn test_deep_chain_then_sibling() {
        // <a><b><c></c></b></a> then <d> appended to a
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        tree.append(a, b).unwrap();
        let c = element(&mut tree, "c");
        tree.append(b, c).unwrap();
        let d = element(&mut tree, "d");
        tree.append(a, d).unwrap();

        assert_eq!(tree.previous_element(d), Some(c));
        assert_eq!(tree.next_element(c), Some(d));
        assert_eq!(names(&tree, tree.document_order(a)), vec!["a", "b", "c", "d"]);
        tree.verify_links(a).unwrap();
    }

    #[test]
    fn test_threaded_walk_matches_preorder() {
        let mut tree = Tree::new();
        let html = element(&mut tree, "html");
        let head = element(&mut tree, "head");
        tree.append(html, head).unwrap();
        let title = element(&mut tree, "title");
        tree.append(head, title).unwrap();
        let t = tree.create_text("Title").unwrap();
        tree.append(title, t).unwrap();
        let body = element(&mut tree, "body");
        tree.append(html, body).unwrap();
        let comment = tree.create_comment(" note ").unwrap();
        tree.append(body, comment).unwrap();
        let p = element(&mut tree, "p");
        tree.append(body, p).unwrap();
        let em = element(&mut tree, "em");
        tree.append(p, em).unwrap();
        let word = tree.create_text("word").unwrap();
        tree.append(em, word).unwrap();
        let tail = tree.create_text(" tail").unwrap();
        tree.append(p, tail).unwrap();

        let threaded: Vec<_> = tree.document_order(html).collect();
        let structural: Vec<_> = tree.preorder(html).collect();
        assert_eq!(threaded, structural);
        assert_eq!(threaded.len(), tree.len());

        for id in tree.ids() {
            if let Some(prev) = tree.previous_sibling(id) {
                assert_eq!(tree.next_sibling(prev), Some(id));
            }
            if let Some(&first) = tree.contents(id).first() {
                assert_eq!(tree.previous_element(first), Some(id));
            }
        }
        tree.verify_links(html).unwrap();
    }

    #[test]
    fn test_subtree_append_keeps_threading() {
        let mut tree = Tree::new();
        let doc = tree.create_document().unwrap();
        let doctype = tree.create_doctype(crate::node::Doctype::new("html", "", "")).unwrap();
        tree.append(doc, doctype).unwrap();

        let html = element(&mut tree, "html");
        let body = element(&mut tree, "body");
        tree.append(html, body).unwrap();
        tree.append(doc, html).unwrap();

        assert_eq!(tree.previous_element(html), Some(doctype));
        assert_eq!(tree.next_element(html), Some(body));
        assert_eq!(
            names(&tree, tree.document_order(doc)),
            vec!["#document", "html", "html", "body"]
        );
        tree.verify_links(doc).unwrap();
    }

    #[test]
    fn test_append_rejects_attached_child() {
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        let c = element(&mut tree, "c");
        tree.append(a, c).unwrap();

        let err = tree.append(b, c).unwrap_err();
        assert_eq!(err, TreeError::PreconditionViolation(Violation::AlreadyAttached(c)));
        assert!(tree.contents(b).is_empty());
    }

    #[test]
    fn test_append_rejects_leaf_parent_and_cycles() {
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        let text = tree.create_text("x").unwrap();
        let b = element(&mut tree, "b");
        tree.append(a, b).unwrap();

        assert_eq!(
            tree.append(text, a).unwrap_err(),
            TreeError::PreconditionViolation(Violation::NotAContainer(text))
        );
        assert_eq!(
            tree.append(b, a).unwrap_err(),
            TreeError::PreconditionViolation(Violation::Cycle { parent: b, child: a })
        );
        assert_eq!(
            tree.append(a, a).unwrap_err(),
            TreeError::PreconditionViolation(Violation::Cycle { parent: a, child: a })
        );
    }

    #[test]
    fn test_append_rejects_unknown_node() {
        let mut tree = Tree::new();
        let a = element(&mut tree, "a");
        let ghost = NodeId::from_raw(99).unwrap();
        assert_eq!(
            tree.append(a, ghost).unwrap_err(),
            TreeError::PreconditionViolation(Violation::UnknownNode(ghost))
        );
    }
}
