//! Flat link table
//!
//! Flattens a finished tree into fixed-size `#[repr(C)]` records so that
//! consumers outside Rust can rebuild their own object graph without walking
//! the arena through many FFI calls. Record `i` describes node id `i + 1`;
//! a link value of 0 means "none".

use std::mem::size_of;

use soup5_tree::{NodeId, NodeType, Tree};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Links of one node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct LinkRecord {
    /// `NodeType` discriminant
    pub kind: u8,
    pub _pad: [u8; 3],
    pub parent: u32,
    pub previous_sibling: u32,
    pub next_sibling: u32,
    pub previous_element: u32,
    pub next_element: u32,
    pub child_count: u32,
}

fn raw(id: Option<NodeId>) -> u32 {
    id.map(NodeId::to_raw).unwrap_or(0)
}

/// Link records for every node of a tree, in id order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkTable {
    pub records: Vec<LinkRecord>,
}

impl LinkTable {
    /// Flatten `tree`
    pub fn from_tree(tree: &Tree) -> Self {
        let records = tree
            .ids()
            .map(|id| {
                let links = tree.links(id);
                let kind = tree.kind(id).map(|k| k.node_type()).unwrap_or(NodeType::Document);
                LinkRecord {
                    kind: kind as u8,
                    _pad: [0; 3],
                    parent: raw(links.parent),
                    previous_sibling: raw(links.previous_sibling),
                    next_sibling: raw(links.next_sibling),
                    previous_element: raw(links.previous_element),
                    next_element: raw(links.next_element),
                    child_count: u32::try_from(tree.contents(id).len()).unwrap_or(u32::MAX),
                }
            })
            .collect();
        Self { records }
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for `id`
    pub fn get(&self, id: NodeId) -> Option<&LinkRecord> {
        self.records.get(id.to_raw() as usize - 1)
    }

    /// Native-endian bytes of all records
    pub fn as_bytes(&self) -> &[u8] {
        self.records.as_slice().as_bytes()
    }

    /// Read records back from bytes produced by [`LinkTable::as_bytes`]
    ///
    /// Returns `None` if the length is not a whole number of records.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let size = size_of::<LinkRecord>();
        if data.len() % size != 0 {
            return None;
        }
        let records = data
            .chunks_exact(size)
            .map(|chunk| LinkRecord::read_from_bytes(chunk).ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use soup5_tree::{Attributes, Compat};

    use super::*;

    #[test]
    fn test_record_layout() {
        assert_eq!(size_of::<LinkRecord>(), 28);
    }

    #[test]
    fn test_table_mirrors_links() {
        let generation = Compat::modern().generation();
        let (mut tree, doc) = generation.new_document().unwrap();
        let a = generation.new_tag(&mut tree, "a", Attributes::new()).unwrap();
        let b = generation.new_tag(&mut tree, "b", Attributes::new()).unwrap();
        let t = generation.wrap_text(&mut tree, "t").unwrap();
        generation.fast_append(&mut tree, a, b).unwrap();
        generation.fast_append(&mut tree, b, t).unwrap();
        generation.fast_append(&mut tree, doc, a).unwrap();

        let table = LinkTable::from_tree(&tree);
        assert_eq!(table.len(), 4);

        let rec_doc = table.get(doc).unwrap();
        assert_eq!(rec_doc.kind, NodeType::Document as u8);
        assert_eq!(rec_doc.parent, 0);
        assert_eq!(rec_doc.next_element, a.to_raw());
        assert_eq!(rec_doc.child_count, 1);

        let rec_t = table.get(t).unwrap();
        assert_eq!(rec_t.kind, NodeType::Text as u8);
        assert_eq!(rec_t.parent, b.to_raw());
        assert_eq!(rec_t.previous_element, b.to_raw());
        assert_eq!(rec_t.next_element, 0);

        let back = LinkTable::from_bytes(table.as_bytes()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_from_bytes_rejects_partial_record() {
        assert!(LinkTable::from_bytes(&[0u8; 27]).is_none());
        assert_eq!(LinkTable::from_bytes(&[]).map(|t| t.len()), Some(0));
    }
}
