//! soup5 tree - node arena for HTML soup construction
//!
//! This crate provides:
//! - An arena tree whose nodes carry structural and document-order links
//! - The node factory and the append adapter used while a parse is running
//! - The compatibility shim selecting a tree-library generation
//! - Generation-specific views over a finished tree

mod append;
pub mod error;
pub mod generation;
pub mod node;
pub mod tree;
pub mod view;

pub use error::{TreeError, Violation};
pub use generation::{
    BuiltinProbe, Compat, Generation, GenerationKind, LibraryProbe, Legacy, Modern, VersionProbe,
};
pub use node::{Attributes, Doctype, ElementData, Links, Node, NodeId, NodeKind, NodeType};
pub use tree::{DocumentOrder, Preorder, Tree};
