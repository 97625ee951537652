//! Tree construction errors

use crate::node::NodeId;

/// Errors raised while selecting a generation or assembling a tree
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// No known tree-library generation could be detected
    #[error("unsupported tree library generation: {0}")]
    UnsupportedLibraryGeneration(String),

    /// A factory or append call broke its contract (engine binding defect)
    #[error("precondition violated: {0}")]
    PreconditionViolation(#[from] Violation),

    /// The arena has handed out every node id
    #[error("tree is full: no node id left after {limit} nodes")]
    ArenaFull { limit: usize },

    /// `verify_links` found a link inconsistent with the structural tree
    #[error("broken {link} link on node {node}")]
    BrokenLink { node: NodeId, link: &'static str },
}

/// Contract breaches detected by the factory and the append adapter
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),
    #[error("node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),
    #[error("appending node {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("document node {0} cannot be appended")]
    DocumentAppended(NodeId),
    #[error("element tag name is empty")]
    EmptyTagName,
}
