//! Engine interface
//!
//! An engine decides which nodes exist and in what order; it reports them
//! through [`TreeCallbacks`] strictly in document order, synchronously and
//! never re-entrantly.

use soup5_tree::{Attributes, NodeId, TreeError};

use crate::error::Result;

/// Node constructors and the append routine handed to an engine
pub trait TreeCallbacks {
    /// Called once per element
    fn new_element(&mut self, name: &str, attrs: Attributes) -> Result<NodeId, TreeError>;

    /// Called once per comment
    fn new_comment(&mut self, text: &str) -> Result<NodeId, TreeError>;

    /// Called once per text run
    fn new_text(&mut self, text: &str) -> Result<NodeId, TreeError>;

    /// Called once per insertion, leaves included
    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError>;

    /// Whether a doctype constructor is bound
    fn keeps_doctype(&self) -> bool {
        false
    }

    /// Called at most once, and only when [`TreeCallbacks::keeps_doctype`]
    /// is true
    fn add_doctype(&mut self, _name: &str, _public_id: &str, _system_id: &str) -> Result<(), TreeError> {
        Ok(())
    }
}

/// HTML tree-construction engine
pub trait Engine {
    /// Parse UTF-8 `data`, build it through `callbacks` and return the root
    /// element
    ///
    /// `stack_size` is the engine's own depth budget; callers forward it
    /// without interpreting it.
    fn parse_and_build(
        &self,
        data: &[u8],
        callbacks: &mut dyn TreeCallbacks,
        stack_size: usize,
    ) -> Result<NodeId>;
}
