//! Parse errors

use soup5_tree::TreeError;

/// Errors surfaced by [`crate::parse`] and [`crate::Parser`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generation detection failed or a callback broke its contract
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The engine aborted the parse
    #[error("engine failure: {0}")]
    Engine(#[from] EngineFailure),
}

/// Reasons an engine aborts
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineFailure {
    /// Nesting went deeper than the configured stack budget
    #[error("nesting depth exceeds stack size {limit}")]
    StackExhausted { limit: usize },

    /// The engine produced no root element
    #[error("document has no root element")]
    NoRootElement,

    #[error("{0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
