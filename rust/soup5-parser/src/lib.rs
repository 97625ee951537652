//! soup5 parser - HTML5 parsing into a foreign-style soup tree
//!
//! This crate provides:
//! - The engine interface and an html5ever-backed engine
//! - The parse driver binding an engine to the soup5 tree arena
//! - A flat link table for consumers outside Rust
//!
//! All of it is reachable through C ABI functions in [`ffi`].

pub mod driver;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod html_parser;
pub mod links;

pub use driver::{parse, parse_with, ParseOptions, Parser, Soup, DEFAULT_STACK_SIZE};
pub use engine::{Engine, TreeCallbacks};
pub use error::{EngineFailure, Error, Result};
pub use html_parser::Html5everEngine;
pub use links::{LinkRecord, LinkTable};
pub use soup5_tree;
