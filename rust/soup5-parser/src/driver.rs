//! Parse driver
//!
//! Owns the parse lifecycle: a [`Parser`] sits idle holding the selected
//! generation and engine, a [`Binding`] exists only while the engine is
//! running, and the finished [`Soup`] is handed back to the caller.

use log::debug;
use soup5_tree::view::{legacy, modern};
use soup5_tree::{
    Attributes, Compat, Doctype, Generation, GenerationKind, LibraryProbe, NodeId, Tree, TreeError,
};

use crate::engine::{Engine, TreeCallbacks};
use crate::error::Result;
use crate::html_parser::Html5everEngine;

/// Default depth budget forwarded to the engine
pub const DEFAULT_STACK_SIZE: usize = 16 * 1024;

/// Options for a single parse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Depth budget forwarded verbatim to the engine
    pub stack_size: usize,
    /// Keep the doctype as a node of the document (if the generation has one)
    pub keep_doctype: bool,
    /// Return the root element instead of the document container
    pub return_root: bool,
    /// Check every link of the finished tree before returning it
    pub verify_links: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            keep_doctype: false,
            return_root: true,
            verify_links: false,
        }
    }
}

impl ParseOptions {
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn keep_doctype(mut self, keep: bool) -> Self {
        self.keep_doctype = keep;
        self
    }

    pub fn return_root(mut self, return_root: bool) -> Self {
        self.return_root = return_root;
        self
    }

    pub fn verify_links(mut self, verify: bool) -> Self {
        self.verify_links = verify;
        self
    }
}

/// A finished tree
///
/// Holds the whole arena; [`Soup::node`] is the node the caller asked for
/// (the root element or the document, depending on `return_root`).
#[derive(Clone, Debug)]
pub struct Soup {
    tree: Tree,
    document: NodeId,
    root: NodeId,
    returned: NodeId,
    generation: GenerationKind,
}

impl Soup {
    /// The node selected by `return_root`
    pub fn node(&self) -> NodeId {
        self.returned
    }

    /// The document container
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The root element produced by the engine
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Generation the tree was built for
    pub fn generation(&self) -> GenerationKind {
        self.generation
    }

    /// 4.x view of `id`
    pub fn modern(&self, id: NodeId) -> Option<modern::NodeRef<'_>> {
        modern::NodeRef::new(&self.tree, id)
    }

    /// 3.x view of `id`
    pub fn legacy(&self, id: NodeId) -> Option<legacy::NodeRef<'_>> {
        legacy::NodeRef::new(&self.tree, id)
    }
}

/// Factory and append callbacks bound to one generation for one parse
struct Binding<'a> {
    tree: Tree,
    document: NodeId,
    generation: &'a dyn Generation,
    keep_doctype: bool,
}

impl TreeCallbacks for Binding<'_> {
    fn new_element(&mut self, name: &str, attrs: Attributes) -> Result<NodeId, TreeError> {
        self.generation.new_tag(&mut self.tree, name, attrs)
    }

    fn new_comment(&mut self, text: &str) -> Result<NodeId, TreeError> {
        self.generation.wrap_comment(&mut self.tree, text)
    }

    fn new_text(&mut self, text: &str) -> Result<NodeId, TreeError> {
        self.generation.wrap_text(&mut self.tree, text)
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.generation.fast_append(&mut self.tree, parent, child)
    }

    fn keeps_doctype(&self) -> bool {
        self.keep_doctype
    }

    fn add_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> Result<(), TreeError> {
        let doctype = Doctype::new(name, public_id, system_id);
        match self.generation.new_doctype(&mut self.tree, doctype)? {
            Some(node) => self.generation.fast_append(&mut self.tree, self.document, node),
            None => Ok(()),
        }
    }
}

/// Parse driver bound to a generation and an engine
pub struct Parser<E = Html5everEngine> {
    compat: Compat,
    engine: E,
}

impl Parser<Html5everEngine> {
    /// Driver using the detected generation and the html5ever engine
    ///
    /// Fails with `UnsupportedLibraryGeneration` before any parse when no
    /// generation is available.
    pub fn new() -> Result<Self> {
        Self::with_engine(Html5everEngine::new())
    }
}

impl<E: Engine> Parser<E> {
    /// Driver using the detected generation and a custom engine
    pub fn with_engine(engine: E) -> Result<Self> {
        Ok(Self {
            compat: Compat::detect()?,
            engine,
        })
    }

    /// Driver whose generation comes from `probe` instead of the cache
    pub fn with_probe(engine: E, probe: &dyn LibraryProbe) -> Result<Self> {
        Ok(Self {
            compat: Compat::probe(probe)?,
            engine,
        })
    }

    /// Driver with an explicitly chosen generation
    pub fn with_compat(engine: E, compat: Compat) -> Self {
        Self { compat, engine }
    }

    pub fn compat(&self) -> Compat {
        self.compat
    }

    /// Override the generation used by later parses
    pub fn set_compat(&mut self, compat: Compat) {
        self.compat = compat;
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Parse `data` (text or UTF-8 bytes) into a soup
    pub fn parse(&mut self, data: impl AsRef<[u8]>, options: ParseOptions) -> Result<Soup> {
        let data = data.as_ref();
        let generation = self.compat.generation();
        debug!(
            "parsing {} bytes as {} (stack size {})",
            data.len(),
            generation.kind(),
            options.stack_size
        );

        let (tree, document) = generation.new_document()?;
        let mut binding = Binding {
            tree,
            document,
            generation,
            keep_doctype: options.keep_doctype && generation.supports_doctype(),
        };
        let root = self
            .engine
            .parse_and_build(data, &mut binding, options.stack_size)?;
        generation.fast_append(&mut binding.tree, document, root)?;

        let tree = binding.tree;
        if options.verify_links {
            tree.verify_links(document)?;
        }
        debug!("built {} nodes", tree.len());

        Ok(Soup {
            tree,
            document,
            root,
            returned: if options.return_root { root } else { document },
            generation: generation.kind(),
        })
    }
}

/// Parse `data` with the detected generation, the html5ever engine and
/// `options`
pub fn parse_with(data: impl AsRef<[u8]>, options: ParseOptions) -> Result<Soup> {
    Parser::new()?.parse(data, options)
}

/// Parse `data` with default options
pub fn parse(data: impl AsRef<[u8]>) -> Result<Soup> {
    parse_with(data, ParseOptions::default())
}
