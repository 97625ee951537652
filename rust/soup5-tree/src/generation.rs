//! Tree-library generation shim
//!
//! Two historically incompatible object models are supported: the 3.x
//! (`Legacy`) model, whose document-order links are called `previous`/`next`
//! and which has no doctype node, and the 4.x (`Modern`) model with
//! `previous_element`/`next_element` and doctype support. Both are exposed
//! through the [`Generation`] trait; which one backs a parse is decided once
//! by probing for a version marker and cached in a [`Compat`] value.

use std::fmt;
use std::sync::OnceLock;

use log::debug;

use crate::error::TreeError;
use crate::node::{Attributes, Doctype, NodeId};
use crate::tree::Tree;

/// Which object model a tree follows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GenerationKind {
    Legacy = 3,
    Modern = 4,
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationKind::Legacy => f.write_str("legacy (3.x)"),
            GenerationKind::Modern => f.write_str("modern (4.x)"),
        }
    }
}

/// Capability set every generation provides
pub trait Generation: fmt::Debug + Send + Sync {
    fn kind(&self) -> GenerationKind;

    /// Version marker this generation answers to
    fn version_marker(&self) -> &'static str;

    /// Whether a doctype node type exists in this object model
    fn supports_doctype(&self) -> bool;

    /// Build an empty tree holding only a document container
    fn new_document(&self) -> Result<(Tree, NodeId), TreeError> {
        let mut tree = Tree::new();
        let document = tree.create_document()?;
        Ok((tree, document))
    }

    /// Element constructor
    fn new_tag(&self, tree: &mut Tree, name: &str, attrs: Attributes) -> Result<NodeId, TreeError> {
        tree.create_element(name, attrs)
    }

    /// Text constructor
    fn wrap_text(&self, tree: &mut Tree, text: &str) -> Result<NodeId, TreeError> {
        tree.create_text(text)
    }

    /// Comment constructor
    fn wrap_comment(&self, tree: &mut Tree, text: &str) -> Result<NodeId, TreeError> {
        tree.create_comment(text)
    }

    /// Doctype constructor; `None` when the model has no doctype node
    fn new_doctype(&self, tree: &mut Tree, doctype: Doctype) -> Result<Option<NodeId>, TreeError>;

    /// Link `child` as the last child of `parent`
    fn fast_append(&self, tree: &mut Tree, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        tree.append(parent, child)
    }
}

/// The 3.x object model
#[derive(Debug)]
pub struct Legacy;

impl Generation for Legacy {
    fn kind(&self) -> GenerationKind {
        GenerationKind::Legacy
    }

    fn version_marker(&self) -> &'static str {
        "3."
    }

    fn supports_doctype(&self) -> bool {
        false
    }

    fn new_doctype(&self, _tree: &mut Tree, _doctype: Doctype) -> Result<Option<NodeId>, TreeError> {
        Ok(None)
    }
}

/// The 4.x object model
#[derive(Debug)]
pub struct Modern;

impl Generation for Modern {
    fn kind(&self) -> GenerationKind {
        GenerationKind::Modern
    }

    fn version_marker(&self) -> &'static str {
        "4."
    }

    fn supports_doctype(&self) -> bool {
        true
    }

    fn new_doctype(&self, tree: &mut Tree, doctype: Doctype) -> Result<Option<NodeId>, TreeError> {
        tree.create_doctype(doctype).map(Some)
    }
}

static LEGACY: Legacy = Legacy;
static MODERN: Modern = Modern;

/// Source of the installed library's version marker
pub trait LibraryProbe {
    /// Version marker such as `"4.12"`, or `None` when nothing is installed
    fn version_marker(&self) -> Option<String>;
}

/// Probe reporting the generation compiled in through cargo features
///
/// `modern` is preferred when both `modern` and `legacy` are enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinProbe;

impl LibraryProbe for BuiltinProbe {
    fn version_marker(&self) -> Option<String> {
        if cfg!(feature = "modern") {
            Some(MODERN.version_marker().to_string())
        } else if cfg!(feature = "legacy") {
            Some(LEGACY.version_marker().to_string())
        } else {
            None
        }
    }
}

/// Fixed version marker, mainly for tests and embedders
#[derive(Clone, Debug)]
pub struct VersionProbe(pub Option<String>);

impl LibraryProbe for VersionProbe {
    fn version_marker(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Selected generation, passed explicitly to whoever builds trees
#[derive(Clone, Copy, Debug)]
pub struct Compat {
    generation: &'static dyn Generation,
}

static DETECTED: OnceLock<Result<Compat, TreeError>> = OnceLock::new();

impl Compat {
    /// Select the generation reported by [`BuiltinProbe`]
    ///
    /// Detection runs once per process; later calls return the cached result,
    /// including a cached failure.
    pub fn detect() -> Result<Compat, TreeError> {
        DETECTED.get_or_init(|| Compat::probe(&BuiltinProbe)).clone()
    }

    /// Select a generation from an arbitrary probe, bypassing the cache
    pub fn probe(probe: &dyn LibraryProbe) -> Result<Compat, TreeError> {
        let marker = probe.version_marker().unwrap_or_default();
        let compat = Compat::from_version(&marker)?;
        debug!("tree library {marker:?} -> {}", compat.kind());
        Ok(compat)
    }

    /// Map a version marker to a generation
    ///
    /// `3.*` selects the legacy model, any other non-empty marker the modern
    /// one.
    pub fn from_version(marker: &str) -> Result<Compat, TreeError> {
        let marker = marker.trim();
        if marker.is_empty() {
            return Err(TreeError::UnsupportedLibraryGeneration(
                "no version marker found".to_string(),
            ));
        }
        if marker.starts_with(LEGACY.version_marker()) {
            Ok(Compat::legacy())
        } else {
            Ok(Compat::modern())
        }
    }

    pub fn legacy() -> Compat {
        Compat { generation: &LEGACY }
    }

    pub fn modern() -> Compat {
        Compat { generation: &MODERN }
    }

    pub fn kind(&self) -> GenerationKind {
        self.generation.kind()
    }

    pub fn generation(&self) -> &'static dyn Generation {
        self.generation
    }
}

impl PartialEq for Compat {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Compat {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_marker_selection() {
        assert_eq!(Compat::from_version("3.2.1").unwrap().kind(), GenerationKind::Legacy);
        assert_eq!(Compat::from_version("4.12.3").unwrap().kind(), GenerationKind::Modern);
        assert_eq!(Compat::from_version("5.0").unwrap().kind(), GenerationKind::Modern);
    }

    #[test]
    fn test_missing_marker_is_unsupported() {
        let err = Compat::probe(&VersionProbe(None)).unwrap_err();
        assert!(matches!(err, TreeError::UnsupportedLibraryGeneration(_)));
        assert!(Compat::from_version("  ").is_err());
    }

    #[test]
    fn test_detect_is_cached() {
        let first = Compat::detect();
        let second = Compat::detect();
        assert_eq!(first, second);
        #[cfg(feature = "modern")]
        assert_eq!(first.unwrap().kind(), GenerationKind::Modern);
    }

    #[test]
    fn test_detect_agrees_across_threads() {
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(Compat::detect)).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let expected = Compat::detect();
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| *r == expected));
    }

    #[test]
    fn test_legacy_has_no_doctype() {
        let legacy = Compat::legacy().generation();
        let (mut tree, _doc) = legacy.new_document().unwrap();
        assert!(!legacy.supports_doctype());
        assert_eq!(legacy.new_doctype(&mut tree, Doctype::new("html", "", "")), Ok(None));
        assert_eq!(tree.len(), 1);

        let modern = Compat::modern().generation();
        assert!(modern.new_doctype(&mut tree, Doctype::new("html", "", "")).unwrap().is_some());
    }

    #[test]
    fn test_generations_build_identical_links() {
        for compat in [Compat::legacy(), Compat::modern()] {
            let generation = compat.generation();
            let (mut tree, doc) = generation.new_document().unwrap();
            let a = generation.new_tag(&mut tree, "a", Attributes::new()).unwrap();
            let b = generation.new_tag(&mut tree, "b", Attributes::new()).unwrap();
            let text = generation.wrap_text(&mut tree, "hi").unwrap();
            let comment = generation.wrap_comment(&mut tree, "c").unwrap();
            generation.fast_append(&mut tree, a, b).unwrap();
            generation.fast_append(&mut tree, b, text).unwrap();
            generation.fast_append(&mut tree, a, comment).unwrap();
            generation.fast_append(&mut tree, doc, a).unwrap();

            assert_eq!(tree.previous_element(comment), Some(text));
            tree.verify_links(doc).unwrap();
        }
    }
}
