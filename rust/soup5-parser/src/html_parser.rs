//! HTML engine using html5ever
//!
//! html5ever runs the full HTML5 tree-construction algorithm into a private
//! scratch tree (foster parenting and the adoption agency need to move nodes
//! around). The finished scratch tree is then replayed through
//! [`TreeCallbacks`] in document order, so the caller only ever sees
//! create-then-append events and never a move.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_document, ParseOpts};
use log::{debug, trace, warn};
use markup5ever::{Attribute, LocalName, Namespace, QualName};
use soup5_tree::{Attributes, NodeId};
use tendril::{ByteTendril, StrTendril, TendrilSink};

use crate::engine::{Engine, TreeCallbacks};
use crate::error::{EngineFailure, Result};

/// Upper bound on the replay stack allocated up front
const INITIAL_STACK: usize = 256;

/// Scratch handle for the document node
const DOCUMENT: usize = 0;

/// Engine backed by html5ever's `parse_document`
#[derive(Clone, Default)]
pub struct Html5everEngine {
    opts: ParseOpts,
}

impl Html5everEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom html5ever tokenizer/tree-builder options
    pub fn with_opts(opts: ParseOpts) -> Self {
        Self { opts }
    }
}

impl Engine for Html5everEngine {
    fn parse_and_build(
        &self,
        data: &[u8],
        callbacks: &mut dyn TreeCallbacks,
        stack_size: usize,
    ) -> Result<NodeId> {
        let dom = parse_document(ScratchSink::new(), self.opts.clone())
            .from_utf8()
            .one(ByteTendril::from_slice(data));
        debug!(
            "html5ever produced {} nodes ({} parse errors)",
            dom.nodes.len(),
            dom.errors
        );
        dom.replay(callbacks, stack_size)
    }
}

// ============================================================================
// Scratch tree
// ============================================================================

#[derive(Debug)]
enum ScratchData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        annotation_xml_integration_point: bool,
    },
    Text(StrTendril),
    Comment(StrTendril),
}

#[derive(Debug)]
struct ScratchNode {
    parent: Option<usize>,
    children: Vec<usize>,
    data: ScratchData,
}

impl ScratchNode {
    fn new(data: ScratchData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

#[derive(Debug)]
struct ScratchDoctype {
    name: StrTendril,
    public_id: StrTendril,
    system_id: StrTendril,
}

/// Output of the html5ever pass
#[derive(Debug)]
struct ScratchDom {
    nodes: Vec<ScratchNode>,
    doctype: Option<ScratchDoctype>,
    errors: usize,
}

/// One element whose children are still being replayed
struct Frame {
    node: usize,
    handle: NodeId,
    next: usize,
}

impl ScratchDom {
    fn root_element(&self) -> Option<usize> {
        self.nodes[DOCUMENT]
            .children
            .iter()
            .copied()
            .find(|&id| matches!(self.nodes[id].data, ScratchData::Element { .. }))
    }

    fn create(&self, id: usize, callbacks: &mut dyn TreeCallbacks) -> Result<NodeId> {
        match &self.nodes[id].data {
            ScratchData::Element { name, attrs, .. } => {
                let attrs: Attributes = attrs
                    .iter()
                    .map(|attr| (attribute_name(&attr.name), attr.value.to_string()))
                    .collect();
                Ok(callbacks.new_element(&name.local, attrs)?)
            }
            ScratchData::Text(text) => Ok(callbacks.new_text(text)?),
            ScratchData::Comment(text) => Ok(callbacks.new_comment(text)?),
            ScratchData::Document => {
                Err(EngineFailure::Internal("document node below the root".to_string()).into())
            }
        }
    }

    /// Report the doctype and every node under the root element, pre-order
    fn replay(&self, callbacks: &mut dyn TreeCallbacks, stack_size: usize) -> Result<NodeId> {
        if callbacks.keeps_doctype() {
            if let Some(doctype) = &self.doctype {
                callbacks.add_doctype(&doctype.name, &doctype.public_id, &doctype.system_id)?;
            }
        }

        let root = self.root_element().ok_or(EngineFailure::NoRootElement)?;
        let dropped = self.nodes[DOCUMENT].children.len() - 1;
        if dropped > 0 {
            warn!("dropping {dropped} document-level nodes outside the root element");
        }

        if stack_size == 0 {
            return Err(EngineFailure::StackExhausted { limit: stack_size }.into());
        }
        let root_handle = self.create(root, callbacks)?;
        let mut stack = Vec::with_capacity(stack_size.min(INITIAL_STACK));
        stack.push(Frame {
            node: root,
            handle: root_handle,
            next: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let Some(&child) = self.nodes[frame.node].children.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;
            let parent = frame.handle;

            let handle = self.create(child, callbacks)?;
            callbacks.append(parent, handle)?;

            if !self.nodes[child].children.is_empty() {
                if stack.len() >= stack_size {
                    return Err(EngineFailure::StackExhausted { limit: stack_size }.into());
                }
                stack.push(Frame {
                    node: child,
                    handle,
                    next: 0,
                });
            }
        }
        Ok(root_handle)
    }
}

/// `prefix:local` for namespaced attributes, `local` otherwise
fn attribute_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", &**prefix, &*name.local),
        None => name.local.to_string(),
    }
}

fn detach(nodes: &mut [ScratchNode], id: usize) {
    if let Some(parent) = nodes[id].parent.take() {
        nodes[parent].children.retain(|&c| c != id);
    }
}

fn insert(nodes: &mut [ScratchNode], parent: usize, index: usize, child: usize) {
    detach(nodes, child);
    nodes[child].parent = Some(parent);
    nodes[parent].children.insert(index, child);
}

// ============================================================================
// TreeSink
// ============================================================================

/// Owned element name handed back to html5ever
#[derive(Debug)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// Sink collecting html5ever's tree operations
struct ScratchSink {
    nodes: RefCell<Vec<ScratchNode>>,
    doctype: RefCell<Option<ScratchDoctype>>,
    errors: Cell<usize>,
}

impl ScratchSink {
    fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![ScratchNode::new(ScratchData::Document)]),
            doctype: RefCell::new(None),
            errors: Cell::new(0),
        }
    }

    fn push(&self, data: ScratchData) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(ScratchNode::new(data));
        nodes.len() - 1
    }

    /// Insert at `index` under `parent`, merging text into a text node
    /// directly before the insertion point
    fn insert_at(&self, parent: usize, index: usize, child: NodeOrText<usize>) {
        match child {
            NodeOrText::AppendNode(node) => {
                insert(&mut self.nodes.borrow_mut(), parent, index, node);
            }
            NodeOrText::AppendText(text) => {
                let mut nodes = self.nodes.borrow_mut();
                let before = index
                    .checked_sub(1)
                    .map(|i| nodes[parent].children[i]);
                if let Some(before) = before {
                    if let ScratchData::Text(existing) = &mut nodes[before].data {
                        existing.push_tendril(&text);
                        return;
                    }
                }
                nodes.push(ScratchNode::new(ScratchData::Text(text)));
                let id = nodes.len() - 1;
                insert(&mut nodes, parent, index, id);
            }
        }
    }
}

impl TreeSink for ScratchSink {
    type Handle = usize;
    type Output = ScratchDom;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> ScratchDom {
        ScratchDom {
            nodes: self.nodes.into_inner(),
            doctype: self.doctype.into_inner(),
            errors: self.errors.get(),
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.set(self.errors.get() + 1);
        trace!("html5ever: {msg}");
    }

    fn get_document(&self) -> usize {
        DOCUMENT
    }

    fn elem_name<'a>(&'a self, target: &'a usize) -> OwnedElemName {
        match &self.nodes.borrow()[*target].data {
            ScratchData::Element { name, .. } => OwnedElemName(name.clone()),
            _ => OwnedElemName(QualName::new(None, Namespace::from(""), LocalName::from(""))),
        }
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> usize {
        self.push(ScratchData::Element {
            name,
            attrs,
            annotation_xml_integration_point: flags.mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&self, text: StrTendril) -> usize {
        self.push(ScratchData::Comment(text))
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> usize {
        self.push(ScratchData::Comment(data))
    }

    fn append(&self, parent: &usize, child: NodeOrText<usize>) {
        if let NodeOrText::AppendNode(node) = &child {
            detach(&mut self.nodes.borrow_mut(), *node);
        }
        let index = self.nodes.borrow()[*parent].children.len();
        self.insert_at(*parent, index, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &usize,
        prev_element: &usize,
        child: NodeOrText<usize>,
    ) {
        let has_parent = self.nodes.borrow()[*element].parent.is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(ScratchDoctype {
            name,
            public_id,
            system_id,
        });
    }

    fn get_template_contents(&self, target: &usize) -> usize {
        // Template contents are kept as ordinary children
        *target
    }

    fn same_node(&self, x: &usize, y: &usize) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        trace!("quirks mode: {mode:?}");
    }

    fn append_before_sibling(&self, sibling: &usize, new_node: NodeOrText<usize>) {
        // Detach first so the sibling's index is measured without the node
        if let NodeOrText::AppendNode(node) = &new_node {
            detach(&mut self.nodes.borrow_mut(), *node);
        }
        let position = {
            let nodes = self.nodes.borrow();
            nodes[*sibling].parent.and_then(|parent| {
                nodes[parent]
                    .children
                    .iter()
                    .position(|&c| c == *sibling)
                    .map(|index| (parent, index))
            })
        };
        if let Some((parent, index)) = position {
            self.insert_at(parent, index, new_node);
        }
    }

    fn add_attrs_if_missing(&self, target: &usize, attrs: Vec<Attribute>) {
        if let ScratchData::Element { attrs: existing, .. } =
            &mut self.nodes.borrow_mut()[*target].data
        {
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &usize) {
        detach(&mut self.nodes.borrow_mut(), *target);
    }

    fn reparent_children(&self, node: &usize, new_parent: &usize) {
        let mut nodes = self.nodes.borrow_mut();
        let children = std::mem::take(&mut nodes[*node].children);
        for child in children {
            nodes[child].parent = Some(*new_parent);
            nodes[*new_parent].children.push(child);
        }
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &usize) -> bool {
        matches!(
            self.nodes.borrow()[*handle].data,
            ScratchData::Element {
                annotation_xml_integration_point: true,
                ..
            }
        )
    }
}
