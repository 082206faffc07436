//! A parsed metadata document.
//!
//! The document is read once with `quick-xml` into an arena of nodes in
//! document order. Node `0` is the document node; every element records the
//! id of its last descendant, so a subtree is the contiguous id range
//! `id..=last`. Names are kept namespace-resolved (URI plus local name), which
//! is what structural path queries match against.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use tracing::debug;

use crate::error::{MedinError, Result};
use crate::path::Scope;

pub type NodeId = usize;

pub const DOCUMENT_NODE: NodeId = 0;

#[derive(Debug, Clone)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Child {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    last: NodeId,
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<Attribute>,
    children: Vec<Child>,
}

impl Node {
    fn document() -> Self {
        Self {
            parent: None,
            last: DOCUMENT_NODE,
            namespace: None,
            local_name: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn last_descendant(&self) -> NodeId {
        self.last
    }
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
    pub fn children(&self) -> &[Child] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn parse(bytes: &[u8]) -> Result<Document> {
        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut nodes = vec![Node::document()];
        let mut open: Vec<NodeId> = vec![DOCUMENT_NODE];
        let mut buf = Vec::new();
        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| MedinError::Parse {
                message: e.to_string(),
                position: Some(reader.buffer_position() as u64),
            })?;
            match event {
                Event::Start(ref e) => {
                    let id = element(&reader, e, &mut nodes, &open)?;
                    open.push(id);
                }
                Event::Empty(ref e) => {
                    element(&reader, e, &mut nodes, &open)?;
                }
                Event::End(_) => {
                    if let Some(id) = open.pop() {
                        nodes[id].last = nodes.len() - 1;
                    }
                }
                Event::Text(ref e) => {
                    let text = e.unescape()?.into_owned();
                    append_text(&mut nodes, &open, text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_text(&mut nodes, &open, text);
                }
                Event::Eof => break,
                _ => (),
            }
            buf.clear();
        }

        if open.len() != 1 {
            return Err(MedinError::Parse {
                message: "unexpected end of document".into(),
                position: Some(reader.buffer_position() as u64),
            });
        }
        if nodes.len() == 1 {
            return Err(MedinError::Parse { message: "document has no root element".into(), position: None });
        }
        let last = nodes.len() - 1;
        nodes[DOCUMENT_NODE].last = last;
        debug!(elements = last, "parsed metadata document");
        Ok(Document { nodes })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
    /// The scope positioned on the document node; absolute paths start here.
    pub fn root(&self) -> Scope<'_> {
        Scope::new(self, DOCUMENT_NODE)
    }
    /// The scope of the outermost element, if the document has one.
    pub fn document_element(&self) -> Option<Scope<'_>> {
        self.nodes[DOCUMENT_NODE].children.iter().find_map(|child| match child {
            Child::Element(id) => Some(Scope::new(self, *id)),
            Child::Text(_) => None,
        })
    }
    /// Concatenated text of the node and all its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }
    fn collect_text(&self, id: NodeId, text: &mut String) {
        for child in &self.nodes[id].children {
            match child {
                Child::Text(t) => text.push_str(t),
                Child::Element(c) => self.collect_text(*c, text),
            }
        }
    }
}

fn namespace_of(resolved: ResolveResult) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            debug!(prefix = %String::from_utf8_lossy(&prefix), "undeclared namespace prefix");
            None
        }
    }
}

fn element<R>(reader: &NsReader<R>, start: &BytesStart, nodes: &mut Vec<Node>, open: &[NodeId]) -> Result<NodeId> {
    let (resolved, local) = reader.resolve_element(start.name());
    let namespace = namespace_of(resolved);
    let local_name = String::from_utf8_lossy(local.as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        attributes.push(Attribute {
            namespace: namespace_of(resolved),
            local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: attribute.unescape_value()?.into_owned(),
        });
    }

    let id = nodes.len();
    let parent = open.last().copied().unwrap_or(DOCUMENT_NODE);
    nodes.push(Node {
        parent: Some(parent),
        last: id,
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
    });
    nodes[parent].children.push(Child::Element(id));
    Ok(id)
}

fn append_text(nodes: &mut [Node], open: &[NodeId], text: String) {
    match open.last() {
        Some(&id) if id != DOCUMENT_NODE && !text.is_empty() => {
            if let Some(Child::Text(previous)) = nodes[id].children.last_mut() {
                previous.push_str(&text);
            } else {
                nodes[id].children.push(Child::Text(text));
            }
        }
        _ => (),
    }
}
