//! Structural path queries over a [`Document`].
//!
//! Paths are a small XPath subset (see `path.pest`): absolute or relative
//! location paths built from child (`/`) and descendant (`//`) steps, element
//! name tests with namespace prefixes and wildcards, attribute steps, `text()`,
//! `.`, `..` and `[@attr='value']` predicates.
//!
//! There is no shared cursor. A query is always evaluated against an explicit
//! [`Scope`], and a query that needs to look inside a sub-node simply asks for
//! that sub-node's scope and queries it. Scopes are `Copy`, so nothing has to be
//! saved or restored between queries.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use seahash::SeaHasher;
use tracing::warn;

use crate::document::{Child, Document, Node, NodeId, DOCUMENT_NODE};
use crate::error::{MedinError, Result};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

#[derive(Parser)]
#[grammar = "path.pest"]
pub struct PathParser;

const GMD: &[&str] = &["http://www.isotc211.org/2005/gmd"];
const GCO: &[&str] = &["http://www.isotc211.org/2005/gco"];
const SRV: &[&str] = &["http://www.isotc211.org/2005/srv"];
const GMX: &[&str] = &["http://www.isotc211.org/2005/gmx"];
const XLINK: &[&str] = &["http://www.w3.org/1999/xlink"];
// MEDIN documents use both the GML 3.2 namespace and the unversioned one
const GML: &[&str] = &["http://www.opengis.net/gml/3.2", "http://www.opengis.net/gml"];

pub const PREFIXES: [(&str, &[&str]); 6] =
    [("gmd", GMD), ("gco", GCO), ("srv", SRV), ("gmx", GMX), ("xlink", XLINK), ("gml", GML)];

fn resolve_prefix(prefix: &str) -> Result<&'static [&'static str]> {
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uris)| *uris)
        .ok_or_else(|| MedinError::Path(format!("unknown namespace prefix '{}'", prefix)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Namespace {
    Any,
    Unqualified,
    OneOf(&'static [&'static str]),
}
impl Namespace {
    fn matches(&self, namespace: Option<&str>) -> bool {
        match self {
            Namespace::Any => true,
            Namespace::Unqualified => namespace.is_none(),
            Namespace::OneOf(uris) => namespace.is_some_and(|ns| uris.contains(&ns)),
        }
    }
}

#[derive(Debug, Clone)]
struct Name {
    namespace: Namespace,
    local: Option<String>,
}
impl Name {
    fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.matches(namespace) && self.local.as_deref().is_none_or(|l| l == local)
    }
}

#[derive(Debug, Clone)]
struct Predicate {
    attribute: Name,
    value: String,
}

#[derive(Debug, Clone)]
enum Step {
    Element { name: Name, predicates: Vec<Predicate> },
    Attribute(Name),
    Text,
    Parent,
    Current,
}

/// A compiled structural path.
#[derive(Debug, Clone)]
pub struct Path {
    expression: String,
    absolute: bool,
    steps: Vec<(Axis, Step)>,
}

impl Path {
    pub fn compile(expression: &str) -> Result<Path> {
        let mut absolute = false;
        let mut axis = Axis::Child;
        let mut steps = Vec::new();
        for pair in PathParser::parse(Rule::path, expression)?.flat_map(|p| p.into_inner()) {
            let step = match pair.as_rule() {
                Rule::axis => {
                    if steps.is_empty() {
                        absolute = true;
                    }
                    axis = if pair.as_str() == "//" { Axis::Descendant } else { Axis::Child };
                    continue;
                }
                Rule::parent => Step::Parent,
                Rule::current => Step::Current,
                Rule::text => Step::Text,
                Rule::attribute => Step::Attribute(attribute_name(pair)?),
                Rule::element => element_step(pair)?,
                _ => continue,
            };
            steps.push((axis, step));
            axis = Axis::Child;
        }
        Ok(Path { expression: expression.to_string(), absolute, steps })
    }
    pub fn expression(&self) -> &str {
        &self.expression
    }
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

fn qualified(pair: Pair<Rule>, unprefixed: Namespace) -> Result<Name> {
    let mut name = Name { namespace: unprefixed, local: None };
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::prefix => name.namespace = Namespace::OneOf(resolve_prefix(part.as_str())?),
            Rule::local => name.local = Some(part.as_str().to_string()),
            _ => (),
        }
    }
    Ok(name)
}

fn attribute_name(pair: Pair<Rule>) -> Result<Name> {
    match pair.into_inner().next() {
        Some(qname) => qualified(qname, Namespace::Unqualified),
        None => Err(MedinError::Path("attribute step without a name".into())),
    }
}

fn element_step(pair: Pair<Rule>) -> Result<Step> {
    let mut name = Name { namespace: Namespace::Any, local: None };
    let mut predicates = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::wildcard => name = qualified(part, Namespace::Any)?,
            Rule::qname => name = qualified(part, Namespace::Unqualified)?,
            Rule::predicate => {
                let mut attribute = None;
                let mut value = String::new();
                for piece in part.into_inner() {
                    match piece.as_rule() {
                        Rule::qname => attribute = Some(qualified(piece, Namespace::Unqualified)?),
                        Rule::single | Rule::double => value = piece.as_str().to_string(),
                        _ => (),
                    }
                }
                let attribute = attribute.ok_or_else(|| MedinError::Path("predicate without an attribute".into()))?;
                predicates.push(Predicate { attribute, value });
            }
            _ => (),
        }
    }
    Ok(Step::Element { name, predicates })
}

lazy_static! {
    static ref COMPILED: Mutex<HashMap<String, Arc<Path>, OtherHasher>> = Mutex::new(HashMap::default());
}

/// Compiles a path, reusing an earlier compilation of the same expression.
pub fn compiled(expression: &str) -> Result<Arc<Path>> {
    if let Ok(cache) = COMPILED.lock() {
        if let Some(path) = cache.get(expression) {
            return Ok(Arc::clone(path));
        }
    }
    let path = Arc::new(Path::compile(expression)?);
    if let Ok(mut cache) = COMPILED.lock() {
        cache.insert(expression.to_string(), Arc::clone(&path));
    }
    Ok(path)
}

/// One result of a path query.
#[derive(Debug, Clone)]
pub enum Item<'d> {
    Element(Scope<'d>),
    Attribute(&'d str),
    Text(String),
}

impl<'d> Item<'d> {
    /// The string value: all descendant text for elements.
    pub fn content(&self) -> String {
        match self {
            Item::Element(scope) => scope.text(),
            Item::Attribute(value) => value.to_string(),
            Item::Text(text) => text.clone(),
        }
    }
    pub fn as_element(&self) -> Option<Scope<'d>> {
        match self {
            Item::Element(scope) => Some(*scope),
            _ => None,
        }
    }
}

/// A position in a document against which paths are evaluated.
#[derive(Clone, Copy)]
pub struct Scope<'d> {
    document: &'d Document,
    node: NodeId,
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Scope").field("node", &self.node).field("name", &self.local_name()).finish()
    }
}

impl<'d> Scope<'d> {
    pub(crate) fn new(document: &'d Document, node: NodeId) -> Self {
        Self { document, node }
    }
    pub fn node_id(&self) -> NodeId {
        self.node
    }
    pub fn document(&self) -> &'d Document {
        self.document
    }
    fn node(&self) -> &'d Node {
        self.document.node(self.node)
    }
    pub fn local_name(&self) -> &'d str {
        self.node().local_name()
    }
    pub fn namespace(&self) -> Option<&'d str> {
        self.node().namespace()
    }
    /// Concatenated text of this node and its descendants.
    pub fn text(&self) -> String {
        self.document.text_content(self.node)
    }
    /// An unqualified attribute of this element.
    pub fn attribute(&self, local_name: &str) -> Option<&'d str> {
        self.node()
            .attributes()
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn evaluate(&self, path: &Path) -> Vec<Item<'d>> {
        let document = self.document;
        let mut nodes = vec![if path.absolute { DOCUMENT_NODE } else { self.node }];
        for (index, (axis, step)) in path.steps.iter().enumerate() {
            let terminal = index + 1 == path.steps.len();
            match step {
                Step::Current => (),
                Step::Parent => {
                    nodes = nodes.iter().filter_map(|&n| document.node(n).parent()).collect();
                    nodes.dedup();
                }
                Step::Element { name, predicates } => {
                    let mut next = Vec::new();
                    for &n in &nodes {
                        for candidate in self.candidates(n, *axis) {
                            let node = document.node(candidate);
                            if name.matches(node.namespace(), node.local_name())
                                && predicates.iter().all(|p| satisfies(node, p))
                            {
                                next.push(candidate);
                            }
                        }
                    }
                    next.sort_unstable();
                    next.dedup();
                    nodes = next;
                }
                Step::Attribute(name) => {
                    if !terminal {
                        return Vec::new();
                    }
                    return self
                        .targets(&nodes, *axis)
                        .into_iter()
                        .flat_map(|n| document.node(n).attributes().iter())
                        .filter(|a| name.matches(a.namespace.as_deref(), &a.local_name))
                        .map(|a| Item::Attribute(a.value.as_str()))
                        .collect();
                }
                Step::Text => {
                    if !terminal {
                        return Vec::new();
                    }
                    return self
                        .targets(&nodes, *axis)
                        .into_iter()
                        .filter_map(|n| direct_text(document.node(n)))
                        .map(Item::Text)
                        .collect();
                }
            }
            if nodes.is_empty() {
                return Vec::new();
            }
        }
        nodes.into_iter().map(|n| Item::Element(Scope::new(document, n))).collect()
    }

    fn candidates(&self, node: NodeId, axis: Axis) -> Vec<NodeId> {
        let n = self.document.node(node);
        match axis {
            Axis::Child => n
                .children()
                .iter()
                .filter_map(|c| match c {
                    Child::Element(id) => Some(*id),
                    Child::Text(_) => None,
                })
                .collect(),
            Axis::Descendant => (node + 1..=n.last_descendant()).collect(),
        }
    }

    // the nodes whose own attributes or text a terminal step reads
    fn targets(&self, nodes: &[NodeId], axis: Axis) -> Vec<NodeId> {
        match axis {
            Axis::Child => nodes.to_vec(),
            Axis::Descendant => {
                let mut all: Vec<NodeId> = nodes
                    .iter()
                    .flat_map(|&n| n..=self.document.node(n).last_descendant())
                    .collect();
                all.sort_unstable();
                all.dedup();
                all
            }
        }
    }

    /// Evaluates an expression; an expression that does not compile selects nothing.
    pub fn select(&self, expression: &str) -> Vec<Item<'d>> {
        match compiled(expression) {
            Ok(path) => self.evaluate(&path),
            Err(e) => {
                warn!(expression, error = %e, "invalid structural path");
                Vec::new()
            }
        }
    }
    pub fn elements(&self, expression: &str) -> Vec<Scope<'d>> {
        self.select(expression).iter().filter_map(Item::as_element).collect()
    }
    pub fn first(&self, expression: &str) -> Option<Scope<'d>> {
        self.select(expression).iter().find_map(Item::as_element)
    }
    /// The trimmed content of the first match, if there is one and it is not blank.
    pub fn value(&self, expression: &str) -> Option<String> {
        self.select(expression).first().map(|item| item.content().trim().to_string()).filter(|v| !v.is_empty())
    }
    /// The trimmed, non-blank contents of every match, in document order.
    pub fn values(&self, expression: &str) -> Vec<String> {
        self.select(expression)
            .iter()
            .map(|item| item.content().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

fn satisfies(node: &Node, predicate: &Predicate) -> bool {
    node.attributes().iter().any(|a| {
        predicate.attribute.matches(a.namespace.as_deref(), &a.local_name) && a.value == predicate.value
    })
}

fn direct_text(node: &Node) -> Option<String> {
    let text: String = node
        .children()
        .iter()
        .filter_map(|c| match c {
            Child::Text(t) => Some(t.as_str()),
            Child::Element(_) => None,
        })
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_absolute_and_relative_paths() {
        let path = Path::compile("//gmd:MD_Metadata/gmd:contact").expect("compiles");
        assert!(path.is_absolute());
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[0].0, Axis::Descendant);
        assert_eq!(path.steps[1].0, Axis::Child);

        let path = Path::compile(".//gmd:MD_KeywordTypeCode/@codeListValue").expect("compiles");
        assert!(!path.is_absolute());
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[1].0, Axis::Descendant);
    }

    #[test]
    fn compiles_predicates_wildcards_and_parents() {
        let path = Path::compile("//gmd:CI_RoleCode[@codeListValue='originator']/../../gmd:organisationName")
            .expect("compiles");
        assert_eq!(path.steps.len(), 4);
        match &path.steps[0].1 {
            Step::Element { predicates, .. } => assert_eq!(predicates[0].value, "originator"),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(Path::compile("//gmd:resourceConstraints/gmd:*/gmd:useLimitation").is_ok());
        assert!(Path::compile("./gmd:keyword/*").is_ok());
        assert!(Path::compile("./gmd:linkage/gmd:URL/text()").is_ok());
    }

    #[test]
    fn rejects_unknown_prefixes_and_garbage() {
        assert!(matches!(Path::compile("//foo:bar"), Err(MedinError::Path(_))));
        assert!(Path::compile("gmd:title[").is_err());
        assert!(Path::compile("").is_err());
    }
}
