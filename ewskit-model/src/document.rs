//! Owned, namespace-resolved document tree.
//!
//! Responses are parsed once into a tree of [`Node`]s whose names carry the
//! resolved namespace URI rather than the prefix the server happened to use.
//! Locators then resolve prefixes through a [`Namespaces`](crate::Namespaces)
//! table, so `t:Subject` matches regardless of how the response spelled it.

use crate::error::{ModelError, ModelResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use serde::{Deserialize, Serialize};

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    /// Resolved namespace URI, `None` for unqualified names.
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

/// An attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// An element with its attributes, direct text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    name: QName,
    attributes: Vec<Attribute>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Creates an empty element.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Adds an unqualified attribute.
    #[must_use]
    pub fn with_attribute(mut self, local: &str, value: &str) -> Self {
        self.attributes.push(Attribute {
            name: QName::new(None, local),
            value: value.to_string(),
        });
        self
    }

    /// Appends text content.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of the unqualified attribute `local`, if present.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Direct text content (text of child elements is not included).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// This node followed by all of its descendants, in document order.
    pub fn descendants_or_self(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Wraps an already-built tree.
    pub fn from_root(root: Node) -> Self {
        Self { root }
    }

    /// Parses an XML document.
    pub fn parse(xml: &str) -> ModelResult<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| ModelError::Parse(e.to_string()))?;
            let namespace = owned_namespace(ns)?;

            match event {
                Event::Start(start) => {
                    let node = open_element(&reader, namespace, &start)?;
                    stack.push(node);
                }
                Event::Empty(start) => {
                    let node = open_element(&reader, namespace, &start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| ModelError::Parse("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| ModelError::Parse(e.to_string()))?;
                        top.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ModelError::Parse("unexpected end of document".to_string()));
        }
        root.map(Self::from_root)
            .ok_or_else(|| ModelError::Parse("document has no root element".to_string()))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }
}

fn owned_namespace(ns: ResolveResult<'_>) -> ModelResult<Option<String>> {
    match ns {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.0).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ModelError::Parse(format!(
            "undeclared namespace prefix {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> ModelResult<Node> {
    let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut node = Node::new(QName { namespace, local });

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ModelError::Parse(e.to_string()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = owned_namespace(ns)?;
        let value = attr
            .unescape_value()
            .map_err(|e| ModelError::Parse(e.to_string()))?;
        node.attributes.push(Attribute {
            name: QName {
                namespace,
                local: String::from_utf8_lossy(local.as_ref()).into_owned(),
            },
            value: value.into_owned(),
        });
    }

    Ok(node)
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> ModelResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(ModelError::Parse("multiple root elements".to_string())),
    }
    Ok(())
}
