//! Owned XML tree for OOXML parts.
//!
//! Parts are parsed once into [`Element`] trees, edited in place and written
//! back. Element names keep their namespace prefix (`w:p`, `wp:extent`) and
//! namespaces are never resolved. Anything the engines do not understand
//! round-trips untouched.

use crate::error::{DocError, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.is(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.is(name))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.elements_mut().filter(move |element| element.is(name))
    }

    /// Position in `children` of the first element called `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(element) if element.is(name)))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Drops child elements rejected by `keep`; text nodes are left alone.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|node| match node {
            Node::Element(element) => keep(element),
            Node::Text(_) => true,
        });
    }

    /// Pre-order walk over this element and everything below it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|element| element.is(name))
    }

    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut Element> {
        if self.is(name) {
            return Some(self);
        }
        self.elements_mut()
            .find_map(|child| child.find_descendant_mut(name))
    }

    /// Concatenation of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| matches!(node, Node::Element(_)));
        self.children.push(Node::Text(text.into()));
    }

    /// Returns the child called `name`, creating it at the slot dictated by
    /// `order` (the schema sequence of the parent) when it is missing.
    pub fn ensure_child_ordered(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let position = match self.position_of(name) {
            Some(position) => position,
            None => {
                let at = insertion_slot(&self.children, name, order);
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };
        let Some(Node::Element(element)) = self.children.get_mut(position) else {
            unreachable!("child position always holds an element");
        };
        element
    }

    /// Replaces the child with the same name as `property`, or inserts it in
    /// schema order.
    pub fn set_ordered(&mut self, property: Element, order: &[&str]) {
        let name = property.name.clone();
        *self.ensure_child_ordered(&name, order) = property;
    }
}

fn insertion_slot(children: &[Node], name: &str, order: &[&str]) -> usize {
    let Some(rank) = order.iter().position(|candidate| *candidate == name) else {
        return children.len();
    };
    children
        .iter()
        .position(|node| {
            node.as_element()
                .and_then(|element| order.iter().position(|candidate| *candidate == element.name))
                .is_some_and(|other| other > rank)
        })
        .unwrap_or(children.len())
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack
            .extend(element.children.iter().rev().filter_map(Node::as_element));
        Some(element)
    }
}

/// Parses a whole part (or a standalone fragment) into its root element.
pub fn parse(xml: &str) -> Result<Element> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(DocError::invalid_document(format!(
                    "malformed xml at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
        };
        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DocError::invalid_document("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map_err(|err| DocError::invalid_document(format!("bad text: {err}")))?;
                    if !value.is_empty() {
                        parent.children.push(Node::Text(value.into_owned()));
                    }
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Text(String::from_utf8_lossy(&data).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DocError::invalid_document("unclosed element at end of xml"));
    }
    root.ok_or_else(|| DocError::invalid_document("xml has no root element"))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|err| DocError::invalid_document(format!("bad attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| DocError::invalid_document(format!("bad attribute value: {err}")))?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_some() {
                return Err(DocError::invalid_document("xml has more than one root element"));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

/// Serializes `root` as a standalone part with an XML declaration.
pub fn to_bytes(root: &Element) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(|err| serialize_error(&err))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attrs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|err| serialize_error(&err));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|err| serialize_error(&err))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|err| serialize_error(&err))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|err| serialize_error(&err))
}

fn serialize_error(err: &impl fmt::Display) -> DocError {
    DocError::io("failed to serialize xml", io::Error::other(err.to_string()))
}
