//! Source document tree model and XML parsing
//!
//! The export arrives as XML text and is parsed once into an owned [`Element`]
//! tree. The tree is read-only during transformation: the engine locates value
//! nodes by their kind and `schema_id` attribute, in document order, and never
//! mutates the source.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// The three value-node kinds the capture API emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Single-value field carrying text
    Datapoint,
    /// One instance of a repeating group
    Multivalue,
    /// One grouped-field row within a repeating group instance
    Tuple,
}

impl NodeKind {
    /// Element name used on the wire for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Datapoint => "datapoint",
            NodeKind::Multivalue => "multivalue",
            NodeKind::Tuple => "tuple",
        }
    }
}

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An owned XML element.
///
/// `text` holds the element's leading text, the content before any child
/// element. Text after a child (tail text) is never consulted by the engine
/// and is dropped at parse time, as is the whitespace-only padding of
/// pretty-printed input. A childless element keeps its text verbatim, even
/// when it is whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Create a childless element carrying text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Strict descendants of this element in document order. The element
    /// itself is not yielded.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant of the given kind carrying the given `schema_id`,
    /// in document order.
    pub fn find_first(&self, kind: NodeKind, schema_id: &str) -> Option<&Element> {
        self.descendants().find(|el| el.matches(kind, schema_id))
    }

    /// All descendants of the given kind carrying the given `schema_id`,
    /// in document order.
    pub fn find_all(&self, kind: NodeKind, schema_id: &str) -> Vec<&Element> {
        self.descendants()
            .filter(|el| el.matches(kind, schema_id))
            .collect()
    }

    /// The `url` attribute of the first descendant named `schema`.
    pub fn schema_url(&self) -> Option<&str> {
        self.descendants()
            .find(|el| el.name == "schema")
            .and_then(|el| el.attr("url"))
    }

    fn matches(&self, kind: NodeKind, schema_id: &str) -> bool {
        self.name == kind.tag() && self.attr("schema_id") == Some(schema_id)
    }
}

/// Pre-order iterator over strict descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// An element under construction while its closing tag is still pending.
struct BuildNode {
    name: String,
    attributes: Vec<Attribute>,
    text: Option<String>,
    children: Vec<Element>,
}

impl BuildNode {
    /// Accumulate leading text. Chunks arriving after the first child are
    /// tail text and are dropped.
    fn append_text(&mut self, chunk: &str) {
        if self.children.is_empty() {
            self.text.get_or_insert_with(String::new).push_str(chunk);
        }
    }

    fn finish(self) -> Element {
        let BuildNode {
            name,
            attributes,
            text,
            children,
        } = self;

        // Leading whitespace ahead of the first child is indentation, not
        // content. A childless element keeps whatever text it has.
        let text = match text {
            Some(t) if children.is_empty() => Some(t),
            Some(t) if !t.trim().is_empty() => Some(t),
            _ => None,
        };

        Element {
            name,
            attributes,
            text,
            children,
        }
    }
}

/// Parse XML text into an [`Element`] tree.
///
/// Comments, processing instructions, declarations, and DOCTYPEs are
/// skipped. Empty input, multiple root elements, and malformed markup are
/// [`Error::DocumentParse`] errors.
pub fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut stack: Vec<BuildNode> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(open_node(&e)?);
            }
            Ok(Event::End(_)) => {
                // quick-xml verifies that end tags match their start tags
                let node = stack.pop().ok_or_else(|| Error::DocumentParse {
                    message: "unexpected closing tag".to_string(),
                })?;
                attach(node.finish(), &mut stack, &mut root)?;
            }
            Ok(Event::Empty(e)) => {
                let node = open_node(&e)?;
                attach(node.finish(), &mut stack, &mut root)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| Error::DocumentParse {
                    message: format!("invalid text content: {}", err),
                })?;
                if let Some(node) = stack.last_mut() {
                    node.append_text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if let Some(node) = stack.last_mut() {
                    node.append_text(&text);
                }
            }
            Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::DocumentParse {
                    message: format!("{} at position {}", e, reader.error_position()),
                });
            }
        }
    }

    if let Some(node) = stack.last() {
        return Err(Error::DocumentParse {
            message: format!("unexpected end of input, expected closing tag </{}>", node.name),
        });
    }

    root.ok_or_else(|| Error::DocumentParse {
        message: "document contains no elements".to_string(),
    })
}

fn open_node(e: &BytesStart<'_>) -> Result<BuildNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::DocumentParse {
            message: format!("invalid attribute in <{}>: {}", name, err),
        })?;
        let value = attr.unescape_value().map_err(|err| Error::DocumentParse {
            message: format!("invalid attribute value in <{}>: {}", name, err),
        })?;
        attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: value.into_owned(),
        });
    }

    Ok(BuildNode {
        name,
        attributes,
        text: None,
        children: Vec::new(),
    })
}

fn attach(element: Element, stack: &mut Vec<BuildNode>, root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(Error::DocumentParse {
                    message: "document has more than one root element".to_string(),
                });
            }
            *root = Some(element);
            Ok(())
        }
    }
}
