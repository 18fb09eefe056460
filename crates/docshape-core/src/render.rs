//! Output tree serialization
//!
//! Renders an [`Element`] tree to the delivered wire form: an XML
//! declaration, four-space indentation per nesting level, text-bearing
//! elements kept on one line, childless elements self-closed, and a trailing
//! newline. Rendering is pure, so serializing the same tree twice yields
//! byte-identical text, and re-parsing the output reproduces the tree.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::document::Element;
use crate::error::{Error, Result};

const INDENT: usize = 4;

/// Serialize `root` to pretty-printed XML text.
pub fn to_pretty_xml(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');

    String::from_utf8(bytes).map_err(|e| Error::Serialize {
        message: e.to_string(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for attr in &el.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if el.text.is_none() && el.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = &el.text {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &el.children {
        write_element(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(el.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::Serialize {
        message: e.to_string(),
    })
}
