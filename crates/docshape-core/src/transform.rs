//! The transform engine
//!
//! Reorganizes a parsed export document into the shape a schema prescribes.
//! The walk is driven entirely by the schema: output order is schema order,
//! every section element is emitted even when nothing matched, and source
//! values are located by `schema_id`, never by position.
//!
//! Selection rules:
//!
//! - A single-value field takes the first matching `datapoint` in document
//!   order, anywhere in the source tree, and is omitted when the match is
//!   absent or carries no text.
//! - A repeating group takes every matching `multivalue` instance; each
//!   produces one container element, so repeated instances become repeated
//!   siblings with the same name.
//! - Within one instance, each member definition takes every matching
//!   `tuple` row scoped to that instance; leaf fields resolve to the first
//!   matching `datapoint` scoped to their row.
//!
//! All element names come from schema labels via
//! [`normalize_label`](crate::normalize::normalize_label), at every level;
//! a label that normalizes to nothing falls back to `_` so the emitted
//! element always carries a name.

use crate::document::{Element, NodeKind};
use crate::normalize::normalize_label;
use crate::schema::{Schema, SchemaChild};

/// Name of the output tree's root element.
pub const OUTPUT_ROOT: &str = "Export";

/// Build the output tree for `document` under `schema`.
///
/// Infallible: schema shape was validated at parse time, and a value that
/// cannot be found is silently absent from the output.
pub fn transform(document: &Element, schema: &Schema) -> Element {
    let mut export = Element::new(OUTPUT_ROOT);

    for section in &schema.sections {
        let mut section_el = Element::new(element_name(&section.label));

        for child in &section.children {
            match child {
                SchemaChild::Datapoint(def) => {
                    if let Some(found) = document.find_first(NodeKind::Datapoint, &def.id) {
                        if let Some(text) = present_text(found) {
                            section_el.push(Element::with_text(element_name(&def.label), text));
                        }
                    }
                }
                SchemaChild::Multivalue(def) => {
                    for instance in document.find_all(NodeKind::Multivalue, &def.id) {
                        let mut group_el = Element::new(element_name(&def.label));

                        for tuple_def in &def.tuples {
                            for row in instance.find_all(NodeKind::Tuple, &tuple_def.id) {
                                let mut row_el = Element::new(element_name(&tuple_def.label));

                                for leaf in &tuple_def.datapoints {
                                    if let Some(found) =
                                        row.find_first(NodeKind::Datapoint, &leaf.id)
                                    {
                                        if let Some(text) = present_text(found) {
                                            row_el.push(Element::with_text(
                                                element_name(&leaf.label),
                                                text,
                                            ));
                                        }
                                    }
                                }

                                group_el.push(row_el);
                            }
                        }

                        section_el.push(group_el);
                    }
                }
            }
        }

        export.push(section_el);
    }

    export
}

// An empty or all-whitespace label normalizes to ""; the element still
// needs a name to serialize.
fn element_name(label: &str) -> String {
    let name = normalize_label(label);
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}

// Missing text and empty text are both "no value"; whitespace counts as a
// value.
fn present_text(el: &Element) -> Option<&str> {
    el.text.as_deref().filter(|t| !t.is_empty())
}
