//! Typed schema model and JSON parsing
//!
//! The capture API describes a queue's target structure as JSON: a `content`
//! array of sections, each holding children tagged with a `category`. The
//! raw wire shape is deserialized once into explicit variant types here, so
//! a structurally broken schema fails up front as [`Error::SchemaParse`]
//! instead of somewhere mid-traversal. Children with a category this engine
//! does not know are skipped.

use serde::Deserialize;

use crate::error::Result;

/// A parsed schema: the ordered sections of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub sections: Vec<Section>,
}

/// One top-level section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Display label, normalized into the section element name
    pub label: String,
    /// Fields and repeating groups, in schema order
    pub children: Vec<SchemaChild>,
}

/// A section child: either a single-value field or a repeating group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChild {
    Datapoint(DatapointDef),
    Multivalue(MultivalueDef),
}

/// Definition of a single-value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointDef {
    /// Identifier correlating this field with source `schema_id` attributes
    pub id: String,
    pub label: String,
}

/// Definition of a repeating group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultivalueDef {
    pub id: String,
    pub label: String,
    /// Group member definitions, one level deep
    pub tuples: Vec<TupleDef>,
}

/// Definition of a group member row within a repeating group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDef {
    pub id: String,
    pub label: String,
    /// Leaf fields resolved within one matched row
    pub datapoints: Vec<DatapointDef>,
}

impl Schema {
    /// Build a typed schema from the capture API's JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaParse`] when the JSON does not match the
    /// expected shape, including missing `id`/`label` keys.
    ///
    /// [`Error::SchemaParse`]: crate::Error::SchemaParse
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawSchema = serde_json::from_value(value)?;
        Ok(raw.into())
    }
}

// Wire shape. `multivalue` children nest their member definitions one object
// deeper: child.children.children is the member list.

#[derive(Deserialize)]
struct RawSchema {
    content: Vec<RawSection>,
}

#[derive(Deserialize)]
struct RawSection {
    label: String,
    #[serde(default)]
    children: Vec<RawChild>,
}

#[derive(Deserialize)]
#[serde(tag = "category")]
enum RawChild {
    #[serde(rename = "datapoint")]
    Datapoint { id: String, label: String },
    #[serde(rename = "multivalue")]
    Multivalue {
        id: String,
        label: String,
        children: RawTupleContainer,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct RawTupleContainer {
    #[serde(default)]
    children: Vec<RawTuple>,
}

#[derive(Deserialize)]
struct RawTuple {
    id: String,
    label: String,
    #[serde(default)]
    children: Vec<RawLeaf>,
}

#[derive(Deserialize)]
struct RawLeaf {
    id: String,
    label: String,
}

impl From<RawSchema> for Schema {
    fn from(raw: RawSchema) -> Self {
        Schema {
            sections: raw.content.into_iter().map(Section::from).collect(),
        }
    }
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        let children = raw
            .children
            .into_iter()
            .filter_map(|child| match child {
                RawChild::Datapoint { id, label } => {
                    Some(SchemaChild::Datapoint(DatapointDef { id, label }))
                }
                RawChild::Multivalue {
                    id,
                    label,
                    children,
                } => {
                    let tuples = children.children.into_iter().map(TupleDef::from).collect();
                    Some(SchemaChild::Multivalue(MultivalueDef { id, label, tuples }))
                }
                RawChild::Unknown => None,
            })
            .collect();

        Section {
            label: raw.label,
            children,
        }
    }
}

impl From<RawTuple> for TupleDef {
    fn from(raw: RawTuple) -> Self {
        TupleDef {
            id: raw.id,
            label: raw.label,
            datapoints: raw
                .children
                .into_iter()
                .map(|leaf| DatapointDef {
                    id: leaf.id,
                    label: leaf.label,
                })
                .collect(),
        }
    }
}
