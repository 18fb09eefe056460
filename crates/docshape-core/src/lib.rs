//! Docshape Core - schema-driven conversion of annotated document exports
//!
//! This crate turns a capture API export (XML, value nodes keyed by
//! `schema_id`) and the queue's schema (JSON, ordered sections of fields and
//! repeating groups) into a clean output document shaped and named by the
//! schema.
//!
//! # Main Components
//!
//! - **Error Handling**: error types using `thiserror` and `anyhow`
//! - **Document Model**: owned XML tree with kind/`schema_id` lookups
//! - **Schema Model**: typed sections, fields, and repeating groups,
//!   validated while parsing
//! - **Transform Engine**: schema-ordered reshaping of source values
//! - **Rendering**: deterministic pretty-printed XML output
//! - **Client & Pipeline**: capture API calls and the end-to-end conversion
//!
//! # Example
//!
//! ```
//! use docshape_core::{document, render, transform, Result, Schema};
//! use serde_json::json;
//!
//! fn convert() -> Result<String> {
//!     let source = document::parse(
//!         r#"<export><datapoint schema_id="due">42</datapoint></export>"#,
//!     )?;
//!     let schema = Schema::from_value(json!({
//!         "content": [{"label": "Totals", "children": [
//!             {"category": "datapoint", "id": "due", "label": "Amount Due"}
//!         ]}]
//!     }))?;
//!
//!     let output = transform::transform(&source, &schema);
//!     render::to_pretty_xml(&output)
//! }
//!
//! let xml = convert().expect("conversion succeeds");
//! assert!(xml.contains("<AmountDue>42</AmountDue>"));
//! ```

pub mod client;
pub mod document;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod transform;

// Re-export main types for convenience
pub use client::{CaptureClient, CaptureConfig, Upstream};
pub use document::{Attribute, Element, NodeKind};
pub use error::{Error, Result};
pub use normalize::normalize_label;
pub use pipeline::run_export;
pub use render::to_pretty_xml;
pub use schema::{DatapointDef, MultivalueDef, Schema, SchemaChild, Section, TupleDef};
pub use transform::{transform, OUTPUT_ROOT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Configuration {
            message: "missing DELIVERY_URL".to_string(),
        };
        assert!(err.to_string().contains("missing DELIVERY_URL"));
    }
}
