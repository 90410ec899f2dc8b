//! Field-definition model and parser for doctype scaffolding.
//!
//! This crate defines the foundational types for turning the compact
//! `fieldname:fieldtype[:attribute...]` syntax into structured records:
//!
//! - [`FieldSpec`] — one parsed field (type, label, constraints, layout
//!   attributes).
//! - [`FieldType`] — the fixed set of supported field types.
//! - [`parse_field_definition`] / [`parse_field_definitions`] — single and
//!   batch parsing under a selectable [`FieldGrammar`].
//! - [`syntax_reference`] — a serializable description of the grammar for
//!   documentation surfaces.
//!
//! Parsing is pure and deterministic; everything that talks to a backend
//! lives in the sibling crates.
//!
//! # Example
//!
//! ```
//! use metaforge_core::*;
//!
//! let defs = vec![
//!     "email:Data:*:unique".to_string(),
//!     "status:Select:options=Open,Closed:?=Open".to_string(),
//!     "amount:Currency:?=0".to_string(),
//! ];
//!
//! let fields = parse_field_definitions(&defs, FieldGrammar::Create).unwrap();
//! assert_eq!(fields.len(), 3);
//! assert_eq!(fields[0].label, "Email");
//! assert!(fields[0].required);
//! assert_eq!(fields[1].options.as_deref(), Some("Open,Closed"));
//! assert_eq!(fields[2].default.as_deref(), Some("0"));
//! ```

mod parse;
mod reference;
mod types;

pub use parse::{
    BatchParseError, FieldGrammar, FieldParseError, parse_field_definition,
    parse_field_definitions,
};
pub use reference::{AttributeDoc, ExampleDoc, SyntaxReference, syntax_reference};
pub use types::*;
