//! Request and result types for the dispatch operations.
//!
//! One request struct per operation, bundling the scalar arguments with
//! the raw field-definition strings. The result summaries are what the
//! REST surface serializes into the success envelope's `data`.

use metaforge_core::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input to [`crate::Dispatcher::create_doctype`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDoctypeRequest {
    /// Name of the doctype to create.
    pub doctype_name: String,
    /// Raw field definitions, in insertion order.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Target module; `None` and `"custom"` (any casing) both land in the
    /// default "Custom" module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Mark the new doctype as custom even inside a named module.
    #[serde(default)]
    pub custom: bool,
}

/// Input to [`crate::Dispatcher::add_custom_fields`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddFieldsRequest {
    /// Target doctype.
    pub doctype: String,
    /// Raw field definitions, in insertion order.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Explicit anchor; overrides any `insert_after=` token in the
    /// definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<String>,
}

/// Input to [`crate::Dispatcher::set_property`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetPropertyRequest {
    /// Target doctype.
    pub doctype: String,
    /// Property name to override.
    pub property: String,
    /// New value; any JSON scalar (booleans become `"1"`/`"0"`).
    pub value: Value,
    /// Property value type; defaults to `"Data"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Target field; required unless `for_doctype`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Override a doctype-level property instead of a field-level one.
    #[serde(default)]
    pub for_doctype: bool,
}

/// Outcome of a successful doctype creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctypeCreated {
    pub doctype_name: String,
    pub module: String,
    pub fields_count: usize,
    pub custom: bool,
}

/// Outcome of one successful custom-field insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldAdded {
    pub doctype: String,
    pub fieldname: String,
    pub fieldtype: FieldType,
    pub label: String,
    pub required: bool,
    pub unique: bool,
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<String>,
}

/// Outcome of a successful property override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySet {
    pub doctype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    pub property: String,
    pub value: String,
    pub property_type: String,
    /// `"DocType"` for doctype-level overrides, `"DocField"` otherwise.
    pub doctype_or_field: String,
}
