//! Conversion from parsed records to framework wire documents.
//!
//! The framework's resource API takes JSON documents with its own
//! conventions: boolean flags as `0`/`1` integers, Select choices as a
//! newline-separated list, and a handful of scaffolding keys every new
//! doctype must carry. This module is the single place those conventions
//! live.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use metaforge_core::{FieldSpec, FieldType};

use crate::backend::{DoctypeDraft, PropertySetter, SYSTEM_MANAGER_ROLE};

static SELECT_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|,]").expect("static regex must compile"));

/// Normalizes a Select choice list to the framework's newline form.
///
/// Choices may be comma- or pipe-separated; surrounding whitespace and
/// empty entries are dropped.
///
/// # Examples
///
/// ```
/// use metaforge_client::convert::normalize_select_options;
///
/// assert_eq!(normalize_select_options("Open, Closed"), "Open\nClosed");
/// assert_eq!(normalize_select_options("Low|Medium|High"), "Low\nMedium\nHigh");
/// ```
pub fn normalize_select_options(options: &str) -> String {
    SELECT_DELIMITERS
        .split(options)
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn flag(value: bool) -> Value {
    Value::from(if value { 1 } else { 0 })
}

fn wire_options(field: &FieldSpec) -> Option<String> {
    let options = field.options.as_deref()?;
    match field.fieldtype {
        FieldType::Select => Some(normalize_select_options(options)),
        _ => Some(options.to_string()),
    }
}

/// Renders one field as a docfield row.
pub fn docfield_value(field: &FieldSpec) -> Value {
    let mut doc = Map::new();
    doc.insert("fieldname".to_string(), field.fieldname.clone().into());
    doc.insert("fieldtype".to_string(), field.fieldtype.as_str().into());
    doc.insert("label".to_string(), field.label.clone().into());
    doc.insert("reqd".to_string(), flag(field.required));
    doc.insert("unique".to_string(), flag(field.unique));
    doc.insert("read_only".to_string(), flag(field.read_only));
    if let Some(options) = wire_options(field) {
        doc.insert("options".to_string(), options.into());
    }
    if let Some(default) = &field.default {
        doc.insert("default".to_string(), default.clone().into());
    }
    if let Some(anchor) = &field.insert_after {
        doc.insert("insert_after".to_string(), anchor.clone().into());
    }
    // Layout and behavior attributes only appear when actually set, so
    // create-flow payloads stay minimal.
    if field.hidden {
        doc.insert("hidden".to_string(), flag(true));
    }
    if field.in_list_view {
        doc.insert("in_list_view".to_string(), flag(true));
    }
    if field.in_standard_filter {
        doc.insert("in_standard_filter".to_string(), flag(true));
    }
    if field.bold {
        doc.insert("bold".to_string(), flag(true));
    }
    if field.translatable {
        doc.insert("translatable".to_string(), flag(true));
    }
    if field.allow_bulk_edit {
        doc.insert("allow_bulk_edit".to_string(), flag(true));
    }
    if let Some(expr) = &field.depends_on {
        doc.insert("depends_on".to_string(), expr.clone().into());
    }
    if let Some(expr) = &field.mandatory_depends_on {
        doc.insert("mandatory_depends_on".to_string(), expr.clone().into());
    }
    if let Some(expr) = &field.read_only_depends_on {
        doc.insert("read_only_depends_on".to_string(), expr.clone().into());
    }
    if let Some(source) = &field.fetch_from {
        doc.insert("fetch_from".to_string(), source.clone().into());
    }
    if let Some(text) = &field.description {
        doc.insert("description".to_string(), text.clone().into());
    }
    if let Some(width) = field.width {
        doc.insert("width".to_string(), width.into());
    }
    if let Some(precision) = field.precision {
        // The framework stores precision as a string-valued select.
        doc.insert("precision".to_string(), precision.to_string().into());
    }
    Value::Object(doc)
}

/// Renders a doctype draft as a full DocType document.
pub fn doctype_document(draft: &DoctypeDraft) -> Value {
    let fields: Vec<Value> = draft.fields.iter().map(docfield_value).collect();
    serde_json::json!({
        "name": draft.name,
        "module": draft.module,
        "custom": flag(draft.custom),
        "istable": 0,
        "issingle": 0,
        "document_type": "Document",
        "fields": fields,
        "permissions": [
            {
                "role": SYSTEM_MANAGER_ROLE,
                "read": 1,
                "write": 1,
                "create": 1,
                "delete": 1,
                "print": 1,
                "email": 1,
                "share": 1,
            }
        ],
    })
}

/// Renders one custom field for an existing doctype.
pub fn custom_field_document(doctype: &str, field: &FieldSpec) -> Value {
    let mut doc = match docfield_value(field) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    doc.insert("dt".to_string(), doctype.into());
    doc.insert("is_system_generated".to_string(), flag(true));
    Value::Object(doc)
}

/// Renders a property setter document.
pub fn property_setter_document(setter: &PropertySetter) -> Value {
    let mut doc = Map::new();
    doc.insert(
        "doctype_or_field".to_string(),
        if setter.for_doctype { "DocType" } else { "DocField" }.into(),
    );
    doc.insert("doc_type".to_string(), setter.doctype.clone().into());
    if let Some(field_name) = &setter.field_name {
        doc.insert("field_name".to_string(), field_name.clone().into());
    }
    doc.insert("property".to_string(), setter.property.clone().into());
    doc.insert("value".to_string(), setter.value.clone().into());
    doc.insert(
        "property_type".to_string(),
        setter.property_type.clone().into(),
    );
    Value::Object(doc)
}

/// Renders a module definition document.
pub fn module_def_document(module: &str, app: &str) -> Value {
    serde_json::json!({
        "module_name": module,
        "app_name": app,
        "custom": 0,
    })
}

#[cfg(test)]
mod tests {
    use metaforge_core::{FieldGrammar, parse_field_definition};

    use super::*;

    fn parse(definition: &str) -> FieldSpec {
        parse_field_definition(definition, FieldGrammar::Customize).unwrap()
    }

    #[test]
    fn test_normalize_select_options() {
        assert_eq!(normalize_select_options("Open,Closed"), "Open\nClosed");
        assert_eq!(normalize_select_options("Open, Closed "), "Open\nClosed");
        assert_eq!(normalize_select_options("Low|Medium|High"), "Low\nMedium\nHigh");
        assert_eq!(normalize_select_options("A,|B"), "A\nB");
    }

    #[test]
    fn test_docfield_flags_are_integers() {
        let doc = docfield_value(&parse("email:Data:*:unique"));

        assert_eq!(doc["fieldname"], "email");
        assert_eq!(doc["fieldtype"], "Data");
        assert_eq!(doc["label"], "Email");
        assert_eq!(doc["reqd"], 1);
        assert_eq!(doc["unique"], 1);
        assert_eq!(doc["read_only"], 0);
        assert!(doc.get("options").is_none());
        assert!(doc.get("hidden").is_none());
    }

    #[test]
    fn test_docfield_select_options_normalized_on_wire() {
        let doc = docfield_value(&parse("status:Select:options=Open, Closed|Pending"));
        assert_eq!(doc["options"], "Open\nClosed\nPending");
    }

    #[test]
    fn test_docfield_link_options_verbatim() {
        let doc = docfield_value(&parse("customer:Link:options=Customer"));
        assert_eq!(doc["options"], "Customer");
    }

    #[test]
    fn test_docfield_extended_attributes() {
        let doc = docfield_value(&parse(
            "discount:Float:insert_after=amount:hidden:width=120:prec=2",
        ));

        assert_eq!(doc["insert_after"], "amount");
        assert_eq!(doc["hidden"], 1);
        assert_eq!(doc["width"], 120);
        assert_eq!(doc["precision"], "2");
    }

    #[test]
    fn test_doctype_document_scaffolding() {
        let draft = DoctypeDraft {
            name: "Library Book".to_string(),
            module: "Custom".to_string(),
            custom: true,
            fields: vec![parse("title:Data:*")],
        };
        let doc = doctype_document(&draft);

        assert_eq!(doc["name"], "Library Book");
        assert_eq!(doc["module"], "Custom");
        assert_eq!(doc["custom"], 1);
        assert_eq!(doc["istable"], 0);
        assert_eq!(doc["issingle"], 0);
        assert_eq!(doc["document_type"], "Document");
        assert_eq!(doc["fields"].as_array().unwrap().len(), 1);
        assert_eq!(doc["permissions"][0]["role"], SYSTEM_MANAGER_ROLE);
        assert_eq!(doc["permissions"][0]["write"], 1);
    }

    #[test]
    fn test_custom_field_document() {
        let doc = custom_field_document("Task", &parse("severity:Int:insert_after=status"));

        assert_eq!(doc["dt"], "Task");
        assert_eq!(doc["fieldname"], "severity");
        assert_eq!(doc["insert_after"], "status");
        assert_eq!(doc["is_system_generated"], 1);
    }

    #[test]
    fn test_property_setter_document_for_field() {
        let setter = PropertySetter {
            doctype: "Task".to_string(),
            field_name: Some("status".to_string()),
            property: "hidden".to_string(),
            value: "1".to_string(),
            property_type: "Check".to_string(),
            for_doctype: false,
        };
        let doc = property_setter_document(&setter);

        assert_eq!(doc["doctype_or_field"], "DocField");
        assert_eq!(doc["doc_type"], "Task");
        assert_eq!(doc["field_name"], "status");
        assert_eq!(doc["property"], "hidden");
        assert_eq!(doc["value"], "1");
        assert_eq!(doc["property_type"], "Check");
    }

    #[test]
    fn test_property_setter_document_for_doctype() {
        let setter = PropertySetter {
            doctype: "Task".to_string(),
            field_name: None,
            property: "track_changes".to_string(),
            value: "1".to_string(),
            property_type: "Check".to_string(),
            for_doctype: true,
        };
        let doc = property_setter_document(&setter);

        assert_eq!(doc["doctype_or_field"], "DocType");
        assert!(doc.get("field_name").is_none());
    }

    #[test]
    fn test_module_def_document() {
        let doc = module_def_document("Warehouse", "logistics");
        assert_eq!(doc["module_name"], "Warehouse");
        assert_eq!(doc["app_name"], "logistics");
        assert_eq!(doc["custom"], 0);
    }
}
