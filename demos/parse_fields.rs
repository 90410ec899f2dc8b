//! Field-definition parsing example.
//!
//! Demonstrates how the compact `fieldname:fieldtype[:attribute...]`
//! syntax turns into structured `FieldSpec` records, what the customize
//! grammar accepts on top of the create grammar, and what a rejected
//! definition reports.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p metaforge-demos --example parse_fields
//! ```

use metaforge_core::{FieldGrammar, parse_field_definition, parse_field_definitions};

fn main() {
    let definitions = vec![
        "customer_name:data:*".to_string(),
        "email:data:unique".to_string(),
        "status:select:options=Open|In Progress|Closed:?=Open".to_string(),
        "credit_limit:currency:?=0".to_string(),
        "notes:text".to_string(),
    ];

    let fields = parse_field_definitions(&definitions, FieldGrammar::Create).unwrap();

    println!("Parsed {} field(s):", fields.len());
    for field in &fields {
        println!("\n  {} ({})", field.fieldname, field.fieldtype);
        println!("    label:    {}", field.label);
        println!("    required: {}", field.required);
        if field.unique {
            println!("    unique:   true");
        }
        if let Some(options) = &field.options {
            println!("    options:  {options}");
        }
        if let Some(default) = &field.default {
            println!("    default:  {default}");
        }
    }

    // The customize grammar adds layout attributes for fields added to
    // an existing doctype.
    let field = parse_field_definition(
        "loyalty_tier:select:options=Bronze,Silver,Gold:in_list_view:insert_after=email",
        FieldGrammar::Customize,
    )
    .unwrap();
    println!("\nCustomize-grammar field:");
    println!("  {} ({})", field.fieldname, field.fieldtype);
    println!("    in_list_view: {}", field.in_list_view);
    println!("    insert_after: {}", field.insert_after.as_deref().unwrap_or("-"));

    // The same attribute is rejected when creating a fresh doctype.
    let err = parse_field_definition(
        "loyalty_tier:select:options=Bronze:in_list_view",
        FieldGrammar::Create,
    )
    .unwrap_err();
    println!("\nCreate-grammar rejection:\n  {err}");

    // Batch parsing is fail-fast: the error names the first offending
    // definition and nothing after it is looked at.
    let mixed = vec![
        "first:data".to_string(),
        "second:data:shiny".to_string(),
        "third:data".to_string(),
    ];
    let err = parse_field_definitions(&mixed, FieldGrammar::Create).unwrap_err();
    println!("\nBatch rejection:\n  {err}");
}
