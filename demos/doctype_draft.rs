//! Wire-document conversion example.
//!
//! Builds a DocType draft from parsed field definitions and prints the
//! JSON documents a site would receive, without contacting anything.
//! Note the Select options normalizing to newline-joined form and the
//! boolean attributes becoming 0/1 flags.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p metaforge-demos --example doctype_draft
//! ```

use metaforge_client::convert::{custom_field_document, doctype_document, property_setter_document};
use metaforge_client::{DoctypeDraft, PropertySetter};
use metaforge_core::{FieldGrammar, parse_field_definition, parse_field_definitions};

fn main() {
    let definitions = vec![
        "isbn:data:*:unique".to_string(),
        "title:data:*".to_string(),
        "status:select:options=Available|Loaned|Lost:?=Available".to_string(),
    ];
    let fields = parse_field_definitions(&definitions, FieldGrammar::Create).unwrap();

    let draft = DoctypeDraft {
        name: "Library Book".to_string(),
        module: "Custom".to_string(),
        custom: true,
        fields,
    };

    println!("DocType document:");
    let document = doctype_document(&draft);
    println!("{}", serde_json::to_string_pretty(&document).unwrap());

    // A field added to an existing doctype becomes a Custom Field
    // document instead.
    let field = parse_field_definition(
        "loyalty_tier:select:options=Bronze,Silver,Gold:in_list_view:insert_after=territory",
        FieldGrammar::Customize,
    )
    .unwrap();

    println!("\nCustom Field document:");
    let document = custom_field_document("Customer", &field);
    println!("{}", serde_json::to_string_pretty(&document).unwrap());

    // Property overrides travel as Property Setter documents.
    let setter = PropertySetter {
        doctype: "Customer".to_string(),
        field_name: Some("territory".to_string()),
        property: "hidden".to_string(),
        value: "1".to_string(),
        property_type: "Check".to_string(),
        for_doctype: false,
    };

    println!("\nProperty Setter document:");
    let document = property_setter_document(&setter);
    println!("{}", serde_json::to_string_pretty(&document).unwrap());
}
