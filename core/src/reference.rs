//! Machine-readable documentation of the field-definition syntax.
//!
//! Drives the offline `docs` dump and the REST reference endpoint so the
//! documented grammar can never drift from the implemented one: type and
//! attribute listings are assembled from the same tables the parser
//! matches against.

use serde::{Deserialize, Serialize};

use crate::{FIELD_SYNTAX_VERSION, FieldType};

/// Self-describing bundle documenting the field-definition grammar.
///
/// # Examples
///
/// ```
/// use metaforge_core::syntax_reference;
///
/// let reference = syntax_reference();
/// assert!(reference.field_types.contains(&"Currency".to_string()));
/// assert!(reference.attributes.iter().any(|a| a.token == "options=<value>"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxReference {
    /// Grammar version, from [`FIELD_SYNTAX_VERSION`].
    pub version: String,
    /// Overall definition shape.
    pub shape: String,
    /// Canonical names of every supported field type.
    pub field_types: Vec<String>,
    /// Every attribute recognizer, base and customize grammar.
    pub attributes: Vec<AttributeDoc>,
    /// Worked examples.
    pub examples: Vec<ExampleDoc>,
    /// Usage notes.
    pub notes: Vec<String>,
}

/// Documentation for one attribute recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDoc {
    /// The token as written, with value placeholders.
    pub token: String,
    /// Accepted short forms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Whether the token is only accepted when customizing an existing
    /// doctype.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub customize_only: bool,
    /// What the attribute does.
    pub description: String,
}

/// A worked field-definition example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleDoc {
    /// The definition string.
    pub definition: String,
    /// What it produces.
    pub explanation: String,
}

impl AttributeDoc {
    fn base(token: &str, description: &str) -> Self {
        Self {
            token: token.to_string(),
            aliases: Vec::new(),
            customize_only: false,
            description: description.to_string(),
        }
    }

    fn customize(token: &str, description: &str) -> Self {
        Self {
            token: token.to_string(),
            aliases: Vec::new(),
            customize_only: true,
            description: description.to_string(),
        }
    }

    fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// Builds the reference for the current grammar.
///
/// Deterministic; safe to call per request.
pub fn syntax_reference() -> SyntaxReference {
    SyntaxReference {
        version: FIELD_SYNTAX_VERSION.to_string(),
        shape: "<fieldname>:<fieldtype>[:<attribute>...]".to_string(),
        field_types: FieldType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
        attributes: vec![
            AttributeDoc::base("*", "mark the field required"),
            AttributeDoc::base("unique", "values must be unique across documents"),
            AttributeDoc::base("readonly", "field cannot be edited through forms"),
            AttributeDoc::base(
                "options=<value>",
                "choice list for Select (comma- or pipe-separated), target doctype for Link/Table; rejected for other types",
            ),
            AttributeDoc::base(
                "?=<value>",
                "default value; boolean-like for Int/Check (true/yes/1, false/no/0, or digits), numeric for Float/Currency/Percent, verbatim otherwise",
            ),
            AttributeDoc::base("label=<value>", "override the label derived from the fieldname"),
            AttributeDoc::customize(
                "insert_after=<field>",
                "position the field after an existing one; an explicit --insert-after wins over this token",
            ),
            AttributeDoc::customize("hidden", "hide the field from forms"),
            AttributeDoc::customize("in_list_view", "show as a list-view column")
                .with_alias("inlist"),
            AttributeDoc::customize("in_standard_filter", "offer as a standard filter")
                .with_alias("infilter"),
            AttributeDoc::customize("bold", "render the value bold"),
            AttributeDoc::customize("translatable", "value participates in translation"),
            AttributeDoc::customize("allow_bulk_edit", "allow editing through bulk update")
                .with_alias("bulk"),
            AttributeDoc::customize("depends_on=<expr>", "show the field only when the expression holds"),
            AttributeDoc::customize("mandatory_depends_on=<expr>", "require the field only when the expression holds")
                .with_alias("mandatory=<expr>"),
            AttributeDoc::customize("read_only_depends_on=<expr>", "lock the field only when the expression holds"),
            AttributeDoc::customize("fetch_from=<field>", "fill the value from a linked document (link_field.source_field)")
                .with_alias("fetch=<field>"),
            AttributeDoc::customize("description=<text>", "help text shown under the field")
                .with_alias("desc=<text>"),
            AttributeDoc::customize("width=<int>", "display width in pixels"),
            AttributeDoc::customize("precision=<int>", "decimal precision for float-like types")
                .with_alias("prec=<int>"),
        ],
        examples: vec![
            ExampleDoc {
                definition: "email_id:Data:*:unique".to_string(),
                explanation: "required, unique Data field labeled 'Email Id'".to_string(),
            },
            ExampleDoc {
                definition: "status:Select:options=Open,Closed:?=Open".to_string(),
                explanation: "Select field with two choices, defaulting to Open".to_string(),
            },
            ExampleDoc {
                definition: "customer:Link:options=Customer".to_string(),
                explanation: "Link field referencing the Customer doctype".to_string(),
            },
            ExampleDoc {
                definition: "amount:Currency:?=0".to_string(),
                explanation: "Currency field defaulting to 0".to_string(),
            },
            ExampleDoc {
                definition: "is_active:Check:?=1".to_string(),
                explanation: "checkbox defaulting to checked".to_string(),
            },
            ExampleDoc {
                definition: "discount:Float:insert_after=amount:prec=2".to_string(),
                explanation: "customize-flow field positioned after 'amount' with two decimals".to_string(),
            },
        ],
        notes: vec![
            "fieldnames should be lowercase with underscores; labels are derived automatically".to_string(),
            "the type token is titlecased before matching, so 'datetime' and 'DATETIME' both resolve".to_string(),
            "the '*' token may appear anywhere after the type".to_string(),
            "when the same attribute is given twice, the last occurrence wins".to_string(),
            "unknown attribute tokens are rejected, never silently ignored".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_lists_every_field_type() {
        let reference = syntax_reference();

        assert_eq!(reference.field_types.len(), FieldType::ALL.len());
        for t in FieldType::ALL {
            assert!(reference.field_types.contains(&t.as_str().to_string()));
        }
    }

    #[test]
    fn test_reference_version_matches_constant() {
        assert_eq!(syntax_reference().version, FIELD_SYNTAX_VERSION);
    }

    #[test]
    fn test_reference_examples_parse_under_their_grammar() {
        use crate::{FieldGrammar, parse_field_definition};

        let reference = syntax_reference();
        for example in &reference.examples {
            let create = parse_field_definition(&example.definition, FieldGrammar::Create);
            let customize = parse_field_definition(&example.definition, FieldGrammar::Customize);
            assert!(
                create.is_ok() || customize.is_ok(),
                "example '{}' does not parse",
                example.definition
            );
        }
    }

    #[test]
    fn test_reference_serializes_compactly() {
        let json = serde_json::to_value(syntax_reference()).unwrap();

        assert!(json["attributes"].as_array().unwrap().len() >= 10);
        let star = &json["attributes"][0];
        assert_eq!(star["token"], "*");
        assert!(star.get("aliases").is_none());
        assert!(star.get("customize_only").is_none());
    }
}
