//! Field-definition parsing.
//!
//! Converts the compact `fieldname:fieldtype[:attribute...]` syntax into
//! [`FieldSpec`] records. Parsing is pure: no I/O, no shared state, and a
//! given input string always produces the same result.
//!
//! Two grammars exist. [`FieldGrammar::Create`] covers new-doctype flows
//! and accepts the base attribute set (`*`, `unique`, `readonly`,
//! `options=`, `?=`, `label=`). [`FieldGrammar::Customize`] covers
//! add-field flows and additionally accepts layout and behavior attributes
//! such as `insert_after=`, `hidden`, or `depends_on=`. Unknown attribute
//! tokens are rejected in both grammars rather than ignored, so a typo
//! fails loudly instead of silently dropping a constraint.
//!
//! # Examples
//!
//! ```
//! use metaforge_core::{FieldGrammar, FieldType, parse_field_definition};
//!
//! let field = parse_field_definition("email:Data:*:unique", FieldGrammar::Create).unwrap();
//! assert_eq!(field.fieldname, "email");
//! assert_eq!(field.fieldtype, FieldType::Data);
//! assert_eq!(field.label, "Email");
//! assert!(field.required);
//! assert!(field.unique);
//! assert!(!field.read_only);
//! ```

use thiserror::Error;

use crate::{FieldSpec, FieldType};

/// Which attribute set a definition is parsed against.
///
/// The extended attributes only make sense when adding fields to an
/// existing doctype, so the create flow rejects them as unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldGrammar {
    /// Base grammar for new-doctype fields (the default).
    #[default]
    Create,
    /// Extended grammar for customizing an existing doctype.
    Customize,
}

/// Errors from parsing one field definition.
///
/// Every variant carries the offending token or the original definition
/// verbatim, so messages can be surfaced to the user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    /// Input was empty or whitespace-only.
    #[error("empty field definition")]
    EmptyDefinition,
    /// No type token present (`"email"` instead of `"email:Data"`).
    #[error("missing field type in '{definition}': expected <fieldname>:<fieldtype>")]
    MissingFieldType { definition: String },
    /// Fieldname token empty after trimming (`":Data"`).
    #[error("missing fieldname in '{definition}'")]
    MissingFieldname { definition: String },
    /// Type token is not in the supported set.
    #[error("unsupported field type '{fieldtype}' for '{fieldname}' (supported: {})", supported_types())]
    UnsupportedFieldType { fieldtype: String, fieldname: String },
    /// `options=` given for a type that has no use for it.
    #[error("'options=' is not valid for field type {fieldtype}")]
    OptionsNotApplicable { fieldtype: FieldType },
    /// `?=` value does not fit the field type.
    #[error("invalid default '{value}' for '{fieldname}': expected {expected}")]
    InvalidDefault {
        value: String,
        fieldname: String,
        expected: &'static str,
    },
    /// `width=`/`precision=` value is not an unsigned integer.
    #[error("invalid {attribute} '{value}' in '{definition}': expected an integer")]
    InvalidIntegerAttribute {
        attribute: &'static str,
        value: String,
        definition: String,
    },
    /// Attribute token matched no recognizer of the active grammar.
    #[error("unrecognized attribute '{attribute}' in '{definition}'")]
    UnrecognizedAttribute {
        attribute: String,
        definition: String,
    },
}

/// Error from parsing a batch of field definitions.
///
/// Reports which definition failed (zero-based `index`, shown one-based)
/// and wraps the underlying [`FieldParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field definition {} ('{definition}'): {source}", .index + 1)]
pub struct BatchParseError {
    /// Zero-based position of the failing definition.
    pub index: usize,
    /// The failing definition, verbatim.
    pub definition: String,
    /// The underlying parse failure.
    pub source: FieldParseError,
}

fn supported_types() -> String {
    FieldType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses one `fieldname:fieldtype[:attribute...]` definition.
///
/// Tokens are colon-separated and individually trimmed. The first token is
/// the fieldname, the second the type, and every remaining token is matched
/// against the attribute recognizers of the active grammar (first match
/// wins; empty tokens from stray colons are skipped). When the same
/// attribute appears more than once, the last occurrence wins.
///
/// # Examples
///
/// ```
/// use metaforge_core::{FieldGrammar, parse_field_definition};
///
/// let field = parse_field_definition(
///     "status:Select:options=Open,Closed:?=Open",
///     FieldGrammar::Create,
/// ).unwrap();
/// assert_eq!(field.options.as_deref(), Some("Open,Closed"));
/// assert_eq!(field.default.as_deref(), Some("Open"));
///
/// let err = parse_field_definition("x:NotAType", FieldGrammar::Create).unwrap_err();
/// assert!(err.to_string().contains("NotAType"));
/// ```
pub fn parse_field_definition(
    definition: &str,
    grammar: FieldGrammar,
) -> Result<FieldSpec, FieldParseError> {
    let trimmed = definition.trim();
    if trimmed.is_empty() {
        return Err(FieldParseError::EmptyDefinition);
    }

    let parts: Vec<&str> = trimmed.split(':').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(FieldParseError::MissingFieldType {
            definition: trimmed.to_string(),
        });
    }

    let fieldname = parts[0];
    if fieldname.is_empty() {
        return Err(FieldParseError::MissingFieldname {
            definition: trimmed.to_string(),
        });
    }

    let raw_type = parts[1];
    let fieldtype =
        FieldType::parse_token(raw_type).ok_or_else(|| FieldParseError::UnsupportedFieldType {
            fieldtype: raw_type.to_string(),
            fieldname: fieldname.to_string(),
        })?;

    let mut field = FieldSpec::new(fieldname, fieldtype);
    for token in &parts[2..] {
        if token.is_empty() {
            continue;
        }
        apply_attribute(&mut field, token, trimmed, grammar)?;
    }

    Ok(field)
}

/// Parses an ordered batch of field definitions.
///
/// Output order matches input order, which determines insertion order into
/// the target doctype when no explicit anchor overrides it. The batch is
/// all-or-nothing: the first invalid definition aborts the whole parse, so
/// a caller never holds a partially parsed batch.
///
/// # Examples
///
/// ```
/// use metaforge_core::{FieldGrammar, parse_field_definitions};
///
/// let defs = vec!["a:Data".to_string(), "b:Int:*".to_string()];
/// let fields = parse_field_definitions(&defs, FieldGrammar::Create).unwrap();
/// assert_eq!(fields[0].fieldname, "a");
/// assert_eq!(fields[1].fieldname, "b");
///
/// let defs = vec!["a:Data".to_string(), "b:NotAType".to_string()];
/// let err = parse_field_definitions(&defs, FieldGrammar::Create).unwrap_err();
/// assert_eq!(err.index, 1);
/// ```
pub fn parse_field_definitions(
    definitions: &[String],
    grammar: FieldGrammar,
) -> Result<Vec<FieldSpec>, BatchParseError> {
    let mut fields = Vec::with_capacity(definitions.len());
    for (index, definition) in definitions.iter().enumerate() {
        match parse_field_definition(definition, grammar) {
            Ok(field) => fields.push(field),
            Err(source) => {
                return Err(BatchParseError {
                    index,
                    definition: definition.clone(),
                    source,
                });
            }
        }
    }
    Ok(fields)
}

fn apply_attribute(
    field: &mut FieldSpec,
    token: &str,
    definition: &str,
    grammar: FieldGrammar,
) -> Result<(), FieldParseError> {
    if token == "*" {
        field.required = true;
        return Ok(());
    }

    let lowered = token.to_ascii_lowercase();
    match lowered.as_str() {
        "unique" => {
            field.unique = true;
            return Ok(());
        }
        "readonly" => {
            field.read_only = true;
            return Ok(());
        }
        _ => {}
    }

    if let Some(value) = token.strip_prefix("options=") {
        if !field.fieldtype.takes_options() {
            return Err(FieldParseError::OptionsNotApplicable {
                fieldtype: field.fieldtype,
            });
        }
        field.options = Some(value.trim().to_string());
        return Ok(());
    }

    if let Some(value) = token.strip_prefix("?=") {
        field.default = Some(check_default(field.fieldtype, &field.fieldname, value.trim())?);
        return Ok(());
    }

    if let Some(value) = token.strip_prefix("label=") {
        field.label = value.trim().to_string();
        return Ok(());
    }

    if grammar == FieldGrammar::Customize {
        if let Some(applied) = apply_customize_attribute(field, token, &lowered, definition)? {
            return Ok(applied);
        }
    }

    Err(FieldParseError::UnrecognizedAttribute {
        attribute: token.to_string(),
        definition: definition.to_string(),
    })
}

/// Recognizers that only exist under [`FieldGrammar::Customize`].
///
/// Returns `Ok(Some(()))` when the token was consumed, `Ok(None)` when no
/// recognizer matched (the caller reports it as unrecognized).
fn apply_customize_attribute(
    field: &mut FieldSpec,
    token: &str,
    lowered: &str,
    definition: &str,
) -> Result<Option<()>, FieldParseError> {
    match lowered {
        "hidden" => {
            field.hidden = true;
            return Ok(Some(()));
        }
        "in_list_view" | "inlist" => {
            field.in_list_view = true;
            return Ok(Some(()));
        }
        "in_standard_filter" | "infilter" => {
            field.in_standard_filter = true;
            return Ok(Some(()));
        }
        "bold" => {
            field.bold = true;
            return Ok(Some(()));
        }
        "translatable" => {
            field.translatable = true;
            return Ok(Some(()));
        }
        "allow_bulk_edit" | "bulk" => {
            field.allow_bulk_edit = true;
            return Ok(Some(()));
        }
        _ => {}
    }

    if let Some(value) = token.strip_prefix("insert_after=") {
        field.insert_after = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token.strip_prefix("depends_on=") {
        field.depends_on = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token
        .strip_prefix("mandatory_depends_on=")
        .or_else(|| token.strip_prefix("mandatory="))
    {
        field.mandatory_depends_on = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token.strip_prefix("read_only_depends_on=") {
        field.read_only_depends_on = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token
        .strip_prefix("fetch_from=")
        .or_else(|| token.strip_prefix("fetch="))
    {
        field.fetch_from = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token
        .strip_prefix("description=")
        .or_else(|| token.strip_prefix("desc="))
    {
        field.description = Some(value.trim().to_string());
        return Ok(Some(()));
    }
    if let Some(value) = token.strip_prefix("width=") {
        field.width = Some(parse_integer_attribute("width", value, definition)?);
        return Ok(Some(()));
    }
    if let Some(value) = token
        .strip_prefix("precision=")
        .or_else(|| token.strip_prefix("prec="))
    {
        field.precision = Some(parse_integer_attribute("precision", value, definition)?);
        return Ok(Some(()));
    }

    Ok(None)
}

fn parse_integer_attribute(
    attribute: &'static str,
    value: &str,
    definition: &str,
) -> Result<u32, FieldParseError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| FieldParseError::InvalidIntegerAttribute {
            attribute,
            value: value.trim().to_string(),
            definition: definition.to_string(),
        })
}

/// Loosely type-checks a `?=` default against the field type.
///
/// Boolean-like types normalize truthy/falsy words to `"1"`/`"0"` and
/// otherwise accept plain digit strings. Float-like types must parse as a
/// number but are kept verbatim. Everything else passes through untouched.
fn check_default(
    fieldtype: FieldType,
    fieldname: &str,
    value: &str,
) -> Result<String, FieldParseError> {
    match fieldtype {
        FieldType::Int | FieldType::Check => {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => return Ok("1".to_string()),
                "0" | "false" | "no" => return Ok("0".to_string()),
                _ => {}
            }
            if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
                return Ok(value.to_string());
            }
            Err(FieldParseError::InvalidDefault {
                value: value.to_string(),
                fieldname: fieldname.to_string(),
                expected: "a boolean or digit literal",
            })
        }
        FieldType::Float | FieldType::Currency | FieldType::Percent => {
            if value.parse::<f64>().is_ok() {
                Ok(value.to_string())
            } else {
                Err(FieldParseError::InvalidDefault {
                    value: value.to_string(),
                    fieldname: fieldname.to_string(),
                    expected: "a numeric literal",
                })
            }
        }
        _ => Ok(value.to_string()),
    }
}
