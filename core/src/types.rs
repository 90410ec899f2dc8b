//! Field model for doctype scaffolding.
//!
//! This module defines the data model produced by the field-definition
//! parser. The types are designed for serialization with [`serde`] and
//! round-trip through JSON unchanged, so a parsed [`FieldSpec`] can be
//! shown to the user, embedded in API responses, or handed to a backend
//! client as-is.

use serde::{Deserialize, Serialize};

/// Version of the field-definition syntax (semver).
///
/// Embedded in the [`SyntaxReference`](crate::SyntaxReference) so callers
/// of the documentation surfaces can detect grammar changes.
pub const FIELD_SYNTAX_VERSION: &str = "1.0.0";

/// Supported field types, by canonical name.
///
/// The canonical set is fixed; a raw type token is resolved by
/// titlecasing it and matching the result against these names, so
/// `"datetime"`, `"DATETIME"`, and `"Datetime"` all resolve to
/// [`FieldType::Datetime`].
///
/// # Examples
///
/// ```
/// use metaforge_core::FieldType;
///
/// assert_eq!(FieldType::parse_token("select"), Some(FieldType::Select));
/// assert_eq!(FieldType::parse_token("NotAType"), None);
/// assert_eq!(FieldType::Currency.as_str(), "Currency");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Short free text.
    Data,
    /// Long free text.
    Text,
    /// Integer number.
    Int,
    /// Floating-point number.
    Float,
    /// Calendar date.
    Date,
    /// Date and time.
    Datetime,
    /// One choice out of a fixed option list.
    Select,
    /// Reference to a document of another doctype.
    Link,
    /// Nested child table of another doctype.
    Table,
    /// Boolean checkbox.
    Check,
    /// Monetary amount.
    Currency,
    /// Percentage value.
    Percent,
}

impl FieldType {
    /// Every supported type, in documentation order.
    pub const ALL: &'static [FieldType] = &[
        FieldType::Data,
        FieldType::Text,
        FieldType::Int,
        FieldType::Float,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Select,
        FieldType::Link,
        FieldType::Table,
        FieldType::Check,
        FieldType::Currency,
        FieldType::Percent,
    ];

    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Data => "Data",
            FieldType::Text => "Text",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Date => "Date",
            FieldType::Datetime => "Datetime",
            FieldType::Select => "Select",
            FieldType::Link => "Link",
            FieldType::Table => "Table",
            FieldType::Check => "Check",
            FieldType::Currency => "Currency",
            FieldType::Percent => "Percent",
        }
    }

    /// Resolves a raw type token from a field definition.
    ///
    /// The token is trimmed and titlecased before the (case-sensitive)
    /// match against the canonical names, so common casings resolve while
    /// misspellings do not.
    ///
    /// # Examples
    ///
    /// ```
    /// use metaforge_core::FieldType;
    ///
    /// assert_eq!(FieldType::parse_token(" datetime "), Some(FieldType::Datetime));
    /// assert_eq!(FieldType::parse_token("Datettime"), None);
    /// ```
    pub fn parse_token(raw: &str) -> Option<Self> {
        let canonical = title_case(raw.trim());
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == canonical)
    }

    /// Whether `options=` carries meaning for this type.
    ///
    /// `Select` uses options as its choice list; `Link` and `Table` use
    /// them as the target doctype name. Every other type rejects the
    /// attribute.
    pub fn takes_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Link | FieldType::Table)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed field definition.
///
/// Produced by [`parse_field_definition`](crate::parse_field_definition),
/// consumed by whichever backend call registers the field. The record has
/// no lifecycle of its own: it is never persisted by this tool.
///
/// The extended attributes past `default` are only populated by the
/// customize grammar (adding fields to an existing doctype); the create
/// grammar leaves them at their defaults.
///
/// # Examples
///
/// ```
/// use metaforge_core::{FieldSpec, FieldType};
///
/// let field = FieldSpec::new("email_id", FieldType::Data)
///     .required()
///     .unique();
///
/// assert_eq!(field.label, "Email Id");
/// assert!(field.required);
/// assert!(!field.read_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field identifier within the target doctype.
    pub fieldname: String,
    /// Field type (canonical).
    pub fieldtype: FieldType,
    /// Display label; derived from the fieldname unless overridden.
    pub label: String,
    /// Value must be provided.
    pub required: bool,
    /// Value must be unique across documents.
    pub unique: bool,
    /// Value cannot be edited through forms.
    pub read_only: bool,
    /// Choice list (`Select`) or target doctype (`Link`/`Table`), verbatim
    /// as given. Select choices are kept comma/pipe separated here and only
    /// normalized when a wire payload is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    /// Default value literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Name of the existing field this one is positioned after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<String>,
    /// Hidden from forms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Shown as a list-view column.
    #[serde(default, skip_serializing_if = "is_false")]
    pub in_list_view: bool,
    /// Offered as a standard filter.
    #[serde(default, skip_serializing_if = "is_false")]
    pub in_standard_filter: bool,
    /// Rendered bold in forms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    /// Value participates in translation.
    #[serde(default, skip_serializing_if = "is_false")]
    pub translatable: bool,
    /// Editable through bulk edit.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_bulk_edit: bool,
    /// Conditional-visibility expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Conditional-required expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_depends_on: Option<String>,
    /// Conditional-read-only expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_depends_on: Option<String>,
    /// Source path to fetch the value from (`link_field.source_field`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_from: Option<String>,
    /// Help text shown under the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Decimal precision for float-like types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl FieldSpec {
    /// Creates a field with the label derived from the fieldname.
    ///
    /// # Examples
    ///
    /// ```
    /// use metaforge_core::{FieldSpec, FieldType};
    ///
    /// let field = FieldSpec::new("delivery_date", FieldType::Date);
    /// assert_eq!(field.label, "Delivery Date");
    /// ```
    pub fn new(fieldname: &str, fieldtype: FieldType) -> Self {
        Self {
            fieldname: fieldname.to_string(),
            fieldtype,
            label: derive_label(fieldname),
            required: false,
            unique: false,
            read_only: false,
            options: None,
            default: None,
            insert_after: None,
            hidden: false,
            in_list_view: false,
            in_standard_filter: false,
            bold: false,
            translatable: false,
            allow_bulk_edit: false,
            depends_on: None,
            mandatory_depends_on: None,
            read_only_depends_on: None,
            fetch_from: None,
            description: None,
            width: None,
            precision: None,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the field as read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Sets the options payload.
    pub fn with_options(mut self, options: &str) -> Self {
        self.options = Some(options.to_string());
        self
    }

    /// Sets the default value literal.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Overrides the derived label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Sets the positioning anchor.
    pub fn with_insert_after(mut self, anchor: &str) -> Self {
        self.insert_after = Some(anchor.to_string());
        self
    }
}

/// Derives a display label from a fieldname.
///
/// Underscores become spaces and each word is titlecased, so
/// `"email_id"` becomes `"Email Id"`.
///
/// # Examples
///
/// ```
/// use metaforge_core::derive_label;
///
/// assert_eq!(derive_label("status"), "Status");
/// assert_eq!(derive_label("customer_name"), "Customer Name");
/// ```
pub fn derive_label(fieldname: &str) -> String {
    title_case(&fieldname.replace('_', " "))
}

/// Titlecases a string: the first letter of every word becomes uppercase,
/// the rest lowercase. A word boundary is any non-alphabetic character.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
