//! Error taxonomy shared by the CLI and REST surfaces.
//!
//! Every failure a dispatch operation can produce maps onto a fixed
//! [`ErrorCode`] vocabulary. The REST layer renders the code and its HTTP
//! status into the failure envelope; the CLI prints the message plus the
//! hint where one exists.

use metaforge_client::BackendError;
use metaforge_core::BatchParseError;
use serde_json::{Value, json};

/// Doctypes owned by the framework core. Customizing these corrupts the
/// framework's own metadata, so every mutating operation refuses them.
pub const CORE_DOCTYPES: &[&str] = &[
    "DefaultValue",
    "DocType",
    "DocField",
    "DocPerm",
    "DocType Action",
    "DocType Link",
    "User",
    "Role",
    "Has Role",
    "Page",
    "Module Def",
    "Print Format",
    "Report",
    "Customize Form",
    "Customize Form Field",
    "Property Setter",
    "Custom Field",
    "Client Script",
];

/// Returns true when `name` is in the protected [`CORE_DOCTYPES`] list.
pub fn is_core_doctype(name: &str) -> bool {
    CORE_DOCTYPES.contains(&name)
}

/// Stable error codes exposed to callers of both surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PermissionDenied,
    DoctypeExists,
    DoctypeNotFound,
    ModuleNotFound,
    CoreDoctype,
    SingleDoctype,
    CustomDoctype,
    FieldExists,
    FieldNotFound,
    ValidationError,
    InternalError,
}

impl ErrorCode {
    /// Every code, in documentation order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::PermissionDenied,
        ErrorCode::DoctypeExists,
        ErrorCode::DoctypeNotFound,
        ErrorCode::ModuleNotFound,
        ErrorCode::CoreDoctype,
        ErrorCode::SingleDoctype,
        ErrorCode::CustomDoctype,
        ErrorCode::FieldExists,
        ErrorCode::FieldNotFound,
        ErrorCode::ValidationError,
        ErrorCode::InternalError,
    ];

    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::DoctypeExists => "DOCTYPE_EXISTS",
            ErrorCode::DoctypeNotFound => "DOCTYPE_NOT_FOUND",
            ErrorCode::ModuleNotFound => "MODULE_NOT_FOUND",
            ErrorCode::CoreDoctype => "CORE_DOCTYPE",
            ErrorCode::SingleDoctype => "SINGLE_DOCTYPE",
            ErrorCode::CustomDoctype => "CUSTOM_DOCTYPE",
            ErrorCode::FieldExists => "FIELD_EXISTS",
            ErrorCode::FieldNotFound => "FIELD_NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// The HTTP status the REST surface answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::PermissionDenied => 403,
            ErrorCode::DoctypeExists | ErrorCode::FieldExists => 409,
            ErrorCode::DoctypeNotFound | ErrorCode::FieldNotFound => 404,
            ErrorCode::ModuleNotFound
            | ErrorCode::CoreDoctype
            | ErrorCode::SingleDoctype
            | ErrorCode::CustomDoctype
            | ErrorCode::ValidationError => 400,
            ErrorCode::InternalError => 500,
        }
    }

    /// One-line description for the documentation dump.
    pub fn summary(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "caller lacks the System Manager role",
            ErrorCode::DoctypeExists => "a DocType with the given name already exists",
            ErrorCode::DoctypeNotFound => "the target DocType does not exist",
            ErrorCode::ModuleNotFound => "the named module or app is not installed",
            ErrorCode::CoreDoctype => "the target is a protected core DocType",
            ErrorCode::SingleDoctype => "the target is a single DocType",
            ErrorCode::CustomDoctype => "the target is itself a custom DocType",
            ErrorCode::FieldExists => "a field with that name already exists on the DocType",
            ErrorCode::FieldNotFound => "the named field does not exist on the DocType",
            ErrorCode::ValidationError => "invalid field definition or parameters",
            ErrorCode::InternalError => "unexpected backend failure",
        }
    }

    /// Suggested remedy for the documentation dump.
    pub fn remedy(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "use an API key for a user with the System Manager role",
            ErrorCode::DoctypeExists => "use a different name, or add fields to the existing DocType",
            ErrorCode::DoctypeNotFound => "check the DocType name spelling, or create it first",
            ErrorCode::ModuleNotFound => "use 'Custom' or install the app first",
            ErrorCode::CoreDoctype => "core DocTypes cannot be customized",
            ErrorCode::SingleDoctype => "single DocTypes cannot take custom fields",
            ErrorCode::CustomDoctype => "edit the custom DocType directly instead",
            ErrorCode::FieldExists => "use a different fieldname, or override the existing field with set-property",
            ErrorCode::FieldNotFound => "check the field name spelling",
            ErrorCode::ValidationError => "check the field syntax and request parameters",
            ErrorCode::InternalError => "inspect the backend logs",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one dispatch operation.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("DocType '{0}' already exists")]
    DoctypeExists(String),

    #[error("DocType '{0}' not found")]
    DoctypeNotFound(String),

    #[error("Module or App '{0}' not found")]
    ModuleNotFound(String),

    #[error("cannot customize core DocType '{0}'")]
    CoreDoctype(String),

    #[error("cannot customize single DocType '{0}'")]
    SingleDoctype(String),

    #[error("cannot add custom fields to custom DocType '{0}'")]
    CustomDoctype(String),

    #[error("field '{fieldname}' already exists on DocType '{doctype}'")]
    FieldExists { doctype: String, fieldname: String },

    #[error("field '{fieldname}' not found on DocType '{doctype}'")]
    FieldNotFound { doctype: String, fieldname: String },

    #[error(transparent)]
    Parse(#[from] BatchParseError),

    #[error("{message}")]
    Validation {
        message: String,
        /// Request parameter at fault, reported in the failure envelope.
        field: Option<&'static str>,
    },

    #[error("backend request failed: {0}")]
    Internal(String),
}

impl OpsError {
    pub(crate) fn validation(message: impl Into<String>, field: Option<&'static str>) -> Self {
        OpsError::Validation {
            message: message.into(),
            field,
        }
    }

    /// Maps backend failures that escaped the pre-checks. Conflicts are
    /// mapped at the call site where the colliding name is known.
    pub(crate) fn from_backend(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(message) | BackendError::Forbidden(message) => {
                OpsError::PermissionDenied(message)
            }
            other => OpsError::Internal(other.to_string()),
        }
    }

    /// The stable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            OpsError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            OpsError::DoctypeExists(_) => ErrorCode::DoctypeExists,
            OpsError::DoctypeNotFound(_) => ErrorCode::DoctypeNotFound,
            OpsError::ModuleNotFound(_) => ErrorCode::ModuleNotFound,
            OpsError::CoreDoctype(_) => ErrorCode::CoreDoctype,
            OpsError::SingleDoctype(_) => ErrorCode::SingleDoctype,
            OpsError::CustomDoctype(_) => ErrorCode::CustomDoctype,
            OpsError::FieldExists { .. } => ErrorCode::FieldExists,
            OpsError::FieldNotFound { .. } => ErrorCode::FieldNotFound,
            OpsError::Parse(_) | OpsError::Validation { .. } => ErrorCode::ValidationError,
            OpsError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Actionable follow-up for the CLI, where one exists.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            OpsError::PermissionDenied(_) => {
                Some("use an API key for a user with the System Manager role")
            }
            OpsError::ModuleNotFound(_) => Some("use 'Custom' or install the app first"),
            OpsError::CustomDoctype(_) => Some("edit the custom DocType directly instead"),
            OpsError::FieldExists { .. } => {
                Some("use a different fieldname, or override the existing field with set-property")
            }
            _ => None,
        }
    }

    /// Structured context for the REST failure envelope.
    pub fn details(&self) -> Value {
        match self {
            OpsError::DoctypeExists(name) => json!({ "doctype_name": name }),
            OpsError::DoctypeNotFound(name)
            | OpsError::SingleDoctype(name)
            | OpsError::CustomDoctype(name) => json!({ "doctype": name }),
            OpsError::ModuleNotFound(module) => json!({ "module": module }),
            OpsError::CoreDoctype(name) => {
                json!({ "doctype": name, "core_doctypes": CORE_DOCTYPES })
            }
            OpsError::FieldExists { doctype, fieldname }
            | OpsError::FieldNotFound { doctype, fieldname } => {
                json!({ "doctype": doctype, "fieldname": fieldname })
            }
            OpsError::Parse(err) => {
                json!({ "index": err.index, "definition": err.definition })
            }
            OpsError::Validation { field, .. } => match field {
                Some(field) => json!({ "field": field }),
                None => json!({}),
            },
            _ => json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_core::{FieldGrammar, parse_field_definitions};

    #[test]
    fn test_core_doctype_lookup() {
        assert!(is_core_doctype("DocType"));
        assert!(is_core_doctype("Custom Field"));
        assert!(!is_core_doctype("Sales Order"));
    }

    #[test]
    fn test_code_strings_and_statuses() {
        assert_eq!(ErrorCode::PermissionDenied.as_str(), "PERMISSION_DENIED");
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::DoctypeExists.http_status(), 409);
        assert_eq!(ErrorCode::DoctypeNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ModuleNotFound.http_status(), 400);
        assert_eq!(ErrorCode::CoreDoctype.http_status(), 400);
        assert_eq!(ErrorCode::SingleDoctype.http_status(), 400);
        assert_eq!(ErrorCode::CustomDoctype.http_status(), 400);
        assert_eq!(ErrorCode::FieldExists.http_status(), 409);
        assert_eq!(ErrorCode::FieldNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ValidationError.http_status(), 400);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_all_lists_every_code() {
        assert_eq!(ErrorCode::ALL.len(), 11);
    }

    #[test]
    fn test_parse_error_maps_to_validation() {
        let defs = vec!["ok:Data".to_string(), "bad".to_string()];
        let err = parse_field_definitions(&defs, FieldGrammar::Create).unwrap_err();
        let ops: OpsError = err.into();

        assert_eq!(ops.code(), ErrorCode::ValidationError);
        assert_eq!(ops.details()["index"], 1);
        assert_eq!(ops.details()["definition"], "bad");
    }

    #[test]
    fn test_backend_auth_failures_map_to_permission_denied() {
        let err = OpsError::from_backend(BackendError::Forbidden("no role".to_string()));
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert!(err.hint().is_some());

        let err = OpsError::from_backend(BackendError::UnexpectedResponse("odd".to_string()));
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_messages_name_the_target() {
        let err = OpsError::FieldExists {
            doctype: "Task".to_string(),
            fieldname: "priority".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "field 'priority' already exists on DocType 'Task'"
        );

        let err = OpsError::ModuleNotFound("Shipping".to_string());
        assert_eq!(err.to_string(), "Module or App 'Shipping' not found");
    }
}
