//! Backend abstraction over the framework's metadata APIs.
//!
//! The dispatcher only ever talks to [`MetadataBackend`]; the trait's
//! method set is exactly the framework surface the operations need
//! (existence probes, module registry, document inserts) and nothing
//! more. [`FrappeClient`](crate::FrappeClient) is the HTTP
//! implementation; tests substitute an in-memory stub.

use async_trait::async_trait;
use metaforge_core::FieldSpec;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Role required for every mutating operation.
pub const SYSTEM_MANAGER_ROLE: &str = "System Manager";

/// What the dispatcher needs to know about an existing doctype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctypeMeta {
    /// Doctype name.
    pub name: String,
    /// Owning module.
    pub module: String,
    /// Created through the UI/API rather than shipped by an app.
    pub custom: bool,
    /// Single doctype (one document, no table).
    pub issingle: bool,
    /// Child-table doctype.
    pub istable: bool,
    /// Fieldnames of standard and custom fields combined.
    pub fieldnames: Vec<String>,
}

impl DoctypeMeta {
    /// Whether the doctype already carries `fieldname`.
    pub fn has_field(&self, fieldname: &str) -> bool {
        self.fieldnames.iter().any(|f| f == fieldname)
    }
}

/// Input to doctype creation.
///
/// The wire layer adds the fixed scaffolding (non-table, non-single,
/// document type "Document", one full-access permission row for
/// [`SYSTEM_MANAGER_ROLE`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctypeDraft {
    /// Name of the doctype to create.
    pub name: String,
    /// Owning module.
    pub module: String,
    /// Register as a custom doctype.
    pub custom: bool,
    /// Fields in insertion order.
    pub fields: Vec<FieldSpec>,
}

/// A property override to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySetter {
    /// Target doctype.
    pub doctype: String,
    /// Target field; `None` when the override applies to the doctype
    /// itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Property name (e.g. `"hidden"`, `"reqd"`).
    pub property: String,
    /// Property value, stringified.
    pub value: String,
    /// Value type as the framework understands it (e.g. `"Data"`,
    /// `"Check"`).
    pub property_type: String,
    /// Override targets the doctype rather than one of its fields.
    pub for_doctype: bool,
}

/// The framework surface the operations are built on.
///
/// Every method is one synchronous question or mutation against the
/// backend; implementations must not cache across calls, since the
/// dispatcher's check-then-insert sequences rely on reads being current.
#[async_trait]
pub trait MetadataBackend: Send + Sync {
    /// Verifies the configured caller holds [`SYSTEM_MANAGER_ROLE`].
    async fn verify_capability(&self) -> Result<(), BackendError>;

    /// Whether a doctype with this name exists.
    async fn doctype_exists(&self, name: &str) -> Result<bool, BackendError>;

    /// Fetches restriction-relevant metadata for an existing doctype.
    async fn doctype_meta(&self, name: &str) -> Result<DoctypeMeta, BackendError>;

    /// Whether a module definition with this name exists.
    async fn module_exists(&self, module: &str) -> Result<bool, BackendError>;

    /// Whether an app with this name is installed on the site.
    async fn app_installed(&self, app: &str) -> Result<bool, BackendError>;

    /// Registers a module definition under an installed app.
    async fn create_module(&self, module: &str, app: &str) -> Result<(), BackendError>;

    /// Inserts a new doctype.
    async fn insert_doctype(&self, draft: &DoctypeDraft) -> Result<(), BackendError>;

    /// Inserts one custom field on an existing doctype.
    async fn insert_custom_field(
        &self,
        doctype: &str,
        field: &FieldSpec,
    ) -> Result<(), BackendError>;

    /// Inserts a property setter.
    async fn insert_property_setter(&self, setter: &PropertySetter) -> Result<(), BackendError>;
}
