//! Command dispatcher.
//!
//! The one place that sequences an operation: local validation, then
//! parsing (fail fast, no backend traffic on bad input), then the
//! capability check, then existence and restriction checks, then the
//! mutation itself. Mutations are at-most-once; a failure mid-batch
//! leaves earlier insertions in place and reports the failing field.

use std::collections::HashSet;

use metaforge_client::{
    BackendError, DoctypeDraft, DoctypeMeta, MetadataBackend, PropertySetter,
};
use metaforge_core::{FieldGrammar, parse_field_definitions};
use serde_json::Value;

use crate::error::{OpsError, is_core_doctype};
use crate::requests::{
    AddFieldsRequest, CreateDoctypeRequest, CustomFieldAdded, DoctypeCreated, PropertySet,
    SetPropertyRequest,
};

/// Module every doctype lands in when no other module is named.
pub const DEFAULT_MODULE: &str = "Custom";

/// Renders a JSON scalar into the property-setter wire value. Booleans
/// follow the backend's 0/1 convention.
fn scalar_value(value: &Value) -> Result<String, OpsError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(OpsError::validation(
            "value must be a scalar (string, number, or boolean)",
            Some("value"),
        )),
    }
}

/// Executes the three mutating operations against a [`MetadataBackend`].
///
/// Construction takes the backend explicitly; the dispatcher holds no
/// other state and no global session.
///
/// # Examples
///
/// ```no_run
/// use metaforge_client::{FrappeClient, SiteConfig};
/// use metaforge_ops::{CreateDoctypeRequest, Dispatcher};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FrappeClient::new(SiteConfig::resolve(None)?)?;
/// let dispatcher = Dispatcher::new(client);
///
/// let created = dispatcher
///     .create_doctype(CreateDoctypeRequest {
///         doctype_name: "Product".to_string(),
///         fields: vec!["product_name:Data:*".to_string()],
///         module: None,
///         custom: false,
///     })
///     .await?;
/// assert_eq!(created.module, "Custom");
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<B> {
    backend: B,
}

impl<B: MetadataBackend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates a new doctype with the given parsed fields.
    pub async fn create_doctype(
        &self,
        request: CreateDoctypeRequest,
    ) -> Result<DoctypeCreated, OpsError> {
        let name = request.doctype_name.trim();
        if name.is_empty() {
            return Err(OpsError::validation(
                "doctype_name is required and cannot be empty",
                Some("doctype_name"),
            ));
        }

        let fields = parse_field_definitions(&request.fields, FieldGrammar::Create)?;

        self.verify_capability().await?;

        if self
            .backend
            .doctype_exists(name)
            .await
            .map_err(OpsError::from_backend)?
        {
            return Err(OpsError::DoctypeExists(name.to_string()));
        }

        let (module, custom) = self
            .resolve_module(request.module.as_deref(), request.custom)
            .await?;

        let draft = DoctypeDraft {
            name: name.to_string(),
            module,
            custom,
            fields,
        };
        let fields_count = draft.fields.len();
        tracing::debug!(
            doctype = %draft.name,
            module = %draft.module,
            custom = draft.custom,
            fields = fields_count,
            "inserting doctype"
        );

        self.backend.insert_doctype(&draft).await.map_err(|err| match err {
            BackendError::Conflict(_) => OpsError::DoctypeExists(draft.name.clone()),
            other => OpsError::from_backend(other),
        })?;

        Ok(DoctypeCreated {
            doctype_name: draft.name,
            module: draft.module,
            fields_count,
            custom,
        })
    }

    /// Adds custom fields to an existing standard doctype, in input order.
    pub async fn add_custom_fields(
        &self,
        request: AddFieldsRequest,
    ) -> Result<Vec<CustomFieldAdded>, OpsError> {
        let doctype = request.doctype.trim();
        if doctype.is_empty() {
            return Err(OpsError::validation(
                "doctype is required and cannot be empty",
                Some("doctype"),
            ));
        }
        if request.fields.is_empty() {
            return Err(OpsError::validation(
                "at least one field definition is required",
                Some("fields"),
            ));
        }

        let fields = parse_field_definitions(&request.fields, FieldGrammar::Customize)?;

        self.verify_capability().await?;

        let meta = self.doctype_meta(doctype).await?;
        self.check_customizable(doctype, &meta)?;
        if meta.custom {
            return Err(OpsError::CustomDoctype(doctype.to_string()));
        }

        let explicit_anchor = request
            .insert_after
            .as_deref()
            .map(str::trim)
            .filter(|anchor| !anchor.is_empty())
            .map(String::from);

        let mut existing: HashSet<String> = meta.fieldnames.iter().cloned().collect();
        let mut previous: Option<String> = None;
        let mut added = Vec::with_capacity(fields.len());

        for mut field in fields {
            if let Some(anchor) = &explicit_anchor {
                field.insert_after = Some(anchor.clone());
            } else if field.insert_after.is_none() {
                field.insert_after = previous.clone();
            }

            if existing.contains(&field.fieldname) {
                return Err(OpsError::FieldExists {
                    doctype: doctype.to_string(),
                    fieldname: field.fieldname,
                });
            }

            tracing::debug!(
                doctype,
                fieldname = %field.fieldname,
                fieldtype = %field.fieldtype,
                "inserting custom field"
            );
            self.backend
                .insert_custom_field(doctype, &field)
                .await
                .map_err(|err| match err {
                    BackendError::Conflict(_) => OpsError::FieldExists {
                        doctype: doctype.to_string(),
                        fieldname: field.fieldname.clone(),
                    },
                    other => OpsError::from_backend(other),
                })?;

            existing.insert(field.fieldname.clone());
            previous = Some(field.fieldname.clone());

            added.push(CustomFieldAdded {
                doctype: doctype.to_string(),
                fieldname: field.fieldname,
                fieldtype: field.fieldtype,
                label: field.label,
                required: field.required,
                unique: field.unique,
                read_only: field.read_only,
                insert_after: field.insert_after,
            });
        }

        Ok(added)
    }

    /// Creates a property override for a doctype or one of its fields.
    pub async fn set_property(
        &self,
        request: SetPropertyRequest,
    ) -> Result<PropertySet, OpsError> {
        let doctype = request.doctype.trim();
        if doctype.is_empty() {
            return Err(OpsError::validation(
                "doctype is required and cannot be empty",
                Some("doctype"),
            ));
        }
        let property = request.property.trim();
        if property.is_empty() {
            return Err(OpsError::validation(
                "property is required and cannot be empty",
                Some("property"),
            ));
        }
        let value = scalar_value(&request.value)?;

        let field_name = request
            .field_name
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty());
        if !request.for_doctype && field_name.is_none() {
            return Err(OpsError::validation(
                "field_name is required when for_doctype is false",
                Some("field_name"),
            ));
        }
        // Doctype-level overrides ignore any field argument.
        let field_name = if request.for_doctype { None } else { field_name };

        self.verify_capability().await?;

        let meta = self.doctype_meta(doctype).await?;
        self.check_customizable(doctype, &meta)?;

        if let Some(fieldname) = field_name {
            if !meta.has_field(fieldname) {
                return Err(OpsError::FieldNotFound {
                    doctype: doctype.to_string(),
                    fieldname: fieldname.to_string(),
                });
            }
        }

        let property_type = request
            .property_type
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .unwrap_or("Data")
            .to_string();

        let setter = PropertySetter {
            doctype: doctype.to_string(),
            field_name: field_name.map(String::from),
            property: property.to_string(),
            value,
            property_type,
            for_doctype: request.for_doctype,
        };
        tracing::debug!(
            doctype,
            property = %setter.property,
            for_doctype = setter.for_doctype,
            "inserting property setter"
        );

        self.backend
            .insert_property_setter(&setter)
            .await
            .map_err(OpsError::from_backend)?;

        let doctype_or_field = if setter.for_doctype {
            "DocType"
        } else {
            "DocField"
        };
        Ok(PropertySet {
            doctype: setter.doctype,
            field_name: setter.field_name,
            property: setter.property,
            value: setter.value,
            property_type: setter.property_type,
            doctype_or_field: doctype_or_field.to_string(),
        })
    }

    async fn verify_capability(&self) -> Result<(), OpsError> {
        self.backend
            .verify_capability()
            .await
            .map_err(OpsError::from_backend)
    }

    async fn doctype_meta(&self, doctype: &str) -> Result<DoctypeMeta, OpsError> {
        match self.backend.doctype_meta(doctype).await {
            Ok(meta) => Ok(meta),
            Err(BackendError::NotFound(_)) => Err(OpsError::DoctypeNotFound(doctype.to_string())),
            Err(other) => Err(OpsError::from_backend(other)),
        }
    }

    /// Restrictions shared by customization operations: core doctypes and
    /// single doctypes are never touched.
    fn check_customizable(&self, doctype: &str, meta: &DoctypeMeta) -> Result<(), OpsError> {
        if is_core_doctype(doctype) {
            return Err(OpsError::CoreDoctype(doctype.to_string()));
        }
        if meta.issingle {
            return Err(OpsError::SingleDoctype(doctype.to_string()));
        }
        Ok(())
    }

    /// Module resolution for new doctypes.
    ///
    /// No module, or "custom" in any casing, lands in [`DEFAULT_MODULE`]
    /// as a custom doctype. A named module is reused when its Module Def
    /// exists, auto-created when an installed app of that name exists,
    /// and rejected otherwise.
    async fn resolve_module(
        &self,
        module: Option<&str>,
        custom: bool,
    ) -> Result<(String, bool), OpsError> {
        let requested = module.map(str::trim).filter(|name| !name.is_empty());
        let Some(name) = requested else {
            return Ok((DEFAULT_MODULE.to_string(), true));
        };
        if name.eq_ignore_ascii_case(DEFAULT_MODULE) {
            return Ok((DEFAULT_MODULE.to_string(), true));
        }

        if self
            .backend
            .module_exists(name)
            .await
            .map_err(OpsError::from_backend)?
        {
            return Ok((name.to_string(), custom));
        }

        if self
            .backend
            .app_installed(name)
            .await
            .map_err(OpsError::from_backend)?
        {
            tracing::debug!(module = name, "creating module for installed app");
            self.backend
                .create_module(name, name)
                .await
                .map_err(OpsError::from_backend)?;
            return Ok((name.to_string(), custom));
        }

        Err(OpsError::ModuleNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use metaforge_core::FieldSpec;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        doctypes: HashMap<String, DoctypeMeta>,
        modules: HashSet<String>,
        apps: HashSet<String>,
        drafts: Vec<DoctypeDraft>,
        custom_fields: Vec<(String, FieldSpec)>,
        setters: Vec<PropertySetter>,
        calls: Vec<String>,
    }

    #[derive(Default)]
    struct StubBackend {
        deny_capability: bool,
        fail_field_insert: Option<String>,
        inner: Mutex<Recorded>,
    }

    fn meta(name: &str, fieldnames: &[&str]) -> DoctypeMeta {
        DoctypeMeta {
            name: name.to_string(),
            module: "Selling".to_string(),
            custom: false,
            issingle: false,
            istable: false,
            fieldnames: fieldnames.iter().map(|f| f.to_string()).collect(),
        }
    }

    impl StubBackend {
        fn with_doctype(self, meta: DoctypeMeta) -> Self {
            self.inner.lock().unwrap().doctypes.insert(meta.name.clone(), meta);
            self
        }

        fn with_module(self, name: &str) -> Self {
            self.inner.lock().unwrap().modules.insert(name.to_string());
            self
        }

        fn with_app(self, name: &str) -> Self {
            self.inner.lock().unwrap().apps.insert(name.to_string());
            self
        }

        fn deny_capability(mut self) -> Self {
            self.deny_capability = true;
            self
        }

        fn fail_field_insert(mut self, fieldname: &str) -> Self {
            self.fail_field_insert = Some(fieldname.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.inner.lock().unwrap().calls.clone()
        }

        fn record(&self, call: &str) {
            self.inner.lock().unwrap().calls.push(call.to_string());
        }
    }

    #[async_trait]
    impl MetadataBackend for StubBackend {
        async fn verify_capability(&self) -> Result<(), BackendError> {
            self.record("verify_capability");
            if self.deny_capability {
                Err(BackendError::Forbidden(
                    "Insufficient permissions. System Manager role required.".to_string(),
                ))
            } else {
                Ok(())
            }
        }

        async fn doctype_exists(&self, name: &str) -> Result<bool, BackendError> {
            self.record("doctype_exists");
            Ok(self.inner.lock().unwrap().doctypes.contains_key(name))
        }

        async fn doctype_meta(&self, name: &str) -> Result<DoctypeMeta, BackendError> {
            self.record("doctype_meta");
            self.inner
                .lock()
                .unwrap()
                .doctypes
                .get(name)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(format!("DocType '{name}' not found")))
        }

        async fn module_exists(&self, module: &str) -> Result<bool, BackendError> {
            self.record("module_exists");
            Ok(self.inner.lock().unwrap().modules.contains(module))
        }

        async fn app_installed(&self, app: &str) -> Result<bool, BackendError> {
            self.record("app_installed");
            Ok(self.inner.lock().unwrap().apps.contains(app))
        }

        async fn create_module(&self, module: &str, _app: &str) -> Result<(), BackendError> {
            self.record("create_module");
            self.inner.lock().unwrap().modules.insert(module.to_string());
            Ok(())
        }

        async fn insert_doctype(&self, draft: &DoctypeDraft) -> Result<(), BackendError> {
            self.record("insert_doctype");
            self.inner.lock().unwrap().drafts.push(draft.clone());
            Ok(())
        }

        async fn insert_custom_field(
            &self,
            doctype: &str,
            field: &FieldSpec,
        ) -> Result<(), BackendError> {
            self.record("insert_custom_field");
            if self.fail_field_insert.as_deref() == Some(field.fieldname.as_str()) {
                return Err(BackendError::Api {
                    status: 500,
                    message: "insert failed".to_string(),
                });
            }
            self.inner
                .lock()
                .unwrap()
                .custom_fields
                .push((doctype.to_string(), field.clone()));
            Ok(())
        }

        async fn insert_property_setter(
            &self,
            setter: &PropertySetter,
        ) -> Result<(), BackendError> {
            self.record("insert_property_setter");
            self.inner.lock().unwrap().setters.push(setter.clone());
            Ok(())
        }
    }

    fn create_request(name: &str, fields: &[&str]) -> CreateDoctypeRequest {
        CreateDoctypeRequest {
            doctype_name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            module: None,
            custom: false,
        }
    }

    fn add_request(doctype: &str, fields: &[&str]) -> AddFieldsRequest {
        AddFieldsRequest {
            doctype: doctype.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            insert_after: None,
        }
    }

    #[tokio::test]
    async fn test_create_doctype_defaults_to_custom_module() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let created = dispatcher
            .create_doctype(create_request("Product", &["product_name:Data:*", "price:Currency:?=0"]))
            .await
            .unwrap();

        assert_eq!(created.doctype_name, "Product");
        assert_eq!(created.module, "Custom");
        assert!(created.custom);
        assert_eq!(created.fields_count, 2);

        let inner = dispatcher.backend().inner.lock().unwrap();
        let draft = &inner.drafts[0];
        assert_eq!(draft.fields[0].fieldname, "product_name");
        assert!(draft.fields[0].required);
        assert_eq!(draft.fields[1].default.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_create_doctype_blank_name_is_validation_error() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let err = dispatcher
            .create_doctype(create_request("   ", &[]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(dispatcher.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_doctype_parse_failure_stops_before_backend() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let err = dispatcher
            .create_doctype(create_request("Product", &["ok:Data", "bad:NotAType"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.to_string().contains("NotAType"));
        assert!(dispatcher.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_doctype_capability_checked_after_parse() {
        let dispatcher = Dispatcher::new(StubBackend::default().deny_capability());

        let err = dispatcher
            .create_doctype(create_request("Product", &["name:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert_eq!(dispatcher.backend().calls(), vec!["verify_capability"]);
    }

    #[tokio::test]
    async fn test_create_doctype_existing_name_conflicts() {
        let backend = StubBackend::default().with_doctype(meta("Product", &[]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .create_doctype(create_request("Product", &[]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DoctypeExists);
        assert_eq!(err.to_string(), "DocType 'Product' already exists");
    }

    #[tokio::test]
    async fn test_create_doctype_reuses_existing_module() {
        let backend = StubBackend::default().with_module("Selling");
        let dispatcher = Dispatcher::new(backend);

        let mut request = create_request("Quote Log", &[]);
        request.module = Some("Selling".to_string());
        let created = dispatcher.create_doctype(request).await.unwrap();

        assert_eq!(created.module, "Selling");
        assert!(!created.custom);
        assert!(!dispatcher.backend().calls().contains(&"create_module".to_string()));
    }

    #[tokio::test]
    async fn test_create_doctype_auto_creates_module_for_installed_app() {
        let backend = StubBackend::default().with_app("shipping");
        let dispatcher = Dispatcher::new(backend);

        let mut request = create_request("Parcel", &[]);
        request.module = Some("shipping".to_string());
        let created = dispatcher.create_doctype(request).await.unwrap();

        assert_eq!(created.module, "shipping");
        assert!(dispatcher.backend().calls().contains(&"create_module".to_string()));
    }

    #[tokio::test]
    async fn test_create_doctype_unknown_module_fails() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let mut request = create_request("Parcel", &[]);
        request.module = Some("Shipping".to_string());
        let err = dispatcher.create_doctype(request).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ModuleNotFound);
        assert_eq!(err.to_string(), "Module or App 'Shipping' not found");
        assert!(dispatcher.backend().inner.lock().unwrap().drafts.is_empty());
    }

    #[tokio::test]
    async fn test_create_doctype_custom_module_any_casing() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let mut request = create_request("Product", &[]);
        request.module = Some("CUSTOM".to_string());
        let created = dispatcher.create_doctype(request).await.unwrap();

        assert_eq!(created.module, "Custom");
        assert!(created.custom);
        // The default module is never looked up.
        assert!(!dispatcher.backend().calls().contains(&"module_exists".to_string()));
    }

    #[tokio::test]
    async fn test_create_doctype_custom_flag_with_named_module() {
        let backend = StubBackend::default().with_module("Selling");
        let dispatcher = Dispatcher::new(backend);

        let mut request = create_request("Quote Log", &[]);
        request.module = Some("Selling".to_string());
        request.custom = true;
        let created = dispatcher.create_doctype(request).await.unwrap();

        assert_eq!(created.module, "Selling");
        assert!(created.custom);
    }

    #[tokio::test]
    async fn test_add_fields_preserves_batch_order_by_chaining() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject", "status"]));
        let dispatcher = Dispatcher::new(backend);

        let added = dispatcher
            .add_custom_fields(add_request("Task", &["a:Data", "b:Int:*", "c:Text"]))
            .await
            .unwrap();

        assert_eq!(added.len(), 3);
        assert_eq!(added[0].fieldname, "a");
        assert_eq!(added[0].insert_after, None);
        assert_eq!(added[1].insert_after.as_deref(), Some("a"));
        assert_eq!(added[2].insert_after.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_add_fields_explicit_anchor_overrides_tokens() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject", "status"]));
        let dispatcher = Dispatcher::new(backend);

        let mut request = add_request("Task", &["a:Data:insert_after=subject", "b:Int"]);
        request.insert_after = Some("status".to_string());
        let added = dispatcher.add_custom_fields(request).await.unwrap();

        assert_eq!(added[0].insert_after.as_deref(), Some("status"));
        assert_eq!(added[1].insert_after.as_deref(), Some("status"));
    }

    #[tokio::test]
    async fn test_add_fields_token_anchor_kept_without_explicit_anchor() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject", "status"]));
        let dispatcher = Dispatcher::new(backend);

        let added = dispatcher
            .add_custom_fields(add_request("Task", &["a:Data:insert_after=subject", "b:Int"]))
            .await
            .unwrap();

        assert_eq!(added[0].insert_after.as_deref(), Some("subject"));
        // The next field still follows the previous one.
        assert_eq!(added[1].insert_after.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_add_fields_missing_doctype() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let err = dispatcher
            .add_custom_fields(add_request("Task", &["a:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DoctypeNotFound);
        assert_eq!(err.to_string(), "DocType 'Task' not found");
    }

    #[tokio::test]
    async fn test_add_fields_core_doctype_refused() {
        let backend = StubBackend::default().with_doctype(meta("User", &["email"]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .add_custom_fields(add_request("User", &["a:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::CoreDoctype);
    }

    #[tokio::test]
    async fn test_add_fields_single_doctype_refused() {
        let mut single = meta("System Settings Copy", &[]);
        single.issingle = true;
        let dispatcher = Dispatcher::new(StubBackend::default().with_doctype(single));

        let err = dispatcher
            .add_custom_fields(add_request("System Settings Copy", &["a:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SingleDoctype);
    }

    #[tokio::test]
    async fn test_add_fields_custom_doctype_refused() {
        let mut custom = meta("My Notes", &[]);
        custom.custom = true;
        let dispatcher = Dispatcher::new(StubBackend::default().with_doctype(custom));

        let err = dispatcher
            .add_custom_fields(add_request("My Notes", &["a:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::CustomDoctype);
        assert_eq!(err.hint(), Some("edit the custom DocType directly instead"));
    }

    #[tokio::test]
    async fn test_add_fields_existing_field_conflicts() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject"]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .add_custom_fields(add_request("Task", &["subject:Data"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::FieldExists);
        assert_eq!(
            err.to_string(),
            "field 'subject' already exists on DocType 'Task'"
        );
    }

    #[tokio::test]
    async fn test_add_fields_duplicate_within_batch_conflicts() {
        let backend = StubBackend::default().with_doctype(meta("Task", &[]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .add_custom_fields(add_request("Task", &["a:Data", "a:Int"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::FieldExists);
        // The first insertion stands.
        assert_eq!(dispatcher.backend().inner.lock().unwrap().custom_fields.len(), 1);
    }

    #[tokio::test]
    async fn test_add_fields_no_rollback_on_mid_batch_failure() {
        let backend = StubBackend::default()
            .with_doctype(meta("Task", &[]))
            .fail_field_insert("b");
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .add_custom_fields(add_request("Task", &["a:Data", "b:Int", "c:Text"]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InternalError);
        let inner = dispatcher.backend().inner.lock().unwrap();
        assert_eq!(inner.custom_fields.len(), 1);
        assert_eq!(inner.custom_fields[0].1.fieldname, "a");
    }

    #[tokio::test]
    async fn test_set_property_for_field() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject", "status"]));
        let dispatcher = Dispatcher::new(backend);

        let set = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "Task".to_string(),
                property: "hidden".to_string(),
                value: json!(true),
                property_type: Some("Check".to_string()),
                field_name: Some("status".to_string()),
                for_doctype: false,
            })
            .await
            .unwrap();

        assert_eq!(set.value, "1");
        assert_eq!(set.doctype_or_field, "DocField");
        assert_eq!(set.field_name.as_deref(), Some("status"));

        let inner = dispatcher.backend().inner.lock().unwrap();
        assert_eq!(inner.setters[0].property_type, "Check");
    }

    #[tokio::test]
    async fn test_set_property_for_doctype_drops_field_name() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject"]));
        let dispatcher = Dispatcher::new(backend);

        let set = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "Task".to_string(),
                property: "track_changes".to_string(),
                value: json!("0"),
                property_type: None,
                field_name: Some("subject".to_string()),
                for_doctype: true,
            })
            .await
            .unwrap();

        assert_eq!(set.doctype_or_field, "DocType");
        assert_eq!(set.field_name, None);
        assert_eq!(set.property_type, "Data");
    }

    #[tokio::test]
    async fn test_set_property_requires_field_name() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let err = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "Task".to_string(),
                property: "hidden".to_string(),
                value: json!("1"),
                property_type: None,
                field_name: None,
                for_doctype: false,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.details()["field"], "field_name");
        assert!(dispatcher.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_property_rejects_non_scalar_value() {
        let dispatcher = Dispatcher::new(StubBackend::default());

        let err = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "Task".to_string(),
                property: "options".to_string(),
                value: json!(["Open", "Closed"]),
                property_type: None,
                field_name: Some("status".to_string()),
                for_doctype: false,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_set_property_unknown_field() {
        let backend = StubBackend::default().with_doctype(meta("Task", &["subject"]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "Task".to_string(),
                property: "hidden".to_string(),
                value: json!("1"),
                property_type: None,
                field_name: Some("missing".to_string()),
                for_doctype: false,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::FieldNotFound);
        assert_eq!(
            err.to_string(),
            "field 'missing' not found on DocType 'Task'"
        );
    }

    #[tokio::test]
    async fn test_set_property_core_doctype_refused() {
        let backend = StubBackend::default().with_doctype(meta("User", &["email"]));
        let dispatcher = Dispatcher::new(backend);

        let err = dispatcher
            .set_property(SetPropertyRequest {
                doctype: "User".to_string(),
                property: "hidden".to_string(),
                value: json!("1"),
                property_type: None,
                field_name: Some("email".to_string()),
                for_doctype: false,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::CoreDoctype);
    }

    #[test]
    fn test_scalar_value_renders_numbers_and_bools() {
        assert_eq!(scalar_value(&json!("Open")).unwrap(), "Open");
        assert_eq!(scalar_value(&json!(3)).unwrap(), "3");
        assert_eq!(scalar_value(&json!(2.5)).unwrap(), "2.5");
        assert_eq!(scalar_value(&json!(true)).unwrap(), "1");
        assert_eq!(scalar_value(&json!(false)).unwrap(), "0");
        assert!(scalar_value(&json!(null)).is_err());
        assert!(scalar_value(&json!({"a": 1})).is_err());
    }
}
