//! REST server demo against an in-memory backend.
//!
//! Runs the full REST surface without a real site: the stub backend
//! keeps doctypes in a map, permits everything, and seeds one standard
//! doctype ("Customer" in module "Selling") plus one module ("Library")
//! so every endpoint and most error codes can be tried with curl.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p metaforge-demos --example serve_stub
//! # in another terminal:
//! curl -s localhost:8700/api/reference
//! curl -s -X POST localhost:8700/api/doctypes \
//!   -H 'content-type: application/json' \
//!   -d '{"doctype_name":"Library Book","fields":["isbn:data:*:unique","title:data"]}'
//! curl -s -X POST localhost:8700/api/doctypes/Customer/fields \
//!   -H 'content-type: application/json' \
//!   -d '{"fields":["loyalty_tier:select:options=Bronze,Silver,Gold"]}'
//! curl -s -X POST localhost:8700/api/doctypes/Customer/properties \
//!   -H 'content-type: application/json' \
//!   -d '{"field_name":"territory","property":"hidden","value":"1"}'
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use metaforge_client::{BackendError, DoctypeDraft, DoctypeMeta, MetadataBackend, PropertySetter};
use metaforge_core::FieldSpec;
use metaforge_ops::Dispatcher;
use metaforge_rest::DEFAULT_BIND;

/// In-memory stand-in for a real site. Everything is permitted and
/// nothing survives process exit.
struct MemoryBackend {
    doctypes: Mutex<HashMap<String, DoctypeMeta>>,
    modules: Mutex<HashSet<String>>,
}

impl MemoryBackend {
    fn seeded() -> Self {
        let customer = DoctypeMeta {
            name: "Customer".to_string(),
            module: "Selling".to_string(),
            custom: false,
            issingle: false,
            istable: false,
            fieldnames: vec!["customer_name".to_string(), "territory".to_string()],
        };
        Self {
            doctypes: Mutex::new(HashMap::from([("Customer".to_string(), customer)])),
            modules: Mutex::new(HashSet::from(["Library".to_string()])),
        }
    }
}

#[async_trait]
impl MetadataBackend for MemoryBackend {
    async fn verify_capability(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn doctype_exists(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.doctypes.lock().unwrap().contains_key(name))
    }

    async fn doctype_meta(&self, name: &str) -> Result<DoctypeMeta, BackendError> {
        self.doctypes
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("DocType {name}")))
    }

    async fn module_exists(&self, module: &str) -> Result<bool, BackendError> {
        Ok(self.modules.lock().unwrap().contains(module))
    }

    async fn app_installed(&self, _app: &str) -> Result<bool, BackendError> {
        Ok(false)
    }

    async fn create_module(&self, module: &str, _app: &str) -> Result<(), BackendError> {
        self.modules.lock().unwrap().insert(module.to_string());
        Ok(())
    }

    async fn insert_doctype(&self, draft: &DoctypeDraft) -> Result<(), BackendError> {
        println!(
            "insert DocType '{}' in module '{}' with {} field(s)",
            draft.name,
            draft.module,
            draft.fields.len()
        );
        let meta = DoctypeMeta {
            name: draft.name.clone(),
            module: draft.module.clone(),
            custom: draft.custom,
            issingle: false,
            istable: false,
            fieldnames: draft.fields.iter().map(|f| f.fieldname.clone()).collect(),
        };
        self.doctypes.lock().unwrap().insert(draft.name.clone(), meta);
        Ok(())
    }

    async fn insert_custom_field(
        &self,
        doctype: &str,
        field: &FieldSpec,
    ) -> Result<(), BackendError> {
        println!("insert Custom Field '{}' on '{doctype}'", field.fieldname);
        let mut doctypes = self.doctypes.lock().unwrap();
        let meta = doctypes
            .get_mut(doctype)
            .ok_or_else(|| BackendError::NotFound(format!("DocType {doctype}")))?;
        meta.fieldnames.push(field.fieldname.clone());
        Ok(())
    }

    async fn insert_property_setter(&self, setter: &PropertySetter) -> Result<(), BackendError> {
        let target = setter.field_name.as_deref().unwrap_or("<doctype>");
        println!(
            "insert Property Setter '{}' = '{}' on {}.{target}",
            setter.property, setter.value, setter.doctype
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().init();

    let dispatcher = Dispatcher::new(MemoryBackend::seeded());
    println!("serving on http://{DEFAULT_BIND} (Ctrl-C to stop)");
    metaforge_rest::serve(dispatcher, DEFAULT_BIND).await
}
