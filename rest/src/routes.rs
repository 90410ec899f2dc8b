//! Route table and handlers.
//!
//! One POST route per mutating operation, plus the offline reference and
//! a liveness probe. Handlers stay thin: decode the body, hand the typed
//! request to the dispatcher, wrap the outcome in an envelope.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use metaforge_client::MetadataBackend;
use metaforge_ops::{
    AddFieldsRequest, CreateDoctypeRequest, Dispatcher, DoctypeCreated, PropertySet,
    SetPropertyRequest,
};

use crate::docs::{ApiReference, api_reference};
use crate::envelope::{ApiError, ApiSuccess};

/// Default bind address. Loopback only; the server adds no auth of its
/// own and forwards every operation with the configured site credentials.
pub const DEFAULT_BIND: &str = "127.0.0.1:8700";

/// Builds the route table around one dispatcher.
pub fn router<B: MetadataBackend + 'static>(dispatcher: Dispatcher<B>) -> Router {
    Router::new()
        .route("/api/doctypes", post(create_doctype::<B>))
        .route("/api/doctypes/:doctype/fields", post(add_fields::<B>))
        .route("/api/doctypes/:doctype/properties", post(set_property::<B>))
        .route("/api/reference", get(reference))
        .route("/health", get(health))
        .with_state(Arc::new(dispatcher))
}

/// Binds `bind` and serves requests until the task is stopped.
pub async fn serve<B: MetadataBackend + 'static>(
    dispatcher: Dispatcher<B>,
    bind: &str,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "serving REST API");
    axum::serve(listener, router(dispatcher)).await
}

async fn create_doctype<B: MetadataBackend>(
    State(dispatcher): State<Arc<Dispatcher<B>>>,
    Json(request): Json<CreateDoctypeRequest>,
) -> Result<ApiSuccess<DoctypeCreated>, ApiError> {
    let created = dispatcher.create_doctype(request).await?;
    let message = format!(
        "DocType '{}' created successfully in module '{}'",
        created.doctype_name, created.module
    );
    Ok(ApiSuccess::new(message, created))
}

#[derive(Debug, Deserialize)]
struct AddFieldsBody {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    insert_after: Option<String>,
}

async fn add_fields<B: MetadataBackend>(
    State(dispatcher): State<Arc<Dispatcher<B>>>,
    Path(doctype): Path<String>,
    Json(body): Json<AddFieldsBody>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let added = dispatcher
        .add_custom_fields(AddFieldsRequest {
            doctype: doctype.clone(),
            fields: body.fields,
            insert_after: body.insert_after,
        })
        .await?;

    let message = match added.as_slice() {
        [one] => format!(
            "Custom field '{}' added successfully to DocType '{}'",
            one.fieldname, doctype
        ),
        _ => format!(
            "{} custom fields added successfully to DocType '{}'",
            added.len(),
            doctype
        ),
    };
    Ok(ApiSuccess::new(
        message,
        json!({ "doctype": doctype, "fields": added }),
    ))
}

#[derive(Debug, Deserialize)]
struct SetPropertyBody {
    property: String,
    value: Value,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    field_name: Option<String>,
    #[serde(default)]
    for_doctype: bool,
}

async fn set_property<B: MetadataBackend>(
    State(dispatcher): State<Arc<Dispatcher<B>>>,
    Path(doctype): Path<String>,
    Json(body): Json<SetPropertyBody>,
) -> Result<ApiSuccess<PropertySet>, ApiError> {
    let set = dispatcher
        .set_property(SetPropertyRequest {
            doctype,
            property: body.property,
            value: body.value,
            property_type: body.property_type,
            field_name: body.field_name,
            for_doctype: body.for_doctype,
        })
        .await?;

    let message = format!(
        "Property setter for '{}' created successfully",
        set.property
    );
    Ok(ApiSuccess::new(message, set))
}

async fn reference() -> ApiSuccess<ApiReference> {
    ApiSuccess::new("metaforge API reference", api_reference())
}

async fn health() -> &'static str {
    "OK"
}
