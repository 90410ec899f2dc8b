//! HTTP implementation of [`MetadataBackend`] for Frappe-style sites.
//!
//! Talks to the framework's REST surface: documents under
//! `/api/resource/<DocType>[/<name>]` and whitelisted RPC methods under
//! `/api/method/<path>`. Authentication uses the `token <key>:<secret>`
//! header scheme.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use async_trait::async_trait;
use metaforge_core::FieldSpec;

use crate::backend::{
    DoctypeDraft, DoctypeMeta, MetadataBackend, PropertySetter, SYSTEM_MANAGER_ROLE,
};
use crate::config::SiteConfig;
use crate::convert;
use crate::error::{BackendError, ConfigError};

/// Single-document and list envelope of the resource API.
#[derive(Debug, Deserialize)]
struct ResourceData<T> {
    data: T,
}

/// Envelope of whitelisted method calls.
#[derive(Debug, Deserialize)]
struct MethodMessage<T> {
    message: T,
}

#[derive(Debug, Deserialize)]
struct DoctypeDoc {
    #[serde(default)]
    module: String,
    #[serde(default)]
    custom: u8,
    #[serde(default)]
    issingle: u8,
    #[serde(default)]
    istable: u8,
    #[serde(default)]
    fields: Vec<FieldnameRow>,
}

#[derive(Debug, Deserialize)]
struct FieldnameRow {
    #[serde(default)]
    fieldname: String,
}

#[derive(Debug, Deserialize)]
struct UserDoc {
    #[serde(default)]
    roles: Vec<RoleRow>,
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    #[serde(default)]
    role: String,
}

/// Extracts a human-readable message from a framework error body.
///
/// Tries `message`, then `exception`, then the `_server_messages` list
/// (a JSON-encoded array of JSON-encoded dicts), falling back to the raw
/// body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return message.to_string();
        }
        if let Some(exception) = json.get("exception").and_then(|v| v.as_str()) {
            return exception.to_string();
        }
        if let Some(raw) = json.get("_server_messages").and_then(|v| v.as_str()) {
            if let Ok(Value::Array(messages)) = serde_json::from_str::<Value>(raw) {
                let texts: Vec<String> = messages
                    .iter()
                    .filter_map(|m| m.as_str())
                    .map(|inner| {
                        serde_json::from_str::<Value>(inner)
                            .ok()
                            .and_then(|v| {
                                v.get("message").and_then(|m| m.as_str()).map(String::from)
                            })
                            .unwrap_or_else(|| inner.to_string())
                    })
                    .collect();
                if !texts.is_empty() {
                    return texts.join("; ");
                }
            }
        }
    }
    body.to_string()
}

/// Client for one configured backend site.
///
/// One instance per invocation; holds no state beyond the connection
/// pool and credentials.
#[derive(Debug)]
pub struct FrappeClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl FrappeClient {
    /// Creates a client from a validated site profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when the profile is
    /// incomplete.
    pub fn new(config: SiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url().to_string(),
            api_key: config.api_key,
            api_secret: config.api_secret,
        })
    }

    fn auth_header(&self) -> String {
        format!("token {}:{}", self.api_key, self.api_secret)
    }

    fn resource_url(&self, doctype: &str, name: Option<&str>) -> String {
        match name {
            Some(name) => format!(
                "{}/api/resource/{}/{}",
                self.base_url,
                urlencoding::encode(doctype),
                urlencoding::encode(name),
            ),
            None => format!(
                "{}/api/resource/{}",
                self.base_url,
                urlencoding::encode(doctype),
            ),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }

    /// Maps a response to a [`BackendError`] based on status code.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);

        match status {
            401 => Err(BackendError::Unauthorized(message)),
            403 => Err(BackendError::Forbidden(message)),
            404 => Err(BackendError::NotFound(message)),
            409 => Err(BackendError::Conflict(message)),
            _ => Err(BackendError::Api { status, message }),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(%url, "backend GET");
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        self.check_response(response).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(%url, "backend POST");
        let response = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;
        self.check_response(response).await
    }

    async fn document_exists(&self, doctype: &str, name: &str) -> Result<bool, BackendError> {
        match self.get(&self.resource_url(doctype, Some(name))).await {
            Ok(_) => Ok(true),
            Err(BackendError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn custom_fieldnames(&self, doctype: &str) -> Result<Vec<String>, BackendError> {
        let filters = serde_json::json!([["dt", "=", doctype]]).to_string();
        let url = format!(
            "{}?filters={}&fields={}&limit_page_length=0",
            self.resource_url("Custom Field", None),
            urlencoding::encode(&filters),
            urlencoding::encode(r#"["fieldname"]"#),
        );
        let response = self.get(&url).await?;
        let rows: ResourceData<Vec<FieldnameRow>> = response.json().await?;
        Ok(rows
            .data
            .into_iter()
            .map(|row| row.fieldname)
            .filter(|fieldname| !fieldname.is_empty())
            .collect())
    }
}

#[async_trait]
impl MetadataBackend for FrappeClient {
    async fn verify_capability(&self) -> Result<(), BackendError> {
        let response = self.get(&self.method_url("frappe.auth.get_logged_user")).await?;
        let user: MethodMessage<String> = response.json().await?;

        let response = self.get(&self.resource_url("User", Some(&user.message))).await?;
        let doc: ResourceData<UserDoc> = response.json().await?;

        if doc.data.roles.iter().any(|r| r.role == SYSTEM_MANAGER_ROLE) {
            Ok(())
        } else {
            Err(BackendError::Forbidden(format!(
                "user '{}' lacks the {} role",
                user.message, SYSTEM_MANAGER_ROLE
            )))
        }
    }

    async fn doctype_exists(&self, name: &str) -> Result<bool, BackendError> {
        self.document_exists("DocType", name).await
    }

    async fn doctype_meta(&self, name: &str) -> Result<DoctypeMeta, BackendError> {
        let response = self.get(&self.resource_url("DocType", Some(name))).await?;
        let doc: ResourceData<DoctypeDoc> = response.json().await?;

        let mut fieldnames: Vec<String> = doc
            .data
            .fields
            .into_iter()
            .map(|row| row.fieldname)
            .filter(|fieldname| !fieldname.is_empty())
            .collect();
        fieldnames.extend(self.custom_fieldnames(name).await?);

        Ok(DoctypeMeta {
            name: name.to_string(),
            module: doc.data.module,
            custom: doc.data.custom != 0,
            issingle: doc.data.issingle != 0,
            istable: doc.data.istable != 0,
            fieldnames,
        })
    }

    async fn module_exists(&self, module: &str) -> Result<bool, BackendError> {
        self.document_exists("Module Def", module).await
    }

    async fn app_installed(&self, app: &str) -> Result<bool, BackendError> {
        let response = self
            .get(&self.method_url("frappe.utils.change_log.get_versions"))
            .await?;
        let body: Value = response.json().await?;
        let apps = body
            .get("message")
            .and_then(|m| m.as_object())
            .ok_or_else(|| {
                BackendError::UnexpectedResponse(
                    "get_versions did not return an app map".to_string(),
                )
            })?;
        Ok(apps.contains_key(app))
    }

    async fn create_module(&self, module: &str, app: &str) -> Result<(), BackendError> {
        let body = convert::module_def_document(module, app);
        self.post(&self.resource_url("Module Def", None), &body).await?;
        Ok(())
    }

    async fn insert_doctype(&self, draft: &DoctypeDraft) -> Result<(), BackendError> {
        let body = convert::doctype_document(draft);
        self.post(&self.resource_url("DocType", None), &body).await?;
        Ok(())
    }

    async fn insert_custom_field(
        &self,
        doctype: &str,
        field: &FieldSpec,
    ) -> Result<(), BackendError> {
        let body = convert::custom_field_document(doctype, field);
        self.post(&self.resource_url("Custom Field", None), &body).await?;
        Ok(())
    }

    async fn insert_property_setter(&self, setter: &PropertySetter) -> Result<(), BackendError> {
        let body = convert::property_setter_document(setter);
        self.post(&self.resource_url("Property Setter", None), &body).await?;
        Ok(())
    }
}
