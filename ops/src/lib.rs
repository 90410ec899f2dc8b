//! Operation dispatch for metaforge.
//!
//! Sits between the surfaces (CLI, REST) and the backend: takes one
//! typed request per operation, parses the raw field definitions, runs
//! the capability and restriction checks, performs the mutation through
//! a [`metaforge_client::MetadataBackend`], and folds every failure into
//! the fixed [`ErrorCode`] vocabulary both surfaces expose.
//!
//! The dispatcher's only internal decision logic is module resolution
//! and error mapping; the real metadata work happens in the backend.

mod dispatch;
mod error;
mod requests;

pub use dispatch::{DEFAULT_MODULE, Dispatcher};
pub use error::{CORE_DOCTYPES, ErrorCode, OpsError, is_core_doctype};
pub use requests::{
    AddFieldsRequest, CreateDoctypeRequest, CustomFieldAdded, DoctypeCreated, PropertySet,
    SetPropertyRequest,
};
