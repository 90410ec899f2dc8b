//! Site configuration and backend access for metaforge.
//!
//! This crate owns everything between the dispatch layer and a running
//! site: the [`SiteConfig`] profile (YAML file plus environment
//! overrides), the [`MetadataBackend`] trait that abstracts the remote
//! metadata store, the [`FrappeClient`] HTTP implementation, and the
//! [`convert`] module that renders parsed field specs into the wire
//! documents the backend accepts.
//!
//! # Examples
//!
//! ```
//! use metaforge_client::SiteConfig;
//!
//! let config: SiteConfig = serde_yaml::from_str(
//!     "url: https://erp.example.com\napi_key: key\napi_secret: secret\n",
//! )?;
//! assert_eq!(config.base_url(), "https://erp.example.com");
//! # Ok::<(), serde_yaml::Error>(())
//! ```

mod backend;
mod config;
pub mod convert;
mod error;
mod frappe;

pub use backend::{
    DoctypeDraft, DoctypeMeta, MetadataBackend, PropertySetter, SYSTEM_MANAGER_ROLE,
};
pub use config::{
    SiteConfig, API_KEY_ENV, API_SECRET_ENV, SITE_PATH_ENV, SITE_URL_ENV,
};
pub use error::{BackendError, ConfigError};
pub use frappe::FrappeClient;
