//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod layout;
pub mod product;
pub mod remote;
pub mod stack;
pub mod store;
pub mod template;

pub use config::{DevenvConfig, validate_config_key, validate_config_value};
pub use error::{AuthError, ConfigError, ProvisionError, StackError, StoreError, TemplateError};
pub use remote::RemoteError;
pub use template::Bindings;
