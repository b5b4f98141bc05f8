//! Foreman provider
//!
//! Manages Foreman smart class parameters and their override values for an
//! infrastructure-as-code host runtime. The host plans and stores state; this
//! crate validates attribute bags, talks to Foreman's REST API, and maps the
//! responses back into state.
//!
//! # Overview
//!
//! - **Resources**: `foreman_override_value` (full CRUD) and
//!   `foreman_smart_class_parameter` (import, read, update)
//! - **Data sources**: the same two types, looked up by name
//! - **API client**: [`api::Client`], a `reqwest` client bound to one Foreman server
//! - **Schema and validation**: attribute schemas checked before any request is made
//! - **Testing**: [`testing::ProviderTester`] drives a provider the way the host does
//!
//! # Quick Start
//!
//! ```ignore
//! use foreman_provider::{ForemanProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     foreman_provider::init_logging();
//!
//!     let provider = ForemanProvider::new();
//!     provider
//!         .configure(json!({
//!             "server_url": "https://foreman.example.com",
//!             "username": "admin",
//!             "password": "changeme"
//!         }))
//!         .await?;
//!
//!     let state = provider
//!         .create("foreman_override_value", json!({
//!             "smart_class_parameter_id": "7",
//!             "match": "os=RedHat",
//!             "value": "true",
//!             "omit": false
//!         }))
//!         .await?;
//!     println!("created override value {}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Import IDs
//!
//! - `foreman_override_value`: `<smart_class_parameter_id>/<id>`
//! - `foreman_smart_class_parameter`: `<hosts|hostgroups|environments>/<parent_id>/<id>`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod attributes;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use api::{Client, Endpoints};
pub use attributes::AttributeBag;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::ForemanProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
