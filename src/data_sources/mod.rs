//! Data sources.
//!
//! A data source searches Foreman by a name-like key and fills the bag with
//! the single match. Zero or several matches are a [`Query`] error.
//!
//! [`Query`]: crate::error::ProviderError::Query

pub mod override_value;
pub mod smart_class_parameter;
