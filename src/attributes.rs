//! Typed access to the host runtime's attribute bag.
//!
//! The bag is a JSON object. Every getter returns `Option`: an absent key and
//! an explicit `null` both read as `None`, so "not set" stays distinguishable
//! from a zero value such as `false` or `""`.

use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Key under which every resource stores its identity.
pub const ID_KEY: &str = "id";

/// A resource's configured or observed state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeBag {
    values: Map<String, Value>,
}

impl AttributeBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a state value received from the host.
    ///
    /// `null` yields an empty bag; anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::new()),
            other => Err(ProviderError::Validation(format!(
                "expected an object of attributes, got {}",
                other
            ))),
        }
    }

    /// Hand the bag back to the host.
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Raw access to a key, with `null` folded into `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// Read a string attribute.
    pub fn get_str(&self, key: &str) -> Result<Option<String>, ProviderError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    /// Read a boolean attribute.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ProviderError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch(key, "bool", other)),
        }
    }

    /// Read an integer attribute.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ProviderError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_mismatch(key, "int64", v)),
        }
    }

    /// Read an integer carried either as a JSON number or as a numeric string.
    pub fn get_numeric_id(&self, key: &str) -> Result<Option<i64>, ProviderError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                ProviderError::Validation(format!(
                    "attribute '{}' must be a numeric ID, got \"{}\"",
                    key, s
                ))
            }),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_mismatch(key, "numeric ID", v)),
        }
    }

    /// Read a list of nested attribute bags.
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<AttributeBag>>, ProviderError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .map(AttributeBag::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(type_mismatch(key, "list", other)),
        }
    }

    /// The resource identity parsed back into Foreman's integer ID.
    pub fn id(&self) -> Result<Option<i64>, ProviderError> {
        self.get_numeric_id(ID_KEY)
    }

    /// Like [`AttributeBag::id`], but a missing identity is an error.
    pub fn require_id(&self) -> Result<i64, ProviderError> {
        self.id()?
            .ok_or_else(|| ProviderError::Validation("state has no resource id".to_string()))
    }

    /// Store the identity, stringified.
    pub fn set_id(&mut self, id: i64) {
        self.values.insert(ID_KEY.to_string(), Value::String(id.to_string()));
    }

    /// Write an attribute; `None` is written as `null`.
    pub fn set<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        let value = value.map(Into::into).unwrap_or(Value::Null);
        self.values.insert(key.to_string(), value);
    }

    /// Write a list of nested bags; `None` is written as `null`.
    pub fn set_list(&mut self, key: &str, items: Option<Vec<AttributeBag>>) {
        let value = items
            .map(|items| Value::Array(items.into_iter().map(AttributeBag::into_value).collect()))
            .unwrap_or(Value::Null);
        self.values.insert(key.to_string(), value);
    }
}

fn type_mismatch(key: &str, expected: &str, got: &Value) -> ProviderError {
    ProviderError::Validation(format!(
        "attribute '{}' must be a {}, got {}",
        key, expected, got
    ))
}
