//! Binds resolved configuration values to script placeholders.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Placeholder-keyed parameters handed to a script's `execute`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMapping(HashMap<String, String>);

impl ParameterMapping {
    /// Wrap every configuration key as `{{key}}`, leaving values untouched.
    ///
    /// `{"foo-site/bar": "baz"}` becomes `{"{{foo-site/bar}}": "baz"}`.
    pub fn bind(values: &HashMap<String, String>) -> Self {
        Self(
            values
                .iter()
                .map(|(key, value)| (placeholder(key), value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0.get(placeholder).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The placeholder form of a configuration key
pub fn placeholder(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}
