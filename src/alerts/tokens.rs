//! Configuration keys a script alert needs resolved before each cycle

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration keys declared by a script's `get_tokens()`.
///
/// Tokens arrive in placeholder form (`{{foo-site/bar}}`) and are stored as
/// the bare key (`foo-site/bar`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from raw script tokens, skipping malformed entries
    pub fn from_tokens<I, S>(alert: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for token in tokens {
            let token = token.as_ref();
            let before = set.0.len();
            let mut found = false;
            for key in lookup_keys(token) {
                found = true;
                set.0.insert(key.to_string());
            }
            if !found {
                tracing::warn!(
                    alert = %alert,
                    token = %token,
                    "Skipping malformed configuration token"
                );
            } else if set.0.len() == before {
                tracing::debug!(alert = %alert, token = %token, "Duplicate configuration token");
            }
        }
        set
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Every configuration key inside the `{{key}}` placeholders of a token
pub fn lookup_keys(token: &str) -> impl Iterator<Item = &str> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\S+?)\}\}").expect("valid regex"));

    re.captures_iter(token)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}
