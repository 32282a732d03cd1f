//! Prefix table used to resolve qualified names in locators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace of response messages (`m:` prefix).
pub const MESSAGES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
/// Namespace of item and folder types (`t:` prefix).
pub const TYPES_NS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
/// SOAP 1.1 envelope namespace (`soap:` prefix).
pub const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Immutable prefix → namespace URI table.
///
/// Passed explicitly to every extraction call; there is no global table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaces {
    prefixes: BTreeMap<String, String>,
}

impl Namespaces {
    /// An empty table. Only unprefixed locators resolve against it.
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// The table for Exchange Web Services responses (`m`, `t`, `soap`).
    pub fn ews() -> Self {
        Self::empty()
            .with("m", MESSAGES_NS)
            .with("t", TYPES_NS)
            .with("soap", SOAP_NS)
    }

    /// Returns a copy of the table with one more binding.
    #[must_use]
    pub fn with(mut self, prefix: &str, uri: &str) -> Self {
        self.prefixes.insert(prefix.to_string(), uri.to_string());
        self
    }

    /// Looks up the URI bound to `prefix`.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Iterates over `(prefix, uri)` bindings in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::ews()
    }
}
