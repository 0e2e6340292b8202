//! Inventory data model
//!
//! [`Resource`] is one discovered asset, [`Resources`] an ordered collection
//! of them, and [`OptionBlock`] the per-provider configuration unit read
//! from the config file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single network-facing asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Backend that produced the asset
    pub provider: String,
    /// Profile label of the provider instance, passed through from config
    #[serde(default)]
    pub profile: String,
    /// Fully-qualified name without a trailing root delimiter
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_name: String,
    /// Whether the asset is reachable from the internet
    pub public: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_ipv4: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_ipv4: String,
}

/// Ordered collection of resources
///
/// No de-duplication is performed: two identical resources from different
/// providers both appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resources {
    items: Vec<Resource>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one resource at the end
    pub fn append(&mut self, resource: Resource) {
        self.items.push(resource);
    }

    /// Move every element of `other` to the end, preserving both orders
    pub fn merge(&mut self, other: Resources) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Resource] {
        &self.items
    }
}

impl Extend<Resource> for Resources {
    fn extend<I: IntoIterator<Item = Resource>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl FromIterator<Resource> for Resources {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Resources {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resources {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Configuration for one provider instance
///
/// Values are opaque to the inventory; each provider extracts the keys it
/// needs at construction time and drops the block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionBlock(HashMap<String, String>);

impl OptionBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, `None` if absent
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Look up a key that `provider` cannot work without
    pub fn require(&self, provider: &str, key: &str) -> Result<&str> {
        match self.get_metadata(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            Some(_) => Err(Error::configuration(provider, format!("{key} is empty"))),
            None => Err(Error::configuration(provider, format!("{key} is missing"))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Full configuration: one block per provider instance, in file order
pub type Options = Vec<OptionBlock>;
