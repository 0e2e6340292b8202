//! Provider abstraction and registry
//!
//! Each cloud or DNS backend implements [`Provider`]. A [`Registry`] maps the
//! short `provider` identifier of a config block to the constructor of the
//! matching backend.
//!
//! # Module Structure
//!
//! - [`http`] - HTTP client shared by the REST providers
//! - [`paginate`] - Cursor pagination state machine
//! - [`normalize`] - DNS record to resource conversion
//! - [`aws`] - Route53 hosted zones (`aws`)
//! - [`digitalocean`] - DigitalOcean domains (`do`)
//! - [`gcp`] - Google Cloud DNS managed zones (`gcp`)
//! - [`scaleway`] - Scaleway instances (`scw`)
//!
//! # Adding a provider
//!
//! Implement [`Provider`] and add one entry to [`Registry::default`].

pub mod aws;
pub mod digitalocean;
pub mod gcp;
pub mod http;
pub mod normalize;
pub mod paginate;
pub mod scaleway;

use crate::error::{Error, Result};
use crate::schema::{OptionBlock, Resources};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A configured backend able to enumerate its assets
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier of the backend (`aws`, `do`, ...)
    fn name(&self) -> &'static str;

    /// Profile label of this instance
    fn profile(&self) -> &str;

    /// Enumerate every resource the backend exposes.
    ///
    /// Cancelling `ctx` aborts in-flight requests with [`Error::Cancelled`].
    async fn get_resource(&self, ctx: &CancellationToken) -> Result<Resources>;
}

/// Builds a provider from its config block
pub type Constructor = Arc<dyn Fn(&OptionBlock) -> Result<Box<dyn Provider>> + Send + Sync>;

/// Name to constructor table
#[derive(Clone)]
pub struct Registry {
    entries: Vec<(String, Constructor)>,
}

impl Registry {
    /// Registry with no providers
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a constructor under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&OptionBlock) -> Result<Box<dyn Provider>> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(constructor);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name.to_string(), constructor)),
        }
    }

    /// Build the provider registered under `name`
    pub fn resolve(&self, name: &str, block: &OptionBlock) -> Result<Box<dyn Provider>> {
        let Some((_, constructor)) = self.entries.iter().find(|(n, _)| n == name) else {
            return Err(Error::UnknownProvider(name.to_string()));
        };
        constructor(block)
    }

    /// Registered provider names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(aws::PROVIDER_NAME, |block| {
            Ok(Box::new(aws::Route53Provider::new(block)?))
        });
        registry.register(digitalocean::PROVIDER_NAME, |block| {
            Ok(Box::new(digitalocean::DigitalOceanProvider::new(block)?))
        });
        registry.register(gcp::PROVIDER_NAME, |block| {
            Ok(Box::new(gcp::CloudDnsProvider::new(block)?))
        });
        registry.register(scaleway::PROVIDER_NAME, |block| {
            Ok(Box::new(scaleway::ScalewayProvider::new(block)?))
        });
        registry
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.names())
            .finish()
    }
}

/// Profile label of a block, empty when not set
pub(crate) fn profile_of(block: &OptionBlock) -> String {
    block.get_metadata("profile").unwrap_or_default().to_string()
}
