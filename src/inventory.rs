//! Inventory of providers
//!
//! Resolves config blocks into providers and enumerates them concurrently.
//! A block that cannot be resolved, or a provider whose fetch fails, is
//! recorded as a [`ProviderFailure`] and never stops the others.

use crate::error::Error;
use crate::provider::{Provider, Registry};
use crate::schema::{OptionBlock, Resources};
use futures::stream::{self, StreamExt};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Knobs for one enumeration run
#[derive(Debug, Clone, Default)]
pub struct InventoryOptions {
    /// Maximum providers fetched at once; `None` runs them all together
    pub concurrency: Option<usize>,
    /// Log a summary line per provider
    pub verbose: bool,
}

/// A provider that could not be resolved or enumerated
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub profile: String,
    pub error: Error,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.profile.is_empty() {
            write!(f, "{}: {}", self.provider, self.error)
        } else {
            write!(f, "{} ({}): {}", self.provider, self.profile, self.error)
        }
    }
}

/// Outcome of an enumeration run
#[derive(Debug, Default)]
pub struct InventoryReport {
    /// Merged resources, in provider resolution order
    pub resources: Resources,
    /// Resolution failures, then fetch failures, in config order
    pub failures: Vec<ProviderFailure>,
}

impl InventoryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolved providers of one configuration
pub struct Inventory {
    providers: Vec<Box<dyn Provider>>,
    resolution_failures: Vec<ProviderFailure>,
}

impl Inventory {
    /// Resolve every block declaring a `provider`
    ///
    /// Blocks without a `provider` key are skipped silently.
    pub fn new(options: &[OptionBlock], registry: &Registry) -> Self {
        let mut providers = Vec::new();
        let mut resolution_failures = Vec::new();

        for block in options {
            let Some(value) = block.get_metadata("provider") else {
                continue;
            };
            let profile = block.get_metadata("profile").unwrap_or_default();

            match registry.resolve(value, block) {
                Ok(provider) => {
                    debug!("Initialized provider {} {}", value, profile);
                    providers.push(provider);
                }
                Err(error) => {
                    warn!("Could not initialize provider {} {}: {}", value, profile, error);
                    resolution_failures.push(ProviderFailure {
                        provider: value.to_string(),
                        profile: profile.to_string(),
                        error,
                    });
                }
            }
        }

        Self {
            providers,
            resolution_failures,
        }
    }

    /// Build directly from constructed providers
    pub fn from_providers(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            providers,
            resolution_failures: Vec::new(),
        }
    }

    pub fn providers(&self) -> &[Box<dyn Provider>] {
        &self.providers
    }

    pub fn resolution_failures(&self) -> &[ProviderFailure] {
        &self.resolution_failures
    }

    /// Enumerate all providers and merge their resources
    ///
    /// Fetches run concurrently up to `options.concurrency`; results are
    /// merged in resolution order regardless of completion order.
    ///
    /// All fetches are polled on the calling task rather than spawned, so
    /// providers overlap while awaiting I/O but never run in parallel on CPU.
    pub async fn enumerate(self, ctx: &CancellationToken, options: &InventoryOptions) -> InventoryReport {
        let limit = options
            .concurrency
            .filter(|n| *n > 0)
            .unwrap_or(self.providers.len())
            .max(1);

        let results: Vec<_> = stream::iter(self.providers.iter())
            .map(|provider| async move {
                let result = provider.get_resource(ctx).await;
                (provider, result)
            })
            .buffered(limit)
            .collect()
            .await;

        let mut report = InventoryReport {
            resources: Resources::new(),
            failures: self.resolution_failures,
        };

        for (provider, result) in results {
            match result {
                Ok(resources) => {
                    if options.verbose {
                        info!(
                            "Found {} resources from {} {}",
                            resources.len(),
                            provider.name(),
                            provider.profile()
                        );
                    }
                    report.resources.merge(resources);
                }
                Err(error) => {
                    warn!(
                        "Could not get resources for provider {} {}: {}",
                        provider.name(),
                        provider.profile(),
                        error
                    );
                    report.failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        profile: provider.profile().to_string(),
                        error,
                    });
                }
            }
        }

        report
    }
}
