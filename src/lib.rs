//! cloudlist
//!
//! Discovers network-facing assets (host names and IP addresses) across cloud
//! and DNS providers and merges them into a single inventory.
//!
//! # Module Structure
//!
//! - [`schema`] - Resource model and per-provider config blocks
//! - [`provider`] - Provider trait, registry and the backends
//! - [`inventory`] - Concurrent enumeration with per-provider failure isolation
//! - [`config`] - YAML config loading
//! - [`output`] - Result rendering
//!
//! # Example
//!
//! ```ignore
//! use cloudlist::{Inventory, InventoryOptions, Registry};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let options = cloudlist::config::read_config("config.yaml".as_ref())?;
//!     let inventory = Inventory::new(&options, &Registry::default());
//!     let report = inventory
//!         .enumerate(&CancellationToken::new(), &InventoryOptions::default())
//!         .await;
//!     println!("{} resources", report.resources.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod output;
pub mod provider;
pub mod schema;

pub use error::{Error, Result};
pub use inventory::{Inventory, InventoryOptions, InventoryReport, ProviderFailure};
pub use provider::{Provider, Registry};
pub use schema::{OptionBlock, Options, Resource, Resources};
