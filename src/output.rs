//! Result rendering
//!
//! Writes resources as JSON lines or plain text, optionally restricted to
//! host names or IP addresses.

use crate::schema::{Resource, Resources};
use anyhow::{Context, Result};
use std::io::Write;

/// What to print for each resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Host names and addresses
    #[default]
    Plain,
    /// Only DNS names
    Hosts,
    /// Only IP addresses
    Ips,
    /// One JSON object per line
    Json,
}

impl Format {
    /// Pick the format from the output flags; `json` wins over the filters
    pub fn from_flags(json: bool, hosts: bool, ips: bool) -> Self {
        match (json, hosts, ips) {
            (true, _, _) => Format::Json,
            (false, true, false) => Format::Hosts,
            (false, false, true) => Format::Ips,
            _ => Format::Plain,
        }
    }
}

/// Lines to print for one resource
fn lines_for(resource: &Resource, format: Format) -> Result<Vec<String>> {
    let addresses = [resource.public_ipv4.as_str(), resource.private_ipv4.as_str()];
    let mut lines = Vec::new();

    match format {
        Format::Json => {
            lines.push(serde_json::to_string(resource).context("Could not serialize resource")?);
        }
        Format::Hosts => {
            if !resource.dns_name.is_empty() {
                lines.push(resource.dns_name.clone());
            }
        }
        Format::Ips => {
            lines.extend(addresses.iter().filter(|a| !a.is_empty()).map(|a| a.to_string()));
        }
        Format::Plain => {
            if !resource.dns_name.is_empty() {
                lines.push(resource.dns_name.clone());
            }
            lines.extend(addresses.iter().filter(|a| !a.is_empty()).map(|a| a.to_string()));
        }
    }

    Ok(lines)
}

/// Write every resource to each of `writers`
pub fn write_resources(resources: &Resources, format: Format, writers: &mut [&mut dyn Write]) -> Result<usize> {
    let mut count = 0;
    for resource in resources {
        for line in lines_for(resource, format)? {
            for writer in writers.iter_mut() {
                writeln!(writer, "{line}").context("Could not write output")?;
            }
            count += 1;
        }
    }
    for writer in writers.iter_mut() {
        writer.flush().context("Could not flush output")?;
    }
    Ok(count)
}
