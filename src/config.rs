//! Configuration Management
//!
//! Reads the YAML list of provider blocks and scaffolds a commented default
//! file on first run.

use crate::schema::{OptionBlock, Options};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Template written when the default config file does not exist yet
pub const DEFAULT_CONFIG_FILE: &str = r#"# Configuration file for cloudlist enumeration agent
#- # provider is the name of the provider
#  provider: do
#  # profile is the name of the provider profile
#  profile: xxxx
#  # digitalocean_token is the API key for digitalocean cloud platform
#  digitalocean_token: xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx
#
#- # provider is the name of the provider
#  provider: scw
#  # scaleway_access_key is the access key for scaleway API
#  scaleway_access_key: SCWXXXXXXXXXXXXXX
#  # scaleway_access_token is the access token for scaleway API
#  scaleway_access_token: xxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxx
#  # scaleway_zones lists the zones to query (optional)
#  scaleway_zones: fr-par-1,nl-ams-1
#
#- # provider is the name of the provider
#  provider: aws
#  # profile is the name of the provider profile
#  profile: staging
#  # aws_access_key is the access key for AWS account
#  aws_access_key: AKIAXXXXXXXXXXXXXX
#  # aws_secret_key is the secret key for AWS account
#  aws_secret_key: xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx
#  # aws_session_token session token for temporary security credentials retrieved via STS (optional)
#  aws_session_token: xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx
#
#- # provider is the name of the provider
#  provider: gcp
#  # profile is the name of the provider profile
#  profile: logs
#  # gcp_service_account_key is the service account key JSON for the project
#  gcp_service_account_key: '{"type": "service_account", "project_id": "..."}'
#  # gcp_project_id overrides the project of the key (optional)
#  gcp_project_id: my-project
"#;

/// Default config file location (`~/.config/cloudlist/config.yaml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("cloudlist").join("config.yaml"))
}

/// Read provider blocks from a YAML file
pub fn read_config(path: &Path) -> Result<Options> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file {}", path.display()))?;
    parse_config(&content)
}

/// Parse provider blocks from YAML text
pub fn parse_config(content: &str) -> Result<Options> {
    let has_content = content.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_content {
        bail!("invalid configuration file provided");
    }

    serde_yaml::from_str(content).context("Could not parse config file")
}

/// Write the template to `path` if it does not exist
///
/// Returns whether a file was created.
pub fn create_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG_FILE)
        .with_context(|| format!("Could not write default config to {}", path.display()))?;

    Ok(true)
}

/// Keep only blocks whose `provider` is in the comma-separated `filter`
pub fn filter_providers(options: Options, filter: Option<&str>) -> Options {
    let Some(filter) = filter else {
        return options;
    };
    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if wanted.is_empty() {
        return options;
    }

    options
        .into_iter()
        .filter(|block: &OptionBlock| {
            block
                .get_metadata("provider")
                .is_some_and(|p| wanted.contains(&p))
        })
        .collect()
}
