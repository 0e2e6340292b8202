//! Scaleway provider
//!
//! Lists instance servers in each configured availability zone. The
//! instance API pages by number and reports the total in `x-total-count`.

use super::http::{client_for, parse_endpoint, HttpClient};
use super::normalize::strip_root;
use super::paginate::{collect_pages, Page};
use super::{profile_of, Provider};
use crate::error::{BoxError, Result};
use crate::schema::{OptionBlock, Resource, Resources};
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const PROVIDER_NAME: &str = "scw";

const DEFAULT_ENDPOINT: &str = "https://api.scaleway.com";
const PER_PAGE: usize = 100;
const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Zones queried when `scaleway_zones` is not set
pub const DEFAULT_ZONES: &[&str] = &["fr-par-1", "fr-par-2", "fr-par-3", "nl-ams-1", "nl-ams-2", "pl-waw-1"];

#[derive(Debug, Deserialize)]
struct ServersResponse {
    #[serde(default)]
    servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
struct Server {
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    public_ip: Option<PublicIp>,
    #[serde(default)]
    private_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicIp {
    #[serde(default)]
    address: String,
}

impl Server {
    fn into_resource(self, profile: &str) -> Resource {
        let public_ipv4 = self.public_ip.map(|ip| ip.address).unwrap_or_default();
        let name = if self.hostname.is_empty() { self.name } else { self.hostname };

        Resource {
            provider: PROVIDER_NAME.to_string(),
            profile: profile.to_string(),
            dns_name: strip_root(&name).to_string(),
            public: !public_ipv4.is_empty(),
            public_ipv4,
            private_ipv4: self.private_ip.unwrap_or_default(),
        }
    }
}

/// Whether results remain after `page` given the reported total
fn has_more(page: usize, total: usize) -> bool {
    page.saturating_mul(PER_PAGE) < total
}

fn parse_zones(raw: Option<&str>) -> Vec<String> {
    let zones: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(str::to_string)
        .collect();

    if zones.is_empty() {
        DEFAULT_ZONES.iter().map(|z| z.to_string()).collect()
    } else {
        zones
    }
}

/// Provider for the Scaleway instance API
pub struct ScalewayProvider {
    profile: String,
    token: String,
    zones: Vec<String>,
    http: HttpClient,
    endpoint: url::Url,
}

impl ScalewayProvider {
    /// Build from a config block with `scaleway_access_key` and `scaleway_access_token`
    pub fn new(block: &OptionBlock) -> Result<Self> {
        // The instance API authenticates with the token alone; the key is still part of a valid block
        block.require(PROVIDER_NAME, "scaleway_access_key")?;

        Ok(Self {
            profile: profile_of(block),
            token: block.require(PROVIDER_NAME, "scaleway_access_token")?.to_string(),
            zones: parse_zones(block.get_metadata("scaleway_zones")),
            http: client_for(PROVIDER_NAME)?,
            endpoint: parse_endpoint(PROVIDER_NAME, DEFAULT_ENDPOINT)?,
        })
    }

    /// Send requests to `endpoint` instead of the public API
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = parse_endpoint(PROVIDER_NAME, endpoint)?;
        Ok(self)
    }

    /// Zones this instance lists, in query order
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    async fn list_servers(
        &self,
        zone: &str,
        page: Option<String>,
    ) -> std::result::Result<Page<Server>, BoxError> {
        let page: usize = page.as_deref().unwrap_or("1").parse()?;

        let mut url = self
            .endpoint
            .join(&format!("instance/v1/zones/{}/servers", urlencoding::encode(zone)))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &PER_PAGE.to_string());

        let request = self
            .http
            .get(url)
            .header("X-Auth-Token", &self.token)
            .build()?;
        let fetched = self.http.execute(request).await?;

        let total = fetched
            .headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let response: ServersResponse = serde_json::from_str(&fetched.body)?;

        Ok(if has_more(page, total) {
            Page::more(response.servers, (page + 1).to_string())
        } else {
            Page::last(response.servers)
        })
    }
}

#[async_trait]
impl Provider for ScalewayProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn profile(&self) -> &str {
        &self.profile
    }

    async fn get_resource(&self, ctx: &CancellationToken) -> Result<Resources> {
        let mut list = Resources::new();

        for zone in &self.zones {
            let operation = format!("listing servers in zone {zone}");
            let servers = collect_pages(
                ctx,
                &operation,
                |page| self.list_servers(zone, page),
                |server| Some(server.into_resource(&self.profile)),
            )
            .await?;
            list.merge(servers);
        }

        Ok(list)
    }
}
