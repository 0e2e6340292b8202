//! Google Cloud DNS provider
//!
//! Lists the managed zones of one project and the `A` record sets of each.
//! Both listings page with `pageToken` / `nextPageToken`.

pub mod auth;

use super::http::{client_for, parse_endpoint, HttpClient};
use super::normalize::{normalize_record, RawRecord};
use super::paginate::{collect_pages, Page, Pager};
use super::{profile_of, Provider};
use crate::error::{BoxError, Error, Result};
use crate::schema::{OptionBlock, Resources};
use async_trait::async_trait;
use auth::{AccessToken, ServiceAccountCredentials};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const PROVIDER_NAME: &str = "gcp";

const DEFAULT_ENDPOINT: &str = "https://dns.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZonesResponse {
    #[serde(default)]
    managed_zones: Vec<ManagedZone>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedZone {
    name: String,
    #[serde(default)]
    dns_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RrsetsResponse {
    #[serde(default)]
    rrsets: Vec<Rrset>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rrset {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    rrdatas: Vec<String>,
}

/// `nextPageToken` is present exactly when more results follow
fn page_of<T>(items: Vec<T>, next_page_token: Option<String>) -> Page<T> {
    Page {
        items,
        truncated: next_page_token.is_some(),
        next_cursor: next_page_token,
    }
}

/// Provider for the Google Cloud DNS API
pub struct CloudDnsProvider {
    profile: String,
    project_id: String,
    credentials: Arc<dyn AccessToken>,
    http: HttpClient,
    endpoint: url::Url,
}

impl CloudDnsProvider {
    /// Build from a config block with `gcp_service_account_key`
    pub fn new(block: &OptionBlock) -> Result<Self> {
        let key = block.require(PROVIDER_NAME, "gcp_service_account_key")?;
        let credentials = ServiceAccountCredentials::from_json(key).map_err(|e| {
            Error::configuration(PROVIDER_NAME, format!("invalid gcp_service_account_key: {e}"))
        })?;

        let project_id = match block.get_metadata("gcp_project_id").map(str::trim) {
            Some(project) if !project.is_empty() => project.to_string(),
            _ => auth::key_project_id(key).ok_or_else(|| {
                Error::configuration(PROVIDER_NAME, "gcp_project_id is missing and the key has no project_id")
            })?,
        };

        Self::with_credentials(block, &project_id, Arc::new(credentials))
    }

    /// Build with an explicit token source
    pub fn with_credentials(
        block: &OptionBlock,
        project_id: &str,
        credentials: Arc<dyn AccessToken>,
    ) -> Result<Self> {
        Ok(Self {
            profile: profile_of(block),
            project_id: project_id.to_string(),
            credentials,
            http: client_for(PROVIDER_NAME)?,
            endpoint: parse_endpoint(PROVIDER_NAME, DEFAULT_ENDPOINT)?,
        })
    }

    /// Send requests to `endpoint` instead of the public API
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = parse_endpoint(PROVIDER_NAME, endpoint)?;
        Ok(self)
    }

    /// Build Cloud DNS API URL under the project
    fn project_url(&self, path: &str) -> std::result::Result<url::Url, BoxError> {
        Ok(self.endpoint.join(&format!(
            "dns/v1/projects/{}/{}",
            urlencoding::encode(&self.project_id),
            path
        ))?)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        mut url: url::Url,
        page_token: Option<String>,
    ) -> std::result::Result<T, BoxError> {
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", &token);
        }
        let token = self.credentials.access_token().await?;
        let request = self.http.get(url).bearer_auth(token).build()?;
        Ok(self.http.execute_json(request).await?)
    }

    async fn list_managed_zones(
        &self,
        page_token: Option<String>,
    ) -> std::result::Result<Page<ManagedZone>, BoxError> {
        let url = self.project_url("managedZones")?;
        let response: ManagedZonesResponse = self.get(url, page_token).await?;
        Ok(page_of(response.managed_zones, response.next_page_token))
    }

    async fn list_rrsets(
        &self,
        zone: &str,
        page_token: Option<String>,
    ) -> std::result::Result<Page<RawRecord>, BoxError> {
        let url = self.project_url(&format!("managedZones/{}/rrsets", urlencoding::encode(zone)))?;
        let response: RrsetsResponse = self.get(url, page_token).await?;

        let records = response
            .rrsets
            .into_iter()
            .map(|set| RawRecord {
                name: set.name,
                record_type: set.record_type,
                values: set.rrdatas,
            })
            .collect();
        Ok(page_of(records, response.next_page_token))
    }
}

#[async_trait]
impl Provider for CloudDnsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn profile(&self) -> &str {
        &self.profile
    }

    async fn get_resource(&self, ctx: &CancellationToken) -> Result<Resources> {
        let mut list = Resources::new();
        let mut zones = Pager::new();

        while let Some(page) = zones
            .next(ctx, "listing zones", |token| self.list_managed_zones(token))
            .await?
        {
            for zone in &page {
                tracing::debug!("listing records for zone {} ({})", zone.name, zone.dns_name);
                let operation = format!("listing records for zone {}", zone.name);
                let records = collect_pages(
                    ctx,
                    &operation,
                    |token| self.list_rrsets(&zone.name, token),
                    |record| normalize_record(PROVIDER_NAME, &self.profile, record),
                )
                .await?;
                list.merge(records);
            }
        }

        Ok(list)
    }
}
