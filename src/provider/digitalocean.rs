//! DigitalOcean provider
//!
//! Lists the account's domains and the `A` records of each domain through the
//! v2 REST API. Pages are addressed by number; a page is truncated when the
//! response links to a next page.

use super::http::{client_for, parse_endpoint, HttpClient};
use super::normalize::{normalize_record, RawRecord};
use super::paginate::{collect_pages, Page, Pager};
use super::{profile_of, Provider};
use crate::error::{BoxError, Result};
use crate::schema::{OptionBlock, Resources};
use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const PROVIDER_NAME: &str = "do";

const DEFAULT_ENDPOINT: &str = "https://api.digitalocean.com";
const PER_PAGE: &str = "200";

#[derive(Debug, Deserialize)]
struct DomainsResponse {
    #[serde(default)]
    domains: Vec<Domain>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Clone, Deserialize)]
struct Domain {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    domain_records: Vec<DomainRecord>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct DomainRecord {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

impl Links {
    /// Page number of the `next` link, if the listing continues
    fn next_page(&self) -> Option<String> {
        let next = self.pages.as_ref()?.next.as_deref()?;
        let url = url::Url::parse(next).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
    }

    fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        let next_cursor = self.next_page();
        Page {
            items,
            truncated: next_cursor.is_some(),
            next_cursor,
        }
    }
}

/// Records are relative to their domain; `@` is the apex
fn qualify(record_name: &str, domain: &str) -> String {
    match record_name {
        "@" | "" => domain.to_string(),
        name if name.ends_with('.') => name.to_string(),
        name => format!("{name}.{domain}"),
    }
}

/// Provider for the DigitalOcean API
pub struct DigitalOceanProvider {
    profile: String,
    token: String,
    http: HttpClient,
    endpoint: url::Url,
}

impl DigitalOceanProvider {
    /// Build from a config block with `digitalocean_token`
    pub fn new(block: &OptionBlock) -> Result<Self> {
        Ok(Self {
            profile: profile_of(block),
            token: block.require(PROVIDER_NAME, "digitalocean_token")?.to_string(),
            http: client_for(PROVIDER_NAME)?,
            endpoint: parse_endpoint(PROVIDER_NAME, DEFAULT_ENDPOINT)?,
        })
    }

    /// Send requests to `endpoint` instead of the public API
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = parse_endpoint(PROVIDER_NAME, endpoint)?;
        Ok(self)
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        page: Option<String>,
    ) -> std::result::Result<T, BoxError> {
        let mut url = self.endpoint.join(path)?;
        url.query_pairs_mut()
            .append_pair("page", page.as_deref().unwrap_or("1"))
            .append_pair("per_page", PER_PAGE);

        let request = self.http.get(url).bearer_auth(&self.token).build()?;
        Ok(self.http.execute_json(request).await?)
    }

    async fn list_domains(&self, page: Option<String>) -> std::result::Result<Page<Domain>, BoxError> {
        let response: DomainsResponse = self.get_page("v2/domains", page).await?;
        Ok(response.links.into_page(response.domains))
    }

    async fn list_domain_records(
        &self,
        domain: &str,
        page: Option<String>,
    ) -> std::result::Result<Page<RawRecord>, BoxError> {
        let path = format!("v2/domains/{}/records", urlencoding::encode(domain));
        let response: RecordsResponse = self.get_page(&path, page).await?;

        let records = response
            .domain_records
            .into_iter()
            .map(|record| RawRecord {
                name: qualify(&record.name, domain),
                record_type: record.record_type,
                values: record.data.into_iter().collect(),
            })
            .collect();
        Ok(response.links.into_page(records))
    }
}

#[async_trait]
impl Provider for DigitalOceanProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn profile(&self) -> &str {
        &self.profile
    }

    async fn get_resource(&self, ctx: &CancellationToken) -> Result<Resources> {
        let mut list = Resources::new();
        let mut domains = Pager::new();

        while let Some(page) = domains
            .next(ctx, "listing zones", |page| self.list_domains(page))
            .await?
        {
            for domain in &page {
                let operation = format!("listing records for zone {}", domain.name);
                let records = collect_pages(
                    ctx,
                    &operation,
                    |page| self.list_domain_records(&domain.name, page),
                    |record| normalize_record(PROVIDER_NAME, &self.profile, record),
                )
                .await?;
                list.merge(records);
            }
        }

        Ok(list)
    }
}
