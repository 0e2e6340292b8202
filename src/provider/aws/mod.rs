//! AWS Route53 provider
//!
//! Lists every hosted zone of the account and the `A` records inside each
//! through the Route53 SDK. Both listings are paginated: zones by
//! `NextMarker`, records by `NextRecordName` / `NextRecordType` /
//! `NextRecordIdentifier`.

use super::http::parse_endpoint;
use super::normalize::{normalize_record, RawRecord};
use super::paginate::{collect_pages, Page, Pager};
use super::{profile_of, Provider};
use crate::error::{BoxError, Result};
use crate::schema::{OptionBlock, Resources};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_route53::config::retry::RetryConfig;
use aws_sdk_route53::config::Credentials;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{HostedZone, ResourceRecordSet, RrType};
use aws_sdk_route53::Client;
use tokio_util::sync::CancellationToken;

pub const PROVIDER_NAME: &str = "aws";

/// Route53 is a global service signed against us-east-1
const SIGNING_REGION: &str = "us-east-1";
const CREDENTIALS_SOURCE: &str = "cloudlist-config";

/// Position at which Route53 resumes a record listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordCursor {
    name: String,
    record_type: Option<String>,
    identifier: Option<String>,
}

impl RecordCursor {
    /// Pack into the pager's single string: fields joined by spaces, which
    /// never occur in a record name or type. The identifier goes last since
    /// it may contain spaces.
    fn encode(&self) -> String {
        let mut cursor = self.name.clone();
        if let Some(record_type) = &self.record_type {
            cursor.push(' ');
            cursor.push_str(record_type);
            if let Some(identifier) = &self.identifier {
                cursor.push(' ');
                cursor.push_str(identifier);
            }
        }
        cursor
    }

    fn decode(cursor: &str) -> Self {
        let mut parts = cursor.splitn(3, ' ');
        let mut next = || parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        Self {
            name: next().unwrap_or_default(),
            record_type: next(),
            identifier: next(),
        }
    }
}

impl From<&ResourceRecordSet> for RawRecord {
    fn from(set: &ResourceRecordSet) -> Self {
        Self {
            name: set.name().to_string(),
            record_type: set.r#type().as_str().to_string(),
            values: set
                .resource_records()
                .iter()
                .map(|r| r.value().to_string())
                .collect(),
        }
    }
}

/// Hosted zone ids come back as `/hostedzone/Z123`
fn zone_id(raw: &str) -> &str {
    raw.rsplit('/').next().unwrap_or(raw)
}

fn sdk_error<E>(err: E) -> BoxError
where
    E: std::error::Error,
{
    DisplayErrorContext(err).to_string().into()
}

/// Provider for the AWS Route53 API
pub struct Route53Provider {
    profile: String,
    client: Client,
}

impl Route53Provider {
    /// Build from a config block with `aws_access_key` and `aws_secret_key`
    pub fn new(block: &OptionBlock) -> Result<Self> {
        let session_token = block
            .get_metadata("aws_session_token")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let credentials = Credentials::new(
            block.require(PROVIDER_NAME, "aws_access_key")?,
            block.require(PROVIDER_NAME, "aws_secret_key")?,
            session_token,
            None,
            CREDENTIALS_SOURCE,
        );

        let config = aws_sdk_route53::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(SIGNING_REGION))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .build();

        Ok(Self {
            profile: profile_of(block),
            client: Client::from_conf(config),
        })
    }

    /// Send requests to `endpoint` instead of the public API
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let endpoint = parse_endpoint(PROVIDER_NAME, endpoint)?;
        let config = self
            .client
            .config()
            .to_builder()
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .build();
        self.client = Client::from_conf(config);
        Ok(self)
    }

    /// One page of hosted zones, starting at `marker`
    async fn list_hosted_zones(
        &self,
        marker: Option<String>,
    ) -> std::result::Result<Page<HostedZone>, BoxError> {
        let output = self
            .client
            .list_hosted_zones()
            .set_marker(marker)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: output.hosted_zones().to_vec(),
            truncated: output.is_truncated(),
            next_cursor: output.next_marker().map(str::to_string),
        })
    }

    /// One page of record sets in `zone`, starting at `cursor`
    async fn list_resource_record_sets(
        &self,
        zone: &str,
        cursor: Option<String>,
    ) -> std::result::Result<Page<RawRecord>, BoxError> {
        let start = cursor.as_deref().map(RecordCursor::decode);
        let (name, record_type, identifier) = match start {
            Some(c) => (Some(c.name), c.record_type, c.identifier),
            None => (None, None, None),
        };

        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone)
            .set_start_record_name(name)
            .set_start_record_type(record_type.as_deref().map(RrType::from))
            .set_start_record_identifier(identifier)
            .send()
            .await
            .map_err(sdk_error)?;

        let next_cursor = output.next_record_name().map(|name| {
            RecordCursor {
                name: name.to_string(),
                record_type: output.next_record_type().map(|t| t.as_str().to_string()),
                identifier: output.next_record_identifier().map(str::to_string),
            }
            .encode()
        });

        Ok(Page {
            items: output.resource_record_sets().iter().map(RawRecord::from).collect(),
            truncated: output.is_truncated(),
            next_cursor,
        })
    }

    /// Lists the `A` records for a hosted zone
    async fn list_resource_records(&self, ctx: &CancellationToken, zone: &HostedZone) -> Result<Resources> {
        let id = zone_id(zone.id());
        let operation = format!("listing records for zone {id}");
        tracing::debug!("{} ({})", operation, zone.name());

        collect_pages(
            ctx,
            &operation,
            |cursor| self.list_resource_record_sets(id, cursor),
            |record| normalize_record(PROVIDER_NAME, &self.profile, record),
        )
        .await
    }
}

#[async_trait]
impl Provider for Route53Provider {
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
            .next(ctx, "listing zones", |marker| self.list_hosted_zones(marker))
            .await?
        {
            for zone in &page {
                list.merge(self.list_resource_records(ctx, zone).await?);
            }
        }

        Ok(list)
    }
}
