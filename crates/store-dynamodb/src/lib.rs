//! Implementation of the membership table backed by a DynamoDB table. One
//! row per node address, full-row upserts, no transactional guarantees.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use natsmesh_store::{MembershipEntry, MembershipStore};

const ADDRESS_ATTRIBUTE: &str = "address";
const TIME_ATTRIBUTE: &str = "time";
const STATUS_ATTRIBUTE: &str = "status";

/// Options for configuring a `DynamoDbStore`.
pub struct DynamoDbStoreOptions {
    /// Per-operation timeout applied to every DynamoDB call.
    pub operation_timeout: Duration,

    /// The AWS region to use. Resolved from the environment when `None`.
    pub region: Option<String>,

    /// The name of the DynamoDB table holding membership rows.
    pub table_name: String,
}

impl DynamoDbStoreOptions {
    /// Default per-operation timeout for DynamoDB calls.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Membership table backed by DynamoDB.
#[derive(Clone, Debug)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new `DynamoDbStore` with the specified options.
    pub async fn new(
        DynamoDbStoreOptions {
            operation_timeout,
            region,
            table_name,
        }: DynamoDbStoreOptions,
    ) -> Self {
        let mut loader = aws_config::from_env().timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(operation_timeout)
                .build(),
        );

        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let config = loader.load().await;

        Self {
            client: Client::new(&config),
            table_name,
        }
    }

    fn entry_from_row(row: &HashMap<String, AttributeValue>) -> Result<MembershipEntry, Error> {
        let address = row
            .get(ADDRESS_ATTRIBUTE)
            .and_then(|value| value.as_s().ok())
            .cloned()
            .ok_or_else(|| {
                Error::MalformedRow("<unknown>".to_string(), "missing string attribute 'address'")
            })?;

        let last_seen = row
            .get(TIME_ATTRIBUTE)
            .and_then(|value| value.as_n().ok())
            .and_then(|number| number.parse().ok())
            .ok_or_else(|| {
                Error::MalformedRow(address.clone(), "missing numeric attribute 'time'")
            })?;

        let status = row
            .get(STATUS_ATTRIBUTE)
            .and_then(|value| value.as_s().ok())
            .and_then(|status| status.parse().ok())
            .ok_or_else(|| {
                Error::MalformedRow(address.clone(), "unrecognized 'status' attribute")
            })?;

        Ok(MembershipEntry {
            address,
            last_seen,
            status,
        })
    }
}

#[async_trait]
impl MembershipStore for DynamoDbStore {
    type Error = Error;

    async fn delete<A: AsRef<str> + Send>(&self, address: A) -> Result<(), Self::Error> {
        // DynamoDB treats deletion of an absent key as success, which is
        // exactly what redundant stale reaping across nodes needs.
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                ADDRESS_ATTRIBUTE,
                AttributeValue::S(address.as_ref().to_string()),
            )
            .send()
            .await
            .map_err(|e| Error::DynamoDb(e.into()))?;

        Ok(())
    }

    async fn get<A: AsRef<str> + Send>(
        &self,
        address: A,
    ) -> Result<Option<MembershipEntry>, Self::Error> {
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(
                ADDRESS_ATTRIBUTE,
                AttributeValue::S(address.as_ref().to_string()),
            )
            .send()
            .await
            .map_err(|e| Error::DynamoDb(e.into()))?;

        resp.item.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn put(&self, entry: MembershipEntry) -> Result<(), Self::Error> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(ADDRESS_ATTRIBUTE, AttributeValue::S(entry.address))
            .item(
                TIME_ATTRIBUTE,
                AttributeValue::N(entry.last_seen.to_string()),
            )
            .item(
                STATUS_ATTRIBUTE,
                AttributeValue::S(entry.status.to_string()),
            )
            .send()
            .await
            .map_err(|e| Error::DynamoDb(e.into()))?;

        Ok(())
    }

    async fn scan(&self) -> Result<Vec<MembershipEntry>, Self::Error> {
        let mut entries = Vec::new();
        let mut start_key = None;

        loop {
            let resp = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| Error::DynamoDb(e.into()))?;

            for row in resp.items() {
                entries.push(Self::entry_from_row(row)?);
            }

            match resp.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use natsmesh_store::NodeStatus;

    fn row(address: &str, time: &str, status: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (
                ADDRESS_ATTRIBUTE.to_string(),
                AttributeValue::S(address.to_string()),
            ),
            (TIME_ATTRIBUTE.to_string(), AttributeValue::N(time.to_string())),
            (
                STATUS_ATTRIBUTE.to_string(),
                AttributeValue::S(status.to_string()),
            ),
        ])
    }

    #[test]
    fn test_parses_well_formed_row() {
        let entry = DynamoDbStore::entry_from_row(&row("10.0.0.1", "1700000000", "working"))
            .unwrap();

        assert_eq!(entry.address, "10.0.0.1");
        assert_eq!(entry.last_seen, 1700000000);
        assert_eq!(entry.status, NodeStatus::Working);
    }

    #[test]
    fn test_rejects_non_numeric_time() {
        let mut bad = row("10.0.0.1", "1700000000", "working");
        bad.insert(
            TIME_ATTRIBUTE.to_string(),
            AttributeValue::S("1700000000".to_string()),
        );

        assert!(DynamoDbStore::entry_from_row(&bad).is_err());
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!(DynamoDbStore::entry_from_row(&row("10.0.0.1", "1700000000", "offline")).is_err());
    }

    #[test]
    fn test_rejects_missing_address() {
        let mut bad = row("10.0.0.1", "1700000000", "working");
        bad.remove(ADDRESS_ATTRIBUTE);

        assert!(DynamoDbStore::entry_from_row(&bad).is_err());
    }
}
