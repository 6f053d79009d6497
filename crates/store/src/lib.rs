//! Abstract interface for the shared membership table used as the rendezvous
//! point for node discovery.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Marker trait for errors returned by membership store implementations.
pub trait MembershipStoreError: Debug + Error + Send + Sync + 'static {}

/// Status a node advertises about itself in its membership row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// The node has published its row but not yet launched its broker.
    Starting,

    /// The node's broker is running and passing health checks.
    Working,

    /// The node failed to bring its broker up.
    Error,
}

impl NodeStatus {
    /// The string form stored in the `status` attribute of the table row.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Working => "working",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(Self::Starting),
            "working" => Ok(Self::Working),
            "error" => Ok(Self::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized status string from the table.
#[derive(Clone, Debug, thiserror::Error)]
#[error("unknown node status: {0}")]
pub struct UnknownStatus(pub String);

/// One row of the membership table.
///
/// A node only ever writes the row keyed by its own address (full-row
/// upsert); other nodes read it, and may delete it once it has gone stale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    /// The node's externally reachable network identity. Unique key.
    pub address: String,

    /// Epoch seconds of the most recent self-reported keepalive.
    #[serde(rename = "time")]
    pub last_seen: u64,

    /// Self-reported status.
    pub status: NodeStatus,
}

/// A trait representing the shared membership table with asynchronous
/// operations.
///
/// Implementations provide no transactional guarantees across operations: a
/// scan may race with a concurrent write from another node. Last writer wins
/// per key, and a `delete` of an already-absent address must be a no-op.
#[async_trait]
pub trait MembershipStore: Clone + Send + Sync + 'static {
    /// The error type returned by store operations.
    type Error: MembershipStoreError;

    /// Removes the entry for `address`. Removing an absent entry succeeds.
    async fn delete<A: AsRef<str> + Send>(&self, address: A) -> Result<(), Self::Error>;

    /// Retrieves the entry for `address`, if present.
    async fn get<A: AsRef<str> + Send>(
        &self,
        address: A,
    ) -> Result<Option<MembershipEntry>, Self::Error>;

    /// Upserts `entry`, keyed by its address.
    async fn put(&self, entry: MembershipEntry) -> Result<(), Self::Error>;

    /// Returns every entry currently in the table.
    async fn scan(&self) -> Result<Vec<MembershipEntry>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [NodeStatus::Starting, NodeStatus::Working, NodeStatus::Error] {
            assert_eq!(status.as_str().parse::<NodeStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!("rebooting".parse::<NodeStatus>().is_err());
    }

    #[test]
    fn test_entry_row_layout() {
        let entry = MembershipEntry {
            address: "10.0.0.1".to_string(),
            last_seen: 1700000000,
            status: NodeStatus::Working,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "address": "10.0.0.1",
                "time": 1700000000u64,
                "status": "working",
            })
        );
    }
}
