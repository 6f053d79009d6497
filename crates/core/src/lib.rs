//! The supervised lifecycle tying broker process health to membership
//! state: bootstrap once (discover peers, reap stale rows, publish
//! `starting`, generate routing config, launch the daemon), then prove
//! liveness forever (probe, publish `working`, sleep).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod settings;

pub use error::Error;
pub use settings::{DynamoDbSettings, GeneralSettings, Settings, SettingsError};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use natsmesh_imds::Imds;
use natsmesh_membership::classify;
use natsmesh_nats_server::{Broker, ClusterConfig};
use natsmesh_store::{MembershipEntry, MembershipStore, NodeStatus};
use tracing::{error, info, warn};

/// Resolves this node's externally reachable address from the instance
/// metadata service.
///
/// # Errors
///
/// Returns an error if the metadata service is unreachable or reports no
/// public address.
pub async fn resolve_self_address(request_timeout: Duration) -> Result<String, Error> {
    let imds = Imds::new(request_timeout).await?;
    let address = imds.get_public_ipv4().await?;

    Ok(address)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Configuration for a `LivenessLoop`.
pub struct NodeConfig<S, B> {
    /// Liveness window in seconds.
    pub alive_window: u64,

    /// The broker daemon supervisor.
    pub broker: B,

    /// Deletion window in seconds.
    pub delete_window: u64,

    /// Pause between keepalive cycles in the running phase.
    pub keepalive_interval: Duration,

    /// This node's externally reachable address.
    pub self_address: String,

    /// The shared membership table.
    pub store: S,
}

/// The top-level control loop for one node.
pub struct LivenessLoop<S, B> {
    alive_window: u64,
    broker: B,
    delete_window: u64,
    keepalive_interval: Duration,
    self_address: String,
    store: S,
}

impl<S, B> LivenessLoop<S, B>
where
    S: MembershipStore,
    B: Broker,
{
    /// Creates a new `LivenessLoop` from the given configuration.
    pub fn new(
        NodeConfig {
            alive_window,
            broker,
            delete_window,
            keepalive_interval,
            self_address,
            store,
        }: NodeConfig<S, B>,
    ) -> Self {
        Self {
            alive_window,
            broker,
            delete_window,
            keepalive_interval,
            self_address,
            store,
        }
    }

    async fn publish(&self, status: NodeStatus) -> Result<(), S::Error> {
        info!("updating status: {}", status);

        self.store
            .put(MembershipEntry {
                address: self.self_address.clone(),
                last_seen: unix_now(),
                status,
            })
            .await
    }

    /// Publishes an `error` status, swallowing any failure: this only runs
    /// on a path that is already exiting with a more specific error.
    async fn publish_error(&self) {
        if let Err(e) = self.publish(NodeStatus::Error).await {
            warn!("could not publish error status: {:?}", e);
        }
    }

    /// Runs the bootstrap phase once: scan the table, reap stale rows,
    /// publish `starting`, generate the routing config from the live peer
    /// set, and launch the daemon.
    ///
    /// # Errors
    ///
    /// Any failure aborts the phase with the error for the failing stage.
    /// Config-generation and launch failures publish an `error` status
    /// (best effort) first. Nothing already published is rolled back; an
    /// abandoned row goes stale and some future participant reaps it.
    pub async fn bootstrap(&self) -> Result<(), Error> {
        let entries = self
            .store
            .scan()
            .await
            .map_err(|e| Error::Discovery(Box::new(e)))?;

        let classification = classify(
            &entries,
            &self.self_address,
            unix_now(),
            self.alive_window,
            self.delete_window,
        );

        for address in &classification.stale {
            info!("reaping stale member {}", address);
            self.store
                .delete(address)
                .await
                .map_err(|e| Error::Discovery(Box::new(e)))?;
        }

        info!("found {} live peers", classification.live.len());

        self.publish(NodeStatus::Starting)
            .await
            .map_err(|e| Error::PublishStarting(Box::new(e)))?;

        let config = ClusterConfig::new(classification.live);

        if let Err(e) = self.broker.write_config(&config).await {
            self.publish_error().await;
            return Err(Error::GenerateConfig(Box::new(e)));
        }

        if let Err(e) = self.broker.launch().await {
            self.publish_error().await;
            return Err(Error::Launch(Box::new(e)));
        }

        Ok(())
    }

    /// Runs one keepalive cycle: probe the daemon, then publish `working`.
    ///
    /// # Errors
    ///
    /// A probe failure is fatal and publishes nothing further (the daemon
    /// is already unreachable, so there is nowhere meaningful to report).
    /// A publish failure is fatal too; no further probes happen.
    pub async fn step(&self) -> Result<(), Error> {
        self.broker
            .probe()
            .await
            .map_err(|e| Error::Probe(Box::new(e)))?;

        self.publish(NodeStatus::Working)
            .await
            .map_err(|e| Error::PublishWorking(Box::new(e)))?;

        Ok(())
    }

    /// Runs the node until a fatal condition occurs, returning it. There is
    /// no graceful shutdown path and no deregistration from the table:
    /// absence is detected by the other nodes via timeout.
    pub async fn run(&self) -> Error {
        if let Err(e) = self.bootstrap().await {
            error!("bootstrap failed: {}", e);
            return e;
        }

        loop {
            if let Err(e) = self.step().await {
                error!("keepalive cycle failed: {}", e);
                return e;
            }

            tokio::time::sleep(self.keepalive_interval).await;
        }
    }
}
