//! Configures and supervises the local `nats-server` daemon.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;

pub use config::{
    ClusterConfig, DEFAULT_CLIENT_PORT, DEFAULT_CLUSTER_PORT, DEFAULT_HTTP_PORT,
};
pub use error::{Error, Result};

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use natsmesh_nats_monitor::NatsMonitor;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

/// Regex pattern for matching NATS server log lines.
static LOG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d+\] \d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}\.\d{6} (\[[A-Z]+\]) (.*)")
        .expect("Invalid regex pattern")
});

/// Seam between the liveness loop and the broker daemon it supervises.
///
/// The daemon moves `NotStarted -> Running -> (Healthy | Dead)` from the
/// supervisor's perspective. A failed `probe` means `Dead`, which is
/// terminal: nothing here resurrects the daemon.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// The error type returned by broker operations.
    type Error: Debug + std::error::Error + Send + Sync + 'static;

    /// Writes the generated configuration artifact the daemon will consume
    /// at launch.
    async fn write_config(&self, config: &ClusterConfig) -> std::result::Result<(), Self::Error>;

    /// Launches the daemon with the previously written configuration,
    /// returning once it is confirmed reachable on its monitoring port.
    async fn launch(&self) -> std::result::Result<(), Self::Error>;

    /// Queries the daemon's status endpoint. Any non-success response or
    /// transport failure is an error.
    async fn probe(&self) -> std::result::Result<(), Self::Error>;
}

/// Options for configuring a `NatsServer`.
pub struct NatsServerOptions {
    /// Optional path to the directory holding the `nats-server` binary if
    /// it is not in the PATH.
    pub bin_dir: Option<PathBuf>,

    /// The directory to write the generated configuration into.
    pub config_dir: PathBuf,

    /// How many readiness checks to attempt after spawning.
    pub ready_attempts: u32,

    /// Delay between readiness checks.
    pub ready_backoff: Duration,
}

impl Default for NatsServerOptions {
    fn default() -> Self {
        Self {
            bin_dir: None,
            config_dir: PathBuf::from("/etc/natsmesh"),
            ready_attempts: 10,
            ready_backoff: Duration::from_millis(500),
        }
    }
}

/// Supervises a `nats-server` child process.
#[derive(Clone)]
pub struct NatsServer {
    config: Arc<Mutex<Option<ClusterConfig>>>,
    config_dir: PathBuf,
    executable_path: PathBuf,
    monitor: Arc<Mutex<Option<NatsMonitor>>>,
    ready_attempts: u32,
    ready_backoff: Duration,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl NatsServer {
    /// Creates a new `NatsServer` with the specified options.
    ///
    /// # Errors
    ///
    /// Returns an error if the `nats-server` binary cannot be located.
    pub fn new(
        NatsServerOptions {
            bin_dir,
            config_dir,
            ready_attempts,
            ready_backoff,
        }: NatsServerOptions,
    ) -> Result<Self> {
        let executable_path = match bin_dir {
            Some(dir) => dir.join("nats-server"),
            None => which::which("nats-server").map_err(|_| Error::BinaryNotFound)?,
        };

        Ok(Self {
            config: Arc::new(Mutex::new(None)),
            config_dir,
            executable_path,
            monitor: Arc::new(Mutex::new(None)),
            ready_attempts,
            ready_backoff,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        })
    }

    /// Requests the daemon to stop and waits for the child to exit.
    pub async fn shutdown(&self) {
        info!("nats server shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("nats server shutdown");
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("nats-server.conf")
    }

    async fn wait_until_ready(&self, monitor: &NatsMonitor) -> Result<()> {
        for attempt in 1..=self.ready_attempts {
            match monitor.get_varz().await {
                Ok(varz) => {
                    info!("nats server ready (version {})", varz.version);
                    return Ok(());
                }
                Err(e) => {
                    debug!("readiness check {} failed: {}", attempt, e);
                    tokio::time::sleep(self.ready_backoff).await;
                }
            }
        }

        Err(Error::ReadyTimeout(self.ready_attempts))
    }
}

#[async_trait]
impl Broker for NatsServer {
    type Error = Error;

    async fn write_config(&self, config: &ClusterConfig) -> Result<()> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        tokio::fs::write(self.config_path(), config.render()).await?;

        self.config.lock().await.replace(config.clone());

        Ok(())
    }

    async fn launch(&self) -> Result<()> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let config = self
            .config
            .lock()
            .await
            .clone()
            .ok_or(Error::ConfigMissing)?;

        let config_path = self.config_path();

        info!(
            "starting nats server with {} routes",
            config.route_addresses.len()
        );

        let mut cmd = Command::new(&self.executable_path)
            .arg("--config")
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Error::Spawn)?;

        let stderr = cmd.stderr.take().ok_or(Error::OutputParse)?;

        self.task_tracker.spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(caps) = LOG_REGEX.captures(&line) {
                    let label = caps.get(1).map_or("[UKW]", |m| m.as_str());
                    let message = caps.get(2).map_or(line.as_str(), |m| m.as_str());

                    match label {
                        "[INF]" => info!(target: "nats-server", "{}", message),
                        "[DBG]" => debug!(target: "nats-server", "{}", message),
                        "[WRN]" => warn!(target: "nats-server", "{}", message),
                        "[ERR]" | "[FTL]" => error!(target: "nats-server", "{}", message),
                        "[TRC]" => trace!(target: "nats-server", "{}", message),
                        _ => error!(target: "nats-server", "{}", line),
                    }
                } else {
                    error!(target: "nats-server", "{}", line);
                }
            }
        });

        let shutdown_token = self.shutdown_token.clone();

        self.task_tracker.spawn(async move {
            tokio::select! {
                status = cmd.wait() => match status {
                    Ok(status) if status.success() => {
                        info!("nats server exited cleanly");
                    }
                    Ok(status) => {
                        error!("nats server exited with status {}", status);
                    }
                    Err(e) => {
                        error!("failed waiting on nats server: {}", e);
                    }
                },
                () = shutdown_token.cancelled() => {
                    if let Err(e) = cmd.kill().await {
                        warn!("failed to kill nats server: {}", e);
                    }
                }
            }
        });

        self.task_tracker.close();

        let monitor = NatsMonitor::new(config.http_port, NatsMonitor::DEFAULT_REQUEST_TIMEOUT)?;
        self.wait_until_ready(&monitor).await?;
        self.monitor.lock().await.replace(monitor);

        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        let monitor = self
            .monitor
            .lock()
            .await
            .clone()
            .ok_or(Error::NotStarted)?;

        let routez = monitor.get_routez().await?;
        trace!("nats server reports {} routes", routez.num_routes);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_before_launch_is_not_started() {
        let server = NatsServer {
            config: Arc::new(Mutex::new(None)),
            config_dir: PathBuf::from("/tmp"),
            executable_path: PathBuf::from("/usr/bin/nats-server"),
            monitor: Arc::new(Mutex::new(None)),
            ready_attempts: 1,
            ready_backoff: Duration::from_millis(1),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        };

        assert!(matches!(server.probe().await, Err(Error::NotStarted)));
    }

    #[tokio::test]
    async fn test_launch_without_config_is_config_missing() {
        let server = NatsServer {
            config: Arc::new(Mutex::new(None)),
            config_dir: PathBuf::from("/tmp"),
            executable_path: PathBuf::from("/usr/bin/nats-server"),
            monitor: Arc::new(Mutex::new(None)),
            ready_attempts: 1,
            ready_backoff: Duration::from_millis(1),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        };

        assert!(matches!(server.launch().await, Err(Error::ConfigMissing)));
    }

    #[tokio::test]
    async fn test_write_config_creates_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let server = NatsServer {
            config: Arc::new(Mutex::new(None)),
            config_dir: dir.path().to_path_buf(),
            executable_path: PathBuf::from("/usr/bin/nats-server"),
            monitor: Arc::new(Mutex::new(None)),
            ready_attempts: 1,
            ready_backoff: Duration::from_millis(1),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        };

        let config = ClusterConfig::new(vec!["10.0.0.2".to_string()]);
        server.write_config(&config).await.unwrap();

        let written = tokio::fs::read_to_string(server.config_path()).await.unwrap();
        assert_eq!(written, config.render());
        assert_eq!(*server.config.lock().await, Some(config));
    }
}
