use thiserror::Error;

use crate::settings::SettingsError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal conditions, one per lifecycle stage. There is no in-process
/// recovery anywhere: each of these terminates the whole process with its
/// own exit code, and an external supervisor is expected to restart it.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file could not be loaded.
    #[error("error reading config: {0}")]
    Settings(#[from] SettingsError),

    /// The membership table could not be scanned or reaped at bootstrap.
    #[error("cannot access membership table: {0}")]
    Discovery(#[source] BoxError),

    /// Publishing the `starting` status failed.
    #[error("cannot publish starting status: {0}")]
    PublishStarting(#[source] BoxError),

    /// The cluster configuration could not be generated or written.
    #[error("cannot generate cluster configuration: {0}")]
    GenerateConfig(#[source] BoxError),

    /// The broker daemon could not be launched or never became ready.
    #[error("cannot run nats server: {0}")]
    Launch(#[source] BoxError),

    /// A running-phase health probe failed. The daemon is gone for good.
    #[error("nats server is dead: {0}")]
    Probe(#[source] BoxError),

    /// Publishing the `working` keepalive failed.
    #[error("cannot publish working status: {0}")]
    PublishWorking(#[source] BoxError),

    /// This node's own address could not be resolved.
    #[error("cannot resolve own address: {0}")]
    SelfAddress(#[from] natsmesh_imds::Error),
}

impl Error {
    /// The process exit code for this failure stage.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Settings(_) => 1,
            Self::Discovery(_) => 2,
            Self::PublishStarting(_) => 3,
            Self::GenerateConfig(_) => 4,
            Self::Launch(_) => 5,
            Self::Probe(_) => 6,
            Self::PublishWorking(_) => 7,
            Self::SelfAddress(_) => 8,
        }
    }
}
