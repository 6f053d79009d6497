use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been launched.
    #[error("nats server already started")]
    AlreadyStarted,

    /// No `nats-server` binary was found on the PATH or in the given dir.
    #[error("nats-server binary not found")]
    BinaryNotFound,

    /// `launch` was called before any configuration was written.
    #[error("no cluster configuration written")]
    ConfigMissing,

    /// Failed to write the generated configuration.
    #[error("failed to write nats config: {0}")]
    ConfigWrite(#[from] std::io::Error),

    /// A monitoring endpoint request failed.
    #[error("monitoring request failed: {0}")]
    Monitor(#[from] natsmesh_nats_monitor::Error),

    /// An operation that needs a running server was called before launch.
    #[error("nats server not started")]
    NotStarted,

    /// Failed to capture the server's stderr stream.
    #[error("failed to capture nats server output")]
    OutputParse,

    /// The server never became ready within the allotted attempts.
    #[error("nats server not ready after {0} checks")]
    ReadyTimeout(u32),

    /// Failed to spawn the server process.
    #[error("failed to spawn nats server: {0}")]
    Spawn(std::io::Error),
}
