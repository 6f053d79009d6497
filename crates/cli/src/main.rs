//! CLI binary to bootstrap a natsmesh node: discover peers through the
//! membership table, launch the local NATS server, and keep proving
//! liveness until something fatal happens.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use natsmesh_core::{Error, LivenessLoop, NodeConfig, Settings, resolve_self_address};
use natsmesh_imds::Imds;
use natsmesh_nats_server::{NatsServer, NatsServerOptions};
use natsmesh_store_dynamodb::{DynamoDbStore, DynamoDbStoreOptions};
use tracing::{error, info};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(
        short = 'c',
        long = "config",
        default_value = "natsmesh.conf",
        env = "NATSMESH_CONFIG"
    )]
    config: PathBuf,

    /// NATS server binary directory path, if not in PATH
    #[arg(long, env = "NATSMESH_NATS_BIN_DIR")]
    nats_bin_dir: Option<PathBuf>,

    /// Directory to write the generated NATS configuration into
    #[arg(
        long,
        default_value = "/etc/natsmesh",
        env = "NATSMESH_NATS_CONFIG_DIR"
    )]
    nats_config_dir: PathBuf,
}

async fn run(args: Args) -> Result<Infallible, Error> {
    let settings = Settings::load(&args.config).await?;

    let self_address = resolve_self_address(Imds::DEFAULT_REQUEST_TIMEOUT).await?;
    info!("own address: {}", self_address);

    let store = DynamoDbStore::new(DynamoDbStoreOptions {
        operation_timeout: DynamoDbStoreOptions::DEFAULT_OPERATION_TIMEOUT,
        region: settings.dynamodb.region.clone(),
        table_name: settings.dynamodb.table.clone(),
    })
    .await;

    let broker = NatsServer::new(NatsServerOptions {
        bin_dir: args.nats_bin_dir,
        config_dir: args.nats_config_dir,
        ..NatsServerOptions::default()
    })
    .map_err(|e| Error::Launch(Box::new(e)))?;

    let node = LivenessLoop::new(NodeConfig {
        alive_window: settings.general.servers_timeout,
        broker,
        delete_window: settings.general.delete_timeout,
        keepalive_interval: Duration::from_secs(settings.general.keepalive_interval),
        self_address,
        store,
    });

    Err(node.run().await)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let error = match run(args).await {
        Ok(never) => match never {},
        Err(error) => error,
    };

    error!("{}", error);
    std::process::exit(error.exit_code());
}
