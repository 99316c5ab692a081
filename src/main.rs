//! trustedcoin
//!
//! Serves Bitcoin block, fee and transaction data to a Lightning node from a
//! local bitcoind when one is configured, or from public block explorers whose
//! answers are verified before use.
//!
//! # Architecture Overview
//!
//! ```text
//!     host / operator
//!           │
//!           ▼
//!     ┌───────────┐     ┌──────────────────────────────────────────────┐
//!     │ http API  │────▶│                   engine                     │
//!     │ or CLI    │     │  tip · block · fees · transaction · broadcast│
//!     └───────────┘     │                                              │
//!                       │  fallback: node ─▶ provider ─▶ provider ...  │
//!                       │  trust cache: height → verified hash         │
//!                       └───────┬──────────────────────┬───────────────┘
//!                               │                      │
//!                               ▼                      ▼
//!                       ┌──────────────┐      ┌──────────────────────┐
//!                       │  bitcoind    │      │ esplora / blockchain │
//!                       │  (trusted)   │      │ .info / blockchair   │
//!                       └──────────────┘      └──────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use trustedcoin::chain::Network;
use trustedcoin::config::loader::{read_config, ConfigError};
use trustedcoin::config::validation::validate_config;
use trustedcoin::config::TrustedcoinConfig;
use trustedcoin::engine::Engine;
use trustedcoin::http::handlers::fee_response;
use trustedcoin::http::{ChainInfoResponse, HttpServer, RawBlockResponse, UtxoResponse};
use trustedcoin::lifecycle::{build_engine, wait_for_signal, Shutdown};
use trustedcoin::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "trustedcoin")]
#[command(about = "Verified Bitcoin chain data from bitcoind or public explorers", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chain to serve (bitcoin, testnet, signet, liquid).
    #[arg(long)]
    network: Option<Network>,

    /// Hostname (IP) of the bitcoind RPC.
    #[arg(long = "bitcoin-rpcconnect")]
    rpc_connect: Option<String>,

    /// Port of the bitcoind RPC.
    #[arg(long = "bitcoin-rpcport")]
    rpc_port: Option<u16>,

    /// Username for the bitcoind RPC.
    #[arg(long = "bitcoin-rpcuser")]
    rpc_user: Option<String>,

    /// Password for the bitcoind RPC.
    #[arg(long = "bitcoin-rpcpassword")]
    rpc_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,
    /// Print chain name and tip height
    Tip,
    /// Print the raw block at a height
    Block { height: u64 },
    /// Print current fee estimates
    Fees,
    /// Print a transaction's outputs
    Tx { txid: String },
    /// Print one transaction output
    Utxo { txid: String, vout: u32 },
    /// Broadcast a raw transaction (hex)
    Send { tx: String },
}

impl Cli {
    fn load(&self) -> Result<TrustedcoinConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => TrustedcoinConfig::default(),
        };
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(host) = &self.rpc_connect {
            config.bitcoind.rpc_connect = Some(host.clone());
        }
        if let Some(port) = self.rpc_port {
            config.bitcoind.rpc_port = Some(port);
        }
        if let Some(user) = &self.rpc_user {
            config.bitcoind.rpc_user = Some(user.clone());
        }
        if let Some(password) = &self.rpc_password {
            config.bitcoind.rpc_password = Some(password.clone());
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), network = %config.network, "trustedcoin starting");

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let engine = Arc::new(build_engine(&config)?);

    match cli.command {
        Commands::Serve => serve(&config, engine).await?,
        Commands::Tip => print_json(&ChainInfoResponse::fetch(&engine).await?)?,
        Commands::Block { height } => {
            print_json(&RawBlockResponse::from_result(height, engine.get_block(height).await))?
        }
        Commands::Fees => print_json(&fee_response(config.fees.shape, engine.get_fee_rates().await))?,
        Commands::Tx { txid } => {
            let details = engine.get_transaction(&txid).await?;
            print_json(&TxReport {
                txid: details.txid.to_string(),
                outputs: details.outputs,
            })?
        }
        Commands::Utxo { txid, vout } => {
            let output = engine.get_output(&txid, vout).await?;
            print_json(&UtxoResponse {
                amount: output.as_ref().map(|o| o.value),
                script: output.map(|o| o.script_pubkey),
            })?
        }
        Commands::Send { tx } => print_json(&engine.send_raw_transaction(&tx).await)?,
    }

    Ok(())
}

#[derive(Serialize)]
struct TxReport {
    txid: String,
    outputs: Vec<trustedcoin::chain::TxOutputView>,
}

async fn serve(config: &TrustedcoinConfig, engine: Arc<Engine>) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    // Both engine chains (hash, then block) may run to their deadline.
    let request_timeout = config.timeouts.operation_deadline() * 2;
    let server = HttpServer::new(engine, config.fees.shape, request_timeout);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
