use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use peer_monitor::config::MonitorConfig;
use peer_monitor::identity::ConfigIdentity;
use peer_monitor::transport::HttpTransport;
use peer_monitor::{Peer, PeerContext, PeerResponse};

#[derive(Parser)]
#[command(name = "peer-cli")]
#[command(about = "Probe a single peer and print what it reports", long_about = None)]
struct Cli {
    /// Network identifier the peer must report.
    #[arg(short, long)]
    nethash: String,

    /// Request timeout in milliseconds.
    #[arg(short, long, default_value_t = 5000)]
    timeout_ms: u64,

    /// OS advertised to the peer.
    #[arg(long, default_value = std::env::consts::OS)]
    os: String,

    /// Version advertised to the peer.
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    version: String,

    /// Port advertised to the peer.
    #[arg(long, default_value_t = 7000)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full health check and print the peer's status
    Status { ip: String, port: u16 },
    /// Query the peer's protocol height endpoint
    Height { ip: String, port: u16 },
    /// GET an arbitrary path on the peer
    Get { ip: String, port: u16, path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = MonitorConfig::default();
    config.nethash = cli.nethash;
    config.peers.options.timeout_ms = cli.timeout_ms;
    config.identity.os = cli.os;
    config.identity.version = cli.version;
    config.identity.port = cli.port;

    let transport = Arc::new(HttpTransport::new()?);
    let identity = ConfigIdentity::from_config(&config);
    let context = Arc::new(PeerContext::bind(&config, &identity, transport));

    match cli.command {
        Commands::Status { ip, port } => {
            let peer = Peer::new(ip, port, context);
            peer.update_status().await;
            let state = peer.state();
            print_json(&json!({
                "peer": peer.to_string(),
                "snapshot": peer.snapshot(),
                "nethash": state.nethash,
                "publicApi": state.public_api,
                "liteClient": peer.is_lite_client(),
            }))?;
        }
        Commands::Height { ip, port } => {
            let peer = Peer::new(ip, port, context);
            print_result(&peer, peer.fetch_height().await)?;
        }
        Commands::Get { ip, port, path } => {
            let peer = Peer::new(ip, port, context);
            print_result(&peer, peer.get(&path).await)?;
        }
    }

    Ok(())
}

fn print_result(
    peer: &Peer,
    result: Result<PeerResponse, peer_monitor::PeerError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(response) => print_json(&json!({
            "body": response.body,
            "peer": response.peer,
        })),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Peer status: {}", peer.status());
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
