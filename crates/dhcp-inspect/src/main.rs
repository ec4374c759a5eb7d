mod config;
mod listener;
mod summary;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::InspectConfig;
use dhcp_proto::{MacAddress, Message, MessageType};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "/etc/dhcp-inspect/config.yaml";

/// DHCP Inspect - decode, capture and build DHCP packets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a captured DHCP payload (UDP payload only)
    Decode {
        /// File holding the packet
        file: String,
        /// The file contains hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
        /// Print the decoded message as JSON
        #[arg(long)]
        json: bool,
    },
    /// Listen on UDP and log every DHCP message received
    Listen {
        /// Override the configured listen address
        #[arg(short, long)]
        address: Option<Ipv4Addr>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Build a DHCPDISCOVER for a client MAC address
    Discover {
        /// Client MAC address (XX:XX:XX:XX:XX:XX)
        #[arg(long)]
        mac: MacAddress,
        /// Transaction ID (random when omitted)
        #[arg(long)]
        xid: Option<u32>,
        /// Write raw bytes to this file instead of printing hex
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    message_type: Option<MessageType>,
    message: &'a Message,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dhcp_inspect=info,dhcp_proto=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&args.config);

    match args.command {
        Commands::Decode { file, hex, json } => decode_file(&file, hex, json, &config),
        Commands::Listen { address, port } => {
            let mut config = config;
            if let Some(address) = address {
                config.listen_address = address;
            }
            if let Some(port) = port {
                config.port = port;
            }
            listen(config).await
        }
        Commands::Discover { mac, xid, output } => build_discover(mac, xid, output.as_deref()),
    }
}

fn load_config(path: &str) -> InspectConfig {
    if !Path::new(path).exists() {
        info!("Config not found at {}, using defaults", path);
        return InspectConfig::default();
    }

    match InspectConfig::from_file(path) {
        Ok(cfg) => {
            info!("Loaded configuration from {}", path);
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration from {}: {}", path, e);
            info!("Using default configuration");
            InspectConfig::default()
        }
    }
}

fn decode_file(path: &str, hex: bool, json: bool, config: &InspectConfig) -> Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path))?;
    let bytes = if hex {
        let text = String::from_utf8(raw).context("hex input is not UTF-8")?;
        summary::parse_hex(&text)?
    } else {
        raw
    };

    let message =
        Message::decode(&bytes).with_context(|| format!("{} is not a valid DHCP message", path))?;

    if json {
        let output = DecodedOutput {
            message_type: message.classify(),
            message: &message,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", summary::summarize(&message, config.duplicate_policy));
    }
    Ok(())
}

async fn listen(config: InspectConfig) -> Result<()> {
    let socket = listener::bind(&config)
        .await
        .with_context(|| format!("failed to bind {}:{}", config.listen_address, config.port))?;

    let (tx, mut rx) = mpsc::channel(64);
    let server = tokio::spawn(listener::listen_loop(socket, Arc::new(config), tx));

    // Messages are already logged by the listener; just drain them
    while rx.recv().await.is_some() {}

    server.await?
}

fn pick_xid(xid: Option<u32>) -> u32 {
    xid.unwrap_or_else(rand::random::<u32>)
}

fn build_discover(mac: MacAddress, xid: Option<u32>, output: Option<&str>) -> Result<()> {
    let xid = pick_xid(xid);

    let bytes = Message::discover(xid, mac).encode()?;
    info!("Built DHCPDISCOVER xid={:#010x} for {}", xid, mac);

    match output {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path))?;
            info!("Wrote {} bytes to {}", bytes.len(), path);
        }
        None => println!("{}", summary::to_hex(&bytes)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_decode() {
        let args = Args::try_parse_from(["dhcp-inspect", "decode", "packet.bin", "--json"]).unwrap();
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
        assert!(matches!(
            args.command,
            Commands::Decode { ref file, hex: false, json: true } if file == "packet.bin"
        ));
    }

    #[test]
    fn test_args_parse_discover_mac() {
        let args = Args::try_parse_from([
            "dhcp-inspect",
            "discover",
            "--mac",
            "aa:bb:cc:dd:ee:ff",
            "--xid",
            "7",
        ])
        .unwrap();
        match args.command {
            Commands::Discover { mac, xid, output } => {
                assert_eq!(mac, MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]));
                assert_eq!(xid, Some(7));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pick_xid() {
        assert_eq!(pick_xid(Some(7)), 7);

        let xids: Vec<u32> = (0..8).map(|_| pick_xid(None)).collect();
        assert!(xids.iter().any(|&xid| xid != xids[0]));
    }

    #[test]
    fn test_args_reject_bad_mac() {
        assert!(Args::try_parse_from(["dhcp-inspect", "discover", "--mac", "nope"]).is_err());
    }

    #[test]
    fn test_decode_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("dhcp-inspect-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let raw_path = dir.join("discover.bin");
        let hex_path = dir.join("discover.hex");

        let mac = MacAddress::new([0, 1, 2, 3, 4, 5]);
        let bytes = Message::discover(99, mac).encode().unwrap();
        std::fs::write(&raw_path, &bytes).unwrap();
        std::fs::write(&hex_path, summary::to_hex(&bytes)).unwrap();

        let config = InspectConfig::default();
        decode_file(raw_path.to_str().unwrap(), false, true, &config).unwrap();
        decode_file(hex_path.to_str().unwrap(), true, false, &config).unwrap();

        std::fs::write(&raw_path, &bytes[..100]).unwrap();
        let err = decode_file(raw_path.to_str().unwrap(), false, false, &config).unwrap_err();
        assert!(err.to_string().contains("not a valid DHCP message"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_discover_writes_file() {
        let path = std::env::temp_dir().join(format!("dhcp-inspect-out-{}.bin", std::process::id()));
        let mac = MacAddress::new([0xAA, 0, 0, 0, 0, 1]);
        build_discover(mac, Some(0x1234), path.to_str()).unwrap();

        let message = Message::decode(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(message.header.xid, 0x1234);
        assert_eq!(message.classify(), Some(MessageType::Discover));
        assert_eq!(message.header.client_mac(), Some(mac));

        std::fs::remove_file(&path).unwrap();
    }
}
