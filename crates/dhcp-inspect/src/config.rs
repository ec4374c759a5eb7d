use dhcp_proto::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Configuration structure loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Address the listener binds to
    #[serde(default = "default_listen_address")]
    pub listen_address: Ipv4Addr,

    /// UDP port the listener binds to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Receive buffer size; longer datagrams are truncated by the socket
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,

    /// How repeated option codes are shown
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_listen_address() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_port() -> u16 {
    67
}

fn default_max_packet_size() -> usize {
    1500
}

impl InspectConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_port(),
            max_packet_size: default_max_packet_size(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
