use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::InspectConfig;
use crate::summary;
use dhcp_proto::Message;

pub async fn bind(config: &InspectConfig) -> anyhow::Result<UdpSocket> {
    let addr = SocketAddr::new(config.listen_address.into(), config.port);
    let socket = UdpSocket::bind(addr).await?;
    socket.set_broadcast(true)?;
    info!("Listening for DHCP traffic on {}", addr);
    Ok(socket)
}

/// Decode one datagram, logging and dropping it if it is malformed
pub fn handle_datagram(data: &[u8], src: SocketAddr, config: &InspectConfig) -> Option<Message> {
    debug!("Received {} bytes from {}", data.len(), src);

    let message = match Message::decode(data) {
        Ok(m) => m,
        Err(e) => {
            warn!("Dropping packet from {}: {}", src, e);
            return None;
        }
    };

    info!("{}", summary::headline(&message));
    debug!("\n{}", summary::summarize(&message, config.duplicate_policy));
    Some(message)
}

/// Receive datagrams until the consumer side of `decoded` goes away
pub async fn listen_loop(
    socket: UdpSocket,
    config: Arc<InspectConfig>,
    decoded: mpsc::Sender<Message>,
) -> anyhow::Result<()> {
    let mut buf = vec![0u8; config.max_packet_size];

    loop {
        let (len, src) = socket.recv_from(&mut buf).await?;

        let Some(message) = handle_datagram(&buf[..len], src, &config) else {
            continue;
        };

        if decoded.send(message).await.is_err() {
            debug!("Message consumer closed, stopping listener");
            return Ok(());
        }
    }
}
