use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::{UdpSocket, lookup_host};

use crate::errors::Result;
use crate::report::{Record, Reporter, deliver_best_effort};
use crate::types::BoxFuture;

/// Sends each record as a single JSON datagram. No acknowledgement.
#[derive(Debug, Clone)]
pub struct UdpReporter {
    host: String,
    port: u16,
}

impl UdpReporter {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    async fn send(&self, payload: &[u8]) -> Result<()> {
        let target = lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address for {}:{}", self.host, self.port),
                )
            })?;
        let socket = bind_for(target).await?;
        socket.send(payload).await?;
        Ok(())
    }
}

/// Ephemeral socket of the same address family as `target`, connected to it.
async fn bind_for(target: SocketAddr) -> io::Result<UdpSocket> {
    let local_ip = match target {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    let socket = UdpSocket::bind(SocketAddr::new(local_ip, 0)).await?;
    socket.connect(target).await?;
    Ok(socket)
}

impl Reporter for UdpReporter {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let attempt = async {
                let payload = record.to_json()?;
                self.send(payload.as_bytes()).await
            };
            deliver_best_effort("udp", record, attempt).await;
        })
    }
}
