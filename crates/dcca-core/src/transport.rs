use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};

/// Byte stream carrying one Diameter peer connection.
///
/// Client sessions and server connections are generic over it, so they run
/// over a `TcpStream` or an in-memory duplex pipe alike.
#[async_trait]
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin {
    /// Address of the remote Diameter peer
    fn peer_addr(&self) -> Result<SocketAddr>;

    /// Local address, advertised as Host-IP-Address in CER/CEA
    fn local_addr(&self) -> Result<SocketAddr>;
}

#[async_trait]
impl Transport for tokio::net::TcpStream {
    fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.peer_addr()?)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr()?)
    }
}
