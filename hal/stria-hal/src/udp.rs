//! `std::net::UdpSocket` datagram source
//!
//! `recv` on a UDP socket consumes the whole datagram at once, so the
//! adapter stages each datagram in a buffer allocated once at construction
//! and serves piecewise reads from there.

use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use crate::net::DatagramSource;

/// Largest UDP payload over IPv4
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Non-blocking UDP receive socket
pub struct UdpSource {
    socket: UdpSocket,
    buf: Vec<u8>,
    len: usize,
    pos: usize,
}

impl UdpSource {
    /// Bind a receive socket on all interfaces at `port`
    pub fn bind(port: u16) -> io::Result<Self> {
        Self::from_socket(UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?)
    }

    /// Wrap an already bound socket, switching it to non-blocking mode
    pub fn from_socket(socket: UdpSocket) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_UDP_PAYLOAD],
            len: 0,
            pos: 0,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSource for UdpSource {
    type Error = io::Error;

    fn poll_datagram(&mut self) -> Result<Option<usize>, Self::Error> {
        self.discard();
        match self.socket.recv(&mut self.buf) {
            Ok(len) => {
                self.len = len;
                self.pos = 0;
                Ok(Some(len))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.len - self.pos);
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn discard(&mut self) {
        self.pos = self.len;
    }
}
