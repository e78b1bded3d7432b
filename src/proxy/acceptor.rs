//! Listening socket and the accept path

use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Registry, Token};

use crate::error::{RelaisError, Result};

/// Listening socket paired with the fixed origin address its sessions dial
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    origin_addr: SocketAddr,
}

impl Acceptor {
    /// Bind the listening socket
    pub fn bind(listen_addr: SocketAddr, origin_addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(listen_addr)
            .map_err(|e| RelaisError::from_io(e, "failed to bind listener"))?;
        Ok(Self {
            listener,
            origin_addr,
        })
    }

    /// Get the address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RelaisError::from_io(e, "failed to read listener address"))
    }

    /// Get the origin address sessions dial
    pub fn origin_addr(&self) -> SocketAddr {
        self.origin_addr
    }

    /// Register the listener for readability
    pub(crate) fn register(&mut self, registry: &Registry, token: Token) -> Result<()> {
        registry
            .register(&mut self.listener, token, Interest::READABLE)
            .map_err(|e| RelaisError::registration(format!("failed to register listener: {}", e)))
    }

    /// Accept one pending connection; `None` once the backlog is drained
    pub fn try_accept(&self) -> Result<Option<(TcpStream, SocketAddr)>> {
        loop {
            match self.listener.accept() {
                Ok(pair) => return Ok(Some(pair)),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RelaisError::from_io(e, "accept failed")),
            }
        }
    }

    /// Start a non-blocking dial to the origin
    pub fn dial_origin(&self) -> io::Result<TcpStream> {
        TcpStream::connect(self.origin_addr)
    }
}
