//! Per-direction channel state and the duplex-copy engine
//!
//! Each session carries two channels, one per endpoint. A channel fills one
//! window from its socket and drains the opposite window to it; the peer
//! channel is wired crosswise to the same pair of windows. Every byte moved
//! recomputes the desired interest for both channels, and the computed mask
//! is pushed to the dispatcher. The open-direction (`duplex`) mask only ever
//! loses bits; once both channels' masks are empty the session is done.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::Shutdown;

use log::{debug, trace};
use mio::net::TcpStream;
use mio::{Registry, Token};

use crate::dispatch::Duplex;
use crate::error::{RelaisError, Result};
use crate::window::ByteWindow;

use super::session::Session;

/// The two endpoints of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The accepted client connection
    Client,
    /// The dialed origin connection
    Origin,
}

impl Side {
    /// Get the opposite endpoint
    pub fn peer(self) -> Side {
        match self {
            Side::Client => Side::Origin,
            Side::Origin => Side::Client,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Origin => write!(f, "origin"),
        }
    }
}

/// One direction-endpoint pair of a session.
///
/// `duplex` tracks which directions of the socket remain open; its bits are
/// monotonically non-increasing over the session's lifetime. `registered`
/// and `pushed` cache what the dispatcher currently holds for this token, so
/// interest pushes skip redundant syscalls and an empty desired mask maps to
/// a deregistration.
#[derive(Debug)]
pub struct Channel {
    /// Dispatcher token for this channel's socket
    pub(crate) token: Token,
    /// Directions still open; only ever loses bits
    pub(crate) duplex: Duplex,
    /// Whether the token is currently registered with the dispatcher
    pub(crate) registered: bool,
    /// Interest mask last pushed to the dispatcher
    pub(crate) pushed: Duplex,
}

impl Channel {
    pub(crate) fn new(token: Token) -> Self {
        Self {
            token,
            duplex: Duplex::BOTH,
            registered: false,
            pushed: Duplex::NONE,
        }
    }

    /// Reset for reuse under a fresh token
    pub(crate) fn rebind(&mut self, token: Token) {
        *self = Self::new(token);
    }

    /// Get the dispatcher token
    pub fn token(&self) -> Token {
        self.token
    }

    /// Get the open-direction mask
    pub fn duplex(&self) -> Duplex {
        self.duplex
    }
}

/// Split borrow of everything one channel's operations touch
struct ChannelView<'a> {
    stream: &'a mut Option<TcpStream>,
    peer_stream: &'a mut Option<TcpStream>,
    fill: &'a mut ByteWindow,
    drain: &'a mut ByteWindow,
    channel: &'a mut Channel,
    peer_channel: &'a mut Channel,
    copied: &'a mut u64,
}

impl Session {
    fn view_mut(&mut self, side: Side) -> ChannelView<'_> {
        match side {
            Side::Client => ChannelView {
                stream: &mut self.client,
                peer_stream: &mut self.origin,
                fill: &mut self.client_to_origin,
                drain: &mut self.origin_to_client,
                channel: &mut self.client_channel,
                peer_channel: &mut self.origin_channel,
                copied: &mut self.bytes_client_to_origin,
            },
            Side::Origin => ChannelView {
                stream: &mut self.origin,
                peer_stream: &mut self.client,
                fill: &mut self.origin_to_client,
                drain: &mut self.client_to_origin,
                channel: &mut self.origin_channel,
                peer_channel: &mut self.client_channel,
                copied: &mut self.bytes_origin_to_client,
            },
        }
    }

    /// Compute the interest mask a channel currently wants.
    ///
    /// READ while the direction is open and the fill window has capacity
    /// (backpressure), WRITE while the direction is open and the drain window
    /// holds pending bytes.
    pub fn desired_interest(&self, side: Side) -> Duplex {
        let (channel, fill, drain) = match side {
            Side::Client => (
                &self.client_channel,
                &self.client_to_origin,
                &self.origin_to_client,
            ),
            Side::Origin => (
                &self.origin_channel,
                &self.origin_to_client,
                &self.client_to_origin,
            ),
        };

        let mut desired = Duplex::NONE;
        if channel.duplex.contains(Duplex::READ) && fill.has_writable() {
            desired |= Duplex::READ;
        }
        if channel.duplex.contains(Duplex::WRITE) && drain.has_readable() {
            desired |= Duplex::WRITE;
        }
        desired
    }

    /// Push the recomputed interest mask for a channel to the dispatcher.
    ///
    /// An unchanged mask is skipped. An empty mask deregisters the token; a
    /// later non-empty mask registers it again (the dispatcher's interest
    /// type cannot express "none").
    pub(crate) fn refresh_interest(&mut self, registry: &Registry, side: Side) -> Result<()> {
        let desired = self.desired_interest(side);
        let (stream, channel) = match side {
            Side::Client => (&mut self.client, &mut self.client_channel),
            Side::Origin => (&mut self.origin, &mut self.origin_channel),
        };
        let Some(stream) = stream.as_mut() else {
            return Ok(());
        };

        if channel.registered {
            match desired.to_interest() {
                Some(interest) => {
                    if desired != channel.pushed {
                        registry
                            .reregister(stream, channel.token, interest)
                            .map_err(|e| {
                                RelaisError::registration(format!(
                                    "failed to update {} interest to {}: {}",
                                    side, desired, e
                                ))
                            })?;
                        channel.pushed = desired;
                        trace!("{} interest -> {}", side, desired);
                    }
                }
                None => {
                    registry.deregister(stream).map_err(|e| {
                        RelaisError::registration(format!(
                            "failed to deregister idle {} socket: {}",
                            side, e
                        ))
                    })?;
                    channel.registered = false;
                    channel.pushed = Duplex::NONE;
                    trace!("{} interest -> none (deregistered)", side);
                }
            }
        } else if let Some(interest) = desired.to_interest() {
            registry
                .register(stream, channel.token, interest)
                .map_err(|e| {
                    RelaisError::registration(format!(
                        "failed to register {} socket for {}: {}",
                        side, desired, e
                    ))
                })?;
            channel.registered = true;
            channel.pushed = desired;
            trace!("{} interest -> {} (registered)", side, desired);
        }

        Ok(())
    }

    /// Read-ready entry point: fill this channel's window from its socket.
    ///
    /// Loops until the window is full or the socket would block (readiness
    /// delivery is edge-triggered; a single read per event would lose the
    /// edge). End-of-stream or a hard error closes this read direction and
    /// propagates a half-close toward the peer's write side.
    pub fn copy_read(&mut self, registry: &Registry, side: Side) -> Result<()> {
        let mut read_closed = false;

        {
            let view = self.view_mut(side);
            let Some(stream) = view.stream.as_mut() else {
                return Ok(());
            };

            loop {
                if !view.fill.has_writable() {
                    break;
                }
                match stream.read(view.fill.writable_region()) {
                    Ok(0) => {
                        debug!("{} closed its sending direction", side);
                        read_closed = true;
                        break;
                    }
                    Ok(n) => {
                        view.fill.advance_write(n)?;
                        *view.copied += n as u64;
                        trace!("copied {} bytes from {}", n, side);
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!("read error on {} socket: {}", side, e);
                        read_closed = true;
                        break;
                    }
                }
            }
        }

        if read_closed {
            self.close_read_side(side);
        }
        self.refresh_interest(registry, side)?;
        self.refresh_interest(registry, side.peer())?;
        self.try_finish(registry);
        Ok(())
    }

    /// Write-ready entry point: drain this channel's window to its socket.
    ///
    /// A short write advances by the bytes actually sent and leaves the
    /// remainder queued with WRITE interest still set. A hard failure closes
    /// this write direction and propagates a half-close toward the peer's
    /// read side.
    pub fn copy_write(&mut self, registry: &Registry, side: Side) -> Result<()> {
        let mut write_failed = false;

        {
            let view = self.view_mut(side);
            let Some(stream) = view.stream.as_mut() else {
                return Ok(());
            };

            loop {
                if !view.drain.has_readable() {
                    break;
                }
                match stream.write(view.drain.readable_region()) {
                    Ok(0) => break,
                    Ok(n) => {
                        view.drain.advance_read(n)?;
                        trace!("sent {} bytes to {}", n, side);
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!("write error on {} socket: {}", side, e);
                        write_failed = true;
                        break;
                    }
                }
            }

            // drain-first half-close: the peer stopped producing and every
            // queued byte has been delivered, so this outgoing direction is
            // finished
            if !write_failed
                && view.channel.duplex.contains(Duplex::WRITE)
                && !view.peer_channel.duplex.contains(Duplex::READ)
                && view.drain.is_empty()
            {
                let _ = stream.shutdown(Shutdown::Write);
                view.channel.duplex.remove(Duplex::WRITE);
                debug!("{} write side closed after drain", side);
            }
        }

        if write_failed {
            self.close_write_side(side);
        }
        self.refresh_interest(registry, side)?;
        self.refresh_interest(registry, side.peer())?;
        self.try_finish(registry);
        Ok(())
    }

    /// Close a channel's incoming direction and propagate toward the peer.
    ///
    /// The peer's outgoing direction closes immediately only if nothing is
    /// buffered for it; otherwise `copy_write` closes it once the queued
    /// bytes drain.
    fn close_read_side(&mut self, side: Side) {
        let view = self.view_mut(side);

        if let Some(stream) = view.stream.as_ref() {
            let _ = stream.shutdown(Shutdown::Read);
        }
        view.channel.duplex.remove(Duplex::READ);

        if view.fill.is_empty() && view.peer_channel.duplex.contains(Duplex::WRITE) {
            if let Some(peer) = view.peer_stream.as_ref() {
                let _ = peer.shutdown(Shutdown::Write);
            }
            view.peer_channel.duplex.remove(Duplex::WRITE);
            debug!("{} write side closed, nothing left to drain", side.peer());
        }
    }

    /// Close a channel's outgoing direction after a hard send failure.
    ///
    /// Bytes queued for this socket can no longer be delivered, so the peer's
    /// incoming direction is shut as well.
    fn close_write_side(&mut self, side: Side) {
        let view = self.view_mut(side);

        if let Some(stream) = view.stream.as_ref() {
            let _ = stream.shutdown(Shutdown::Write);
        }
        view.channel.duplex.remove(Duplex::WRITE);

        if view.peer_channel.duplex.contains(Duplex::READ) {
            if let Some(peer) = view.peer_stream.as_ref() {
                let _ = peer.shutdown(Shutdown::Read);
            }
            view.peer_channel.duplex.remove(Duplex::READ);
            debug!("{} read side closed, peer unable to deliver", side.peer());
        }
    }
}
