//! Per-connection session state and lifecycle

use std::fmt;
use std::io;

use log::{debug, info, warn};
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::dispatch::{Duplex, EventSnapshot};
use crate::error::{RelaisError, Result};
use crate::window::ByteWindow;

use super::channel::{Channel, Side};

/// Lifecycle states of a relay session.
///
/// `Connecting` covers the non-blocking origin dial; `Copy` is the steady
/// relay state; `Done` and `Error` are terminal and route through identical
/// teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Origin dial in flight; the origin socket is armed for writability
    Connecting,
    /// Steady state: bytes shuttle in both directions
    Copy,
    /// Both directions collapsed; torn down cleanly
    Done,
    /// Torn down after an internal failure
    Error,
}

impl SessionState {
    /// Check whether the session has been torn down
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Copy => write!(f, "copy"),
            SessionState::Done => write!(f, "done"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// Full state for one client-origin connection pair.
///
/// Owns both sockets (`None` once closed), the two backpressure windows and
/// the two channels wired crosswise over them. Mutated only by the event
/// loop thread.
#[derive(Debug)]
pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) client: Option<TcpStream>,
    pub(crate) origin: Option<TcpStream>,
    /// Window the client channel fills and the origin channel drains
    pub(crate) client_to_origin: ByteWindow,
    /// Window the origin channel fills and the client channel drains
    pub(crate) origin_to_client: ByteWindow,
    pub(crate) client_channel: Channel,
    pub(crate) origin_channel: Channel,
    pub(crate) bytes_client_to_origin: u64,
    pub(crate) bytes_origin_to_client: u64,
}

impl Session {
    /// Build a session around a freshly accepted client and an in-flight
    /// origin dial
    pub fn new(
        client: TcpStream,
        origin: TcpStream,
        client_token: Token,
        origin_token: Token,
        window_capacity: usize,
    ) -> Result<Self> {
        Ok(Self {
            state: SessionState::Connecting,
            client: Some(client),
            origin: Some(origin),
            client_to_origin: ByteWindow::new(window_capacity)?,
            origin_to_client: ByteWindow::new(window_capacity)?,
            client_channel: Channel::new(client_token),
            origin_channel: Channel::new(origin_token),
            bytes_client_to_origin: 0,
            bytes_origin_to_client: 0,
        })
    }

    /// Reset a pooled session for reuse: fresh sockets and tokens, cleared
    /// windows, restored masks. No state from the previous connection
    /// survives.
    pub(crate) fn rebind(
        &mut self,
        client: TcpStream,
        origin: TcpStream,
        client_token: Token,
        origin_token: Token,
    ) {
        self.state = SessionState::Connecting;
        self.client = Some(client);
        self.origin = Some(origin);
        self.client_to_origin.clear();
        self.origin_to_client.clear();
        self.client_channel.rebind(client_token);
        self.origin_channel.rebind(origin_token);
        self.bytes_client_to_origin = 0;
        self.bytes_origin_to_client = 0;
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the client channel's dispatcher token
    pub fn client_token(&self) -> Token {
        self.client_channel.token
    }

    /// Get the origin channel's dispatcher token
    pub fn origin_token(&self) -> Token {
        self.origin_channel.token
    }

    /// Get a channel's open-direction mask
    pub fn duplex(&self, side: Side) -> Duplex {
        match side {
            Side::Client => self.client_channel.duplex,
            Side::Origin => self.origin_channel.duplex,
        }
    }

    /// Get the bytes a channel has read from its socket and not yet relayed
    pub fn buffered(&self, side: Side) -> usize {
        match side {
            Side::Client => self.client_to_origin.len(),
            Side::Origin => self.origin_to_client.len(),
        }
    }

    /// Get total bytes relayed so far as (client-to-origin, origin-to-client)
    pub fn bytes_copied(&self) -> (u64, u64) {
        (self.bytes_client_to_origin, self.bytes_origin_to_client)
    }

    /// Resolve which channel an event token concerns.
    ///
    /// A token matching neither channel is a relay bug, not an external
    /// condition.
    pub fn side_for(&self, token: Token) -> Side {
        if token == self.client_channel.token {
            Side::Client
        } else {
            debug_assert_eq!(
                token, self.origin_channel.token,
                "event token matches neither channel"
            );
            Side::Origin
        }
    }

    /// Arm the in-flight origin dial: register the origin socket for
    /// writability, which is how connect completion is signalled. The client
    /// socket is registered once the dial succeeds.
    pub fn begin_connect(&mut self, registry: &Registry) -> Result<()> {
        debug_assert_eq!(self.state, SessionState::Connecting);
        let stream = self
            .origin
            .as_mut()
            .ok_or_else(|| RelaisError::connection("origin socket already closed"))?;

        registry
            .register(stream, self.origin_channel.token, Interest::WRITABLE)
            .map_err(|e| {
                RelaisError::registration(format!("failed to register origin socket: {}", e))
            })?;
        self.origin_channel.registered = true;
        self.origin_channel.pushed = Duplex::WRITE;
        Ok(())
    }

    /// Check the outcome of the non-blocking origin dial.
    ///
    /// On success the session enters `Copy` and both channels get their
    /// computed interest. A dial still in flight leaves the session in
    /// `Connecting`; a failed dial is an error for this session only.
    pub fn finish_connect(&mut self, registry: &Registry) -> Result<()> {
        debug_assert_eq!(self.state, SessionState::Connecting);
        let stream = self
            .origin
            .as_ref()
            .ok_or_else(|| RelaisError::connection("origin socket already closed"))?;

        if let Some(err) = stream
            .take_error()
            .map_err(|e| RelaisError::from_io(e, "failed to query origin socket"))?
        {
            return Err(RelaisError::connection(format!(
                "origin dial failed: {}",
                err
            )));
        }
        match stream.peer_addr() {
            Ok(addr) => {
                debug!("origin connect complete: {}", addr);
            }
            // writable fired before the handshake finished; keep waiting
            Err(ref e) if e.kind() == io::ErrorKind::NotConnected => return Ok(()),
            Err(e) => {
                return Err(RelaisError::connection(format!(
                    "origin dial failed: {}",
                    e
                )));
            }
        }

        self.state = SessionState::Copy;
        self.refresh_interest(registry, Side::Client)?;
        self.refresh_interest(registry, Side::Origin)?;
        Ok(())
    }

    /// Route one readiness event into the copy engine.
    ///
    /// Internal failures end this session (teardown with `Error`); nothing
    /// propagates beyond it.
    pub fn handle_event(&mut self, registry: &Registry, token: Token, readiness: EventSnapshot) {
        if self.state.is_terminal() {
            return;
        }
        let side = self.side_for(token);

        let result = match self.state {
            SessionState::Connecting => {
                if side == Side::Origin && readiness.writable {
                    self.finish_connect(registry)
                } else {
                    Ok(())
                }
            }
            SessionState::Copy => {
                let mut result = Ok(());
                if readiness.readable {
                    result = self.copy_read(registry, side);
                }
                // the read may have finished the session
                if result.is_ok() && self.state == SessionState::Copy && readiness.writable {
                    result = self.copy_write(registry, side);
                }
                result
            }
            SessionState::Done | SessionState::Error => Ok(()),
        };

        if let Err(e) = result {
            warn!("{} session event failed: {}", side, e);
            self.fail(registry);
        }
    }

    /// Transition to `Done` if both channels' masks have emptied
    pub(super) fn try_finish(&mut self, registry: &Registry) {
        if self.client_channel.duplex.is_empty()
            && self.origin_channel.duplex.is_empty()
            && !self.state.is_terminal()
        {
            self.teardown(registry, SessionState::Done);
        }
    }

    /// Tear the session down cleanly (terminal state `Done`)
    pub fn close(&mut self, registry: &Registry) {
        if !self.state.is_terminal() {
            self.teardown(registry, SessionState::Done);
        }
    }

    /// Tear the session down after a failure (terminal state `Error`)
    pub(crate) fn fail(&mut self, registry: &Registry) {
        if !self.state.is_terminal() {
            self.teardown(registry, SessionState::Error);
        }
    }

    /// Deregister and close both sockets together and enter a terminal
    /// state. Runs at most once per session lifetime.
    fn teardown(&mut self, registry: &Registry, state: SessionState) {
        for side in [Side::Client, Side::Origin] {
            let (stream, channel) = match side {
                Side::Client => (&mut self.client, &mut self.client_channel),
                Side::Origin => (&mut self.origin, &mut self.origin_channel),
            };
            if let Some(stream) = stream.as_mut() {
                if channel.registered {
                    if let Err(e) = registry.deregister(stream) {
                        warn!("failed to deregister {} socket: {}", side, e);
                    }
                    channel.registered = false;
                    channel.pushed = Duplex::NONE;
                }
            }
            channel.duplex = Duplex::NONE;
            // dropping the stream closes the descriptor
            *stream = None;
        }

        self.state = state;
        info!(
            "session {}: {} bytes client->origin, {} bytes origin->client",
            state, self.bytes_client_to_origin, self.bytes_origin_to_client
        );
    }
}
