//! The relay server event loop

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use mio::Token;

use crate::config::RelayConfig;
use crate::dispatch::{DispatchEvent, Dispatcher};
use crate::error::Result;
use crate::session::{RelayStats, Session, SessionPool, SessionState};

use super::acceptor::Acceptor;

/// Token reserved for the listening socket
pub const LISTENER: Token = Token(0);

/// Single-threaded readiness-driven relay server.
///
/// Owns the dispatcher, the acceptor, the session pool and the token table.
/// One thread drives `run`; sessions, windows and the pool are never touched
/// from anywhere else, so none of it is locked.
#[derive(Debug)]
pub struct RelayServer {
    config: RelayConfig,
    dispatcher: Dispatcher,
    acceptor: Acceptor,
    pool: SessionPool,
    /// Live sessions, one entry per registered token (two per session)
    sessions: HashMap<Token, Rc<RefCell<Session>>>,
    stats: RelayStats,
}

impl RelayServer {
    /// Bind the listener and set up the relay
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;

        let dispatcher = Dispatcher::new(config.events_capacity)?;
        let mut acceptor = Acceptor::bind(config.listen_addr, config.origin_addr)?;
        acceptor.register(dispatcher.registry(), LISTENER)?;
        let pool = SessionPool::new(config.max_pool, config.window_capacity);

        Ok(Self {
            config,
            dispatcher,
            acceptor,
            pool,
            sessions: HashMap::new(),
            stats: RelayStats::new(),
        })
    }

    /// Get the address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Get the server configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Get the relay counters
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Get the session pool
    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Get the number of live sessions
    pub fn active_sessions(&self) -> usize {
        self.sessions.len() / 2
    }

    /// Run the event loop until polling fails
    pub fn run(&mut self) -> Result<()> {
        info!(
            "relaying {} -> {}",
            self.acceptor.local_addr()?,
            self.acceptor.origin_addr()
        );
        loop {
            self.poll_once(None)?;
        }
    }

    /// Wait for one batch of readiness events and dispatch it.
    ///
    /// Returns the number of events handled. Public so tests and embedders
    /// can drive the loop themselves.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let events = self.dispatcher.poll_once(timeout)?;
        let count = events.len();
        for event in events {
            if event.token == LISTENER {
                self.drain_accept();
            } else {
                self.dispatch_session(event);
            }
        }
        Ok(count)
    }

    /// Release every live session back to the pool and forget their tokens.
    ///
    /// This is the teardown path for registrations the event loop is
    /// abandoning rather than completing.
    pub fn shutdown(&mut self) {
        let live: Vec<Rc<RefCell<Session>>> = self
            .sessions
            .iter()
            .filter(|(token, session)| **token == session.borrow().client_token())
            .map(|(_, session)| Rc::clone(session))
            .collect();
        self.sessions.clear();

        for session in live {
            session.borrow_mut().close(self.dispatcher.registry());
            self.stats.sessions_closed += 1;
            self.pool.release(session);
        }
    }

    /// Accept until the backlog drains; each failure abandons only that
    /// connection attempt
    fn drain_accept(&mut self) {
        loop {
            match self.acceptor.try_accept() {
                Ok(Some((client, peer_addr))) => self.establish(client, peer_addr),
                Ok(None) => break,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    self.stats.accept_failures += 1;
                    break;
                }
            }
        }
    }

    /// Pair an accepted client with an origin dial and start the session
    fn establish(&mut self, client: mio::net::TcpStream, peer_addr: SocketAddr) {
        let origin = match self.acceptor.dial_origin() {
            Ok(origin) => origin,
            Err(e) => {
                warn!("origin dial to {} failed: {}", self.acceptor.origin_addr(), e);
                self.stats.dial_failures += 1;
                return;
            }
        };

        let client_token = self.dispatcher.allocate_token();
        let origin_token = self.dispatcher.allocate_token();
        let session = match self
            .pool
            .alloc(client, origin, client_token, origin_token)
        {
            Ok(session) => session,
            Err(e) => {
                warn!("session allocation failed: {}", e);
                self.stats.accept_failures += 1;
                return;
            }
        };

        let armed = session.borrow_mut().begin_connect(self.dispatcher.registry());
        if let Err(e) = armed {
            warn!("session setup failed: {}", e);
            self.stats.dial_failures += 1;
            session.borrow_mut().fail(self.dispatcher.registry());
            self.pool.release(session);
            return;
        }

        self.sessions.insert(client_token, Rc::clone(&session));
        self.sessions.insert(origin_token, session);
        self.stats.sessions_accepted += 1;
        info!(
            "accepted {} (tokens {:?}/{:?})",
            peer_addr, client_token, origin_token
        );
    }

    /// Route one readiness event to its session and reap it if it finished
    fn dispatch_session(&mut self, event: DispatchEvent) {
        let session = match self.sessions.get(&event.token) {
            Some(session) => Rc::clone(session),
            // already reaped earlier in this batch
            None => return,
        };

        let finished = {
            let mut session = session.borrow_mut();
            session.handle_event(self.dispatcher.registry(), event.token, event.readiness);
            session.state().is_terminal()
        };

        if finished {
            self.reap(session);
        }
    }

    /// Remove a finished session's tokens, fold its counters into the relay
    /// totals and return it to the pool. Guarded so a session is reaped
    /// exactly once.
    fn reap(&mut self, session: Rc<RefCell<Session>>) {
        let (client_token, origin_token, state, copied) = {
            let session = session.borrow();
            (
                session.client_token(),
                session.origin_token(),
                session.state(),
                session.bytes_copied(),
            )
        };

        if self.sessions.remove(&client_token).is_none() {
            return;
        }
        self.sessions.remove(&origin_token);

        match state {
            SessionState::Error => self.stats.sessions_failed += 1,
            _ => self.stats.sessions_closed += 1,
        }
        self.stats.bytes_client_to_origin += copied.0;
        self.stats.bytes_origin_to_client += copied.1;

        debug!(
            "session reaped (tokens {:?}/{:?}), pool holds {}",
            client_token,
            origin_token,
            self.pool.len()
        );
        self.pool.release(session);
    }
}
