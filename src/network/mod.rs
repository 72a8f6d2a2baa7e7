//! Single-threaded, readiness-driven connection handling.
//!
//! Every socket is registered with one [`polling::Poller`] in oneshot mode. A
//! connection is always armed for reading, and for writing only while it has output
//! queued, so an idle server sleeps in [`Network::process_events`] instead of spinning.
use crate::prelude::*;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::time::{Duration, Instant};

mod request;
mod response;
pub mod client;
pub mod wire;

pub use request::Request;
pub use response::Response;

#[derive(Debug)]
pub struct Network {
    pub(super) listener: TcpListener,
    pub(super) scratch_buffer: Vec<u8>,

    pub(super) poller: polling::Poller,
    pub(super) events: Vec<polling::Event>,

    pub(super) clients: SlotMap<client::Client>,
    outbound_limit: usize,
    /// Set while accepting is paused for lack of file descriptors or memory.
    accept_resumes_at: Option<Instant>,
}

const LISTENER: usize = usize::MAX - 1;
/// Output a connection may have queued before it's dropped.
pub const DEFAULT_OUTBOUND_LIMIT: usize = 1 << 20;
/// How long to leave pending connections in the backlog after running out of resources.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept failures caused by the process or system running short, not by the listener.
fn out_of_resources(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

impl Network {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let poller = polling::Poller::new()?;

        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        poller.add(&listener, polling::Event::readable(LISTENER))?;
        Ok(Self {
            listener,
            scratch_buffer: vec![0; wire::MAX_MSG_LENGTH],

            poller,
            events: vec![],

            clients: SlotMap::new(),
            outbound_limit: DEFAULT_OUTBOUND_LIMIT,
            accept_resumes_at: None,
        })
    }
    /// Caps the output queued for any one connection at `bytes`.
    pub fn with_outbound_limit(mut self, bytes: usize) -> Self {
        self.outbound_limit = bytes;
        self
    }
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
    /// Number of open connections, logged in or not.
    pub fn connections(&self) -> usize {
        self.clients.len()
    }

    /// Serves clients forever. Only a failure of the listener or the poller returns.
    pub fn run(&mut self, game: &mut crate::Game) -> io::Result<()> {
        log::info!("listening on {}", self.local_addr()?);
        loop {
            self.process_events(game, None)?;
        }
    }

    /// Waits up to `timeout` for readiness and handles whatever became ready.
    ///
    /// Returns the number of events handled; zero means the wait timed out.
    pub fn process_events(
        &mut self,
        game: &mut crate::Game,
        timeout: Option<Duration>,
    ) -> io::Result<usize> {
        let timeout = match self.accept_resumes_at {
            Some(at) => {
                let left = at.saturating_duration_since(Instant::now());
                Some(timeout.map_or(left, |timeout| timeout.min(left)))
            }
            None => timeout,
        };
        let mut events = core::mem::take(&mut self.events);
        events.clear();
        match self.poller.wait(&mut events, timeout) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
        if self.accept_resumes_at.is_some_and(|at| at <= Instant::now()) {
            self.accept_resumes_at = None;
            self.accept_clients()?;
        }
        let handled = events.len();
        for event in events.drain(..) {
            if event.key == LISTENER {
                self.accept_clients()?;
                continue;
            }

            let Some(client) = self.clients.get(event.key) else {
                log::trace!("event for released slot {}", event.key);
                continue;
            };
            let was_waiting_for_write = core::mem::take(&mut client.waiting_for_write);

            if event.readable {
                // may set the waiting_for_write flag
                if let Err(e) = client::Client::read(self, game, event.key) {
                    self.disconnect(game, event.key, e);
                    continue;
                }
            }
            let Some(client) = self.clients.get(event.key) else { continue };
            if event.writable {
                if let Err(e) = client.write() {
                    self.disconnect(game, event.key, e);
                    continue;
                }
            }
            let interest = polling::Event {
                key: event.key,
                readable: true,
                writable: client.waiting_for_write || (was_waiting_for_write && !event.writable),
            };
            client.waiting_for_write = interest.writable;
            if let Err(e) = self.poller.modify(client.conn(), interest) {
                self.disconnect(game, event.key, e);
            }
        }
        self.events = events;
        Ok(handled)
    }

    /// Accepts everything pending, then re-arms the listener.
    ///
    /// Running out of descriptors or memory leaves the rest in the backlog and pauses
    /// accepting for [`ACCEPT_BACKOFF`]. Only other failures are the listener's own.
    fn accept_clients(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // the peer gave up before we got to it
                Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => continue,
                Err(e) if out_of_resources(&e) => {
                    log::warn!("unable to accept connections, retrying shortly: {e}");
                    self.accept_resumes_at = Some(Instant::now() + ACCEPT_BACKOFF);
                    return Ok(());
                }
                Err(e) => return Err(e),
                Ok((conn, peer)) => {
                    let idx = self.clients.next_idx();
                    let client = match client::Client::accept(conn, peer, self.outbound_limit) {
                        Ok(client) => client,
                        Err(e) => {
                            log::warn!("unable to set up connection from {peer}: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = self.poller.add(client.conn(), polling::Event::readable(idx)) {
                        log::warn!("unable to watch connection from {peer}: {e}");
                        continue;
                    }
                    self.clients.insert(client);
                    log::debug!("new connection {idx} from {peer}");
                }
            }
        }
        self.poller.modify(&self.listener, polling::Event::readable(LISTENER))
    }

    /// Forgets a connection and whoever was logged in on it.
    fn disconnect(&mut self, game: &mut crate::Game, idx: usize, reason: io::Error) {
        let Some(client) = self.clients.release(idx) else { return };
        if let Err(e) = self.poller.delete(client.conn()) {
            log::debug!("unable to unregister connection {idx}: {e}");
        }
        game.disconnect(idx);
        log::debug!("connection {idx} from {} closed: {reason}", client.peer());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Game;

    fn process_until(network: &mut Network, game: &mut Game, done: impl Fn(&Network) -> bool) {
        for _ in 0..50 {
            if done(network) {
                return;
            }
            network.process_events(game, Some(Duration::from_millis(100))).unwrap();
        }
        panic!("gave up waiting on {network:?}");
    }

    #[test]
    fn idle_wait_times_out() {
        let mut game = Game::new(vec![], vec![]).unwrap();
        let mut network = Network::bind("127.0.0.1:0").unwrap();
        let handled = network.process_events(&mut game, Some(Duration::from_millis(20))).unwrap();
        assert_eq!(handled, 0);
        assert_eq!(network.connections(), 0);
    }

    #[test]
    fn counts_open_connections() {
        let mut game = Game::new(vec![], vec![]).unwrap();
        let mut network = Network::bind("127.0.0.1:0").unwrap();
        let addr = network.local_addr().unwrap();

        let first = TcpStream::connect(addr).unwrap();
        let second = TcpStream::connect(addr).unwrap();
        process_until(&mut network, &mut game, |network| network.connections() == 2);

        drop(first);
        process_until(&mut network, &mut game, |network| network.connections() == 1);
        drop(second);
        process_until(&mut network, &mut game, |network| network.connections() == 0);
    }

    #[test]
    fn resource_errors_are_recognised() {
        assert!(out_of_resources(&io::Error::from_raw_os_error(libc::EMFILE)));
        assert!(out_of_resources(&io::Error::from_raw_os_error(libc::ENFILE)));
        assert!(!out_of_resources(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!out_of_resources(&io::ErrorKind::ConnectionAborted.into()));
    }
}
