use crate::prelude::*;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::SocketAddr;

/// Handle the game uses to queue responses for one connection.
#[derive(Debug)]
pub struct Inbox<'a>(&'a mut Client);
impl Inbox<'_> {
    /// Queues `response`. A response too big for one frame is answered with an error
    /// instead, so the client isn't left waiting.
    pub fn submit(&mut self, response: Response) {
        let frame = match response.encode() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("unable to send {} to {}: {e}", response.command(), self.0.peer);
                match Response::Error(GameError::ResponseTooLong).encode() {
                    Ok(frame) => frame,
                    Err(_) => return,
                }
            }
        };
        let client = &mut *self.0;
        if client.queued_bytes.saturating_add(frame.len()) > client.outbound_limit {
            if !client.overflowed {
                log::warn!(
                    "{} isn't reading, over {} bytes queued",
                    client.peer,
                    client.queued_bytes
                );
            }
            client.overflowed = true;
            return;
        }
        log::trace!("queueing {} for {}", response.command(), client.peer);
        client.queued_bytes += frame.len();
        client.queue.push_back(frame);
        client.waiting_for_write = true;
    }
}

pub struct Client {
    conn: TcpStream,
    peer: SocketAddr,
    /// Encoded frames, oldest first.
    queue: VecDeque<Vec<u8>>,
    queued_bytes: usize,
    outbound_limit: usize,
    /// Set once a response didn't fit under `outbound_limit`.
    overflowed: bool,
    pending_bytes: Vec<u8>,
    pending_byte_cursor: usize,

    pub(super) waiting_for_write: bool,
}
impl Client {
    pub(super) fn conn(&self) -> &TcpStream {
        &self.conn
    }
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
    pub(super) fn inbox(&mut self) -> Inbox<'_> {
        Inbox(self)
    }
    /// Bytes of whole frames waiting behind the one being sent.
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }
    /// `outbound_limit` bounds how many bytes may sit in the queue at once.
    pub fn accept(conn: TcpStream, peer: SocketAddr, outbound_limit: usize) -> io::Result<Self> {
        conn.set_nonblocking(true)?;
        Ok(Self {
            conn,
            peer,
            queue: Default::default(),
            queued_bytes: 0,
            outbound_limit,
            overflowed: false,
            pending_bytes: vec![],
            pending_byte_cursor: 0,
            waiting_for_write: false,
        })
    }
    /// Sends as much queued output as the socket takes without blocking.
    ///
    /// Whatever doesn't fit stays buffered and `waiting_for_write` is raised, so the
    /// rest goes out on the next writable event in the same order.
    pub fn write(&mut self) -> io::Result<()> {
        loop {
            // flush buffer of any half-sent frame
            while self.pending_byte_cursor < self.pending_bytes.len() {
                match self.conn.write(&self.pending_bytes[self.pending_byte_cursor..]) {
                    Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                    Ok(n) => self.pending_byte_cursor += n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        self.waiting_for_write = true;
                        return Ok(());
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
            match self.queue.pop_front() {
                Some(frame) => {
                    self.queued_bytes -= frame.len();
                    self.pending_bytes = frame;
                    self.pending_byte_cursor = 0;
                }
                None => {
                    self.pending_bytes.clear();
                    self.pending_byte_cursor = 0;
                    return Ok(());
                }
            }
        }
    }
    /// Reads one chunk and hands the frame in it to the game.
    ///
    /// An error means the connection is gone, either closed by the peer or dropped
    /// because its output piled up past the limit. A chunk that doesn't decode is
    /// dropped: frames are never reassembled across reads.
    pub fn read(
        network: &mut super::Network,
        game: &mut crate::Game,
        id: usize,
    ) -> io::Result<()> {
        let client = network.clients.get(id).ok_or(io::ErrorKind::NotConnected)?;
        let n = loop {
            match client.conn.read(&mut network.scratch_buffer) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        };
        match super::wire::decode(&network.scratch_buffer[..n]) {
            Ok(message) => {
                log::trace!("{} sent {} {:?}", client.peer, message.command, message.payload);
                game.handle(id, &message, client.inbox());
            }
            Err(e) => log::debug!("dropping {n} bytes from {}: {e}", client.peer),
        }
        if client.overflowed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("more than {} bytes of output queued", client.outbound_limit),
            ));
        }
        Ok(())
    }
}
impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.peer)
            .field("queued", &self.queue.len())
            .field("queued_bytes", &self.queued_bytes)
            .field("waiting_for_write", &self.waiting_for_write)
            .finish()
    }
}
