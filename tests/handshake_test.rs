//! Handshake behavior over an in-memory duplex pipe.
//!
//! The session's handshake is generic over the byte stream, so these
//! tests drive both roles through an in-process pipe with no sockets
//! involved.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use e2ee_protocol::{E2eeSession, Error, Role, SessionState};

/// One end of an in-memory duplex byte pipe.
struct PipeEnd {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

/// Build a connected pair of pipe ends.
fn duplex_pipe() -> (PipeEnd, PipeEnd) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    (
        PipeEnd {
            tx: a_tx,
            rx: a_rx,
            pending: Vec::new(),
        },
        PipeEnd {
            tx: b_tx,
            rx: b_rx,
            pending: Vec::new(),
        },
    )
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run the full handshake across a pipe, returning both ready sessions.
fn handshake_pair() -> (E2eeSession, E2eeSession) {
    let (mut server_end, mut client_end) = duplex_pipe();

    let server = thread::spawn(move || {
        let mut session = E2eeSession::new(Role::Server);
        session.handshake(&mut server_end).expect("server handshake");
        (session, server_end)
    });

    let mut client = E2eeSession::new(Role::Client);
    client.handshake(&mut client_end).expect("client handshake");

    let (server_session, _server_end) = server.join().expect("server thread");
    (server_session, client)
}

#[test]
fn handshake_establishes_identical_session_keys() {
    let (server, client) = handshake_pair();

    assert_eq!(server.state(), SessionState::SessionReady);
    assert_eq!(client.state(), SessionState::SessionReady);

    // The keys are byte-identical exactly when frames encrypted by one
    // peer decrypt on the other, in both directions.
    let frame = client.encrypt_message(b"hello").expect("client encrypt");
    let plain = server.decrypt_message(&frame).expect("server decrypt");
    assert_eq!(plain, b"hello");

    let frame = server.encrypt_message(b"hi back").expect("server encrypt");
    let plain = client.decrypt_message(&frame).expect("client decrypt");
    assert_eq!(plain, b"hi back");
}

#[test]
fn handshake_runs_exactly_once() {
    let (_server, mut client) = handshake_pair();

    let (_unused, mut fresh_end) = duplex_pipe();
    let err = client.handshake(&mut fresh_end).unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn client_rejects_garbage_public_key() {
    let (mut server_end, mut client_end) = duplex_pipe();

    // A peer that does not speak the protocol.
    server_end.write_all(b"this is not a pem key").unwrap();

    let mut client = E2eeSession::new(Role::Client);
    let err = client.handshake(&mut client_end).unwrap_err();
    assert!(matches!(err, Error::Crypto(_)));
    assert_ne!(client.state(), SessionState::SessionReady);
}

#[test]
fn server_fails_when_client_disconnects_mid_handshake() {
    let (mut server_end, client_end) = duplex_pipe();

    // Client vanishes before sending the wrapped key.
    drop(client_end);

    let mut server = E2eeSession::new(Role::Server);
    let err = server.handshake(&mut server_end).unwrap_err();
    assert!(matches!(err, Error::Transfer(_)));
    assert_ne!(server.state(), SessionState::SessionReady);
}
