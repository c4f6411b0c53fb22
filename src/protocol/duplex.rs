/*!
Concurrent duplex messaging over one established session.

The send loop runs on the calling thread and the receive loop on a
dedicated thread; both block on I/O and never poll. Within one direction
frames arrive in send order; between directions there is no ordering
guarantee.

Termination is a one-shot signal rather than a polled flag: whichever
loop finishes first triggers [`StopSignal`], which closes the shared
socket exactly once. The closed socket unblocks the other loop's pending
call with an error, and the receive thread is joined before
[`run_duplex`] returns, so the connection is never used after teardown.
*/

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use tracing::{debug, warn};

use crate::core::crypto::Cipher;
use crate::core::error::{Error, Result};
use crate::core::message::Frame;
use crate::core::session::E2eeSession;
use crate::core::transport::Connection;

/// Source of outgoing plaintext messages (operator input).
pub trait MessageSource: Send {
    /// Next message to send, or `None` when the operator ends the input.
    fn next_message(&mut self) -> Option<String>;
}

/// Sink for incoming plaintext messages (operator output).
pub trait MessageSink: Send {
    /// Deliver one received message to the operator.
    fn deliver(&mut self, text: &str);
}

/// A channel receiver feeds the send loop until its sender is dropped.
impl MessageSource for Receiver<String> {
    fn next_message(&mut self) -> Option<String> {
        self.recv().ok()
    }
}

/// A channel sender forwards received messages until its receiver is
/// dropped; deliveries after that are discarded.
impl MessageSink for Sender<String> {
    fn deliver(&mut self, text: &str) {
        let _ = self.send(text.to_string());
    }
}

/// One-shot termination signal shared by both loops.
///
/// Triggering closes the connection exactly once; the closed socket is
/// what unblocks the peer loop, so no loop ever busy-waits on a flag.
#[derive(Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    conn: Connection,
}

impl StopSignal {
    /// Create a signal for the given connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            conn,
        }
    }

    /// Signal both loops to stop and close the shared connection.
    pub fn trigger(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!("stop signaled");
            self.conn.close();
        }
    }

    /// Whether a stop has been signaled.
    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Run the duplex messaging loops until either side terminates.
///
/// Sends on the calling thread, receives on a spawned thread. Returns
/// after the receive thread has been joined and the connection closed.
/// A clean end of input, or the peer closing the connection, is `Ok`;
/// transfer and decrypt failures are returned as errors.
pub fn run_duplex<I, O>(
    session: &E2eeSession,
    conn: Connection,
    mut source: I,
    sink: O,
) -> Result<()>
where
    I: MessageSource,
    O: MessageSink + 'static,
{
    let cipher = session.cipher()?;
    let stop = StopSignal::new(conn.clone());

    let rx_cipher = Arc::clone(&cipher);
    let rx_conn = conn.clone();
    let rx_stop = stop.clone();
    let rx_thread = thread::spawn(move || receive_loop(rx_cipher, rx_conn, sink, rx_stop));

    let send_result = send_loop(&cipher, conn, &mut source, &stop);
    stop.trigger();

    let recv_result = match rx_thread.join() {
        Ok(result) => result,
        Err(_) => Err(Error::Transfer(io::Error::other("receive loop panicked"))),
    };

    send_result.and(recv_result)
}

fn send_loop<I: MessageSource>(
    cipher: &Cipher,
    mut conn: Connection,
    source: &mut I,
    stop: &StopSignal,
) -> Result<()> {
    while let Some(text) = source.next_message() {
        if stop.is_triggered() {
            break;
        }
        let frame = cipher.encrypt(text.as_bytes())?;
        if let Err(err) = frame.write_to(&mut conn) {
            if stop.is_triggered() {
                // The receive loop already tore the session down; this
                // write raced the close.
                break;
            }
            stop.trigger();
            return Err(err);
        }
    }
    debug!("send loop finished");
    Ok(())
}

fn receive_loop<O: MessageSink>(
    cipher: Arc<Cipher>,
    mut conn: Connection,
    mut sink: O,
    stop: StopSignal,
) -> Result<()> {
    loop {
        let frame = match Frame::read_from(&mut conn) {
            Ok(frame) => frame,
            Err(err) => {
                if stop.is_triggered() {
                    debug!("receive loop stopped");
                    return Ok(());
                }
                stop.trigger();
                if err.is_peer_closed() {
                    debug!("peer closed the connection");
                    return Ok(());
                }
                return Err(err);
            }
        };

        match cipher.decrypt(&frame) {
            Ok(plaintext) => sink.deliver(&String::from_utf8_lossy(&plaintext)),
            Err(err) => {
                // Without a MAC there is no telling corruption from a
                // forged frame; terminate instead of processing further.
                warn!("decrypt failed, terminating session");
                stop.trigger();
                return Err(err);
            }
        }
    }
}
