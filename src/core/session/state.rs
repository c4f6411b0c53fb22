/*!
Session state management for the e2ee protocol.

This module defines session states and the state machine for session
progression. Transitions are strictly ordered; skipping a phase is a
programming error surfaced by the guards in [`StateManager`].
*/

use std::fmt;

/// Session state, tracking which phases of the protocol have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// No connection yet
    Idle,
    /// Byte stream established, no keys exchanged
    Connected,
    /// Public key exchanged, session key not yet established
    KeyExchanged,
    /// Session key resident on both sides; messaging may begin
    SessionReady,
    /// Session terminated
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::KeyExchanged => write!(f, "KeyExchanged"),
            SessionState::SessionReady => write!(f, "SessionReady"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Endpoint role in the session.
///
/// The two roles differ only in the handshake step order: the client
/// generates and wraps the session key; the server only ever unwraps
/// the one it is sent. The messaging loops are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Client role (initiates the connection, generates the session key)
    Client,
    /// Server role (accepts the connection, unwraps the session key)
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "Client"),
            Role::Server => write!(f, "Server"),
        }
    }
}

/// Session state manager.
///
/// Handles state transitions and validates that operations happen in
/// protocol order.
#[derive(Debug, Clone, Copy)]
pub struct StateManager {
    /// Current state of the session
    state: SessionState,
    /// Role of this endpoint
    role: Role,
}

impl StateManager {
    /// Create a new state manager
    pub fn new(role: Role) -> Self {
        Self {
            state: SessionState::Idle,
            role,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if the session is in the given state
    pub fn is_state(&self, state: SessionState) -> bool {
        self.state == state
    }

    /// Check if the handshake may start
    pub fn can_handshake(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Check if message transfer is allowed
    pub fn can_transfer(&self) -> bool {
        self.state == SessionState::SessionReady
    }

    /// Transition to the connected state
    pub fn transition_to_connected(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Connected;
        }
    }

    /// Transition to the key exchanged state
    pub fn transition_to_key_exchanged(&mut self) {
        if self.state == SessionState::Connected {
            self.state = SessionState::KeyExchanged;
        }
    }

    /// Transition to the session ready state
    pub fn transition_to_session_ready(&mut self) {
        if self.state == SessionState::KeyExchanged {
            self.state = SessionState::SessionReady;
        }
    }

    /// Transition to the closed state
    pub fn transition_to_closed(&mut self) {
        self.state = SessionState::Closed;
    }
}
