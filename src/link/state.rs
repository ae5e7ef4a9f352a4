//! The connection lifecycle state machine.
//!
//! A single [`Phase`] replaces what older implementations of this protocol
//! modeled as independent `connected`/`encrypted` booleans; the transition
//! methods below are the only mutation path, and [`LinkStateMachine::dispatch`]
//! reproduces the original inbound routing rule exactly.
//!
//! `established` (notification subscription live, pipeline running) stays a
//! separate flag rather than a phase: in the real handshake flow it is set
//! *before* the peer's connection request arrives, so it is orthogonal to
//! the dispatch-relevant lifecycle.

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No handshake identification yet; inbound data is interpreted as
    /// connection requests.
    Idle,
    /// Identified, plaintext traffic.
    Connected,
    /// Identified, authenticated-encrypted traffic.
    Encrypted,
    /// Fallback phase. Not reachable through the transitions below; the
    /// dispatch loop still handles it via [`Dispatch::Fault`].
    Faulted,
}

/// How the session pipeline must treat one reassembled inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Route the raw frame to the connection-request handler.
    ConnectionRequest,
    /// Deliver the reassembled bytes unmodified.
    Plaintext,
    /// Decrypt, then deliver.
    Decrypt,
    /// Drop encryption and the established flag, keep the connection.
    Fault,
}

/// Connection state: lifecycle phase, subscription liveness, and the
/// negotiated protocol version.
#[derive(Debug)]
pub struct LinkStateMachine {
    phase: Phase,
    established: bool,
    /// The raw "encrypt traffic" switch. Armed independently of the phase so
    /// that enabling encryption before identification still routes inbound
    /// data to the connection-request handler first.
    encryption_armed: bool,
    version: u8,
}

impl LinkStateMachine {
    /// Initial state: idle, nothing established, version zero.
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            established: false,
            encryption_armed: false,
            version: 0,
        }
    }

    /// A well-formed connection request was accepted: record the peer's
    /// declared protocol version and leave the identification phase.
    pub fn on_connection_request(&mut self, version: u8) {
        if self.phase == Phase::Idle {
            self.version = version;
            self.phase = if self.encryption_armed {
                Phase::Encrypted
            } else {
                Phase::Connected
            };
        }
    }

    /// Switch the session to authenticated-encrypted traffic (keys are
    /// available). Before identification this arms encryption without
    /// changing how inbound data is routed.
    pub fn enable_encryption(&mut self) {
        self.encryption_armed = true;
        if self.phase == Phase::Connected {
            self.phase = Phase::Encrypted;
        }
    }

    /// The notification subscription is live and the pipeline is running.
    pub fn on_subscribed(&mut self) {
        self.established = true;
    }

    /// Mark the state unknown: a panic interrupted a transition. The next
    /// inbound message routes through [`Dispatch::Fault`] recovery.
    pub(crate) fn fault(&mut self) {
        self.phase = Phase::Faulted;
    }

    /// Leave the fallback phase: drop encryption and the established flag,
    /// keep the connection identified.
    pub fn recover(&mut self) {
        self.established = false;
        self.encryption_armed = false;
        self.phase = Phase::Connected;
    }

    /// Clear everything back to the initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The routing decision for inbound messages, evaluated in protocol
    /// order: unidentified connections always see the connection-request
    /// handler, regardless of the encryption switch.
    pub fn dispatch(&self) -> Dispatch {
        match self.phase {
            Phase::Idle => Dispatch::ConnectionRequest,
            Phase::Connected => Dispatch::Plaintext,
            Phase::Encrypted => Dispatch::Decrypt,
            Phase::Faulted => Dispatch::Fault,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether handshake identification has completed.
    pub fn connected(&self) -> bool {
        matches!(self.phase, Phase::Connected | Phase::Encrypted)
    }

    /// Whether outbound traffic must be encrypted.
    pub fn encrypted(&self) -> bool {
        self.encryption_armed
    }

    /// Whether the subscription/notification pipeline is live.
    pub fn established(&self) -> bool {
        self.established
    }

    /// The peer's declared protocol version (0 before identification).
    pub fn version(&self) -> u8 {
        self.version
    }
}

impl Default for LinkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_covers_all_flag_combinations() {
        // (connected, encrypted) = (false, false)
        let machine = LinkStateMachine::new();
        assert_eq!(machine.dispatch(), Dispatch::ConnectionRequest);

        // (false, true): encryption armed before identification still routes
        // to the connection-request handler.
        let mut machine = LinkStateMachine::new();
        machine.enable_encryption();
        assert_eq!(machine.dispatch(), Dispatch::ConnectionRequest);

        // (true, false)
        let mut machine = LinkStateMachine::new();
        machine.on_connection_request(4);
        assert_eq!(machine.dispatch(), Dispatch::Plaintext);

        // (true, true)
        machine.enable_encryption();
        assert_eq!(machine.dispatch(), Dispatch::Decrypt);
    }

    #[test]
    fn test_connection_request_records_version() {
        let mut machine = LinkStateMachine::new();
        machine.on_connection_request(6);

        assert!(machine.connected());
        assert_eq!(machine.version(), 6);
        assert_eq!(machine.phase(), Phase::Connected);

        // A second request while identified changes nothing.
        machine.on_connection_request(9);
        assert_eq!(machine.version(), 6);
    }

    #[test]
    fn test_armed_encryption_applies_on_identification() {
        let mut machine = LinkStateMachine::new();
        machine.enable_encryption();
        machine.on_connection_request(5);
        assert_eq!(machine.phase(), Phase::Encrypted);
    }

    #[test]
    fn test_fault_recovery_keeps_connection_drops_encryption() {
        let mut machine = LinkStateMachine::new();
        machine.on_connection_request(5);
        machine.enable_encryption();
        machine.on_subscribed();

        machine.fault();
        assert_eq!(machine.dispatch(), Dispatch::Fault);

        machine.recover();
        assert!(machine.connected());
        assert!(!machine.encrypted());
        assert!(!machine.established());
        assert_eq!(machine.dispatch(), Dispatch::Plaintext);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut machine = LinkStateMachine::new();
        machine.on_connection_request(5);
        machine.enable_encryption();
        machine.on_subscribed();

        machine.reset();
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(!machine.established());
        assert!(!machine.encrypted());
        assert_eq!(machine.version(), 0);
    }
}
