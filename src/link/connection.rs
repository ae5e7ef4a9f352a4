//! The link handle: handshake sequencer, session pipeline, and outbound path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::core::{
    CONNECT_TIMEOUT, DEFAULT_CHANNEL_CAPACITY, HANDSHAKE_ATTEMPTS, HANDSHAKE_RETRY_DELAY,
    LinkError, PROTOCOL_VERSION_OFFSET, READ_CHARACTERISTIC_UUID, SCAN_WINDOW, SERVICE_UUID,
    TransportError, WRITE_CHARACTERISTIC_UUID,
};
use crate::crypto::{CryptoSession, SessionKeys};
use crate::transport::{Advertisement, BleAdapter, BlePeer, ConnectionParams, Reassembler, fragment};

use super::retry::retry;
use super::scan::{Device, DeviceId, ScanRegistry};
use super::state::{Dispatch, LinkStateMachine};

/// Link configuration.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// How long a scan runs before results are finalized.
    pub scan_window: Duration,
    /// Overall bound on the initial connection attempt.
    pub connect_timeout: Duration,
    /// Transport-level connection parameters.
    pub connection_params: ConnectionParams,
    /// Attempt budget for each retried handshake step.
    pub handshake_attempts: u32,
    /// Initial backoff delay between handshake attempts.
    pub handshake_retry_delay: Duration,
    /// Capacity of the inbound frame and delivered-message channels.
    pub channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            scan_window: SCAN_WINDOW,
            connect_timeout: CONNECT_TIMEOUT,
            connection_params: ConnectionParams::default(),
            handshake_attempts: HANDSHAKE_ATTEMPTS,
            handshake_retry_delay: HANDSHAKE_RETRY_DELAY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Builder for [`LinkConfig`].
#[derive(Debug, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan window.
    pub fn scan_window(mut self, window: Duration) -> Self {
        self.config.scan_window = window;
        self
    }

    /// Set the overall connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the transport-level connection parameters.
    pub fn connection_params(mut self, params: ConnectionParams) -> Self {
        self.config.connection_params = params;
        self
    }

    /// Set the per-step handshake attempt budget.
    pub fn handshake_attempts(mut self, attempts: u32) -> Self {
        self.config.handshake_attempts = attempts;
        self
    }

    /// Set the initial handshake backoff delay.
    pub fn handshake_retry_delay(mut self, delay: Duration) -> Self {
        self.config.handshake_retry_delay = delay;
        self
    }

    /// Set the inbound channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LinkConfig {
        self.config
    }
}

/// Handle for receiving fully reassembled (and decrypted, if applicable)
/// inbound messages.
pub struct MessageReceiver {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl MessageReceiver {
    /// Receive the next inbound message.
    ///
    /// Returns `None` once the pipeline has stopped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

/// State shared between the link handle and the pipeline task.
struct Shared<P: BlePeer> {
    state: Mutex<LinkStateMachine>,
    crypto: Mutex<CryptoSession>,
    peer: Mutex<Option<Arc<P>>>,
    delivered: mpsc::Sender<Vec<u8>>,
}

impl<P: BlePeer> Shared<P> {
    /// A poisoned lock means a panic interrupted a transition; the state is
    /// marked faulted so the next inbound message runs the recovery path.
    fn state(&self) -> std::sync::MutexGuard<'_, LinkStateMachine> {
        self.state.lock().unwrap_or_else(|poisoned| {
            self.state.clear_poison();
            let mut guard = poisoned.into_inner();
            guard.fault();
            guard
        })
    }

    fn crypto(&self) -> std::sync::MutexGuard<'_, CryptoSession> {
        self.crypto.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn peer(&self) -> Option<Arc<P>> {
        self.peer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A reliable, authenticated message channel over one BLE GATT link.
///
/// Construction hands back the link plus a [`MessageReceiver`] for inbound
/// messages. Session key material is established out-of-band and supplied
/// up front; traffic stays plaintext until [`BleLink::enable_encryption`].
///
/// # Example
///
/// ```ignore
/// let (link, mut messages) = BleLink::new(adapter, keys, LinkConfig::default());
/// let devices = link.scan().await?;
/// link.connect(devices[0].id).await?;
/// link.send(b"status request").await?;
/// ```
pub struct BleLink<A: BleAdapter> {
    adapter: A,
    config: LinkConfig,
    registry: Arc<ScanRegistry>,
    shared: Arc<Shared<A::Peer>>,
    pipeline: Mutex<Option<JoinHandle<()>>>,
}

impl<A: BleAdapter> BleLink<A> {
    /// Create a link over `adapter` with the given session keys.
    pub fn new(adapter: A, keys: SessionKeys, config: LinkConfig) -> (Self, MessageReceiver) {
        let (delivered, rx) = mpsc::channel(config.channel_capacity);
        let link = Self {
            adapter,
            config,
            registry: Arc::new(ScanRegistry::new()),
            shared: Arc::new(Shared {
                state: Mutex::new(LinkStateMachine::new()),
                crypto: Mutex::new(CryptoSession::new(keys)),
                peer: Mutex::new(None),
                delivered,
            }),
            pipeline: Mutex::new(None),
        };
        (link, MessageReceiver { rx })
    }

    /// Scan for compatible peripherals.
    ///
    /// Runs the adapter scan until the configured window elapses, then stops
    /// it and finalizes results. Advertisements are filtered by the protocol
    /// service UUID and deduplicated by address; identifiers are stable
    /// across repeated scans.
    pub async fn scan(&self) -> Result<Vec<Device>, LinkError> {
        let (tx, mut rx) = mpsc::channel::<Advertisement>(self.config.channel_capacity);
        let registry = Arc::clone(&self.registry);
        let collector = tokio::spawn(async move {
            while let Some(advertisement) = rx.recv().await {
                if advertisement.services.contains(&SERVICE_UUID) {
                    let id = registry
                        .insert_if_absent(advertisement.address, advertisement.local_name);
                    trace!(id, "recorded advertisement");
                }
            }
        });

        let window = self.config.scan_window;
        let outcome = timeout(window, self.adapter.scan(window, tx)).await;
        // Either path drops the sink, which ends the collector.
        let _ = collector.await;

        if let Ok(Err(error)) = outcome {
            return Err(error.into());
        }
        Ok(self.registry.devices())
    }

    /// Connect to a device from the latest scan and bring the session up.
    ///
    /// Runs the handshake sequence: resolve the identifier, open the
    /// transport connection under an overall timeout, then discover services
    /// and locate both protocol characteristics with jittered-backoff
    /// retries, and finally subscribe to notifications. On success the
    /// inbound pipeline is running and the link is established.
    ///
    /// Failures surface the last error without rollback; an open transport
    /// connection is left for the caller to [`BleLink::close`] explicitly.
    pub async fn connect(&self, id: DeviceId) -> Result<(), LinkError> {
        let address = self
            .registry
            .resolve(id)
            .ok_or(LinkError::UnknownDevice(id))?;

        debug!(%address, "opening transport connection");
        let peer = timeout(
            self.config.connect_timeout,
            self.adapter.connect(&address, &self.config.connection_params),
        )
        .await
        .map_err(|_| LinkError::ConnectTimeout)??;
        let peer = Arc::new(peer);
        *self.shared.peer.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::clone(&peer));

        let attempts = self.config.handshake_attempts;
        let delay = self.config.handshake_retry_delay;
        let peer_ref: &A::Peer = &peer;

        debug!("discovering services");
        let services = retry(attempts, delay, || peer_ref.discover_services()).await?;
        let services_ref: &[Uuid] = &services;

        debug!("locating read characteristic");
        retry(attempts, delay, || {
            locate_characteristic(peer_ref, services_ref, READ_CHARACTERISTIC_UUID)
        })
        .await?;

        debug!("locating write characteristic");
        retry(attempts, delay, || {
            locate_characteristic(peer_ref, services_ref, WRITE_CHARACTERISTIC_UUID)
        })
        .await?;

        debug!("subscribing to notifications");
        let (frame_tx, frame_rx) = mpsc::channel(self.config.channel_capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let subscriber = Arc::clone(&peer);
        tokio::spawn(async move {
            let result = subscriber
                .subscribe(WRITE_CHARACTERISTIC_UUID, frame_tx)
                .await;
            let _ = done_tx.send(result);
        });
        done_rx
            .await
            .map_err(|_| TransportError::SubscribeFailed("subscription task dropped".into()))??;

        self.shared.state().on_subscribed();
        info!("link established; starting inbound pipeline");

        let pipeline = tokio::spawn(run_inbound(Arc::clone(&self.shared), frame_rx));
        if let Some(previous) = self
            .pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pipeline)
        {
            previous.abort();
        }
        Ok(())
    }

    /// Send a logical message to the peer.
    ///
    /// Encrypts when the session is in encrypted mode, then fragments and
    /// writes each frame in byte order. Write failures surface immediately
    /// and are not retried.
    pub async fn send(&self, message: &[u8]) -> Result<(), LinkError> {
        let peer = self.shared.peer().ok_or(TransportError::NotConnected)?;

        let payload = if self.shared.state().encrypted() {
            self.shared.crypto().encrypt(message)?
        } else {
            message.to_vec()
        };

        for frame in fragment(&payload) {
            peer.write_without_response(READ_CHARACTERISTIC_UUID, &frame)
                .await?;
        }
        Ok(())
    }

    /// Switch the session to authenticated-encrypted traffic.
    pub fn enable_encryption(&self) {
        self.shared.state().enable_encryption();
    }

    /// Replace the session key material, resetting both nonce counters.
    ///
    /// Required after a [`BleLink::reset`] if the link is re-established: a
    /// desynchronized or spent nonce pair never recovers on its own.
    pub fn set_session_keys(&self, keys: SessionKeys) {
        *self.shared.crypto() = CryptoSession::new(keys);
    }

    /// Whether handshake identification has completed.
    pub fn connected(&self) -> bool {
        self.shared.state().connected()
    }

    /// Whether the notification pipeline is live.
    pub fn established(&self) -> bool {
        self.shared.state().established()
    }

    /// The peer's declared protocol version (0 before identification).
    pub fn version(&self) -> u8 {
        self.shared.state().version()
    }

    /// Clear all link state without touching the transport connection.
    pub fn reset(&self) {
        self.shared.state().reset();
    }

    /// Clear all link state and tear down the transport connection.
    pub async fn close(&self) -> Result<(), LinkError> {
        self.shared.state().reset();
        if let Some(pipeline) = self
            .pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pipeline.abort();
        }
        let peer = self
            .shared
            .peer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(peer) = peer {
            peer.disconnect().await?;
        }
        Ok(())
    }
}

/// Check that one of `services` exposes a characteristic with UUID `target`.
///
/// Services that fail characteristic discovery are skipped, not fatal; only
/// a full sweep without a match errors.
async fn locate_characteristic<P: BlePeer>(
    peer: &P,
    services: &[Uuid],
    target: Uuid,
) -> Result<(), TransportError> {
    for &service in services {
        let Ok(characteristics) = peer.discover_characteristics(service).await else {
            continue;
        };
        if characteristics.contains(&target) {
            return Ok(());
        }
    }
    Err(TransportError::CharacteristicNotFound(target))
}

/// The session pipeline: the single consumer of inbound frames.
///
/// Exclusive owner of the reassembler; the only task that advances the state
/// machine from inbound traffic.
async fn run_inbound<P: BlePeer>(shared: Arc<Shared<P>>, mut frames: mpsc::Receiver<Vec<u8>>) {
    let mut reassembler = Reassembler::new();

    while let Some(raw) = frames.recv().await {
        let Some(message) = reassembler.receive(&raw) else {
            continue;
        };

        let dispatch = shared.state().dispatch();
        match dispatch {
            Dispatch::ConnectionRequest => handle_connection_request(&shared, &raw).await,
            Dispatch::Plaintext => {
                if shared.delivered.send(message).await.is_err() {
                    debug!("message consumer dropped; stopping inbound pipeline");
                    return;
                }
            }
            Dispatch::Decrypt => {
                let result = shared.crypto().decrypt(&message);
                match result {
                    Ok(plaintext) => {
                        if shared.delivered.send(plaintext).await.is_err() {
                            debug!("message consumer dropped; stopping inbound pipeline");
                            return;
                        }
                    }
                    Err(error) => warn!(%error, "dropping undecryptable message"),
                }
            }
            Dispatch::Fault => shared.state().recover(),
        }
    }
    if reassembler.in_progress() {
        trace!("discarding incomplete assembly; frame channel closed");
    }
    debug!("inbound frame channel closed; pipeline stopping");
}

/// Handle an inbound frame while unidentified.
///
/// The peripheral expects its connection request echoed back verbatim; only
/// after a successful echo is the connection considered identified, with the
/// protocol version read from byte offset 2 of the raw frame.
async fn handle_connection_request<P: BlePeer>(shared: &Shared<P>, raw: &[u8]) {
    if raw.len() <= PROTOCOL_VERSION_OFFSET {
        trace!("dropping short connection request");
        return;
    }
    let Some(peer) = shared.peer() else {
        return;
    };
    if let Err(error) = peer.write_without_response(READ_CHARACTERISTIC_UUID, raw).await {
        debug!(%error, "connection-request acknowledgment failed");
        return;
    }

    let version = raw[PROTOCOL_VERSION_OFFSET];
    shared.state().on_connection_request(version);
    debug!(version, "peer identified");
}
