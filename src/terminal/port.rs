//! Port transport abstraction.
//!
//! The session core never talks to a serial line directly: it consumes a
//! narrow boundary contract of `open` / `write` / `read_all` / `close`
//! plus an asynchronous "bytes available" readiness signal.  The real
//! platform back-end is expected to be injected via the `PortLink`
//! trait; an in-memory implementation is provided for unit tests and
//! offline use.

use crate::terminal::types::{PortConfig, TerminalError, TerminalErrorKind};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Port trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Boundary contract to the external serial port.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc` and shared with the session task.
#[async_trait::async_trait]
pub trait PortLink: Send + Sync {
    /// Open the port with the given configuration.  Either succeeds or
    /// fails synchronously; no retry is attempted here.
    async fn open(&self, config: &PortConfig) -> Result<(), TerminalError>;

    /// Close the port.
    async fn close(&self) -> Result<(), TerminalError>;

    /// Write all bytes in `buf`.  Fire-and-forget: no acknowledgment wait.
    async fn write(&self, buf: &[u8]) -> Result<usize, TerminalError>;

    /// Read and drain everything currently available.
    async fn read_all(&self) -> Result<Vec<u8>, TerminalError>;

    /// Resolve once new bytes are available for `read_all`, or once the
    /// port has been closed.
    async fn wait_readable(&self);

    /// Number of bytes waiting in the receive buffer.
    async fn bytes_available(&self) -> usize;

    /// Check whether the port is open.
    fn is_open(&self) -> bool;

    /// Retrieve the port name.
    fn port_name(&self) -> &str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Simulated port (for testing & offline use)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A fully in-memory port useful for unit tests and UI demos.
pub struct SimulatedPort {
    name: String,
    open: AtomicBool,
    config: Mutex<PortConfig>,
    rx_buf: Mutex<VecDeque<u8>>,
    tx_buf: Mutex<VecDeque<u8>>,
    rx_notify: Notify,
    loopback: AtomicBool,
    open_failure: Mutex<Option<String>>,
}

impl SimulatedPort {
    /// Create a new simulated port for the given port name.
    pub fn new(port_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: port_name.into(),
            open: AtomicBool::new(false),
            config: Mutex::new(PortConfig::default()),
            rx_buf: Mutex::new(VecDeque::with_capacity(4096)),
            tx_buf: Mutex::new(VecDeque::with_capacity(4096)),
            rx_notify: Notify::new(),
            loopback: AtomicBool::new(false),
            open_failure: Mutex::new(None),
        })
    }

    /// Enable loopback mode (TX data is immediately available in RX).
    pub fn set_loopback(&self, enabled: bool) {
        self.loopback.store(enabled, Ordering::SeqCst);
    }

    /// Make the next `open` call fail with the given driver description.
    pub async fn fail_next_open(&self, description: impl Into<String>) {
        let mut failure = self.open_failure.lock().await;
        *failure = Some(description.into());
    }

    /// Inject bytes into the receive buffer (simulate incoming data).
    pub async fn inject_rx(&self, data: &[u8]) {
        let mut buf = self.rx_buf.lock().await;
        buf.extend(data);
        drop(buf);
        self.rx_notify.notify_one();
    }

    /// Drain all bytes from the transmit buffer (for test assertions).
    pub async fn drain_tx(&self) -> Vec<u8> {
        let mut buf = self.tx_buf.lock().await;
        buf.drain(..).collect()
    }

    /// Peek at the transmit buffer contents without draining.
    pub async fn peek_tx(&self) -> Vec<u8> {
        let buf = self.tx_buf.lock().await;
        buf.iter().copied().collect()
    }
}

#[async_trait::async_trait]
impl PortLink for SimulatedPort {
    async fn open(&self, config: &PortConfig) -> Result<(), TerminalError> {
        if let Some(description) = self.open_failure.lock().await.take() {
            return Err(
                TerminalError::new(TerminalErrorKind::PortOpenFailed, description)
                    .with_port(&self.name),
            );
        }
        if self.open.load(Ordering::SeqCst) {
            return Err(TerminalError::new(
                TerminalErrorKind::PortOpenFailed,
                format!("port {} already open", self.name),
            )
            .with_port(&self.name));
        }
        let mut cfg = self.config.lock().await;
        *cfg = config.clone();
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), TerminalError> {
        self.open.store(false, Ordering::SeqCst);
        // Wake any readiness waiter so it can observe the closed state.
        self.rx_notify.notify_one();
        Ok(())
    }

    async fn write(&self, buf: &[u8]) -> Result<usize, TerminalError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TerminalError::new(
                TerminalErrorKind::NotConnected,
                "port not open",
            )
            .with_port(&self.name));
        }
        let mut tx = self.tx_buf.lock().await;
        tx.extend(buf);
        drop(tx);

        if self.loopback.load(Ordering::SeqCst) {
            self.inject_rx(buf).await;
        }
        Ok(buf.len())
    }

    async fn read_all(&self) -> Result<Vec<u8>, TerminalError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TerminalError::new(
                TerminalErrorKind::NotConnected,
                "port not open",
            )
            .with_port(&self.name));
        }
        let mut rx = self.rx_buf.lock().await;
        Ok(rx.drain(..).collect())
    }

    async fn wait_readable(&self) {
        loop {
            if !self.open.load(Ordering::SeqCst) {
                return;
            }
            if !self.rx_buf.lock().await.is_empty() {
                return;
            }
            self.rx_notify.notified().await;
        }
    }

    async fn bytes_available(&self) -> usize {
        self.rx_buf.lock().await.len()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn port_name(&self) -> &str {
        &self.name
    }
}
