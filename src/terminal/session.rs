//! Terminal session management.
//!
//! A session owns the transcript, the send history, and the pending
//! input, and orchestrates them against an injected `PortLink`.  All
//! mutation is confined to a single async task (the runner), which
//! serializes user commands and port readiness onto one logical thread
//! of control, so a receive can never interleave with an in-progress
//! send.

use crate::terminal::codec;
use crate::terminal::history::SendHistory;
use crate::terminal::port::PortLink;
use crate::terminal::reformat;
use crate::terminal::transcript::TranscriptLog;
use crate::terminal::types::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session commands (caller → session)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Commands that can be sent to a running session.
#[derive(Debug)]
pub enum SessionCommand {
    /// Decode the display text under the active mode and transmit it.
    Send {
        text: String,
        reply: oneshot::Sender<Result<(), TerminalError>>,
    },
    /// Live keystroke update of the pending-input field.
    EditPending { text: String, cursor: usize },
    /// Walk the send history one entry further into the past.
    RecallPrevious,
    /// Walk the send history one entry back toward the present.
    RecallNext,
    /// Switch the display mode, replaying the transcript under it.
    SetDisplayMode {
        mode: DisplayMode,
        reply: oneshot::Sender<Result<(), TerminalError>>,
    },
    /// Drop all transcript frames.
    ClearTranscript,
    /// Get a session info snapshot (response via oneshot).
    GetInfo(oneshot::Sender<SessionInfo>),
    /// Disconnect and clean up.
    Disconnect,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session events (session → renderer)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Events emitted by a running session.  This channel is the renderer
/// contract: tagged strings only, no markup or color.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A frame was exchanged and rendered under the active mode.
    FrameLogged(FrameEvent),
    /// The full transcript was re-rendered (mode switch or clear).
    TranscriptReplaced(Vec<FrameEvent>),
    /// The pending-input field was reformatted.
    PendingInputChanged(PendingInputEvent),
    /// Recoverable error occurred.
    Error {
        error: TerminalError,
        recoverable: bool,
    },
    /// Session disconnected.
    Disconnected { reason: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session core (single mutation path)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Synchronous session state: transcript, history, pending input, and
/// the exchange timer.  Owned exclusively by the runner task.
pub struct SessionCore {
    mode: DisplayMode,
    transcript: TranscriptLog,
    history: SendHistory,
    pending_text: String,
    pending_cursor: usize,
    last_exchange: Instant,
}

impl SessionCore {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            transcript: TranscriptLog::new(),
            history: SendHistory::new(),
            pending_text: String::new(),
            pending_cursor: 0,
            last_exchange: Instant::now(),
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn history(&self) -> &SendHistory {
        &self.history
    }

    /// Current pending-input field contents.
    pub fn pending(&self) -> PendingInputEvent {
        PendingInputEvent {
            text: self.pending_text.clone(),
            cursor: self.pending_cursor,
        }
    }

    /// Milliseconds since the previous exchanged frame; restarts the
    /// timer so the next frame is stamped relative to this one.
    fn restart_exchange_timer(&mut self) -> u64 {
        let elapsed = self.last_exchange.elapsed().as_millis() as u64;
        self.last_exchange = Instant::now();
        elapsed
    }

    /// Render a frame under the active display mode.
    pub fn render_frame(&self, frame: &Frame) -> FrameEvent {
        FrameEvent {
            direction: frame.direction,
            encoded: codec::encode(&frame.payload, self.mode),
            elapsed_ms: frame.elapsed_ms,
            size: frame.payload.len(),
            raw: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &frame.payload,
            ),
        }
    }

    /// Re-render the whole transcript under the active mode.
    pub fn replay(&self) -> Vec<FrameEvent> {
        self.transcript.iter().map(|f| self.render_frame(f)).collect()
    }

    /// Decode outgoing display text under the active mode.  Rejection
    /// leaves all session state untouched.
    pub fn decode_outgoing(&self, text: &str) -> Result<Vec<u8>, TerminalError> {
        codec::decode(text, self.mode)
    }

    /// Book-keep a successfully transmitted payload: stamp it, append a
    /// Tx frame, record it in history, and clear the pending input.
    pub fn commit_send(&mut self, payload: Vec<u8>) -> (FrameEvent, PendingInputEvent) {
        let elapsed = self.restart_exchange_timer();
        let payload = Bytes::from(payload);
        let frame = Frame::new(Direction::Tx, payload.clone(), elapsed);
        let event = self.render_frame(&frame);
        self.transcript.append(frame);
        self.history.record(payload);
        self.pending_text.clear();
        self.pending_cursor = 0;
        (event, self.pending())
    }

    /// Book-keep a completed receive: stamp it and append an Rx frame.
    pub fn receive(&mut self, data: Vec<u8>) -> FrameEvent {
        let elapsed = self.restart_exchange_timer();
        let frame = Frame::new(Direction::Rx, data, elapsed);
        let event = self.render_frame(&frame);
        self.transcript.append(frame);
        event
    }

    /// Switch the display mode.
    ///
    /// A redundant switch to the already-active mode is a no-op
    /// (`Ok(None)`).  Otherwise the pending input is re-rendered first;
    /// if that fails nothing changes.  On success the full transcript
    /// replay plus the reformatted pending input are returned.
    pub fn set_display_mode(
        &mut self,
        mode: DisplayMode,
    ) -> Result<Option<(Vec<FrameEvent>, PendingInputEvent)>, TerminalError> {
        if mode == self.mode {
            return Ok(None);
        }
        let (text, cursor) = reformat::reformat_for_mode_switch(self.mode, mode, &self.pending_text)?;
        self.mode = mode;
        self.pending_text = text;
        self.pending_cursor = cursor;
        Ok(Some((self.replay(), self.pending())))
    }

    /// Live keystroke update.  Hex mode reformats into canonical
    /// grouping; text mode accepts the input verbatim.
    pub fn edit_pending(&mut self, text: String, cursor: usize) -> PendingInputEvent {
        match self.mode {
            DisplayMode::Hex => {
                let (display, adjusted) = reformat::reformat_hex(&text, cursor);
                self.pending_text = display;
                self.pending_cursor = adjusted;
            }
            DisplayMode::Text => {
                self.pending_cursor = cursor.min(text.chars().count());
                self.pending_text = text;
            }
        }
        self.pending()
    }

    /// Recall the next-older distinct payload into the pending input.
    pub fn recall_previous(&mut self) -> Result<Option<PendingInputEvent>, TerminalError> {
        let draft = reformat::pending_bytes(self.mode, &self.pending_text)?;
        match self.history.recall_previous(&draft) {
            Some(payload) => Ok(Some(self.show_payload(&payload))),
            None => Ok(None),
        }
    }

    /// Walk back toward the present; landing on "not recalling" restores
    /// the cached pre-recall draft.
    pub fn recall_next(&mut self) -> Option<PendingInputEvent> {
        self.history
            .recall_next()
            .map(|payload| self.show_payload(&payload))
    }

    fn show_payload(&mut self, payload: &[u8]) -> PendingInputEvent {
        self.pending_text = codec::encode(payload, self.mode);
        self.pending_cursor = self.pending_text.chars().count();
        self.pending()
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Handle to a running terminal session.  Held by the service layer.
#[derive(Debug)]
pub struct TerminalSessionHandle {
    /// Unique session ID.
    pub id: String,
    /// Port name.
    pub port_name: String,
    /// Config used to open the session.
    pub config: PortConfig,
    /// Channel to send commands to the session task.
    pub cmd_tx: mpsc::Sender<SessionCommand>,
    /// Channel to receive events from the session task.
    pub event_rx: Mutex<mpsc::Receiver<SessionEvent>>,
    /// Whether the session is connected.
    pub connected: Arc<AtomicBool>,
    /// When the session was opened.
    pub connected_at: DateTime<Utc>,
    /// Frames received.
    pub frames_rx: Arc<AtomicU64>,
    /// Frames transmitted.
    pub frames_tx: Arc<AtomicU64>,
    /// Last display mode the runner confirmed.
    pub display_mode: Arc<StdMutex<DisplayMode>>,
}

impl TerminalSessionHandle {
    /// Send a command to the session.
    pub async fn send_command(&self, cmd: SessionCommand) -> Result<(), TerminalError> {
        self.cmd_tx.send(cmd).await.map_err(|_| {
            TerminalError::new(TerminalErrorKind::ChannelClosed, "session command channel closed")
                .with_session(&self.id)
        })
    }

    /// Decode and transmit display text, waiting for the typed outcome.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), TerminalError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(SessionCommand::Send {
            text: text.into(),
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| {
            TerminalError::new(TerminalErrorKind::ChannelClosed, "session ended before reply")
                .with_session(&self.id)
        })?
    }

    /// Switch the display mode, waiting for the typed outcome.
    pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<(), TerminalError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(SessionCommand::SetDisplayMode { mode, reply: tx })
            .await?;
        rx.await.map_err(|_| {
            TerminalError::new(TerminalErrorKind::ChannelClosed, "session ended before reply")
                .with_session(&self.id)
        })?
    }

    /// Build a `SessionInfo` snapshot.
    pub async fn info(&self) -> SessionInfo {
        let (tx, rx) = oneshot::channel();
        if self.send_command(SessionCommand::GetInfo(tx)).await.is_ok() {
            if let Ok(info) = rx.await {
                return info;
            }
        }
        // The runner is gone; report what the handle still knows.
        SessionInfo {
            id: self.id.clone(),
            port_name: self.port_name.clone(),
            config_shorthand: self.config.shorthand(),
            state: SessionState::Disconnected,
            display_mode: self.display_mode.lock().map(|m| *m).unwrap_or_default(),
            label: self.config.label.clone(),
            connected_at: self.connected_at,
            frames_rx: self.frames_rx.load(Ordering::Relaxed),
            frames_tx: self.frames_tx.load(Ordering::Relaxed),
        }
    }

    /// Receive the next session event.
    pub async fn recv_event(&self) -> Option<SessionEvent> {
        let mut rx = self.event_rx.lock().await;
        rx.recv().await
    }

    /// Check whether the session is still connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session runner (async task)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Internal state for the session task.
struct SessionRunner {
    id: String,
    core: SessionCore,
    port: Arc<dyn PortLink>,
    config: PortConfig,
    event_tx: mpsc::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
    connected_at: DateTime<Utc>,
    frames_rx: Arc<AtomicU64>,
    frames_tx: Arc<AtomicU64>,
    display_mode: Arc<StdMutex<DisplayMode>>,
}

impl SessionRunner {
    /// Main session loop: one task, one mutation path.
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        None | Some(SessionCommand::Disconnect) => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                // Port readiness: read everything currently available as
                // one payload.  Rapid deliveries become separate frames.
                _ = self.port.wait_readable() => {
                    if !self.port.is_open() {
                        warn!("session {}: port {} closed externally", self.id, self.config.port_name);
                        break;
                    }
                    self.handle_readable().await;
                }
            }
        }

        // Cleanup
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.port.close().await;
        info!("session {}: disconnected from {}", self.id, self.config.port_name);
        let _ = self
            .event_tx
            .send(SessionEvent::Disconnected {
                reason: "session ended".to_string(),
            })
            .await;
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Send { text, reply } => {
                let result = self.handle_send(&text).await;
                if let Err(e) = &result {
                    debug!("session {}: send rejected: {}", self.id, e);
                }
                let _ = reply.send(result);
            }
            SessionCommand::EditPending { text, cursor } => {
                let event = self.core.edit_pending(text, cursor);
                let _ = self
                    .event_tx
                    .send(SessionEvent::PendingInputChanged(event))
                    .await;
            }
            SessionCommand::RecallPrevious => match self.core.recall_previous() {
                Ok(Some(event)) => {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::PendingInputChanged(event))
                        .await;
                }
                Ok(None) => {}
                Err(error) => {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::Error {
                            error,
                            recoverable: true,
                        })
                        .await;
                }
            },
            SessionCommand::RecallNext => {
                if let Some(event) = self.core.recall_next() {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::PendingInputChanged(event))
                        .await;
                }
            }
            SessionCommand::SetDisplayMode { mode, reply } => {
                let result = match self.core.set_display_mode(mode) {
                    Ok(Some((frames, pending))) => {
                        debug!("session {}: display mode -> {}", self.id, mode.label());
                        if let Ok(mut cached) = self.display_mode.lock() {
                            *cached = mode;
                        }
                        let _ = self
                            .event_tx
                            .send(SessionEvent::TranscriptReplaced(frames))
                            .await;
                        let _ = self
                            .event_tx
                            .send(SessionEvent::PendingInputChanged(pending))
                            .await;
                        Ok(())
                    }
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::ClearTranscript => {
                self.core.clear_transcript();
                let _ = self
                    .event_tx
                    .send(SessionEvent::TranscriptReplaced(Vec::new()))
                    .await;
            }
            SessionCommand::GetInfo(reply) => {
                let _ = reply.send(self.build_info());
            }
            // Handled by the run loop.
            SessionCommand::Disconnect => {}
        }
    }

    /// Decode, transmit, then book-keep.  A decode or write failure is
    /// reported as a typed result and leaves transcript, history, and
    /// pending input untouched.
    async fn handle_send(&mut self, text: &str) -> Result<(), TerminalError> {
        let payload = self.core.decode_outgoing(text)?;
        self.port
            .write(&payload)
            .await
            .map_err(|e| e.with_session(&self.id))?;
        let (frame, pending) = self.core.commit_send(payload);
        self.frames_tx.fetch_add(1, Ordering::Relaxed);
        debug!("session {}: tx {} bytes", self.id, frame.size);
        let _ = self.event_tx.send(SessionEvent::FrameLogged(frame)).await;
        let _ = self
            .event_tx
            .send(SessionEvent::PendingInputChanged(pending))
            .await;
        Ok(())
    }

    async fn handle_readable(&mut self) {
        match self.port.read_all().await {
            Ok(data) if !data.is_empty() => {
                let frame = self.core.receive(data);
                self.frames_rx.fetch_add(1, Ordering::Relaxed);
                debug!("session {}: rx {} bytes", self.id, frame.size);
                let _ = self.event_tx.send(SessionEvent::FrameLogged(frame)).await;
            }
            Ok(_) => {}
            Err(error) => {
                let _ = self
                    .event_tx
                    .send(SessionEvent::Error {
                        error: error.with_session(&self.id),
                        recoverable: true,
                    })
                    .await;
            }
        }
    }

    fn build_info(&self) -> SessionInfo {
        let state = if self.connected.load(Ordering::SeqCst) {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        };
        SessionInfo {
            id: self.id.clone(),
            port_name: self.config.port_name.clone(),
            config_shorthand: self.config.shorthand(),
            state,
            display_mode: self.core.display_mode(),
            label: self.config.label.clone(),
            connected_at: self.connected_at,
            frames_rx: self.frames_rx.load(Ordering::Relaxed),
            frames_tx: self.frames_tx.load(Ordering::Relaxed),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session factory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Open the port and start a new terminal session.
///
/// On open failure the session never leaves `Disconnected` and the
/// port's error description is surfaced as `PortOpenFailed`.  On success
/// the runner task starts in the background and communicates via the
/// command/event channels on the returned handle.
pub async fn connect_session(
    id: String,
    port: Arc<dyn PortLink>,
    config: PortConfig,
) -> Result<Arc<TerminalSessionHandle>, TerminalError> {
    port.open(&config).await.map_err(|e| e.with_session(&id))?;
    info!("session {}: {}", id, config.summary());

    let (cmd_tx, cmd_rx) = mpsc::channel::<SessionCommand>(64);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(256);

    let connected = Arc::new(AtomicBool::new(true));
    let frames_rx = Arc::new(AtomicU64::new(0));
    let frames_tx = Arc::new(AtomicU64::new(0));
    let display_mode = Arc::new(StdMutex::new(DisplayMode::default()));
    let connected_at = Utc::now();

    let handle = Arc::new(TerminalSessionHandle {
        id: id.clone(),
        port_name: config.port_name.clone(),
        config: config.clone(),
        cmd_tx,
        event_rx: Mutex::new(event_rx),
        connected: connected.clone(),
        connected_at,
        frames_rx: frames_rx.clone(),
        frames_tx: frames_tx.clone(),
        display_mode: display_mode.clone(),
    });

    let runner = SessionRunner {
        id,
        core: SessionCore::new(DisplayMode::default()),
        port,
        config,
        event_tx,
        connected,
        connected_at,
        frames_rx,
        frames_tx,
        display_mode,
    };

    // Spawn the session task
    tokio::spawn(async move {
        runner.run(cmd_rx).await;
    });

    Ok(handle)
}
