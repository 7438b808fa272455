//! Terminal service layer.
//!
//! Owns the registry of live sessions and exposes the operations a
//! front end drives: connect, disconnect, send, input editing, history
//! recall, and display-mode switching.  Each session runs on its own
//! task; the service only routes commands and snapshots.

use crate::terminal::port::PortLink;
use crate::terminal::session::{
    connect_session, SessionCommand, SessionEvent, TerminalSessionHandle,
};
use crate::terminal::types::*;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared service state handed to front-end glue.
pub type TerminalServiceState = Arc<TerminalService>;

/// Registry of running terminal sessions.
pub struct TerminalService {
    sessions: RwLock<HashMap<String, Arc<TerminalSessionHandle>>>,
}

impl TerminalService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Open a port and register a new session for it.  A port already
    /// claimed by a live session cannot be opened twice.
    pub async fn connect(
        &self,
        port: Arc<dyn PortLink>,
        config: PortConfig,
    ) -> Result<SessionInfo, TerminalError> {
        {
            let sessions = self.sessions.read().await;
            let in_use = sessions
                .values()
                .any(|h| h.port_name == config.port_name && h.is_connected());
            if in_use {
                return Err(TerminalError::new(
                    TerminalErrorKind::PortOpenFailed,
                    format!("port {} is already in use", config.port_name),
                )
                .with_port(&config.port_name));
            }
        }

        let id = Uuid::new_v4().to_string();
        let handle = connect_session(id.clone(), port, config).await?;
        let info = handle.info().await;

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, handle);
        info!("terminal service: {} session(s) active", sessions.len());
        Ok(info)
    }

    /// Disconnect a session.  Unknown or already-ended sessions are a
    /// no-op.
    pub async fn disconnect(&self, session_id: &str) {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id)
        };
        if let Some(handle) = handle {
            if handle
                .send_command(SessionCommand::Disconnect)
                .await
                .is_err()
            {
                warn!("session {}: already ended", session_id);
            }
        }
    }

    /// Disconnect every live session.
    pub async fn disconnect_all(&self) {
        let handles: Vec<_> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            let _ = handle.send_command(SessionCommand::Disconnect).await;
        }
    }

    /// Decode and transmit display text on a session.
    pub async fn send(&self, session_id: &str, text: &str) -> Result<(), TerminalError> {
        self.get_session(session_id).await?.send_text(text).await
    }

    /// Live keystroke update of a session's pending input.
    pub async fn edit_pending(
        &self,
        session_id: &str,
        text: String,
        cursor: usize,
    ) -> Result<(), TerminalError> {
        self.get_session(session_id)
            .await?
            .send_command(SessionCommand::EditPending { text, cursor })
            .await
    }

    /// Step a session's history recall toward the past.
    pub async fn recall_previous(&self, session_id: &str) -> Result<(), TerminalError> {
        self.get_session(session_id)
            .await?
            .send_command(SessionCommand::RecallPrevious)
            .await
    }

    /// Step a session's history recall toward the present.
    pub async fn recall_next(&self, session_id: &str) -> Result<(), TerminalError> {
        self.get_session(session_id)
            .await?
            .send_command(SessionCommand::RecallNext)
            .await
    }

    /// Switch a session's display mode.
    pub async fn set_display_mode(
        &self,
        session_id: &str,
        mode: DisplayMode,
    ) -> Result<(), TerminalError> {
        self.get_session(session_id)
            .await?
            .set_display_mode(mode)
            .await
    }

    /// Drop a session's transcript.
    pub async fn clear_transcript(&self, session_id: &str) -> Result<(), TerminalError> {
        self.get_session(session_id)
            .await?
            .send_command(SessionCommand::ClearTranscript)
            .await
    }

    /// Snapshot one session.
    pub async fn session_info(&self, session_id: &str) -> Result<SessionInfo, TerminalError> {
        Ok(self.get_session(session_id).await?.info().await)
    }

    /// Snapshot every registered session.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let handles: Vec<_> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            infos.push(handle.info().await);
        }
        infos
    }

    /// Drain the events a session has queued for the renderer.
    pub async fn take_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, TerminalError> {
        let handle = self.get_session(session_id).await?;
        let mut events = Vec::new();
        let mut rx = handle.event_rx.lock().await;
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        Ok(events)
    }

    async fn get_session(
        &self,
        session_id: &str,
    ) -> Result<Arc<TerminalSessionHandle>, TerminalError> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned().ok_or_else(|| {
            TerminalError::new(
                TerminalErrorKind::SessionNotFound,
                format!("session not found: {}", session_id),
            )
            .with_session(session_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::port::SimulatedPort;

    fn config(name: &str) -> PortConfig {
        PortConfig {
            port_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_and_list() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM3");
        let info = service.connect(port, config("COM3")).await.unwrap();
        assert_eq!(info.state, SessionState::Connected);
        assert_eq!(info.port_name, "COM3");

        let sessions = service.list_sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, info.id);

        service.disconnect_all().await;
    }

    #[tokio::test]
    async fn test_connect_rejects_port_in_use() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM3");
        service.connect(port, config("COM3")).await.unwrap();

        let other = SimulatedPort::new("COM3");
        let err = service.connect(other, config("COM3")).await.unwrap_err();
        assert_eq!(err.kind, TerminalErrorKind::PortOpenFailed);

        service.disconnect_all().await;
    }

    #[tokio::test]
    async fn test_connect_failure_registers_nothing() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM9");
        port.fail_next_open("access denied").await;
        let err = service.connect(port, config("COM9")).await.unwrap_err();
        assert_eq!(err.kind, TerminalErrorKind::PortOpenFailed);
        assert!(service.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_routes_to_session_port() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM3");
        let info = service.connect(port.clone(), config("COM3")).await.unwrap();

        service.send(&info.id, "DE AD").await.unwrap();
        assert_eq!(port.drain_tx().await, vec![0xDE, 0xAD]);

        service.disconnect_all().await;
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let service = TerminalService::new();
        let err = service.send("nope", "00").await.unwrap_err();
        assert_eq!(err.kind, TerminalErrorKind::SessionNotFound);
        assert_eq!(err.session_id.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn test_disconnect_unknown_is_noop() {
        let service = TerminalService::new();
        service.disconnect("nope").await;
        assert!(service.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_removes_session() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM3");
        let info = service.connect(port.clone(), config("COM3")).await.unwrap();

        service.disconnect(&info.id).await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(service.list_sessions().await.is_empty());
        assert!(!port.is_open());

        // Idempotent.
        service.disconnect(&info.id).await;
    }

    #[tokio::test]
    async fn test_take_events_drains_queue() {
        let service = TerminalService::new();
        let port = SimulatedPort::new("COM3");
        let info = service.connect(port.clone(), config("COM3")).await.unwrap();

        service.send(&info.id, "01 02").await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let events = service.take_events(&info.id).await.unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::FrameLogged(f) if f.encoded == "01 02")));

        // Drained.
        let events = service.take_events(&info.id).await.unwrap();
        assert!(events.is_empty());

        service.disconnect_all().await;
    }
}
