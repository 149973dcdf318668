//! Session and connection status at the credential boundary. The OAuth
//! flow itself lives in the embedding shell; the core only tracks whether a
//! valid session exists and which transports are up.

use std::sync::RwLock;

use serde::Serialize;

use crate::events::bus::TransportKind;

/// Snapshot handed to the UI and the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub authenticated: bool,
    pub chat_connected: bool,
    pub push_connected: bool,
    pub channel: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    authenticated: bool,
    chat_connected: bool,
    push_connected: bool,
    channel: Option<String>,
}

/// Shared, process-lifetime session state. Adapters report transport
/// transitions; the shell flips `authenticated` on login/logout.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Losing the session also means losing both transports.
    pub fn set_authenticated(&self, authenticated: bool) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.authenticated = authenticated;
        if !authenticated {
            inner.chat_connected = false;
            inner.push_connected = false;
            inner.channel = None;
        }
    }

    pub fn transport_connected(&self, transport: TransportKind, channel: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match transport {
            TransportKind::Chat => inner.chat_connected = true,
            TransportKind::EventSub => inner.push_connected = true,
        }
        inner.channel = Some(channel.to_string());
    }

    pub fn transport_disconnected(&self, transport: TransportKind) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match transport {
            TransportKind::Chat => inner.chat_connected = false,
            TransportKind::EventSub => inner.push_connected = false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        ConnectionStatus {
            authenticated: inner.authenticated,
            chat_connected: inner.chat_connected,
            push_connected: inner.push_connected,
            channel: inner.channel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out_and_disconnected() {
        let session = SessionState::new();
        let status = session.status();
        assert!(!status.authenticated);
        assert!(!status.chat_connected);
        assert!(!status.push_connected);
        assert_eq!(status.channel, None);
    }

    #[test]
    fn transports_report_independently() {
        let session = SessionState::new();
        session.set_authenticated(true);
        session.transport_connected(TransportKind::Chat, "somechannel");

        let status = session.status();
        assert!(status.chat_connected);
        assert!(!status.push_connected);
        assert_eq!(status.channel.as_deref(), Some("somechannel"));

        session.transport_disconnected(TransportKind::Chat);
        assert!(!session.status().chat_connected);
    }

    #[test]
    fn logout_tears_down_everything() {
        let session = SessionState::new();
        session.set_authenticated(true);
        session.transport_connected(TransportKind::Chat, "somechannel");
        session.transport_connected(TransportKind::EventSub, "somechannel");

        session.set_authenticated(false);

        let status = session.status();
        assert!(!status.authenticated);
        assert!(!status.chat_connected);
        assert!(!status.push_connected);
        assert_eq!(status.channel, None);
    }
}
