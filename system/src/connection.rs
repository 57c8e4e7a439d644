use crate::config::{ConfigError, Credentials};
use crate::message::{ClientFrame, ServerFrame};
use crate::traits::{Channel, ConnectionStatus};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    ClosedPendingReconnect,
    /// Reached only through [`ConnectionManager::close`].
    Closed,
}

/// Builds `<server>/ws?userId=..&session=..[&token=..][&accountId=..]`.
pub fn channel_url(
    server_url: &str,
    session_code: &str,
    participant_id: &str,
    credentials: &Credentials,
) -> Result<Url, ConfigError> {
    let mut url = Url::parse(server_url)?;
    url.path_segments_mut()
        .map_err(|_| ConfigError::UnsupportedUrl(server_url.to_owned()))?
        .pop_if_empty()
        .push("ws");
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("userId", participant_id)
            .append_pair("session", session_code);
        if let Some(token) = &credentials.token {
            query.append_pair("token", token);
        }
        if let Some(account_id) = &credentials.account_id {
            query.append_pair("accountId", account_id);
        }
    }
    Ok(url)
}

/// Lifecycle of the channel to the relay: open, send while open, and heal after a close with
/// a single delayed reconnection.
pub struct ConnectionManager<C: Channel> {
    channel: C,
    url: Url,
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_at: Option<Duration>,
}

impl<C: Channel> ConnectionManager<C> {
    pub fn new(channel: C, url: Url, reconnect_delay: Duration) -> Self {
        Self {
            channel,
            url,
            state: ConnectionState::Connecting,
            reconnect_delay,
            reconnect_at: None,
        }
    }

    pub fn connect(&mut self) {
        log::info!("Connecting to {}", self.url);
        self.state = ConnectionState::Connecting;
        self.channel.open(self.url.as_str());
    }

    /// Sends a frame if the channel is open. There is no outbound queue: anything submitted
    /// while not open is dropped.
    pub fn send(&mut self, frame: &ClientFrame) -> bool {
        if self.state != ConnectionState::Open {
            log::debug!("Dropping outbound frame while {:?}", self.state);
            return false;
        }
        match frame.encode() {
            Ok(text) => {
                self.channel.send(text);
                true
            }
            Err(err) => {
                log::warn!("Could not encode outbound frame: {}", err);
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.reconnect_at = None;
        if self.state != ConnectionState::Closed {
            log::info!("Closing channel");
            self.state = ConnectionState::Closed;
            self.channel.close();
        }
    }

    pub fn on_open(&mut self) -> Option<ConnectionStatus> {
        if self.state == ConnectionState::Closed {
            log::debug!("Ignoring open after manual close");
            return None;
        }
        self.reconnect_at = None;
        self.state = ConnectionState::Open;
        log::info!("Channel open");
        Some(ConnectionStatus::Connected)
    }

    /// Handles a close or a failed open. Schedules one reconnection unless one is pending.
    pub fn on_closed(&mut self, now: Duration) -> Option<ConnectionStatus> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.state = ConnectionState::ClosedPendingReconnect;
        if self.reconnect_at.is_none() {
            let at = now + self.reconnect_delay;
            log::info!("Channel closed, reconnecting in {:?}", self.reconnect_delay);
            self.reconnect_at = Some(at);
        }
        Some(ConnectionStatus::Disconnected)
    }

    /// Decodes an inbound payload. Malformed payloads are dropped; they are not a connection
    /// failure.
    pub fn on_message(&self, text: &str) -> Option<ServerFrame> {
        match ServerFrame::decode(text) {
            Ok(frame) => Some(frame),
            Err(err) => {
                log::debug!("Dropping inbound payload: {}", err);
                None
            }
        }
    }

    /// Fires the reconnection timer when due.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now => {
                self.reconnect_at = None;
                self.connect();
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.reconnect_at
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}
