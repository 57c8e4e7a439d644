use crate::config::{ConfigError, Credentials, SyncConfig};
use crate::connection::{channel_url, ConnectionManager, ConnectionState};
use crate::document::Document;
use crate::layout::ScrollOffset;
use crate::message::ClientFrame;
use crate::persistence::{PersistenceError, PersistenceScheduler, SaveTrigger};
use crate::presence::PresenceRegistry;
use crate::router::{MessageRouter, Routed};
use crate::session_state::SessionState;
use crate::traits::{Channel, Persistence, RenderPort, SaveIndicator};
use crate::types::ParticipantId;
use std::time::Duration;

/// One participant's view of one session.
///
/// Every host event ends up here. The host supplies the clock on the calls that need it and
/// wakes the session up again at [`CollabSession::next_deadline`].
pub struct CollabSession<C: Channel, P: Persistence> {
    state: SessionState,
    credentials: Credentials,
    connection: ConnectionManager<C>,
    scheduler: PersistenceScheduler,
    persistence: P,
}

impl<C: Channel, P: Persistence> CollabSession<C, P> {
    pub fn new(
        config: SyncConfig,
        participant_id: ParticipantId,
        channel: C,
        persistence: P,
        now: Duration,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let url = channel_url(
            &config.server_url,
            &config.session_code,
            &participant_id,
            &config.credentials,
        )?;
        log::debug!("Session {} as {}", config.session_code, participant_id);
        Ok(Self {
            state: SessionState::new(config.session_code, participant_id, config.surface),
            credentials: config.credentials,
            connection: ConnectionManager::new(
                channel,
                url,
                config.timing.reconnect_delay(),
            ),
            scheduler: PersistenceScheduler::new(config.timing, now),
            persistence,
        })
    }

    pub fn start(&mut self) {
        self.connection.connect();
    }

    pub fn on_channel_open(&mut self, port: &mut dyn RenderPort) {
        if let Some(status) = self.connection.on_open() {
            port.show_connection_status(status);
        }
    }

    /// The relay re-sends `init` and the participant list after a reconnect, so everything
    /// known about others is dropped here.
    pub fn on_channel_closed(&mut self, now: Duration, port: &mut dyn RenderPort) {
        if let Some(status) = self.connection.on_closed(now) {
            port.show_connection_status(status);
            self.state.reset_presence(port);
        }
    }

    pub fn on_channel_message(&mut self, text: &str, port: &mut dyn RenderPort) -> Routed {
        match self.connection.on_message(text) {
            Some(frame) => MessageRouter::dispatch(&mut self.state, frame, port),
            None => Routed::Ignored,
        }
    }

    /// A keystroke: the surface now holds `content` with the caret at `caret`.
    pub fn on_local_input(
        &mut self,
        now: Duration,
        content: &str,
        caret: usize,
        port: &mut dyn RenderPort,
    ) {
        if content == self.state.document.content() {
            self.on_local_cursor(caret, port);
            return;
        }
        self.state.document.replace(content);
        self.scheduler.on_local_edit(
            now,
            &self.state.document,
            self.credentials.is_authenticated(),
        );
        self.connection.send(&ClientFrame::Update {
            content: content.to_owned(),
        });
        self.on_local_cursor(caret, port);
    }

    /// Caret moved by navigation or selection.
    pub fn on_local_cursor(&mut self, caret: usize, port: &mut dyn RenderPort) {
        let local_id = self.state.local_id.clone();
        let cursor_pos = self
            .state
            .cursors
            .set(&local_id, caret, self.state.document.len());
        self.connection.send(&ClientFrame::Cursor { cursor_pos });
        self.state.render_cursor(&local_id, port);
    }

    pub fn on_scroll(&mut self, scroll: ScrollOffset, port: &mut dyn RenderPort) {
        self.state.surface.scroll = scroll;
        self.state.render_cursors(None, port);
    }

    /// Fires every timer due at `now`.
    pub fn tick(&mut self, now: Duration) {
        self.connection.poll(now);
        if let Some(trigger) = self.scheduler.due(now, &self.state.document) {
            if let Some(request) = self.scheduler.prepare(
                trigger,
                &self.state.document,
                &self.state.session_code,
                self.credentials.token.as_deref(),
            ) {
                self.persistence.save(request);
            }
        }
    }

    /// Reports the outcome of a save issued through [`Persistence::save`].
    pub fn on_save_finished(
        &mut self,
        content: &str,
        outcome: Result<(), PersistenceError>,
        port: &mut dyn RenderPort,
    ) {
        let indicator = self
            .scheduler
            .finish(content, outcome, &mut self.state.document);
        if indicator == SaveIndicator::CredentialRejected {
            self.credentials.token = None;
        }
        port.show_save_indicator(indicator);
    }

    /// Best-effort flush while the page goes away.
    pub fn page_leave(&mut self) {
        if let Some(request) = self.scheduler.prepare(
            SaveTrigger::PageLeave,
            &self.state.document,
            &self.state.session_code,
            self.credentials.token.as_deref(),
        ) {
            self.persistence.beacon(request);
        }
    }

    pub fn close(&mut self) {
        self.connection.close();
    }

    /// The earliest instant at which [`Self::tick`] has work to do.
    pub fn next_deadline(&self) -> Duration {
        let save = self.scheduler.next_deadline();
        match self.connection.next_deadline() {
            Some(reconnect) => reconnect.min(save),
            None => save,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.state.local_id
    }

    pub fn session_code(&self) -> &str {
        &self.state.session_code
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.state.presence
    }

    pub fn cursor_of(&self, id: &str) -> Option<usize> {
        self.state.cursors.offset_of(id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn channel(&self) -> &C {
        self.connection.channel()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }
}
