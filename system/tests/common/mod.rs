#![allow(dead_code)]

use std::time::Duration;
use system::euclid::default::Point2D;
use system::{
    new_participant_id, Channel, CollabSession, Color, ConnectionStatus, Persistence,
    RenderPort, SaveIndicator, SaveRequest, SyncConfig,
};

#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub opened: Vec<String>,
    pub sent: Vec<String>,
    pub closed: usize,
}

impl Channel for RecordingChannel {
    fn open(&mut self, url: &str) {
        self.opened.push(url.to_owned());
    }

    fn send(&mut self, text: String) {
        self.sent.push(text);
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingPersistence {
    pub saves: Vec<SaveRequest>,
    pub beacons: Vec<SaveRequest>,
}

impl Persistence for RecordingPersistence {
    fn save(&mut self, request: SaveRequest) {
        self.saves.push(request);
    }

    fn beacon(&mut self, request: SaveRequest) {
        self.beacons.push(request);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Presence(String, bool),
    PresenceRemoved(String),
    Cursor(String, usize, Point2D<f32>),
    SaveIndicator(SaveIndicator),
    Status(ConnectionStatus),
    Content(String, usize),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub rendered: Vec<Rendered>,
}

impl RecordingSurface {
    pub fn cursors_of(&self, id: &str) -> Vec<usize> {
        self.rendered
            .iter()
            .filter_map(|rendered| match rendered {
                Rendered::Cursor(who, offset, _) if who == id => Some(*offset),
                _ => None,
            })
            .collect()
    }

    pub fn last_content(&self) -> Option<(&str, usize)> {
        self.rendered.iter().rev().find_map(|rendered| match rendered {
            Rendered::Content(content, caret) => Some((content.as_str(), *caret)),
            _ => None,
        })
    }
}

impl RenderPort for RecordingSurface {
    fn render_presence(&mut self, participant_id: &str, _color: &Color, is_local: bool) {
        self.rendered
            .push(Rendered::Presence(participant_id.to_owned(), is_local));
    }

    fn remove_presence(&mut self, participant_id: &str) {
        self.rendered
            .push(Rendered::PresenceRemoved(participant_id.to_owned()));
    }

    fn render_cursor(&mut self, participant_id: &str, _color: &Color, offset: usize, at: Point2D<f32>) {
        self.rendered
            .push(Rendered::Cursor(participant_id.to_owned(), offset, at));
    }

    fn show_save_indicator(&mut self, indicator: SaveIndicator) {
        self.rendered.push(Rendered::SaveIndicator(indicator));
    }

    fn show_connection_status(&mut self, status: ConnectionStatus) {
        self.rendered.push(Rendered::Status(status));
    }

    fn apply_remote_content(&mut self, content: &str, caret: usize) {
        self.rendered
            .push(Rendered::Content(content.to_owned(), caret));
    }
}

pub type TestSession = CollabSession<RecordingChannel, RecordingPersistence>;

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn config(token: Option<&str>) -> SyncConfig {
    let mut config = SyncConfig::new("ws://localhost:8080", "abc");
    config.credentials.token = token.map(str::to_owned);
    config
}

pub fn session_as(id: &str, token: Option<&str>) -> TestSession {
    CollabSession::new(
        config(token),
        id.to_owned(),
        RecordingChannel::default(),
        RecordingPersistence::default(),
        Duration::ZERO,
    )
    .expect("valid config")
}

/// A session that is connected and has received `init` for `content`.
pub fn joined(id: &str, content: &str, surface: &mut RecordingSurface) -> TestSession {
    let mut session = session_as(id, None);
    session.start();
    session.on_channel_open(surface);
    session.on_channel_message(
        &format!(
            r##"{{"type":"init","content":{},"userId":"{}","color":"#ffffff"}}"##,
            system::serde_json::to_string(content).expect("string"),
            id
        ),
        surface,
    );
    session
}

pub fn anonymous() -> TestSession {
    session_as(&new_participant_id(), None)
}
