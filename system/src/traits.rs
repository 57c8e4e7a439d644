use crate::message::Color;
use crate::persistence::SaveRequest;
use euclid::default::Point2D;
use serde::Serialize;

/// The persistent bidirectional channel to the relay. Every call returns immediately; the
/// host reports the outcome through the session's `on_channel_*` entry points.
pub trait Channel {
    fn open(&mut self, url: &str);
    fn send(&mut self, text: String);
    fn close(&mut self);
}

/// Durable storage of the document content.
pub trait Persistence {
    /// Starts a save; the host reports back through `CollabSession::on_save_finished`.
    /// Until it does, the same content is not saved again for `saveTimeoutMs`.
    fn save(&mut self, request: SaveRequest);
    /// Fire-and-forget save used while the page is being torn down. Never reported back.
    fn beacon(&mut self, request: SaveRequest);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveIndicator {
    Saved,
    Failed,
    /// The credential was rejected; the account layer should drop it and ask to sign in.
    CredentialRejected,
}

/// What the engine asks of the editing surface.
pub trait RenderPort {
    fn render_presence(&mut self, participant_id: &str, color: &Color, is_local: bool);
    /// Drops every visual indicator of the participant: badge and floating cursor.
    fn remove_presence(&mut self, participant_id: &str);
    fn render_cursor(&mut self, participant_id: &str, color: &Color, offset: usize, at: Point2D<f32>);
    fn show_save_indicator(&mut self, indicator: SaveIndicator);
    fn show_connection_status(&mut self, status: ConnectionStatus);
    /// Puts remote content on the surface and moves the local caret to `caret`.
    fn apply_remote_content(&mut self, content: &str, caret: usize);
}
