mod effects;
mod offsets;
mod utils;

pub use effects::{Effect, EffectQueue, JsChannel, JsPersistence, JsSurface};

use std::time::Duration;
use system::{
    new_participant_id, serde_json, CollabSession, ConfigError, ConnectionState,
    PersistenceError, ParticipantId, Routed, ScrollOffset, SyncConfig,
};
use wasm_bindgen::prelude::*;

fn millis(ms: f64) -> Duration {
    Duration::from_millis(ms.max(0.0) as u64)
}

/// Browser handle of one collaborative editing session.
///
/// JavaScript owns the socket, the HTTP calls, the timers and the DOM. It reports events
/// through the methods below and after each call performs whatever `consume_effects`
/// returns. Carets and cursor offsets on this side are UTF-16 code units, as the DOM
/// reports them.
#[wasm_bindgen]
pub struct CollabEditor {
    session: CollabSession<JsChannel, JsPersistence>,
    surface: JsSurface,
    effects: EffectQueue,
}

impl CollabEditor {
    pub fn from_config(
        config: SyncConfig,
        participant_id: ParticipantId,
        now: Duration,
    ) -> Result<Self, ConfigError> {
        let effects = EffectQueue::default();
        let session = CollabSession::new(
            config,
            participant_id,
            JsChannel::new(effects.clone()),
            JsPersistence::new(effects.clone()),
            now,
        )?;
        Ok(Self {
            session,
            surface: JsSurface::new(effects.clone()),
            effects,
        })
    }

    /// Pending effects with their offsets converted to UTF-16.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        let document = self.session.document().content();
        self.effects
            .drain()
            .into_iter()
            .map(|effect| match effect {
                Effect::ApplyRemoteContent { content, caret } => {
                    let caret = offsets::utf16_offset(&content, caret);
                    Effect::ApplyRemoteContent { content, caret }
                }
                Effect::RenderCursor {
                    user_id,
                    color,
                    offset,
                    x,
                    y,
                } => Effect::RenderCursor {
                    user_id,
                    color,
                    offset: offsets::utf16_offset(document, offset),
                    x,
                    y,
                },
                effect => effect,
            })
            .collect()
    }
}

#[wasm_bindgen]
impl CollabEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, now_ms: f64) -> Result<CollabEditor, JsValue> {
        utils::set_panic_hook();
        utils::init_logging();

        let config =
            SyncConfig::from_json(config_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Self::from_config(config, new_participant_id(), millis(now_ms))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn participant_id(&self) -> String {
        self.session.local_id().to_owned()
    }

    pub fn is_connected(&self) -> bool {
        self.session.connection_state() == ConnectionState::Open
    }

    pub fn is_dirty(&self) -> bool {
        self.session.document().is_dirty()
    }

    pub fn content(&self) -> String {
        self.session.document().content().to_owned()
    }

    pub fn connect(&mut self) {
        self.session.start();
    }

    pub fn channel_opened(&mut self) {
        self.session.on_channel_open(&mut self.surface);
    }

    pub fn channel_closed(&mut self, now_ms: f64) {
        self.session.on_channel_closed(millis(now_ms), &mut self.surface);
    }

    /// Returns whether the frame changed anything.
    pub fn channel_message(&mut self, text: &str) -> bool {
        self.session.on_channel_message(text, &mut self.surface) != Routed::Ignored
    }

    pub fn local_input(&mut self, now_ms: f64, content: &str, caret: usize) {
        let caret = offsets::char_offset(content, caret);
        self.session
            .on_local_input(millis(now_ms), content, caret, &mut self.surface);
    }

    pub fn local_cursor(&mut self, caret: usize) {
        let caret = offsets::char_offset(self.session.document().content(), caret);
        self.session.on_local_cursor(caret, &mut self.surface);
    }

    pub fn scroll(&mut self, x: f32, y: f32) {
        self.session
            .on_scroll(ScrollOffset::new(x, y), &mut self.surface);
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.session.tick(millis(now_ms));
    }

    /// `status` is the HTTP status of the save response, or 0 when the request failed
    /// without one.
    pub fn save_finished(&mut self, content: &str, status: u16, message: &str) {
        let outcome = if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(PersistenceError::from_status(status, message))
        };
        self.session
            .on_save_finished(content, outcome, &mut self.surface);
    }

    pub fn page_leave(&mut self) {
        self.session.page_leave();
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn next_deadline_ms(&self) -> f64 {
        self.session.next_deadline().as_millis() as f64
    }

    // NOTE: effects cross the boundary as one JSON array so JS never has to free Rust objects.
    pub fn consume_effects(&mut self) -> String {
        let effects = self.drain_effects();
        match serde_json::to_string(&effects) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Could not encode {} effect(s): {}", effects.len(), err);
                "[]".to_owned()
            }
        }
    }
}
