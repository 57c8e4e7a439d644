use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use system::euclid::default::Point2D;
use system::{
    Channel, Color, ConnectionStatus, Persistence, RenderPort, SaveIndicator, SaveRequest,
};

/// Something JavaScript has to do on behalf of the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    OpenChannel {
        url: String,
    },
    Send {
        text: String,
    },
    CloseChannel,
    Save(SaveRequest),
    Beacon(SaveRequest),
    ConnectionStatus {
        status: ConnectionStatus,
    },
    #[serde(rename_all = "camelCase")]
    RenderPresence {
        user_id: String,
        color: Color,
        is_local: bool,
    },
    #[serde(rename_all = "camelCase")]
    RemovePresence {
        user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    RenderCursor {
        user_id: String,
        color: Color,
        offset: usize,
        x: f32,
        y: f32,
    },
    ApplyRemoteContent {
        content: String,
        caret: usize,
    },
    SaveIndicator {
        indicator: SaveIndicator,
    },
}

/// Effects accumulated between two `consume_effects` calls.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue(Rc<RefCell<VecDeque<Effect>>>);

impl EffectQueue {
    pub fn push(&self, effect: Effect) {
        self.0.borrow_mut().push_back(effect);
    }

    pub fn drain(&self) -> Vec<Effect> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

pub struct JsChannel {
    effects: EffectQueue,
}

impl JsChannel {
    pub fn new(effects: EffectQueue) -> Self {
        Self { effects }
    }
}

impl Channel for JsChannel {
    fn open(&mut self, url: &str) {
        self.effects.push(Effect::OpenChannel {
            url: url.to_owned(),
        });
    }

    fn send(&mut self, text: String) {
        self.effects.push(Effect::Send { text });
    }

    fn close(&mut self) {
        self.effects.push(Effect::CloseChannel);
    }
}

pub struct JsPersistence {
    effects: EffectQueue,
}

impl JsPersistence {
    pub fn new(effects: EffectQueue) -> Self {
        Self { effects }
    }
}

impl Persistence for JsPersistence {
    fn save(&mut self, request: SaveRequest) {
        self.effects.push(Effect::Save(request));
    }

    fn beacon(&mut self, request: SaveRequest) {
        self.effects.push(Effect::Beacon(request));
    }
}

pub struct JsSurface {
    effects: EffectQueue,
}

impl JsSurface {
    pub fn new(effects: EffectQueue) -> Self {
        Self { effects }
    }
}

impl RenderPort for JsSurface {
    fn render_presence(&mut self, participant_id: &str, color: &Color, is_local: bool) {
        self.effects.push(Effect::RenderPresence {
            user_id: participant_id.to_owned(),
            color: *color,
            is_local,
        });
    }

    fn remove_presence(&mut self, participant_id: &str) {
        self.effects.push(Effect::RemovePresence {
            user_id: participant_id.to_owned(),
        });
    }

    fn render_cursor(&mut self, participant_id: &str, color: &Color, offset: usize, at: Point2D<f32>) {
        self.effects.push(Effect::RenderCursor {
            user_id: participant_id.to_owned(),
            color: *color,
            offset,
            x: at.x,
            y: at.y,
        });
    }

    fn show_save_indicator(&mut self, indicator: SaveIndicator) {
        self.effects.push(Effect::SaveIndicator { indicator });
    }

    fn show_connection_status(&mut self, status: ConnectionStatus) {
        self.effects.push(Effect::ConnectionStatus { status });
    }

    fn apply_remote_content(&mut self, content: &str, caret: usize) {
        self.effects.push(Effect::ApplyRemoteContent {
            content: content.to_owned(),
            caret,
        });
    }
}
