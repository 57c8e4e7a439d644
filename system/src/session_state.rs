use crate::cursor::CursorReconciler;
use crate::document::Document;
use crate::layout::{Surface, SurfaceLayout};
use crate::presence::PresenceRegistry;
use crate::traits::RenderPort;
use crate::types::{ParticipantId, SessionCode};

/// Everything one client knows about its session. Only mutated from the event context of
/// the owning [`crate::CollabSession`].
#[derive(Debug)]
pub struct SessionState {
    pub session_code: SessionCode,
    pub local_id: ParticipantId,
    pub document: Document,
    pub presence: PresenceRegistry,
    pub cursors: CursorReconciler,
    pub surface: Surface,
}

impl SessionState {
    pub fn new(session_code: SessionCode, local_id: ParticipantId, layout: SurfaceLayout) -> Self {
        Self {
            session_code,
            local_id,
            document: Document::new(),
            presence: PresenceRegistry::new(),
            cursors: CursorReconciler::new(),
            surface: Surface::new(layout),
        }
    }

    pub fn local_cursor(&self) -> usize {
        self.cursors.offset_of(&self.local_id).unwrap_or(0)
    }

    pub fn render_cursor(&self, id: &str, port: &mut dyn RenderPort) -> bool {
        self.cursors.render(
            id,
            self.document.content(),
            &self.surface,
            &self.presence,
            port,
        )
    }

    pub fn render_cursors(&self, skip: Option<&str>, port: &mut dyn RenderPort) {
        self.cursors.render_all(
            skip,
            self.document.content(),
            &self.surface,
            &self.presence,
            port,
        )
    }

    /// Forgets every participant after the channel dropped.
    pub fn reset_presence(&mut self, port: &mut dyn RenderPort) {
        self.presence.clear(port);
        self.cursors.clear();
    }
}
