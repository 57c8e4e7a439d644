use crate::server_state::ConnectionId;
use system::{Color, ParticipantId, SessionCode};

/// Colors handed out in join order, cycling.
pub const PALETTE: [Color; 6] = [
    Color { r: 0xFF, g: 0x6B, b: 0x6B },
    Color { r: 0x4E, g: 0xCD, b: 0xC4 },
    Color { r: 0x45, g: 0xB7, b: 0xD1 },
    Color { r: 0x96, g: 0xCE, b: 0xB4 },
    Color { r: 0xDD, g: 0xA0, b: 0xDD },
    Color { r: 0xF4, g: 0xA4, b: 0x60 },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub user_id: ParticipantId,
    pub color: Color,
}

#[derive(Debug)]
pub struct Session {
    pub session_code: SessionCode,
    pub content: String,
    pub participants: Vec<Participant>,
    /// Bumped on every update; a delayed save only runs if nothing newer arrived.
    pub save_generation: u64,
    pub dirty: bool,
    color_index: usize,
}

impl Session {
    pub fn new(session_code: SessionCode, content: String) -> Self {
        Self {
            session_code,
            content,
            participants: Vec::new(),
            save_generation: 0,
            dirty: false,
            color_index: 0,
        }
    }

    pub fn next_color(&mut self) -> Color {
        let color = PALETTE[self.color_index % PALETTE.len()];
        self.color_index += 1;
        color
    }

    pub fn participant(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.participants.iter().map(|p| p.connection_id)
    }
}
