use crate::message::Color;
use crate::traits::RenderPort;
use crate::types::ParticipantId;
use std::collections::BTreeMap;

/// Who is connected to the session and how they are drawn.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    local_id: Option<ParticipantId>,
    participants: BTreeMap<ParticipantId, Color>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant and renders its badge. No-op when already present.
    pub fn add(&mut self, id: &str, color: Color, port: &mut dyn RenderPort) -> bool {
        if self.participants.contains_key(id) {
            return false;
        }
        self.participants.insert(id.to_owned(), color);
        port.render_presence(id, &color, self.is_local(id));
        true
    }

    /// Creates or overwrites the entry of the local participant.
    pub fn insert_local(&mut self, id: &str, color: Color, port: &mut dyn RenderPort) {
        self.local_id = Some(id.to_owned());
        self.participants.insert(id.to_owned(), color);
        port.render_presence(id, &color, true);
    }

    pub fn remove(&mut self, id: &str, port: &mut dyn RenderPort) -> bool {
        if self.participants.remove(id).is_some() {
            port.remove_presence(id);
            true
        } else {
            false
        }
    }

    /// Drops everyone, the local participant included; the relay re-announces them after a
    /// reconnect.
    pub fn clear(&mut self, port: &mut dyn RenderPort) {
        for id in std::mem::take(&mut self.participants).keys() {
            port.remove_presence(id);
        }
    }

    pub fn color_of(&self, id: &str) -> Option<&Color> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Color)> {
        self.participants.iter().map(|(id, color)| (id.as_str(), color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ConnectionStatus, SaveIndicator};
    use euclid::default::Point2D;

    #[derive(Default)]
    struct Badges {
        rendered: Vec<(String, bool)>,
        removed: Vec<String>,
    }

    impl RenderPort for Badges {
        fn render_presence(&mut self, participant_id: &str, _color: &Color, is_local: bool) {
            self.rendered.push((participant_id.to_owned(), is_local));
        }
        fn remove_presence(&mut self, participant_id: &str) {
            self.removed.push(participant_id.to_owned());
        }
        fn render_cursor(&mut self, _: &str, _: &Color, _: usize, _: Point2D<f32>) {}
        fn show_save_indicator(&mut self, _: SaveIndicator) {}
        fn show_connection_status(&mut self, _: ConnectionStatus) {}
        fn apply_remote_content(&mut self, _: &str, _: usize) {}
    }

    fn red() -> Color {
        Color { r: 255, g: 0, b: 0 }
    }

    #[test]
    fn add_is_idempotent() {
        let mut port = Badges::default();
        let mut presence = PresenceRegistry::new();

        assert!(presence.add("u2", red(), &mut port));
        assert!(!presence.add("u2", Color::default(), &mut port));

        assert_eq!(presence.len(), 1);
        assert_eq!(presence.color_of("u2"), Some(&red()));
        assert_eq!(port.rendered, vec![("u2".to_owned(), false)]);
    }

    #[test]
    fn remove_of_absent_id_is_noop() {
        let mut port = Badges::default();
        let mut presence = PresenceRegistry::new();
        presence.add("u2", red(), &mut port);

        assert!(presence.remove("u2", &mut port));
        assert!(!presence.remove("u2", &mut port));
        assert!(!presence.remove("nobody", &mut port));

        assert!(presence.is_empty());
        assert_eq!(port.removed, vec!["u2".to_owned()]);
    }

    #[test]
    fn local_entry_is_overwritten_and_flagged() {
        let mut port = Badges::default();
        let mut presence = PresenceRegistry::new();

        presence.insert_local("me", Color::default(), &mut port);
        presence.insert_local("me", red(), &mut port);
        presence.add("me", Color::default(), &mut port);

        assert_eq!(presence.color_of("me"), Some(&red()));
        assert!(presence.is_local("me"));
        assert_eq!(
            port.rendered,
            vec![("me".to_owned(), true), ("me".to_owned(), true)]
        );
    }

    #[test]
    fn clear_removes_every_indicator() {
        let mut port = Badges::default();
        let mut presence = PresenceRegistry::new();
        presence.insert_local("me", red(), &mut port);
        presence.add("u2", red(), &mut port);

        presence.clear(&mut port);

        assert!(presence.is_empty());
        assert_eq!(port.removed, vec!["me".to_owned(), "u2".to_owned()]);
    }
}
