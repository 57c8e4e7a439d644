//! Cursor offsets of every participant and their placement on the surface.
//!
//! A remote edit is only known as "content before" and "content after". The edit is assumed
//! to be one contiguous insertion or deletion at the editor's last known cursor, so:
//!
//! ```text
//! pos' = pos                  if change_pos >= pos
//! pos' = max(0, pos + delta)  if change_pos <  pos
//! ```
//!
//! This is exact for a single edit at that anchor and drifts otherwise (paste elsewhere,
//! programmatic replace, interleaved edits from several peers). There is no ordering
//! metadata to do better.

use crate::layout::Surface;
use crate::presence::PresenceRegistry;
use crate::traits::RenderPort;
use crate::types::ParticipantId;
use std::collections::BTreeMap;

/// Where a cursor at `pos` ends up after an edit of `delta` chars anchored at `change_pos`.
pub fn reconcile_offset(pos: usize, change_pos: usize, delta: isize) -> usize {
    if change_pos >= pos {
        pos
    } else {
        pos.saturating_add_signed(delta)
    }
}

#[derive(Debug, Default)]
pub struct CursorReconciler {
    offsets: BTreeMap<ParticipantId, usize>,
}

impl CursorReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an offset, clamped to `content_len`, and returns what was stored.
    pub fn set(&mut self, id: &str, offset: usize, content_len: usize) -> usize {
        let offset = offset.min(content_len);
        self.offsets.insert(id.to_owned(), offset);
        offset
    }

    pub fn offset_of(&self, id: &str) -> Option<usize> {
        self.offsets.get(id).copied()
    }

    pub fn remove(&mut self, id: &str) -> Option<usize> {
        self.offsets.remove(id)
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Moves every cursor except the editor's after the editor replaced content of
    /// `old_len` chars with content of `new_len` chars.
    pub fn reconcile_remote_edit(&mut self, editor: &str, old_len: usize, new_len: usize) {
        let change_pos = self.offset_of(editor).unwrap_or(0);
        let delta = new_len as isize - old_len as isize;
        for (id, pos) in self.offsets.iter_mut() {
            let reconciled = if id == editor {
                *pos
            } else {
                reconcile_offset(*pos, change_pos, delta)
            };
            *pos = reconciled.min(new_len);
        }
        log::debug!(
            "Reconciled {} cursor(s) after edit by {} at {} (delta {})",
            self.offsets.len().saturating_sub(1),
            editor,
            change_pos,
            delta
        );
    }

    /// Draws one cursor. Participants without a known color are not drawn.
    pub fn render(
        &self,
        id: &str,
        content: &str,
        surface: &Surface,
        presence: &PresenceRegistry,
        port: &mut dyn RenderPort,
    ) -> bool {
        match (self.offset_of(id), presence.color_of(id)) {
            (Some(offset), Some(color)) => {
                port.render_cursor(id, color, offset, surface.point_at(content, offset));
                true
            }
            _ => false,
        }
    }

    /// Redraws every tracked cursor, except `skip`.
    pub fn render_all(
        &self,
        skip: Option<&str>,
        content: &str,
        surface: &Surface,
        presence: &PresenceRegistry,
        port: &mut dyn RenderPort,
    ) {
        for id in self.offsets.keys() {
            if Some(id.as_str()) != skip {
                self.render(id, content, surface, presence, port);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_at_or_before_change_is_unaffected() {
        for pos in 0..20 {
            for change_pos in pos..25 {
                for delta in [-30, -1, 0, 1, 30] {
                    assert_eq!(reconcile_offset(pos, change_pos, delta), pos);
                }
            }
        }
    }

    #[test]
    fn cursor_after_change_shifts_and_never_goes_negative() {
        for pos in 1..20usize {
            for change_pos in 0..pos {
                for delta in [-30isize, -3, -1, 0, 1, 4] {
                    let expected = (pos as isize + delta).max(0) as usize;
                    assert_eq!(reconcile_offset(pos, change_pos, delta), expected);
                }
            }
        }
    }

    #[test]
    fn it_should_shift_cursor_after_an_insertion_before_it() {
        // "Hello World": A at 10, B at 3; B types "X" at 3.
        let mut cursors = CursorReconciler::new();
        cursors.set("a", 10, 11);
        cursors.set("b", 3, 11);

        cursors.reconcile_remote_edit("b", 11, 12);

        assert_eq!(cursors.offset_of("a"), Some(11));
        assert_eq!(cursors.offset_of("b"), Some(3));
    }

    #[test]
    fn it_should_clamp_to_new_length() {
        let mut cursors = CursorReconciler::new();
        cursors.set("a", 10, 10);
        cursors.set("b", 2, 10);

        // b deleted everything past offset 2
        cursors.reconcile_remote_edit("b", 10, 2);
        assert_eq!(cursors.offset_of("a"), Some(2));

        // unknown editor anchors at 0
        cursors.set("a", 2, 2);
        cursors.reconcile_remote_edit("ghost", 2, 0);
        assert_eq!(cursors.offset_of("a"), Some(0));
        assert_eq!(cursors.offset_of("b"), Some(0));
    }

    #[test]
    fn set_clamps_to_content_length() {
        let mut cursors = CursorReconciler::new();
        assert_eq!(cursors.set("a", 99, 4), 4);
        assert_eq!(cursors.offset_of("a"), Some(4));
    }
}
