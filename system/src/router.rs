use crate::message::ServerFrame;
use crate::session_state::SessionState;
use crate::traits::RenderPort;

/// What a routed frame did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Initialized,
    ContentReplaced,
    CursorMoved,
    Joined,
    Left,
    Ignored,
}

/// Applies inbound frames to the session state.
pub struct MessageRouter;

impl MessageRouter {
    pub fn dispatch(
        state: &mut SessionState,
        frame: ServerFrame,
        port: &mut dyn RenderPort,
    ) -> Routed {
        match frame {
            ServerFrame::Init {
                content,
                user_id,
                color,
            } => {
                if user_id != state.local_id {
                    log::info!("Relay assigned id {} (was {})", user_id, state.local_id);
                    state.local_id = user_id.clone();
                }
                state.document.load(content);
                state.presence.insert_local(&user_id, color, port);
                state.cursors.set(&user_id, 0, state.document.len());
                port.apply_remote_content(state.document.content(), 0);
                state.render_cursor(&user_id, port);
                Routed::Initialized
            }
            ServerFrame::Update { user_id, content } => {
                if user_id == state.local_id {
                    return Routed::Ignored;
                }
                let old_len = state.document.len();
                state.document.replace(content);
                let new_len = state.document.len();
                state.cursors.reconcile_remote_edit(&user_id, old_len, new_len);
                port.apply_remote_content(state.document.content(), state.local_cursor());
                state.render_cursors(Some(&user_id), port);
                Routed::ContentReplaced
            }
            ServerFrame::Cursor {
                user_id,
                cursor_pos,
                ..
            } => {
                if user_id == state.local_id {
                    return Routed::Ignored;
                }
                if !state.presence.contains(&user_id) {
                    log::debug!("Dropping cursor of unknown participant {}", user_id);
                    return Routed::Ignored;
                }
                state
                    .cursors
                    .set(&user_id, cursor_pos, state.document.len());
                state.render_cursor(&user_id, port);
                Routed::CursorMoved
            }
            ServerFrame::UserJoined { user_id, color } => {
                if user_id == state.local_id || !state.presence.add(&user_id, color, port) {
                    return Routed::Ignored;
                }
                log::info!("{} joined", user_id);
                Routed::Joined
            }
            ServerFrame::UserLeft { user_id } => {
                state.cursors.remove(&user_id);
                if state.presence.remove(&user_id, port) {
                    log::info!("{} left", user_id);
                    Routed::Left
                } else {
                    Routed::Ignored
                }
            }
            ServerFrame::Unknown => {
                log::debug!("Ignoring frame of unknown type");
                Routed::Ignored
            }
        }
    }
}
