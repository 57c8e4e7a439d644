use crate::session::{Participant, Session};
use std::collections::HashMap;
use std::num::Wrapping;
use system::{ClientFrame, ParticipantId, ServerFrame, SessionCode};
use thiserror::Error;

pub type ConnectionId = u32;

/// A frame addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub to: ConnectionId,
    pub frame: ServerFrame,
}

#[derive(Debug)]
pub struct Relayed {
    pub session_code: SessionCode,
    pub outgoing: Vec<Outgoing>,
    pub content_changed: bool,
}

#[derive(Debug)]
pub struct Departure {
    pub session_code: SessionCode,
    pub outgoing: Vec<Outgoing>,
    /// The session, when its last participant just left.
    pub evicted: Option<Session>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("session {0} is not loaded")]
    InvalidSession(SessionCode),
    #[error("connection {0} is not in any session")]
    InvalidConnection(ConnectionId),
}

/// Sessions held in memory and which connection sits in which session.
pub struct ServerState {
    connection_id_source: Wrapping<ConnectionId>,
    pub connection_locations: HashMap<ConnectionId, SessionCode>,
    pub sessions: HashMap<SessionCode, Session>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            connection_locations: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn has_session(&self, session_code: &str) -> bool {
        self.sessions.contains_key(session_code)
    }

    /// Makes a session live with its stored content. No-op if it already is.
    pub fn open_session(&mut self, session_code: &str, content: String) {
        if !self.has_session(session_code) {
            log::info!("Session {} opened", session_code);
            self.sessions.insert(
                session_code.to_owned(),
                Session::new(session_code.to_owned(), content),
            );
        }
    }

    /// Adds a participant. The newcomer gets `init` and then one `userJoined` per participant
    /// already there; everybody else gets `userJoined` for the newcomer.
    pub fn join_session(
        &mut self,
        session_code: &str,
        user_id: ParticipantId,
    ) -> Result<(ConnectionId, Vec<Outgoing>), ServerError> {
        let connection_id = self.new_connection_id();
        let session = self
            .sessions
            .get_mut(session_code)
            .ok_or_else(|| ServerError::InvalidSession(session_code.to_owned()))?;
        let color = session.next_color();

        let mut outgoing = vec![Outgoing {
            to: connection_id,
            frame: ServerFrame::Init {
                content: session.content.clone(),
                user_id: user_id.clone(),
                color,
            },
        }];
        for existing in &session.participants {
            outgoing.push(Outgoing {
                to: connection_id,
                frame: ServerFrame::UserJoined {
                    user_id: existing.user_id.clone(),
                    color: existing.color,
                },
            });
        }
        for existing in &session.participants {
            outgoing.push(Outgoing {
                to: existing.connection_id,
                frame: ServerFrame::UserJoined {
                    user_id: user_id.clone(),
                    color,
                },
            });
        }

        log::info!(
            "Connection {} joined session {} as {}",
            connection_id,
            session_code,
            user_id
        );
        session.participants.push(Participant {
            connection_id,
            user_id,
            color,
        });
        self.connection_locations
            .insert(connection_id, session_code.to_owned());
        Ok((connection_id, outgoing))
    }

    /// Stamps a client frame with its sender and addresses it to every participant of the
    /// session, the sender included.
    pub fn relay(&mut self, from: ConnectionId, frame: ClientFrame) -> Result<Relayed, ServerError> {
        let session_code = self
            .connection_locations
            .get(&from)
            .ok_or(ServerError::InvalidConnection(from))?;
        let session = self
            .sessions
            .get_mut(session_code)
            .ok_or_else(|| ServerError::InvalidSession(session_code.clone()))?;
        let sender = session
            .participant(from)
            .cloned()
            .ok_or(ServerError::InvalidConnection(from))?;

        let (frame, content_changed) = match frame {
            ClientFrame::Update { content } => {
                session.content = content.clone();
                session.dirty = true;
                session.save_generation += 1;
                (
                    ServerFrame::Update {
                        user_id: sender.user_id,
                        content,
                    },
                    true,
                )
            }
            ClientFrame::Cursor { cursor_pos } => (
                ServerFrame::Cursor {
                    user_id: sender.user_id,
                    cursor_pos,
                    color: sender.color,
                },
                false,
            ),
        };
        let outgoing = session
            .connection_ids()
            .map(|to| Outgoing {
                to,
                frame: frame.clone(),
            })
            .collect();
        Ok(Relayed {
            session_code: session_code.clone(),
            outgoing,
            content_changed,
        })
    }

    /// Removes a connection and tells the others. A session left empty is evicted.
    pub fn leave_session(&mut self, connection_id: ConnectionId) -> Result<Departure, ServerError> {
        let session_code = self
            .connection_locations
            .remove(&connection_id)
            .ok_or(ServerError::InvalidConnection(connection_id))?;
        let session = self
            .sessions
            .get_mut(&session_code)
            .ok_or_else(|| ServerError::InvalidSession(session_code.clone()))?;

        let mut outgoing = Vec::new();
        if let Some(index) = session
            .participants
            .iter()
            .position(|p| p.connection_id == connection_id)
        {
            let left = session.participants.remove(index);
            log::info!("{} left session {}", left.user_id, session_code);
            outgoing = session
                .connection_ids()
                .map(|to| Outgoing {
                    to,
                    frame: ServerFrame::UserLeft {
                        user_id: left.user_id.clone(),
                    },
                })
                .collect();
        }

        let evicted = if session.participants.is_empty() {
            log::info!("Session {} closed", session_code);
            self.sessions.remove(&session_code)
        } else {
            None
        };
        Ok(Departure {
            session_code,
            outgoing,
            evicted,
        })
    }

    pub fn session(&self, session_code: &str) -> Option<&Session> {
        self.sessions.get(session_code)
    }

    pub fn session_mut(&mut self, session_code: &str) -> Option<&mut Session> {
        self.sessions.get_mut(session_code)
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_joined(to: ConnectionId, user_id: &str, color: &str) -> Outgoing {
        Outgoing {
            to,
            frame: ServerFrame::UserJoined {
                user_id: user_id.into(),
                color: color.parse().expect("color"),
            },
        }
    }

    fn state_with_two() -> (ServerState, ConnectionId, ConnectionId) {
        let mut state = ServerState::new();
        state.open_session("abc", "stored".into());
        let (first, _) = state.join_session("abc", "u1".into()).expect("join");
        let (second, _) = state.join_session("abc", "u2".into()).expect("join");
        (state, first, second)
    }

    #[test]
    fn newcomer_gets_init_then_existing_participants() {
        let mut state = ServerState::new();
        state.open_session("abc", "stored".into());
        let (first, outgoing) = state.join_session("abc", "u1".into()).expect("join");
        assert_eq!(outgoing.len(), 1);

        let (second, outgoing) = state.join_session("abc", "u2".into()).expect("join");
        assert_eq!(
            outgoing,
            vec![
                Outgoing {
                    to: second,
                    frame: ServerFrame::Init {
                        content: "stored".into(),
                        user_id: "u2".into(),
                        color: "#4ECDC4".parse().expect("color"),
                    },
                },
                user_joined(second, "u1", "#FF6B6B"),
                user_joined(first, "u2", "#4ECDC4"),
            ]
        );
    }

    #[test]
    fn it_should_not_join_unloaded_session() {
        let mut state = ServerState::new();
        assert_eq!(
            state.join_session("nope", "u1".into()).map(|(id, _)| id),
            Err(ServerError::InvalidSession("nope".into()))
        );
    }

    #[test]
    fn update_is_stamped_and_sent_to_everyone() {
        let (mut state, first, second) = state_with_two();

        let relayed = state
            .relay(
                first,
                ClientFrame::Update {
                    content: "edited".into(),
                },
            )
            .expect("relay");

        assert!(relayed.content_changed);
        let expected = ServerFrame::Update {
            user_id: "u1".into(),
            content: "edited".into(),
        };
        assert_eq!(
            relayed.outgoing,
            vec![
                Outgoing {
                    to: first,
                    frame: expected.clone()
                },
                Outgoing {
                    to: second,
                    frame: expected
                },
            ]
        );
        let session = state.session("abc").expect("live");
        assert_eq!(session.content, "edited");
        assert_eq!(session.save_generation, 1);
        assert!(session.dirty);
    }

    #[test]
    fn cursor_carries_sender_color() {
        let (mut state, _, second) = state_with_two();
        let relayed = state
            .relay(second, ClientFrame::Cursor { cursor_pos: 3 })
            .expect("relay");

        assert!(!relayed.content_changed);
        assert_eq!(
            relayed.outgoing[0].frame,
            ServerFrame::Cursor {
                user_id: "u2".into(),
                cursor_pos: 3,
                color: "#4ECDC4".parse().expect("color"),
            }
        );
    }

    #[test]
    fn it_should_announce_departure_and_evict_empty_session() {
        let (mut state, first, second) = state_with_two();

        let departure = state.leave_session(first).expect("leave");
        assert_eq!(
            departure.outgoing,
            vec![Outgoing {
                to: second,
                frame: ServerFrame::UserLeft {
                    user_id: "u1".into()
                },
            }]
        );
        assert!(departure.evicted.is_none());

        let departure = state.leave_session(second).expect("leave");
        assert!(departure.outgoing.is_empty());
        assert_eq!(
            departure.evicted.map(|session| session.content),
            Some("stored".to_owned())
        );
        assert!(state.sessions.is_empty());
        assert_eq!(
            state.leave_session(second).map(|d| d.session_code),
            Err(ServerError::InvalidConnection(second))
        );
    }
}
