use std::time::Duration;
use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::oneshot;

use system::{ClientFrame, ParticipantId, SessionCode};

use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage, Delivery};
use crate::document_file::{DocumentStore, StoreError};
use crate::server_state::{ConnectionId, Outgoing, ServerState};

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    /// Fired by the debounce timer of a session.
    SaveDue {
        session_code: SessionCode,
        generation: u64,
    },
    SaveDocument {
        session_code: SessionCode,
        content: String,
        tx: oneshot::Sender<Result<(), StoreError>>,
    },
}

pub type ServerTx = Sender<ServerCommand>;

struct Server {
    server_state: ServerState,
    connections: ConnectionTxStorage,
    store: DocumentStore,
    save_debounce: Duration,
    srv_tx: ServerTx,
    /// Connections found closed while delivering; unregistered once the command is done.
    departed: Vec<ConnectionId>,
}

impl Server {
    fn new(store: DocumentStore, save_debounce: Duration, srv_tx: ServerTx) -> Self {
        Self {
            server_state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
            store,
            save_debounce,
            srv_tx,
            departed: Vec::new(),
        }
    }

    async fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(ConnectionCommand::Connect {
                tx,
                session_code,
                user_id,
            }) => self.connect(tx, session_code, user_id).await,
            ServerCommand::Connection(ConnectionCommand::Frame { from, text }) => {
                self.relay(from, &text)
            }
            ServerCommand::Connection(ConnectionCommand::Disconnect { from }) => {
                self.disconnect(from).await
            }
            ServerCommand::SaveDue {
                session_code,
                generation,
            } => self.save_due(&session_code, generation).await,
            ServerCommand::SaveDocument {
                session_code,
                content,
                tx,
            } => {
                let result = self.store.write(&session_code, &content).await.map(|_| ());
                if tx.send(result).is_err() {
                    log::debug!("Save requester for {} went away", session_code);
                }
            }
        }

        while let Some(connection_id) = self.departed.pop() {
            self.disconnect(connection_id).await;
        }
    }

    async fn connect(&mut self, tx: ConnectionTx, session_code: SessionCode, user_id: ParticipantId) {
        if !self.server_state.has_session(&session_code) {
            let content = match self.store.read(&session_code).await {
                Ok(snapshot) => snapshot.map(|s| s.content).unwrap_or_default(),
                Err(err) => {
                    log::warn!("Failed to load session {}: {}", session_code, err);
                    String::new()
                }
            };
            self.server_state.open_session(&session_code, content);
        }

        match self.server_state.join_session(&session_code, user_id) {
            Ok((connection_id, outgoing)) => {
                self.connections.insert(connection_id, tx);
                let registered = self
                    .connections
                    .send(&connection_id, ConnectionEvent::Registered { connection_id });
                if registered == Delivery::Closed {
                    log::info!("Connection {} closed before registration", connection_id);
                    self.mark_departed(connection_id);
                    return;
                }
                self.deliver(outgoing);
            }
            Err(err) => log::warn!("Join failed: {}", err),
        }
    }

    fn relay(&mut self, from: ConnectionId, text: &str) {
        let frame = match ClientFrame::decode(text) {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("Skipping frame from connection {}: {}", from, err);
                return;
            }
        };
        match self.server_state.relay(from, frame) {
            Ok(relayed) => {
                self.deliver(relayed.outgoing);
                if relayed.content_changed {
                    self.schedule_save(relayed.session_code);
                }
            }
            Err(err) => log::warn!("Relay failed: {}", err),
        }
    }

    async fn disconnect(&mut self, connection_id: ConnectionId) {
        self.connections.remove(&connection_id);
        match self.server_state.leave_session(connection_id) {
            Ok(departure) => {
                self.deliver(departure.outgoing);
                if let Some(session) = departure.evicted {
                    if session.dirty {
                        self.write(&session.session_code, &session.content).await;
                    }
                }
            }
            Err(err) => log::debug!("Disconnect of {} skipped: {}", connection_id, err),
        }
    }

    fn mark_departed(&mut self, connection_id: ConnectionId) {
        if !self.departed.contains(&connection_id) {
            self.departed.push(connection_id);
        }
    }

    fn schedule_save(&self, session_code: SessionCode) {
        let generation = match self.server_state.session(&session_code) {
            Some(session) => session.save_generation,
            None => return,
        };
        let srv_tx = self.srv_tx.clone();
        let delay = self.save_debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if srv_tx
                .send(ServerCommand::SaveDue {
                    session_code,
                    generation,
                })
                .await
                .is_err()
            {
                log::debug!("Server stopped before a scheduled save");
            }
        });
    }

    async fn save_due(&mut self, session_code: &str, generation: u64) {
        let content = match self.server_state.session(session_code) {
            Some(session) if session.save_generation == generation && session.dirty => {
                session.content.clone()
            }
            _ => return,
        };
        if self.write(session_code, &content).await {
            if let Some(session) = self.server_state.session_mut(session_code) {
                if session.save_generation == generation {
                    session.dirty = false;
                }
            }
        }
    }

    async fn write(&self, session_code: &str, content: &str) -> bool {
        match self.store.write(session_code, content).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Failed to save document {}: {}", session_code, err);
                false
            }
        }
    }

    fn deliver(&mut self, outgoing: Vec<Outgoing>) {
        for Outgoing { to, frame } in outgoing {
            match frame.encode() {
                Ok(text) => {
                    if self.connections.send(&to, ConnectionEvent::Frame(text)) == Delivery::Closed
                    {
                        self.mark_departed(to);
                    }
                }
                Err(err) => log::warn!("Could not encode frame for {}: {}", to, err),
            }
        }
    }
}

pub fn spawn_server(store: DocumentStore, save_debounce: Duration) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(256);
    let mut server = Server::new(store, save_debounce, srv_tx.clone());

    tokio::spawn(async move {
        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command).await;
        }
    });

    srv_tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc::Receiver;

    async fn recv_frame(rx: &mut Receiver<ConnectionEvent>) -> String {
        match rx.recv().await {
            Some(ConnectionEvent::Frame(text)) => text,
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    async fn register(
        srv_tx: &ServerTx,
        user_id: &str,
    ) -> (ConnectionId, Receiver<ConnectionEvent>) {
        let (tx, mut rx) = channel(32);
        srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Connect {
                tx,
                session_code: "abc".into(),
                user_id: user_id.into(),
            }))
            .await
            .unwrap();
        match rx.recv().await {
            Some(ConnectionEvent::Registered { connection_id }) => (connection_id, rx),
            other => panic!("expected registration, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_should_relay_and_save_after_debounce() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        store.write("abc", "stored").await.unwrap();
        let srv_tx = spawn_server(store.clone(), Duration::from_millis(50));

        let (first, mut first_rx) = register(&srv_tx, "u1").await;
        assert_eq!(
            recv_frame(&mut first_rx).await,
            r##"{"type":"init","content":"stored","userId":"u1","color":"#FF6B6B"}"##
        );

        let (_, mut second_rx) = register(&srv_tx, "u2").await;
        assert!(recv_frame(&mut second_rx).await.contains(r#""type":"init""#));
        assert_eq!(
            recv_frame(&mut second_rx).await,
            r##"{"type":"userJoined","userId":"u1","color":"#FF6B6B"}"##
        );
        assert_eq!(
            recv_frame(&mut first_rx).await,
            r##"{"type":"userJoined","userId":"u2","color":"#4ECDC4"}"##
        );

        srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Frame {
                from: first,
                text: "garbage".into(),
            }))
            .await
            .unwrap();
        srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Frame {
                from: first,
                text: r#"{"type":"update","content":"edited"}"#.into(),
            }))
            .await
            .unwrap();
        let update = r#"{"type":"update","userId":"u1","content":"edited"}"#;
        assert_eq!(recv_frame(&mut first_rx).await, update);
        assert_eq!(recv_frame(&mut second_rx).await, update);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.read("abc").await.unwrap().unwrap().content, "edited");
    }

    #[tokio::test]
    async fn it_should_unregister_connection_closed_before_registration() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        let srv_tx = spawn_server(store, Duration::from_secs(5));

        let (tx, rx) = channel(32);
        drop(rx);
        srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Connect {
                tx,
                session_code: "abc".into(),
                user_id: "gone".into(),
            }))
            .await
            .unwrap();

        let (_, mut rx) = register(&srv_tx, "u2").await;
        assert_eq!(
            recv_frame(&mut rx).await,
            r##"{"type":"init","content":"","userId":"u2","color":"#FF6B6B"}"##
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn it_should_unregister_connection_whose_actor_went_away() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        let srv_tx = spawn_server(store, Duration::from_secs(5));

        let (_, mut first_rx) = register(&srv_tx, "u1").await;
        recv_frame(&mut first_rx).await;
        drop(first_rx);

        let (_, mut second_rx) = register(&srv_tx, "u2").await;
        recv_frame(&mut second_rx).await;
        assert_eq!(
            recv_frame(&mut second_rx).await,
            r##"{"type":"userJoined","userId":"u1","color":"#FF6B6B"}"##
        );
        assert_eq!(
            recv_frame(&mut second_rx).await,
            r#"{"type":"userLeft","userId":"u1"}"#
        );

        let (_, mut third_rx) = register(&srv_tx, "u3").await;
        recv_frame(&mut third_rx).await;
        assert_eq!(
            recv_frame(&mut third_rx).await,
            r##"{"type":"userJoined","userId":"u2","color":"#4ECDC4"}"##
        );
        assert!(third_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn it_should_announce_departure() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        let srv_tx = spawn_server(store, Duration::from_secs(5));

        let (first, mut first_rx) = register(&srv_tx, "u1").await;
        recv_frame(&mut first_rx).await;
        let (_, mut second_rx) = register(&srv_tx, "u2").await;
        recv_frame(&mut first_rx).await;

        srv_tx
            .send(ServerCommand::Connection(ConnectionCommand::Disconnect {
                from: first,
            }))
            .await
            .unwrap();

        recv_frame(&mut second_rx).await;
        recv_frame(&mut second_rx).await;
        assert_eq!(
            recv_frame(&mut second_rx).await,
            r#"{"type":"userLeft","userId":"u1"}"#
        );
    }
}
