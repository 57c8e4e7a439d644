use crate::connection::ConnectionEvent;
use crate::server_state::ConnectionId;
use std::collections::HashMap;
use tokio::sync::mpsc::error::TrySendError;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Dropped,
    /// The receiving actor is gone; the connection should be unregistered.
    Closed,
}

pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    /// Never waits: a connection that cannot keep up loses the event.
    pub fn send(&self, to: &ConnectionId, event: ConnectionEvent) -> Delivery {
        match self.connection_txs.get(to) {
            Some(tx) => match tx.try_send(event) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(_)) => {
                    log::warn!("Connection {} is lagging, dropping event", to);
                    Delivery::Dropped
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Connection {} already gone", to);
                    Delivery::Closed
                }
            },
            None => {
                log::warn!("No connection {}", to);
                Delivery::Dropped
            }
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }
}
