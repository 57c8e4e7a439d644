use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{error, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::time::{Duration, Instant};

use system::{new_participant_id, ParticipantId, SessionCode};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::{ServerCommand, ServerTx};
use crate::server_state::ConnectionId;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(54);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
        session_code: SessionCode,
        user_id: ParticipantId,
    },
    Frame {
        from: ConnectionId,
        text: String,
    },
    Disconnect {
        from: ConnectionId,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Registered { connection_id: ConnectionId },
    /// An encoded server frame.
    Frame(String),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Registered(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
    session_code: SessionCode,
    user_id: ParticipantId,
    heartbeat: Instant,
}

impl ConnectionActor {
    fn submit(&self, command: ConnectionCommand) -> bool {
        match self.srv_tx.try_send(ServerCommand::Connection(command)) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Server is not accepting commands: {}", err);
                false
            }
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > CLIENT_TIMEOUT {
                log::info!("{} timed out", act.user_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(256);

        if !self.submit(ConnectionCommand::Connect {
            tx,
            session_code: self.session_code.clone(),
            user_id: self.user_id.clone(),
        }) {
            ctx.stop();
            return;
        }
        self.start_heartbeat(ctx);

        let addr = ctx.address().recipient();
        tokio::spawn(async move {
            log::debug!("connection green thread - started");
            while let Some(event) = rx.recv().await {
                addr.do_send(ConnectionActorMessage(event));
            }
            log::debug!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Registered(from) = self.state {
            self.submit(ConnectionCommand::Disconnect { from });
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.heartbeat = Instant::now();
                match self.state {
                    ConnectionState::Registered(from) => {
                        self.submit(ConnectionCommand::Frame {
                            from,
                            text: text.to_string(),
                        });
                    }
                    ConnectionState::Idle => {
                        log::debug!("Dropping frame from {} before registration", self.user_id);
                    }
                }
            }
            Ok(ws::Message::Binary(bin)) => {
                log::debug!("Ignoring binary frame of {} bytes", bin.len());
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => (),
            Err(err) => {
                log::warn!("Protocol error from {}: {}", self.user_id, err);
                ctx.stop();
            }
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Registered { connection_id } => {
                self.state = ConnectionState::Registered(connection_id);
            }
            ConnectionEvent::Frame(text) => {
                log::trace!("Egress {}", text);
                ctx.text(text);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub user_id: Option<String>,
    pub session: Option<String>,
    pub token: Option<String>,
    pub account_id: Option<String>,
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    let WsQuery {
        user_id,
        session,
        token,
        account_id,
    } = query.into_inner();
    let session_code = session
        .filter(|code| !code.is_empty())
        .ok_or_else(|| error::ErrorBadRequest("No session code provided"))?;
    let user_id = user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(new_participant_id);
    if token.is_some() || account_id.is_some() {
        log::debug!("{} connected with credentials", user_id);
    }

    ws::start(
        ConnectionActor {
            state: ConnectionState::Idle,
            srv_tx: srv_tx.get_ref().clone(),
            session_code,
            user_id,
            heartbeat: Instant::now(),
        },
        &req,
        stream,
    )
}
