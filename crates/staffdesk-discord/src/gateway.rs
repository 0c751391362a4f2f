//! Gateway client: keeps one websocket session alive and forwards the
//! dispatch events the bot handles.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use staffdesk_types::events::{
    GatewayCommand, GatewayDispatch, GatewayFrame, Hello, intents, opcode,
};

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Guilds, guild messages, reactions and message content.
pub const INTENTS: u64 = intents::GUILDS
    | intents::GUILD_MESSAGES
    | intents::GUILD_MESSAGE_REACTIONS
    | intents::MESSAGE_CONTENT;

/// Pause before re-identifying after a session ends.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long to wait for Hello after the socket opens.
const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Close codes after which reconnecting cannot succeed (bad token, bad
/// intents, disallowed intents, ...).
const FATAL_CLOSE_CODES: &[u16] = &[4004, 4010, 4011, 4012, 4013, 4014];

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed gateway frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected Hello, got opcode {0}")]
    UnexpectedOpcode(u8),

    #[error("gateway closed before Hello")]
    ClosedEarly,

    #[error("timed out waiting for Hello")]
    HelloTimeout,

    #[error("gateway closed the session with code {code}: {reason}")]
    Fatal { code: u16, reason: String },
}

/// What the connection loop should do after a frame.
#[derive(Debug)]
enum FrameAction {
    Nothing,
    Dispatch(GatewayDispatch),
    HeartbeatNow,
    Reconnect(&'static str),
}

/// Per-session sequence and heartbeat bookkeeping.
#[derive(Debug)]
struct SessionTracker {
    seq: Option<u64>,
    acked: bool,
}

impl SessionTracker {
    fn new() -> Self {
        Self { seq: None, acked: true }
    }

    fn on_frame(&mut self, frame: GatewayFrame) -> FrameAction {
        if frame.s.is_some() {
            self.seq = frame.s;
        }

        match frame.op {
            opcode::DISPATCH => {
                let Some(event_type) = frame.t else {
                    return FrameAction::Nothing;
                };
                match GatewayDispatch::decode(&event_type, frame.d) {
                    Ok(dispatch) => FrameAction::Dispatch(dispatch),
                    Err(e) => {
                        warn!("Dropping undecodable {} dispatch: {}", event_type, e);
                        FrameAction::Nothing
                    }
                }
            }
            opcode::HEARTBEAT => FrameAction::HeartbeatNow,
            opcode::HEARTBEAT_ACK => {
                self.acked = true;
                FrameAction::Nothing
            }
            opcode::RECONNECT => FrameAction::Reconnect("reconnect requested"),
            opcode::INVALID_SESSION => FrameAction::Reconnect("invalid session"),
            other => {
                debug!("Ignoring gateway opcode {}", other);
                FrameAction::Nothing
            }
        }
    }

    /// Called on each heartbeat tick. Returns false when the previous beat
    /// was never acknowledged (zombied connection).
    fn beat(&mut self) -> bool {
        if !self.acked {
            return false;
        }
        self.acked = false;
        true
    }
}

pub struct GatewayClient {
    url: String,
    token: String,
    intents: u64,
}

impl GatewayClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            intents: INTENTS,
        }
    }

    /// Run sessions back to back until a fatal close code arrives or the
    /// event receiver is dropped.
    pub async fn run(self, events: mpsc::UnboundedSender<GatewayDispatch>) -> Result<(), GatewayError> {
        loop {
            match self.run_session(&events).await {
                Ok(reason) => info!("Gateway session ended ({}), reconnecting", reason),
                Err(e @ GatewayError::Fatal { .. }) => return Err(e),
                Err(e) => warn!("Gateway session failed: {}", e),
            }

            if events.is_closed() {
                return Ok(());
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn run_session(
        &self,
        events: &mpsc::UnboundedSender<GatewayDispatch>,
    ) -> Result<&'static str, GatewayError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut sender, mut receiver) = socket.split();

        let hello = wait_for_hello(&mut receiver).await?;
        debug!("Gateway hello, heartbeat every {}ms", hello.heartbeat_interval);

        send_command(&mut sender, &GatewayCommand::identify(&self.token, self.intents)).await?;

        let mut tracker = SessionTracker::new();
        let mut heartbeat =
            tokio::time::interval(Duration::from_millis(hello.heartbeat_interval.max(1)));
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !tracker.beat() {
                        return Ok("heartbeat not acknowledged");
                    }
                    send_command(&mut sender, &GatewayCommand::heartbeat(tracker.seq)).await?;
                }
                msg = receiver.next() => {
                    let msg = match msg {
                        Some(msg) => msg?,
                        None => return Ok("socket closed"),
                    };

                    match msg {
                        Message::Text(text) => {
                            let frame: GatewayFrame = serde_json::from_str(text.as_str())?;
                            match tracker.on_frame(frame) {
                                FrameAction::Nothing => {}
                                FrameAction::Dispatch(dispatch) => {
                                    if events.send(dispatch).is_err() {
                                        return Ok("event receiver closed");
                                    }
                                }
                                FrameAction::HeartbeatNow => {
                                    send_command(&mut sender, &GatewayCommand::heartbeat(tracker.seq)).await?;
                                }
                                FrameAction::Reconnect(reason) => return Ok(reason),
                            }
                        }
                        Message::Close(Some(frame)) => {
                            let code = u16::from(frame.code);
                            if FATAL_CLOSE_CODES.contains(&code) {
                                return Err(GatewayError::Fatal {
                                    code,
                                    reason: frame.reason.as_str().to_string(),
                                });
                            }
                            return Ok("closed by gateway");
                        }
                        Message::Close(None) => return Ok("closed by gateway"),
                        _ => {}
                    }
                }
            }
        }
    }
}

async fn wait_for_hello(receiver: &mut SplitStream<WsStream>) -> Result<Hello, GatewayError> {
    let msg = tokio::time::timeout(HELLO_TIMEOUT, receiver.next())
        .await
        .map_err(|_| GatewayError::HelloTimeout)?
        .ok_or(GatewayError::ClosedEarly)??;

    let Message::Text(text) = msg else {
        return Err(GatewayError::ClosedEarly);
    };

    let frame: GatewayFrame = serde_json::from_str(text.as_str())?;
    if frame.op != opcode::HELLO {
        return Err(GatewayError::UnexpectedOpcode(frame.op));
    }
    Ok(serde_json::from_value(frame.d)?)
}

async fn send_command(
    sender: &mut SplitSink<WsStream, Message>,
    command: &GatewayCommand,
) -> Result<(), GatewayError> {
    let text = serde_json::to_string(command)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}
