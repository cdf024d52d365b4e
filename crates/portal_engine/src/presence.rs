use std::sync::mpsc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::packet::{decode_packet, encode_connect, encode_event, Packet, PONG};
use crate::{ChannelError, EngineEvent, PresenceEvent};

const USER_COUNT_EVENT: &str = "user_count";
const USER_CONNECTED_EVENT: &str = "user_connected";

#[derive(Debug, Deserialize)]
struct UserCount {
    count: u64,
}

/// Websocket endpoint of the presence channel for a service base url.
pub fn presence_url(base: &Url) -> Option<Url> {
    let mut url = base.clone();
    let scheme = match base.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return None,
    };
    url.set_scheme(scheme).ok()?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    Some(url)
}

/// Outbound requests the controller can make on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outbound {
    AnnouncePresence,
}

pub struct PresenceClient {
    url: Url,
    connect_timeout: Duration,
}

impl PresenceClient {
    pub fn new(url: Url, connect_timeout: Duration) -> Self {
        Self {
            url,
            connect_timeout,
        }
    }

    /// Runs until the channel closes. The count is only ever relayed, in
    /// delivery order; the remote side is authoritative.
    pub(crate) async fn run(
        &self,
        mut outbound: UnboundedReceiver<Outbound>,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<(), ChannelError> {
        let (socket, _) = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| ChannelError::ConnectTimeout)??;
        engine_info!("Presence channel connected to {}", self.url);
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                frame = read.next() => {
                    let text = match frame {
                        None => break,
                        Some(Err(err)) => return Err(err.into()),
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) => break,
                        Some(Ok(_)) => continue,
                    };
                    let packet = match decode_packet(text.as_str()) {
                        Ok(packet) => packet,
                        Err(err) => {
                            engine_warn!("Skipping malformed presence frame: {}", err);
                            continue;
                        }
                    };
                    match packet {
                        Packet::Open(handshake) => {
                            engine_debug!("Presence handshake sid={}", handshake.sid);
                            write.send(Message::text(encode_connect())).await?;
                        }
                        Packet::Ping => write.send(Message::text(PONG)).await?,
                        Packet::Connected => {
                            let _ = events.send(EngineEvent::Presence(PresenceEvent::Opened));
                        }
                        Packet::Event { name, args } if name == USER_COUNT_EVENT => {
                            match args.first().map(|arg| UserCount::deserialize(arg)) {
                                Some(Ok(payload)) => {
                                    let _ = events.send(EngineEvent::Presence(PresenceEvent::Count(
                                        payload.count,
                                    )));
                                }
                                _ => engine_warn!("Ignoring user_count without a count"),
                            }
                        }
                        Packet::ConnectError(message) => return Err(ChannelError::Refused(message)),
                        Packet::Close | Packet::Disconnected => break,
                        other => engine_debug!("Ignoring presence packet {:?}", other),
                    }
                }
                Some(request) = outbound.recv() => match request {
                    Outbound::AnnouncePresence => {
                        write
                            .send(Message::text(encode_event(USER_CONNECTED_EVENT, &[])))
                            .await?;
                    }
                },
            }
        }
        engine_info!("Presence channel closed");
        Ok(())
    }
}
