//! Socket transport seam
//!
//! A transport opens one socket per call and hands back a pair of channels,
//! mirroring browser WebSocket semantics: `open` returns immediately and the
//! outcome arrives later as [`SocketEvent`]s.
//!
//! ```text
//!   Driver ──OutboundFrame──> pump task ──> WebSocket
//!   Driver <──SocketEvent──── pump task <── WebSocket
//! ```
//!
//! Dropping the [`SocketConnection`] closes the outbound channel, which makes
//! the pump task close the socket; any events it still had are discarded.

use crate::traits::WsMessage;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Close code for an intentional, client-initiated close
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code used when the connection dropped without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Event surfaced by an open or opening socket
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Open,
    Message(WsMessage),
    Error(String),
    Closed { code: u16, reason: String },
}

/// Frame handed to the transport for transmission
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Message(WsMessage),
    Close { code: u16, reason: String },
}

/// Driver-side end of a socket
pub struct SocketConnection {
    pub outbound: UnboundedSender<OutboundFrame>,
    pub events: UnboundedReceiver<SocketEvent>,
}

/// Transport-side end of a socket
pub struct SocketPeer {
    pub events: UnboundedSender<SocketEvent>,
    pub outbound: UnboundedReceiver<OutboundFrame>,
}

impl SocketPeer {
    /// Deliver an event to the driver, ignoring a driver that already hung up
    pub fn emit(&self, event: SocketEvent) {
        let _ = self.events.send(event);
    }
}

impl SocketConnection {
    /// Create both ends of a socket
    pub fn pair() -> (SocketConnection, SocketPeer) {
        let (outbound_tx, outbound_rx) = unbounded_channel();
        let (events_tx, events_rx) = unbounded_channel();
        (
            SocketConnection {
                outbound: outbound_tx,
                events: events_rx,
            },
            SocketPeer {
                events: events_tx,
                outbound: outbound_rx,
            },
        )
    }
}

/// Opens sockets for the connection manager
pub trait Transport: Send + Sync + 'static {
    /// Start opening a socket to `url`. Must not block.
    fn open(&self, url: &str) -> SocketConnection;
}

/// Transport backed by `tokio-tungstenite`
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Default, Clone)]
pub struct TungsteniteTransport;

impl Transport for TungsteniteTransport {
    fn open(&self, url: &str) -> SocketConnection {
        let (connection, peer) = SocketConnection::pair();
        let url = url.to_string();
        tokio::spawn(async move {
            pump(url, peer).await;
        });
        connection
    }
}

/// Drive one tungstenite socket until it closes or the driver hangs up
async fn pump(url: String, mut peer: SocketPeer) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            peer.emit(SocketEvent::Error(e.to_string()));
            peer.emit(SocketEvent::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "Connection failed".into(),
            });
            return;
        }
    };

    peer.emit(SocketEvent::Open);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = peer.outbound.recv() => {
                match frame {
                    Some(OutboundFrame::Message(msg)) => {
                        if let Err(e) = write.send(ws_message_to_tungstenite(msg)).await {
                            peer.emit(SocketEvent::Error(e.to_string()));
                            peer.emit(SocketEvent::Closed {
                                code: ABNORMAL_CLOSURE,
                                reason: "Send failed".into(),
                            });
                            return;
                        }
                    }
                    Some(OutboundFrame::Close { code, reason }) => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        let _ = write.send(Message::Close(Some(frame))).await;
                        let _ = write.close().await;
                        debug!("Socket closed by client with code {}", code);
                        return;
                    }
                    None => {
                        // Driver dropped the connection
                        let _ = write.close().await;
                        return;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => peer.emit(SocketEvent::Message(WsMessage::Text(text))),
                    Some(Ok(Message::Binary(data))) => peer.emit(SocketEvent::Message(WsMessage::Binary(data))),
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.into_owned()))
                            .unwrap_or((1005, String::new()));
                        peer.emit(SocketEvent::Closed { code, reason });
                        return;
                    }
                    // Protocol ping/pong is answered by tungstenite itself
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {}", e);
                        peer.emit(SocketEvent::Error(e.to_string()));
                        peer.emit(SocketEvent::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: e.to_string(),
                        });
                        return;
                    }
                    None => {
                        peer.emit(SocketEvent::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "Stream ended".into(),
                        });
                        return;
                    }
                }
            }
        }
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_routes_both_directions() {
        let (mut conn, mut peer) = SocketConnection::pair();

        peer.emit(SocketEvent::Open);
        assert_eq!(conn.events.recv().await, Some(SocketEvent::Open));

        conn.outbound
            .send(OutboundFrame::Message(WsMessage::Text("hi".into())))
            .unwrap();
        assert_eq!(
            peer.outbound.recv().await,
            Some(OutboundFrame::Message(WsMessage::Text("hi".into())))
        );
    }

    #[tokio::test]
    async fn test_dropping_connection_hangs_up_peer() {
        let (conn, mut peer) = SocketConnection::pair();
        drop(conn);
        assert!(peer.outbound.recv().await.is_none());
        assert!(peer.events.is_closed());
    }
}
