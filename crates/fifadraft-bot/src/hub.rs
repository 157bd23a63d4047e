// WebSocket chat hub.
//
// Every connected client sees every outbound frame. Inbound text frames carry
// one chat message each as `{"user": "...", "text": "..."}`; outbound frames
// are `{"channel": "lobby|draft|teams", "text": "..."}`.

use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Capacity of the outbound broadcast buffer per client.
pub const OUTBOUND_CAPACITY: usize = 256;

/// One chat message from a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    pub user: String,
    pub text: String,
}

/// One line posted by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundFrame {
    pub channel: String,
    pub text: String,
}

/// Parse an inbound text frame. Frames that are not a JSON message with a
/// non-blank user are rejected.
pub fn parse_inbound(raw: &str) -> Option<InboundMessage> {
    match serde_json::from_str::<InboundMessage>(raw) {
        Ok(msg) => {
            let user = msg.user.trim();
            if user.is_empty() {
                warn!("ignoring message without a user: {raw}");
                return None;
            }
            Some(InboundMessage {
                user: user.to_string(),
                text: msg.text,
            })
        }
        Err(e) => {
            warn!("ignoring malformed frame ({e}): {raw}");
            None
        }
    }
}

/// Run the hub on `127.0.0.1:{port}`, forwarding inbound messages through
/// `tx` and relaying `outbound` to every client. Runs until the inbound
/// receiver is dropped or the listener fails.
pub async fn run(
    port: u16,
    tx: mpsc::Sender<InboundMessage>,
    outbound: broadcast::Sender<OutboundFrame>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("chat hub listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        if tx.is_closed() {
            break;
        }
        let addr = addr.to_string();
        info!("accepted TCP connection from {addr}");

        let tx = tx.clone();
        let outbound_rx = outbound.subscribe();
        tokio::spawn(async move {
            handle_connection(stream, addr, tx, outbound_rx).await;
        });
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    addr: String,
    tx: mpsc::Sender<InboundMessage>,
    outbound_rx: broadcast::Receiver<OutboundFrame>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let (write, read) = ws_stream.split();
    let writer = tokio::spawn(forward_outbound(write, outbound_rx, addr.clone()));

    if process_message_stream(read, &tx, &addr).await.is_err() {
        debug!("inbound channel closed while reading from {addr}");
    }
    writer.abort();
    info!("client {addr} disconnected");
}

/// Serialize and send every broadcast frame to one client until it goes
/// away or the hub shuts down.
async fn forward_outbound<W>(
    mut write: W,
    mut outbound_rx: broadcast::Receiver<OutboundFrame>,
    addr: String,
) where
    W: futures_util::Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    loop {
        let frame = match outbound_rx.recv().await {
            Ok(frame) => frame,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("client {addr} lagging, {skipped} frames dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize outbound frame: {e}");
                continue;
            }
        };
        if let Err(e) = write.send(Message::Text(json.into())).await {
            warn!("failed to send to {addr}: {e}");
            break;
        }
    }
}

/// Read raw WebSocket [`Message`] items from any [`Stream`], forwarding
/// parsed chat messages through `tx`. Returns `Err(())` once the receiver
/// is gone.
///
/// Pure logic over the stream, so it is tested without opening ports.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<InboundMessage>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let Some(msg) = parse_inbound(text.as_str()) else {
                    continue;
                };
                if tx.send(msg).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong and raw frames carry no chat.
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    fn chat(user: &str, text: &str) -> Result<Message, WsError> {
        let json = serde_json::json!({ "user": user, "text": text }).to_string();
        Ok(Message::Text(json.into()))
    }

    fn inbound(user: &str, text: &str) -> InboundMessage {
        InboundMessage {
            user: user.into(),
            text: text.into(),
        }
    }

    #[test]
    fn parse_inbound_trims_user() {
        assert_eq!(
            parse_inbound(r#"{"user": " alice ", "text": "3"}"#),
            Some(inbound("alice", "3"))
        );
    }

    #[test]
    fn parse_inbound_rejects_bad_frames() {
        assert_eq!(parse_inbound("not json"), None);
        assert_eq!(parse_inbound(r#"{"text": "3"}"#), None);
        assert_eq!(parse_inbound(r#"{"user": "  ", "text": "3"}"#), None);
    }

    #[test]
    fn outbound_frame_serializes_channel_and_text() {
        let frame = OutboundFrame {
            channel: "draft".into(),
            text: "## Free Pick Round 1".into(),
        };
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r###"{"channel":"draft","text":"## Free Pick Round 1"}"###
        );
    }

    #[tokio::test]
    async fn chat_messages_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![chat("a", "first"), chat("b", "second")];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), inbound("a", "first"));
        assert_eq!(rx.recv().await.unwrap(), inbound("b", "second"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("garbage".into())),
            chat("a", "after garbage"),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), inbound("a", "after garbage"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_frame_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            chat("a", "before_close"),
            Ok(Message::Close(None)),
            chat("a", "after_close"),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), inbound("a", "before_close"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn error_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            chat("a", "before_error"),
            Err(WsError::ConnectionClosed),
            chat("a", "after_error"),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), inbound("a", "before_error"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn binary_and_ping_messages_are_ignored() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            chat("a", "after_ignored"),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), inbound("a", "after_ignored"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn returns_err_when_channel_closed() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);

        let result = process_message_stream(mock_stream(vec![chat("a", "orphan")]), &tx, "test").await;
        assert!(result.is_err());
    }

    /// A client write half that hands each frame to `tx`.
    fn client_sink(
        tx: mpsc::UnboundedSender<Message>,
    ) -> impl futures_util::Sink<Message, Error = mpsc::error::SendError<Message>> + Unpin {
        Box::pin(futures_util::sink::unfold(
            tx,
            |tx: mpsc::UnboundedSender<Message>, msg: Message| async move {
                tx.send(msg)?;
                Ok::<_, mpsc::error::SendError<Message>>(tx)
            },
        ))
    }

    fn lobby(text: &str) -> OutboundFrame {
        OutboundFrame {
            channel: "lobby".into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn forward_outbound_writes_json_frames() {
        let (out_tx, out_rx) = broadcast::channel(8);
        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel();

        out_tx.send(lobby("hello")).unwrap();
        drop(out_tx);

        forward_outbound(client_sink(sent_tx), out_rx, "test".into()).await;

        let Some(Message::Text(text)) = sent_rx.recv().await else {
            panic!("expected a text frame");
        };
        assert_eq!(text.as_str(), r#"{"channel":"lobby","text":"hello"}"#);
        assert!(sent_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn forward_outbound_stops_when_client_is_gone() {
        let (out_tx, out_rx) = broadcast::channel(8);
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        drop(sent_rx);

        out_tx.send(lobby("nobody hears this")).unwrap();

        // Returns although the broadcast sender is still open.
        forward_outbound(client_sink(sent_tx), out_rx, "test".into()).await;
        assert_eq!(out_tx.receiver_count(), 0);
    }
}
