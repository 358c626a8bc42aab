//! WebSocket bridge to the external speech pipeline

use super::protocol::{InboundMessage, OutboundMessage, PROTOCOL_VERSION};
use crate::domain::session::{
    AgentSession, SessionError, SessionEvent, SessionStart, ToolOutput,
};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<Result<(), SessionError>>>>>;

/// Upper bound on waiting for an `ack`; replies resolve after playout
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(120);

pub struct BridgeSession {
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: Pending,
    /// Set by the reader, under the `pending` lock, once it stops reading
    closed: Arc<AtomicBool>,
    ack_timeout: Duration,
    events: Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl BridgeSession {
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| SessionError::Connection(format!("{}: {}", url, e)))?;
        info!(%url, "connected to speech pipeline");

        let (sink, stream) = stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(
            stream,
            pending.clone(),
            closed.clone(),
            events_tx,
        ));

        Ok(Self {
            sink: Mutex::new(sink),
            pending,
            closed,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            events: Mutex::new(events_rx),
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    fn next_request_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), SessionError> {
        let text = serde_json::to_string(message)
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))
    }

    /// Send a request and wait for its `ack`
    async fn call(&self, id: String, message: OutboundMessage) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                return Err(SessionError::Closed);
            }
            pending.insert(id.clone(), tx);
        }

        if let Err(e) = self.send(&message).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.ack_timeout, rx).await {
            Ok(reply) => reply.unwrap_or(Err(SessionError::Closed)),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(SessionError::Timeout(format!(
                    "no ack for request {} within {:?}",
                    id, self.ack_timeout
                )))
            }
        }
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("speech pipeline connection error: {}", e);
                break;
            }
        };

        let message: InboundMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("ignoring malformed pipeline message: {}", e);
                continue;
            }
        };

        match message {
            InboundMessage::Ack { id } => {
                if let Some(waiter) = pending.lock().await.remove(&id) {
                    let _ = waiter.send(Ok(()));
                }
            }
            InboundMessage::Error { id: Some(id), message } => {
                if let Some(waiter) = pending.lock().await.remove(&id) {
                    let _ = waiter.send(Err(SessionError::Rejected(message)));
                } else {
                    warn!(%id, "pipeline error for unknown request: {}", message);
                }
            }
            InboundMessage::Error { id: None, message } => {
                warn!("speech pipeline error: {}", message);
            }
            InboundMessage::ToolCall(call) => {
                debug!(call_id = %call.id, tool = %call.name, "tool call received");
                if events.send(SessionEvent::ToolCall(call)).is_err() {
                    break;
                }
            }
            InboundMessage::Closed { reason } => {
                let _ = events.send(SessionEvent::Closed { reason });
                break;
            }
        }
    }

    let mut pending = pending.lock().await;
    closed.store(true, Ordering::SeqCst);
    for (_, waiter) in pending.drain() {
        let _ = waiter.send(Err(SessionError::Closed));
    }
}

#[async_trait]
impl AgentSession for BridgeSession {
    async fn start(&self, start: SessionStart) -> Result<(), SessionError> {
        let id = self.next_request_id();
        let message = OutboundMessage::Start {
            id: id.clone(),
            version: PROTOCOL_VERSION,
            session: start,
        };
        self.call(id, message).await
    }

    async fn generate_reply(&self, instructions: &str) -> Result<(), SessionError> {
        let id = self.next_request_id();
        let message = OutboundMessage::GenerateReply {
            id: id.clone(),
            instructions: instructions.to_string(),
        };
        self.call(id, message).await
    }

    async fn wait_for_playout(&self) -> Result<(), SessionError> {
        let id = self.next_request_id();
        let message = OutboundMessage::WaitForPlayout { id: id.clone() };
        self.call(id, message).await
    }

    async fn next_event(&self) -> Option<SessionEvent> {
        self.events.lock().await.recv().await
    }

    async fn submit_tool_output(
        &self,
        call_id: &str,
        output: ToolOutput,
        is_error: bool,
    ) -> Result<(), SessionError> {
        self.send(&OutboundMessage::ToolOutput {
            call_id: call_id.to_string(),
            output,
            is_error,
        })
        .await
    }

    async fn close(&self) -> Result<(), SessionError> {
        let sent = self.send(&OutboundMessage::Close).await;
        if let Err(e) = self.sink.lock().await.close().await {
            debug!("closing pipeline socket: {}", e);
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{NoiseCancellation, ToolCall};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Minimal pipeline: acks every request, emits one tool call after
    /// start, then closes once the tool output arrives.
    async fn spawn_pipeline() -> (String, JoinHandle<Vec<Value>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            let mut received = Vec::new();

            while let Some(Ok(frame)) = ws.next().await {
                let Message::Text(text) = frame else { continue };
                let value: Value = serde_json::from_str(&text).unwrap();
                received.push(value.clone());

                match value["type"].as_str().unwrap() {
                    "start" => {
                        let ack = json!({"type": "ack", "id": value["id"]});
                        ws.send(Message::Text(ack.to_string())).await.unwrap();
                        let call = json!({
                            "type": "tool_call",
                            "id": "call-1",
                            "name": "confirm_appointment",
                            "arguments": {"date": "Monday", "time": "11am"}
                        });
                        ws.send(Message::Text(call.to_string())).await.unwrap();
                    }
                    "generate_reply" => {
                        let err = json!({"type": "error", "id": value["id"], "message": "busy"});
                        ws.send(Message::Text(err.to_string())).await.unwrap();
                    }
                    "tool_output" => {
                        let closed = json!({"type": "closed", "reason": "done"});
                        ws.send(Message::Text(closed.to_string())).await.unwrap();
                    }
                    "close" => break,
                    _ => {}
                }
            }
            received
        });

        (format!("ws://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_bridge_round_trip() {
        let (url, pipeline) = spawn_pipeline().await;
        let session = BridgeSession::connect(&url).await.unwrap();

        session
            .start(SessionStart {
                room_name: "call-1".to_string(),
                instructions: "hello".to_string(),
                tools: vec![],
                noise_cancellation: NoiseCancellation::BackgroundVoiceTelephony,
            })
            .await
            .unwrap();

        let event = session.next_event().await.unwrap();
        assert_eq!(
            event,
            SessionEvent::ToolCall(ToolCall {
                id: "call-1".to_string(),
                name: "confirm_appointment".to_string(),
                arguments: json!({"date": "Monday", "time": "11am"}),
            })
        );

        let rejected = session.generate_reply("say hi").await;
        assert_eq!(rejected, Err(SessionError::Rejected("busy".to_string())));

        session
            .submit_tool_output("call-1", ToolOutput::Text("reservation confirmed".to_string()), false)
            .await
            .unwrap();

        assert_eq!(
            session.next_event().await,
            Some(SessionEvent::Closed {
                reason: "done".to_string()
            })
        );
        assert_eq!(session.next_event().await, None);

        session.close().await.unwrap();
        let received = pipeline.await.unwrap();
        let types: Vec<&str> = received.iter().map(|v| v["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["start", "generate_reply", "tool_output", "close"]);
        assert_eq!(received[2]["output"]["value"], "reservation confirmed");
    }

    /// Sends `frames` right after the handshake, never acks, and records
    /// what the client sends until the socket goes away.
    async fn spawn_silent_pipeline(frames: Vec<Value>) -> (String, JoinHandle<(Vec<String>, bool)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(socket).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.to_string())).await.unwrap();
            }

            let mut types = Vec::new();
            let mut saw_close_frame = false;
            while let Some(Ok(frame)) = ws.next().await {
                match frame {
                    Message::Text(text) => {
                        let value: Value = serde_json::from_str(&text).unwrap();
                        types.push(value["type"].as_str().unwrap().to_string());
                    }
                    Message::Close(_) => {
                        saw_close_frame = true;
                        break;
                    }
                    _ => {}
                }
            }
            (types, saw_close_frame)
        });

        (format!("ws://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_request_after_closed_frame_fails_instead_of_hanging() {
        let (url, pipeline) = spawn_silent_pipeline(vec![
            json!({"type": "tool_call", "id": "call-1", "name": "end_call", "arguments": {}}),
            json!({"type": "closed", "reason": "participant left"}),
        ])
        .await;
        let session = BridgeSession::connect(&url).await.unwrap();

        let event = session.next_event().await.unwrap();
        assert!(matches!(event, SessionEvent::ToolCall(call) if call.name == "end_call"));

        // the pipeline keeps the socket open but will never ack
        let result = tokio::time::timeout(Duration::from_secs(3), session.wait_for_playout())
            .await
            .expect("wait_for_playout should resolve once the pipeline has closed");
        assert_eq!(result, Err(SessionError::Closed));

        // later requests fail straight away
        assert_eq!(session.generate_reply("goodbye").await, Err(SessionError::Closed));

        session.close().await.unwrap();
        let (_, saw_close_frame) = pipeline.await.unwrap();
        assert!(saw_close_frame);
    }

    #[tokio::test]
    async fn test_unacknowledged_request_times_out() {
        let (url, pipeline) = spawn_silent_pipeline(vec![]).await;
        let session = BridgeSession::connect(&url)
            .await
            .unwrap()
            .with_ack_timeout(Duration::from_millis(100));

        let result = session.wait_for_playout().await;
        assert!(matches!(result, Err(SessionError::Timeout(_))));
        assert!(session.pending.lock().await.is_empty());

        session.close().await.unwrap();
        let (types, saw_close_frame) = pipeline.await.unwrap();
        assert_eq!(types, vec!["wait_for_playout", "close"]);
        assert!(saw_close_frame);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = BridgeSession::connect(&format!("ws://{}", addr)).await;
        assert!(matches!(result, Err(SessionError::Connection(_))));
    }
}
