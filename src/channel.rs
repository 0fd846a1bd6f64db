use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::api::{ApiClient, ApiError};
use crate::events::{ClientEvent, ServerEvent};
use crate::models::Message;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("event channel closed")]
    Closed,
    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Empty and whitespace-only content never reaches the network.
pub(crate) fn non_blank(content: &str) -> Result<&str, ChannelError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(ChannelError::EmptyMessage)
    } else {
        Ok(trimmed)
    }
}

/// Transport seam for one conversation's messages. Two implementations:
/// HTTP polling and the long-lived websocket event channel.
#[async_trait]
pub trait MessageChannel: Send {
    /// The thread to show when a conversation is selected; the caller
    /// replaces its local message state wholesale with the result.
    async fn open(&mut self, conversation_id: &str) -> Result<Vec<Message>, ChannelError>;

    /// Sends a message. Returns the server echo when the transport echoes
    /// synchronously (polling); the event transport returns `None` and the
    /// persisted echo arrives later as a pushed event.
    async fn send(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Option<Message>, ChannelError>;
}

/// Polling variant: every open re-fetches the whole thread, sends append
/// the echo on success and are dropped on failure. No retry, no queue.
pub struct PollingChannel {
    api: ApiClient,
}

impl PollingChannel {
    pub fn new(api: ApiClient) -> Self {
        PollingChannel { api }
    }
}

#[async_trait]
impl MessageChannel for PollingChannel {
    async fn open(&mut self, conversation_id: &str) -> Result<Vec<Message>, ChannelError> {
        Ok(self.api.fetch_messages(conversation_id).await?)
    }

    async fn send(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Option<Message>, ChannelError> {
        let content = non_blank(content)?;
        let echo = self
            .api
            .send_message(conversation_id, sender_id, content)
            .await?;
        Ok(Some(echo))
    }
}

/// Event variant: one websocket per session, registered to the user id on
/// connect. Outgoing events are queued through an mpsc to a writer task;
/// pushed events are forwarded to the consumer's receiver. Dropping the
/// receiver detaches the reader task cleanly. No reconnection is attempted
/// when the socket dies.
pub struct EventChannel {
    outgoing: mpsc::UnboundedSender<ClientEvent>,
}

impl EventChannel {
    pub async fn connect(
        ws_url: &str,
        user_id: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>), ChannelError> {
        let (stream, _) = connect_async(ws_url).await?;
        let (mut write, mut read) = stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(event) = outgoing_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(raw) => {
                        if let Err(e) = write.send(WsMessage::text(raw)).await {
                            error!("failed to send event: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("failed to encode event: {}", e),
                }
            }
        });

        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                if incoming_tx.send(event).is_err() {
                                    // consumer unsubscribed
                                    break;
                                }
                            }
                            Err(e) => debug!("ignoring unparsable event: {}", e),
                        }
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("websocket error: {}", e);
                        break;
                    }
                }
            }
            info!("event channel reader stopped");
        });

        let channel = EventChannel { outgoing };
        channel.emit(ClientEvent::Register {
            user_id: user_id.to_string(),
        })?;
        Ok((channel, incoming_rx))
    }

    fn emit(&self, event: ClientEvent) -> Result<(), ChannelError> {
        self.outgoing.send(event).map_err(|_| ChannelError::Closed)
    }
}

#[async_trait]
impl MessageChannel for EventChannel {
    /// The event contract has no history fetch; the thread starts empty and
    /// fills from pushed events.
    async fn open(&mut self, _conversation_id: &str) -> Result<Vec<Message>, ChannelError> {
        Ok(Vec::new())
    }

    async fn send(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Option<Message>, ChannelError> {
        let text = non_blank(content)?;
        self.emit(ClientEvent::SendMessage {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
        })?;
        // no optimistic render: the server echo is authoritative
        Ok(None)
    }
}
