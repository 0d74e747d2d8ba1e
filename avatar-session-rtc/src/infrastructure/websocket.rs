use crate::infrastructure::error::{Result, RtcError};
use avatar_session_core::protocol::{WsRequest, WsResponse};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Build the authenticated endpoint: `<url>?authorization=Basic <key>`
pub fn authorized_url(url: &str, key: &str) -> String {
    format!(
        "{}?authorization=Basic%20{}",
        url,
        urlencoding::encode(key)
    )
}

/// JSON-over-WebSocket connection to the streaming endpoint.
///
/// Outbound requests are queued to a writer task; inbound frames are parsed
/// into [`WsResponse`] and delivered on the receiver returned by `connect`.
pub struct WsConnection {
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl WsConnection {
    pub async fn connect(
        url: &str,
        key: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WsResponse>)> {
        tracing::info!("Connecting to WebSocket {}", url);
        let (stream, _) = connect_async(authorized_url(url, key)).await?;
        tracing::info!("WebSocket connection opened");

        let (mut write, mut read) = stream.split();
        let open = Arc::new(AtomicBool::new(true));

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<WsResponse>();

        let writer_open = open.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = write.send(message).await {
                    tracing::error!("WebSocket send failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            writer_open.store(false, Ordering::SeqCst);
        });

        let reader_open = open.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<WsResponse>(text.as_str()) {
                        Ok(response) => {
                            if inbound_tx.send(response).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Unparseable WebSocket message: {}", e),
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::info!("WebSocket closed by server: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
        });

        Ok((
            Self {
                outbound,
                open,
                writer,
                reader,
            },
            inbound,
        ))
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Serialize and queue a request
    pub fn send(&self, request: &WsRequest) -> Result<()> {
        if !self.is_open() {
            return Err(RtcError::NotConnected("WebSocket is not open".to_string()));
        }

        let json = serde_json::to_string(request)?;
        tracing::debug!("WS send {} ({} bytes)", request.kind(), json.len());
        self.outbound
            .send(Message::text(json))
            .map_err(|_| RtcError::ChannelClosed)
    }

    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.outbound.send(Message::Close(None));
        }
        self.reader.abort();
        tracing::info!("WebSocket connection closed");
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_url_encodes_key() {
        let url = authorized_url("wss://ws-api.d-id.com", "user:secret/+");
        assert_eq!(
            url,
            "wss://ws-api.d-id.com?authorization=Basic%20user%3Asecret%2F%2B"
        );
    }
}
