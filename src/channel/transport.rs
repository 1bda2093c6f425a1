//! Transport seam between the channel manager and the network.
//!
//! The manager only ever sees [`Connector`] and [`FeedStream`]; the
//! production implementation below speaks WebSocket through
//! tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use super::error::ChannelError;

/// Opens one streaming connection per call.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FeedStream>, ChannelError>;
}

/// An open inbound-only message stream.
#[async_trait]
pub trait FeedStream: Send {
    /// Next text frame. `None` means the peer closed the stream.
    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>>;

    /// Send a keepalive ping. An error means the connection is gone.
    async fn ping(&mut self) -> Result<(), ChannelError>;

    /// Close the stream from our side. Errors are not interesting here.
    async fn close(&mut self);
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Default, Clone)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn FeedStream>, ChannelError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Box::new(TungsteniteStream { inner: ws_stream }))
    }
}

struct TungsteniteStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedStream for TungsteniteStream {
    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.inner.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Some(Err(e.into())),
            }
        }
    }

    async fn ping(&mut self) -> Result<(), ChannelError> {
        self.inner.send(Message::Ping(Vec::new())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            debug!("WebSocket close handshake failed: {}", e);
        }
    }
}
