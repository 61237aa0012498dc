use crate::duplex::{DuplexCommand, DuplexEndpoint, DuplexHandle, DuplexTransport};
use futures_util::{SinkExt, StreamExt};
use parley_core::{ClientConfig, Identity, ParleyError, ParleyResult};
use reqwest::Url;
use tokio_tungstenite::tungstenite::Message as Frame;
use tracing::{debug, error, info, warn};

/// Duplex transport backed by the chat service's WebSocket endpoint.
///
/// Each link connects to `<chat_url>/<me>/<peer>`. Text frames are payloads;
/// ping, pong and binary frames are ignored. There is no reconnection: a
/// dropped connection ends the link with [`DuplexEvent::Closed`].
///
/// [`DuplexEvent::Closed`]: crate::duplex::DuplexEvent::Closed
pub struct WebSocketTransport {
    chat_url: String,
    event_buffer: usize,
}

impl WebSocketTransport {
    /// Create a new `WebSocketTransport`.
    ///
    /// * `chat_url` – Root of the chat route, e.g. `ws://host/ws/chat`.
    /// * `event_buffer` – Capacity of each link's event buffer.
    pub fn new(chat_url: impl Into<String>, event_buffer: usize) -> Self {
        Self {
            chat_url: chat_url.into(),
            event_buffer,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.chat_url(), config.event_buffer)
    }

    /// URL for the (me, peer) link, with both names percent-encoded.
    pub fn link_url(&self, me: &Identity, peer: &Identity) -> ParleyResult<String> {
        let mut url = Url::parse(&self.chat_url)
            .map_err(|e| ParleyError::Config(format!("invalid chat URL '{}': {e}", self.chat_url)))?;
        url.path_segments_mut()
            .map_err(|()| ParleyError::Config(format!("chat URL '{}' cannot take a path", self.chat_url)))?
            .pop_if_empty()
            .extend([me.as_str(), peer.as_str()]);
        Ok(url.into())
    }
}

impl DuplexTransport for WebSocketTransport {
    fn open(&self, me: &Identity, peer: &Identity) -> ParleyResult<DuplexHandle> {
        let url = self.link_url(me, peer)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ParleyError::TransportUnavailable(format!("no async runtime to drive the link: {e}"))
        })?;
        let (handle, endpoint) = DuplexHandle::pair(peer.clone(), self.event_buffer);
        info!(peer = %peer, url = %url, "Opening duplex link");
        runtime.spawn(drive(url, endpoint));
        Ok(handle)
    }
}

/// Owns one WebSocket connection for its whole life.
async fn drive(url: String, mut endpoint: DuplexEndpoint) {
    let stream = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(url = %url, error = %e, "Duplex connect failed");
                endpoint.errored(format!("connect failed: {e}")).await;
                endpoint.closed().await;
                return;
            }
        },
        command = endpoint.next_command() => {
            debug!(url = %url, ?command, "Link closed while connecting");
            endpoint.closed().await;
            return;
        }
    };

    if !endpoint.opened().await {
        let mut stream = stream;
        let _ = stream.close(None).await;
        endpoint.closed().await;
        return;
    }
    info!(url = %url, "Duplex link open");

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            command = endpoint.next_command() => match command {
                Some(DuplexCommand::Send(payload)) => {
                    if let Err(e) = write.send(Frame::Text(payload)).await {
                        error!(url = %url, error = %e, "Duplex send failed");
                        endpoint.errored(format!("send failed: {e}")).await;
                        break;
                    }
                }
                Some(DuplexCommand::Close) | None => {
                    if let Err(e) = write.send(Frame::Close(None)).await {
                        debug!(error = %e, "Close frame not delivered");
                    }
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    if !endpoint.deliver(text).await {
                        debug!(url = %url, "Nobody listening, dropping link");
                        break;
                    }
                }
                Some(Ok(Frame::Close(_))) | None => {
                    info!(url = %url, "Chat service closed the link");
                    break;
                }
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(e)) => {
                    error!(url = %url, error = %e, "Duplex read error");
                    endpoint.errored(format!("read failed: {e}")).await;
                    break;
                }
            }
        }
    }

    endpoint.closed().await;
    info!(url = %url, "Duplex link closed");
}
