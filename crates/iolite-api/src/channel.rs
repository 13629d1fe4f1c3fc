//! WebSocket channel plumbing for the gateway endpoints.
//!
//! The gateway exposes three WebSocket endpoints, all authorized the
//! same way: a Basic auth header on the upgrade request plus the `SID`
//! query parameter. [`connect`] performs the handshake and returns the
//! split sink/stream halves so a session task can read and write from
//! separate `select!` arms.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;
use crate::transport::basic_auth_header;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Endpoints ────────────────────────────────────────────────────────

/// The three WebSocket endpoints the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// `/bus/websocket/application/json` — the request/response bus
    /// used for discovery and actions.
    Application,
    /// `/devices/ws` — read-only device monitoring, client-driven
    /// `keep_alive` text frames.
    Devices,
    /// `/heating/ws` — read-only heating snapshot frames.
    Heating,
}

impl ChannelKind {
    pub fn path(self) -> &'static str {
        match self {
            Self::Application => "/bus/websocket/application/json",
            Self::Devices => "/devices/ws",
            Self::Heating => "/heating/ws",
        }
    }
}

/// Build the full channel URL: `wss://{host}{path}?SID={sid}`.
pub fn channel_url(host: &str, kind: ChannelKind, sid: &str) -> Result<Url, Error> {
    let mut url = Url::parse(&format!("wss://{host}{}", kind.path()))?;
    url.query_pairs_mut().append_pair("SID", sid);
    Ok(url)
}

// ── Connection ───────────────────────────────────────────────────────

/// A connected channel, split into independently owned halves.
pub struct Channel {
    pub writer: ChannelWriter,
    pub reader: ChannelReader,
}

/// Open a channel with the gateway's Basic auth header on the
/// upgrade request.
pub async fn connect(
    url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<Channel, Error> {
    tracing::info!(url = %url, "connecting channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri)
        .with_header("Authorization", basic_auth_header(username, password));

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::debug!("channel connected");

    let (sink, stream) = ws_stream.split();
    Ok(Channel {
        writer: ChannelWriter { sink },
        reader: ChannelReader { stream },
    })
}

// ── Writer half ──────────────────────────────────────────────────────

pub struct ChannelWriter {
    sink: SplitSink<WsStream, tungstenite::Message>,
}

impl ChannelWriter {
    /// Send a JSON payload as a text frame.
    pub async fn send_json(&mut self, payload: &serde_json::Value) -> Result<(), Error> {
        self.send_text(&payload.to_string()).await
    }

    /// Send a raw text frame (the devices endpoint expects the literal
    /// `keep_alive` string, not JSON).
    pub async fn send_text(&mut self, text: &str) -> Result<(), Error> {
        tracing::debug!(frame = text, "sending frame");
        self.sink
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }

    /// Send a close frame and flush.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.sink
            .send(tungstenite::Message::Close(None))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }
}

// ── Reader half ──────────────────────────────────────────────────────

pub struct ChannelReader {
    stream: SplitStream<WsStream>,
}

impl ChannelReader {
    /// Read the next text frame.
    ///
    /// Returns `None` once the peer closes the channel or the stream
    /// ends. Ping/pong and binary frames are skipped (tungstenite
    /// answers pings itself).
    pub async fn next_text(&mut self) -> Option<Result<String, Error>> {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return Some(Ok(text.to_string()));
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                    } else {
                        tracing::info!("close frame received (no payload)");
                    }
                    return None;
                }
                Some(Ok(tungstenite::Message::Ping(_))) => {
                    tracing::trace!("websocket ping");
                }
                Some(Ok(_)) => {
                    // Binary, Pong, Frame — ignore
                }
                Some(Err(e)) => return Some(Err(Error::WebSocket(e.to_string()))),
                None => {
                    tracing::info!("channel stream ended");
                    return None;
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_channel_url() {
        let url = channel_url("remote.iolite.de", ChannelKind::Application, "abc123").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://remote.iolite.de/bus/websocket/application/json?SID=abc123"
        );
    }

    #[test]
    fn heating_channel_url() {
        let url = channel_url("remote.iolite.de", ChannelKind::Heating, "s-1").unwrap();
        assert_eq!(url.as_str(), "wss://remote.iolite.de/heating/ws?SID=s-1");
    }

    #[test]
    fn devices_channel_url() {
        let url = channel_url("remote.iolite.de", ChannelKind::Devices, "s-1").unwrap();
        assert_eq!(url.as_str(), "wss://remote.iolite.de/devices/ws?SID=s-1");
    }

    #[test]
    fn sid_is_query_escaped() {
        let url = channel_url("remote.iolite.de", ChannelKind::Devices, "a b&c").unwrap();
        assert!(url.as_str().ends_with("SID=a+b%26c"));
    }
}
