//! Transport seam: how the client obtains a duplex text-frame channel.
//!
//! The client only ever sees a [`FrameSink`]/[`FrameStream`] pair, so tests
//! swap the real WebSocket dialer for [`MockConnector`] and drive the state
//! machine over in-memory channels with a paused clock.

use std::collections::VecDeque;
use std::future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::StreamError;

pub type FrameSink = Pin<Box<dyn Sink<String, Error = StreamError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Dial an endpoint and return the text-frame duplex for it.
    async fn connect(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), StreamError>;
}

/// Production connector backed by tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), StreamError> {
        Url::parse(endpoint).map_err(|e| StreamError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let (ws, _response) = connect_async(endpoint)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        let (write, read) = ws.split();

        let sink = write
            .sink_map_err(|e| StreamError::Transport(e.to_string()))
            .with(|text: String| future::ready(Ok::<Message, StreamError>(Message::Text(text))));

        // The protocol's heartbeats ride in text frames; WebSocket-level
        // control frames are handled by tungstenite itself.
        let stream = read.filter_map(|item| {
            future::ready(match item {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(_)) => Some(Err(StreamError::TransportClosed)),
                Ok(_) => None,
                Err(e) => Some(Err(StreamError::Transport(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// Scripted outcome for one `MockConnector` dial.
#[derive(Debug, Clone, Copy)]
pub enum MockOutcome {
    /// Hand out an in-memory duplex (the default when nothing is scripted).
    Open,
    /// Fail immediately, as a refused or reset connection would.
    Refuse,
    /// Never resolve, as a blackholed endpoint would; the client's connect
    /// timeout is expected to fire.
    Hang,
}

/// The far end of an in-memory connection opened through [`MockConnector`].
#[derive(Debug)]
pub struct MockRemote {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MockRemote {
    /// Push a frame to the client, as the server would.
    pub fn send(&self, frame: &str) {
        let _ = self.to_client.send(frame.to_string());
    }

    /// Next frame the client wrote, or `None` once the client released the
    /// transport.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    pub fn try_next_frame(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }
}

/// In-memory connector for deterministic tests.
///
/// Each dial records the endpoint and timestamp, pops the next scripted
/// outcome (defaulting to [`MockOutcome::Open`]), and on success emits the
/// remote end through the receiver returned by [`MockConnector::new`].
pub struct MockConnector {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    dials: Mutex<Vec<(String, Instant)>>,
    remotes_tx: mpsc::UnboundedSender<MockRemote>,
}

impl MockConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockRemote>) {
        let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            dials: Mutex::new(Vec::new()),
            remotes_tx,
        });
        (connector, remotes_rx)
    }

    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes
            .lock()
            .expect("mock connector state poisoned")
            .push_back(outcome);
    }

    pub fn dialed(&self) -> Vec<String> {
        self.dials
            .lock()
            .expect("mock connector state poisoned")
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.dials
            .lock()
            .expect("mock connector state poisoned")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), StreamError> {
        self.dials
            .lock()
            .expect("mock connector state poisoned")
            .push((endpoint.to_string(), Instant::now()));

        let outcome = self
            .outcomes
            .lock()
            .expect("mock connector state poisoned")
            .pop_front()
            .unwrap_or(MockOutcome::Open);

        match outcome {
            MockOutcome::Refuse => Err(StreamError::Transport("connection refused".to_string())),
            MockOutcome::Hang => future::pending().await,
            MockOutcome::Open => {
                let (in_tx, in_rx) = mpsc::unbounded_channel();
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                let _ = self.remotes_tx.send(MockRemote {
                    to_client: in_tx,
                    from_client: out_rx,
                });
                Ok((
                    Box::pin(ChannelSink(out_tx)),
                    Box::pin(ChannelStream(in_rx)),
                ))
            }
        }
    }
}

struct ChannelSink(mpsc::UnboundedSender<String>);

impl Sink<String> for ChannelSink {
    type Error = StreamError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: String) -> Result<(), Self::Error> {
        self.0.send(item).map_err(|_| StreamError::TransportClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<String>);

impl Stream for ChannelStream {
    type Item = Result<String, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().0.poll_recv(cx).map(|item| item.map(Ok))
    }
}
