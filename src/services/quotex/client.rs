//! Resilient streaming client for the quote feed.
//!
//! A single manager task owns the transport, every timer, the subscription
//! set, and the connection state; callers talk to it through commands and
//! read back parsed ticks and connection events. Serializing everything
//! through one task is what keeps the state machine free of locks.
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Connected
//!      ^                        |  open fails / timeout      |
//!      |                        v                            v  close / liveness
//!      |                   Reconnecting <---------------------
//!      |                        | backoff elapses
//!      |                        v
//!      |                    Connecting
//!  any state --disconnect--> ManuallyDisconnected --reconnect--> Disconnected
//! ```

use std::sync::Arc;
use std::time::Duration;

use backon::ExponentialBackoff;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::models::Instrument;

use super::connector::{Connector, FrameSink, FrameStream};
use super::protocol::{self, Frame};
use super::subscriptions::SubscriptionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    ManuallyDisconnected,
}

/// Events the manager surfaces to its single consumer.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    PriceUpdate { instrument: Instrument, price: f64 },
    Connected,
    Disconnected,
    /// The attempt cap ran out; the client parks in `Disconnected` until a
    /// manual `reconnect()`.
    ReconnectsExhausted { attempts: u32 },
}

/// Point-in-time snapshot of the connection, for diagnostics.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub attempts: u32,
    pub endpoint: String,
    pub subscribed: Vec<Instrument>,
    pub session_id: Option<String>,
}

enum Command {
    Connect,
    Subscribe {
        instrument: Instrument,
        reply: oneshot::Sender<bool>,
    },
    Unsubscribe {
        instrument: Instrument,
        reply: oneshot::Sender<bool>,
    },
    Disconnect,
    Reconnect,
    Status {
        reply: oneshot::Sender<ConnectionStatus>,
    },
}

/// Handle to the manager task.
///
/// Subscribe/unsubscribe report whether anything was handed to the
/// transport: `Ok(false)` means the instrument was only queued (or the
/// unsubscribe was a no-op) because the client is not connected.
pub struct QuotexClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ClientEvent>>>,
    _task: JoinHandle<()>,
}

impl QuotexClient {
    /// Validate the config and spawn the manager task. The task idles until
    /// `connect()` (or a queued subscribe) starts the first attempt.
    pub fn spawn(
        config: StreamConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, StreamError> {
        config.validate()?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let manager = Manager {
            config,
            connector,
            cmd_rx,
            events_tx,
            state_tx,
            subscriptions: SubscriptionSet::new(),
            endpoint_index: 0,
            attempts: 0,
            backoff: None,
            manual: false,
            exhausted: false,
            session_id: None,
        };
        let task = tokio::spawn(manager.run());

        Ok(Self {
            cmd_tx,
            state_rx,
            events_rx: Mutex::new(Some(events_rx)),
            _task: task,
        })
    }

    fn send(&self, command: Command) -> Result<(), StreamError> {
        self.cmd_tx.send(command).map_err(|_| StreamError::NotRunning)
    }

    /// Start connecting. Rejected internally while manually disconnected.
    pub fn connect(&self) -> Result<(), StreamError> {
        self.send(Command::Connect)
    }

    /// Add the instrument to the desired set and, when connected, send the
    /// subscribe burst. When offline the instrument is queued and a
    /// connection attempt is triggered.
    pub async fn subscribe(&self, instrument: Instrument) -> Result<bool, StreamError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { instrument, reply })?;
        rx.await.map_err(|_| StreamError::NotRunning)
    }

    /// Remove the instrument and notify the feed. A no-op returning
    /// `Ok(false)` while disconnected.
    pub async fn unsubscribe(&self, instrument: Instrument) -> Result<bool, StreamError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unsubscribe { instrument, reply })?;
        rx.await.map_err(|_| StreamError::NotRunning)
    }

    /// Tear the connection down, clear subscriptions, and cancel every
    /// timer. Terminal until `reconnect()`.
    pub fn disconnect(&self) -> Result<(), StreamError> {
        self.send(Command::Disconnect)
    }

    /// Leave `ManuallyDisconnected`, reset endpoint rotation and backoff,
    /// and start connecting again.
    pub fn reconnect(&self) -> Result<(), StreamError> {
        self.send(Command::Reconnect)
    }

    pub async fn status(&self) -> Result<ConnectionStatus, StreamError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply })?;
        rx.await.map_err(|_| StreamError::NotRunning)
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current_state() == ConnectionState::Connected
    }

    /// The event stream. There is exactly one; the first caller takes it.
    pub async fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ClientEvent>> {
        self.events_rx.lock().await.take()
    }
}

/// Where the connected loop left off, deciding the next phase.
enum Leave {
    Lost,
    Manual,
    Restart,
    Stopped,
}

enum Phase {
    Idle,
    Dial,
    Backoff(Duration),
    Stopped,
}

struct Manager {
    config: StreamConfig,
    connector: Arc<dyn Connector>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<ClientEvent>,
    state_tx: watch::Sender<ConnectionState>,
    subscriptions: SubscriptionSet,
    endpoint_index: usize,
    attempts: u32,
    backoff: Option<ExponentialBackoff>,
    manual: bool,
    exhausted: bool,
    session_id: Option<String>,
}

impl Manager {
    async fn run(mut self) {
        let mut phase = Phase::Idle;
        loop {
            phase = match phase {
                Phase::Idle => self.idle().await,
                Phase::Dial => self.dial().await,
                Phase::Backoff(delay) => self.wait_backoff(delay).await,
                Phase::Stopped => break,
            };
        }
        debug!("stream manager stopped");
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: *self.state_tx.borrow(),
            attempts: self.attempts,
            endpoint: self.config.endpoints[self.endpoint_index].clone(),
            subscribed: self.subscriptions.iter().cloned().collect(),
            session_id: self.session_id.clone(),
        }
    }

    fn enter_manual(&mut self) {
        info!("manual disconnect");
        self.manual = true;
        self.exhausted = false;
        self.subscriptions.clear();
        self.attempts = 0;
        self.backoff = None;
        self.session_id = None;
        self.set_state(ConnectionState::ManuallyDisconnected);
    }

    fn reset_for_reconnect(&mut self) {
        info!("manual reconnect");
        self.manual = false;
        self.exhausted = false;
        self.endpoint_index = 0;
        self.attempts = 0;
        self.backoff = None;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Wait for commands while no connection work is pending.
    async fn idle(&mut self) -> Phase {
        loop {
            let Some(command) = self.cmd_rx.recv().await else {
                return Phase::Stopped;
            };
            match command {
                Command::Connect => {
                    if self.manual {
                        warn!("connect ignored while manually disconnected");
                    } else {
                        self.exhausted = false;
                        return Phase::Dial;
                    }
                }
                Command::Subscribe { instrument, reply } => {
                    self.subscriptions.insert(instrument.clone());
                    let _ = reply.send(false);
                    if !self.manual && !self.exhausted {
                        info!(instrument = %instrument, "subscription queued, starting connection attempt");
                        return Phase::Dial;
                    }
                    debug!(instrument = %instrument, "subscription queued");
                }
                Command::Unsubscribe { reply, .. } => {
                    let _ = reply.send(false);
                }
                Command::Disconnect => self.enter_manual(),
                Command::Reconnect => {
                    self.reset_for_reconnect();
                    return Phase::Dial;
                }
                Command::Status { reply } => {
                    let _ = reply.send(self.status());
                }
            }
        }
    }

    /// One connection attempt against the current endpoint, responsive to
    /// commands while the dial is in flight.
    async fn dial(&mut self) -> Phase {
        self.set_state(ConnectionState::Connecting);
        let endpoint = self.config.endpoints[self.endpoint_index].clone();
        info!(endpoint = %endpoint, attempts = self.attempts, "dialing quote feed");

        let connector = Arc::clone(&self.connector);
        let connect_timeout = self.config.connect_timeout;
        let dial_endpoint = endpoint.clone();
        let dial = async move { timeout(connect_timeout, connector.connect(&dial_endpoint)).await };
        tokio::pin!(dial);

        loop {
            tokio::select! {
                result = &mut dial => {
                    return match result {
                        Ok(Ok((sink, stream))) => self.connected(endpoint, sink, stream).await,
                        Ok(Err(e)) => {
                            warn!(endpoint = %endpoint, error = %e, "connection attempt failed");
                            self.dial_failed()
                        }
                        Err(_) => {
                            warn!(endpoint = %endpoint, timeout = ?self.config.connect_timeout, "connection attempt timed out");
                            self.dial_failed()
                        }
                    };
                }
                command = self.cmd_rx.recv() => {
                    match command {
                        None => return Phase::Stopped,
                        Some(Command::Disconnect) => {
                            self.enter_manual();
                            return Phase::Idle;
                        }
                        Some(Command::Reconnect) => {
                            self.reset_for_reconnect();
                            return Phase::Dial;
                        }
                        Some(Command::Subscribe { instrument, reply }) => {
                            self.subscriptions.insert(instrument);
                            let _ = reply.send(false);
                        }
                        Some(Command::Unsubscribe { reply, .. }) => {
                            let _ = reply.send(false);
                        }
                        Some(Command::Status { reply }) => {
                            let _ = reply.send(self.status());
                        }
                        Some(Command::Connect) => {}
                    }
                }
            }
        }
    }

    /// Failed to open: rotate to the next candidate endpoint and back off.
    fn dial_failed(&mut self) -> Phase {
        self.attempts += 1;
        self.endpoint_index = (self.endpoint_index + 1) % self.config.endpoints.len();
        debug!(endpoint = %self.config.endpoints[self.endpoint_index], "rotating to next endpoint");
        self.next_backoff_phase()
    }

    /// An established connection dropped: back off without rotating.
    fn connection_lost(&mut self) -> Phase {
        self.attempts += 1;
        self.next_backoff_phase()
    }

    fn next_backoff_phase(&mut self) -> Phase {
        if self.backoff.is_none() {
            self.backoff = Some(self.config.backoff());
        }
        let delay = self.backoff.as_mut().and_then(|backoff| backoff.next());
        match delay {
            Some(delay) => {
                info!(delay = ?delay, attempts = self.attempts, "scheduling reconnect");
                self.set_state(ConnectionState::Reconnecting);
                Phase::Backoff(delay)
            }
            None => {
                error!(attempts = self.attempts, "reconnect attempts exhausted, giving up");
                self.exhausted = true;
                self.backoff = None;
                self.set_state(ConnectionState::Disconnected);
                let _ = self.events_tx.send(ClientEvent::ReconnectsExhausted {
                    attempts: self.attempts,
                });
                Phase::Idle
            }
        }
    }

    /// Sit out the backoff delay, still answering commands.
    async fn wait_backoff(&mut self, delay: Duration) -> Phase {
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return Phase::Dial,
                command = self.cmd_rx.recv() => {
                    match command {
                        None => return Phase::Stopped,
                        Some(Command::Disconnect) => {
                            self.enter_manual();
                            return Phase::Idle;
                        }
                        Some(Command::Reconnect) => {
                            self.reset_for_reconnect();
                            return Phase::Dial;
                        }
                        Some(Command::Connect) => return Phase::Dial,
                        Some(Command::Subscribe { instrument, reply }) => {
                            self.subscriptions.insert(instrument);
                            let _ = reply.send(false);
                        }
                        Some(Command::Unsubscribe { reply, .. }) => {
                            let _ = reply.send(false);
                        }
                        Some(Command::Status { reply }) => {
                            let _ = reply.send(self.status());
                        }
                    }
                }
            }
        }
    }

    /// The connected loop: pump frames, heartbeat, watch liveness, and
    /// drain the staggered outbox, until the transport or the caller ends
    /// the connection.
    async fn connected(
        &mut self,
        endpoint: String,
        mut sink: FrameSink,
        mut stream: FrameStream,
    ) -> Phase {
        info!(endpoint = %endpoint, "connected to quote feed");
        self.attempts = 0;
        self.backoff = None;
        self.exhausted = false;
        self.set_state(ConnectionState::Connected);
        let _ = self.events_tx.send(ClientEvent::Connected);

        // Session-initialization burst after a short settle delay.
        let mut outbox: Vec<(Instant, String)> = Vec::new();
        let opened_at = Instant::now();
        for (i, frame) in protocol::handshake_frames().into_iter().enumerate() {
            let due = opened_at + self.config.handshake_settle + self.config.handshake_spacing * i as u32;
            outbox.push((due, frame));
        }

        let mut heartbeat = interval_at(
            opened_at + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );
        let mut liveness = interval_at(
            opened_at + self.config.liveness_check_interval,
            self.config.liveness_check_interval,
        );
        let mut last_inbound = Instant::now();

        let leave = 'conn: loop {
            let next_due = outbox.iter().map(|(due, _)| *due).min();
            tokio::select! {
                item = stream.next() => {
                    match item {
                        Some(Ok(raw)) => {
                            last_inbound = Instant::now();
                            if self.handle_frame(&raw, &mut sink, &mut outbox).await.is_err() {
                                warn!("send failed while answering frame");
                                break 'conn Leave::Lost;
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "transport error");
                            break 'conn Leave::Lost;
                        }
                        None => {
                            info!("transport closed by peer");
                            break 'conn Leave::Lost;
                        }
                    }
                }
                command = self.cmd_rx.recv() => {
                    match command {
                        None => break 'conn Leave::Stopped,
                        Some(Command::Disconnect) => break 'conn Leave::Manual,
                        Some(Command::Reconnect) => break 'conn Leave::Restart,
                        Some(Command::Subscribe { instrument, reply }) => {
                            self.subscriptions.insert(instrument.clone());
                            let now = Instant::now();
                            for (i, frame) in protocol::subscribe_frames(&instrument).into_iter().enumerate() {
                                outbox.push((now + self.config.subscribe_spacing * i as u32, frame));
                            }
                            info!(instrument = %instrument, "subscribed");
                            let _ = reply.send(true);
                        }
                        Some(Command::Unsubscribe { instrument, reply }) => {
                            self.subscriptions.remove(&instrument);
                            let mut failed = false;
                            for frame in protocol::unsubscribe_frames(&instrument) {
                                if sink.send(frame).await.is_err() {
                                    failed = true;
                                    break;
                                }
                            }
                            let _ = reply.send(!failed);
                            if failed {
                                warn!("unsubscribe send failed");
                                break 'conn Leave::Lost;
                            }
                            info!(instrument = %instrument, "unsubscribed");
                        }
                        Some(Command::Connect) => {}
                        Some(Command::Status { reply }) => {
                            let _ = reply.send(self.status());
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    if sink.send(protocol::PING.to_string()).await.is_err() {
                        warn!("heartbeat send failed");
                        break 'conn Leave::Lost;
                    }
                }
                _ = liveness.tick() => {
                    let silent_for = last_inbound.elapsed();
                    if silent_for > self.config.liveness_timeout {
                        warn!(silent_for = ?silent_for, "no inbound frames, treating connection as dead");
                        break 'conn Leave::Lost;
                    }
                }
                _ = sleep_until(next_due.unwrap_or_else(|| Instant::now() + Duration::from_secs(60))), if next_due.is_some() => {
                    let now = Instant::now();
                    let mut due = Vec::new();
                    outbox.retain(|(at, frame)| {
                        if *at <= now {
                            due.push(frame.clone());
                            false
                        } else {
                            true
                        }
                    });
                    for frame in due {
                        if sink.send(frame).await.is_err() {
                            warn!("outbox send failed");
                            break 'conn Leave::Lost;
                        }
                    }
                }
            }
        };

        // Cancel timers and pending sends before releasing the transport,
        // so nothing can fire into a dead connection.
        drop(heartbeat);
        drop(liveness);
        outbox.clear();
        drop(sink);
        drop(stream);

        let _ = self.events_tx.send(ClientEvent::Disconnected);

        match leave {
            Leave::Manual => {
                self.enter_manual();
                Phase::Idle
            }
            Leave::Restart => {
                self.reset_for_reconnect();
                Phase::Dial
            }
            Leave::Lost => self.connection_lost(),
            Leave::Stopped => Phase::Stopped,
        }
    }

    /// Interpret one inbound frame. `Err` means a reply could not be
    /// written, which the caller treats as a lost transport.
    async fn handle_frame(
        &mut self,
        raw: &str,
        sink: &mut FrameSink,
        outbox: &mut Vec<(Instant, String)>,
    ) -> Result<(), StreamError> {
        match Frame::decode(raw) {
            Frame::Ping => sink.send(protocol::PONG.to_string()).await?,
            Frame::Pong => sink.send(protocol::PING.to_string()).await?,
            Frame::SessionOpen { sid } => {
                debug!(sid = ?sid, "session opened");
                self.session_id = sid;
            }
            Frame::HandshakeAck => {
                debug!(
                    subscriptions = self.subscriptions.len(),
                    "handshake acknowledged, replaying subscriptions"
                );
                let now = Instant::now();
                for (i, instrument) in self.subscriptions.iter().enumerate() {
                    let due = now
                        + self.config.resubscribe_settle
                        + self.config.resubscribe_spacing * i as u32;
                    outbox.push((due, protocol::subscribe_frame(instrument)));
                }
            }
            Frame::Data { event, body } => {
                if protocol::is_price_event(&event) {
                    match protocol::extract_quote(&body) {
                        Some((symbol, price)) => {
                            let instrument = Instrument::from_wire(&symbol);
                            let _ = self.events_tx.send(ClientEvent::PriceUpdate { instrument, price });
                        }
                        None => debug!(event = %event, "price event without usable quote"),
                    }
                } else {
                    debug!(event = %event, "ignoring event");
                }
            }
            Frame::Unrecognized => debug!(frame = raw, "unrecognized frame"),
        }
        Ok(())
    }
}
