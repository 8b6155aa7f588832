//! Streaming session: the composition root of the pipeline.
//!
//! Wires client events into per-instrument history windows, runs the signal
//! generator on a per-instrument cadence, and exposes the results through
//! typed channels. Each channel supports exactly one subscriber: the
//! receiver is handed out once and never again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::StreamError;
use crate::indicators::trend;
use crate::models::{Instrument, MarketDataWindow, PriceTick, Signal};
use crate::signals::SignalGenerator;

use super::license::LicenseGate;
use super::quotex::{ClientEvent, ConnectionState, QuotexClient};

pub struct StreamingSession {
    client: Arc<QuotexClient>,
    config: SessionConfig,
    license: Arc<dyn LicenseGate>,
    ticks_tx: mpsc::UnboundedSender<PriceTick>,
    ticks_rx: Mutex<Option<mpsc::UnboundedReceiver<PriceTick>>>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: Mutex<Option<mpsc::UnboundedReceiver<Signal>>>,
    connected_tx: watch::Sender<bool>,
    connected_rx: watch::Receiver<bool>,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl StreamingSession {
    pub fn new(
        client: Arc<QuotexClient>,
        config: SessionConfig,
        license: Arc<dyn LicenseGate>,
    ) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = watch::channel(false);
        Self {
            client,
            config,
            license,
            ticks_tx,
            ticks_rx: Mutex::new(Some(ticks_rx)),
            signals_tx,
            signals_rx: Mutex::new(Some(signals_rx)),
            connected_tx,
            connected_rx,
            handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start streaming for an instrument.
    ///
    /// Checks the license gate before any connection attempt, rejects an
    /// empty instrument, spawns the event pump if it is not yet running,
    /// and queues the subscription (delivered once the handshake lands).
    pub async fn start(&self, instrument: &str) -> Result<(), StreamError> {
        if !self.license.is_session_authorized() {
            return Err(StreamError::Unauthorized);
        }
        if instrument.trim().is_empty() {
            return Err(StreamError::NoInstrumentSelected);
        }
        let instrument = Instrument::new(instrument)?;

        {
            let mut handle = self.handle.write().await;
            if handle.is_none() {
                let events = self
                    .client
                    .take_events()
                    .await
                    .ok_or(StreamError::NotRunning)?;
                let worker = SessionWorker {
                    config: self.config.clone(),
                    generator: SignalGenerator::new(self.config.policy.clone()),
                    windows: HashMap::new(),
                    last_signal: HashMap::new(),
                    ticks_tx: self.ticks_tx.clone(),
                    signals_tx: self.signals_tx.clone(),
                    connected_tx: self.connected_tx.clone(),
                };
                *handle = Some(tokio::spawn(worker.run(events)));
            }
        }

        self.client.connect()?;
        self.client.subscribe(instrument).await?;
        Ok(())
    }

    /// Add another instrument to the live session.
    pub async fn subscribe(&self, instrument: &str) -> Result<bool, StreamError> {
        let instrument = Instrument::new(instrument)?;
        self.client.subscribe(instrument).await
    }

    pub async fn unsubscribe(&self, instrument: &str) -> Result<bool, StreamError> {
        let instrument = Instrument::new(instrument)?;
        self.client.unsubscribe(instrument).await
    }

    /// Disconnect and stop the event pump. Terminal for this session.
    pub async fn stop(&self) {
        if let Err(e) = self.client.disconnect() {
            warn!(error = %e, "disconnect on stop failed");
        }
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("streaming session stopped");
        }
    }

    /// Manual recovery passthroughs for a parked connection.
    pub fn disconnect(&self) -> Result<(), StreamError> {
        self.client.disconnect()
    }

    pub fn reconnect(&self) -> Result<(), StreamError> {
        self.client.reconnect()
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }

    pub fn client(&self) -> &Arc<QuotexClient> {
        &self.client
    }

    /// Accepted ticks, in arrival order. Taken at most once.
    pub async fn take_price_updates(&self) -> Option<mpsc::UnboundedReceiver<PriceTick>> {
        self.ticks_rx.lock().await.take()
    }

    /// Generated signals. Taken at most once.
    pub async fn take_signals(&self) -> Option<mpsc::UnboundedReceiver<Signal>> {
        self.signals_rx.lock().await.take()
    }

    /// Connected/disconnected edge notifications.
    pub fn connection_changes(&self) -> watch::Receiver<bool> {
        self.connected_rx.clone()
    }

    /// The full connection state machine, for richer observers.
    pub fn connection_states(&self) -> watch::Receiver<ConnectionState> {
        self.client.state()
    }
}

/// The single task that owns all window and cadence state.
struct SessionWorker {
    config: SessionConfig,
    generator: SignalGenerator,
    windows: HashMap<Instrument, MarketDataWindow>,
    last_signal: HashMap<Instrument, Instant>,
    ticks_tx: mpsc::UnboundedSender<PriceTick>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    connected_tx: watch::Sender<bool>,
}

impl SessionWorker {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<ClientEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::PriceUpdate { instrument, price } => {
                    self.on_price(instrument, price);
                }
                ClientEvent::Connected => {
                    let _ = self.connected_tx.send(true);
                }
                ClientEvent::Disconnected => {
                    let _ = self.connected_tx.send(false);
                }
                ClientEvent::ReconnectsExhausted { attempts } => {
                    error!(
                        attempts,
                        "connection abandoned after repeated failures; awaiting manual reconnect"
                    );
                    let _ = self.connected_tx.send(false);
                }
            }
        }
        debug!("session worker stopped");
    }

    fn on_price(&mut self, instrument: Instrument, price: f64) {
        let Some(tick) = PriceTick::new(instrument.clone(), price) else {
            debug!(instrument = %instrument, price, "dropping unusable price");
            return;
        };

        let capacity = self.config.window_capacity;
        let window = self
            .windows
            .entry(instrument.clone())
            .or_insert_with(|| MarketDataWindow::new(capacity));
        window.push(tick.clone());
        let _ = self.ticks_tx.send(tick);

        self.maybe_generate(&instrument);
    }

    /// Evaluate the window when enough samples exist and the per-instrument
    /// cadence has elapsed. The cadence clock only advances when a signal
    /// is actually emitted.
    fn maybe_generate(&mut self, instrument: &Instrument) {
        let Some(window) = self.windows.get(instrument) else {
            return;
        };
        if window.len() < self.generator.policy().min_samples {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_signal.get(instrument) {
            if now.duration_since(*last) < self.config.signal_interval {
                return;
            }
        }

        let prices = window.prices();
        if let Some(signal) = self.generator.evaluate(instrument, &prices) {
            debug!(
                instrument = %instrument,
                direction = ?signal.direction,
                confidence = signal.confidence,
                rsi = signal.rsi,
                trend = ?trend::direction(&prices),
                "signal generated"
            );
            self.last_signal.insert(instrument.clone(), now);
            let _ = self.signals_tx.send(signal);
        }
    }
}
