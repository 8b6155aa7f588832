//! Integration tests for the streaming session pipeline

use std::sync::Arc;

use quotrix::config::{SessionConfig, StreamConfig};
use quotrix::models::SignalDirection;
use quotrix::services::license::{AlwaysAuthorized, LicenseGate};
use quotrix::services::quotex::{MockConnector, QuotexClient};
use quotrix::services::session::StreamingSession;
use quotrix::StreamError;

fn test_config() -> StreamConfig {
    StreamConfig {
        endpoints: vec!["wss://feed.example/socket.io/?EIO=3&transport=websocket".to_string()],
        ..StreamConfig::default()
    }
}

struct DeniedGate;

impl LicenseGate for DeniedGate {
    fn is_session_authorized(&self) -> bool {
        false
    }
}

fn quote(price: f64) -> String {
    format!(r#"42["quotes/stream",{{"symbol":"EUR USD","price":{}}}]"#, price)
}

fn build_session(
    gate: Arc<dyn LicenseGate>,
) -> (
    StreamingSession,
    Arc<MockConnector>,
    tokio::sync::mpsc::UnboundedReceiver<quotrix::services::quotex::MockRemote>,
) {
    let (connector, remotes) = MockConnector::new();
    let client = Arc::new(
        QuotexClient::spawn(test_config(), connector.clone()).expect("client should spawn"),
    );
    let session = StreamingSession::new(client, SessionConfig::default(), gate);
    (session, connector, remotes)
}

#[tokio::test(start_paused = true)]
async fn unauthorized_sessions_never_touch_the_wire() {
    let (session, connector, _remotes) = build_session(Arc::new(DeniedGate));
    assert!(matches!(
        session.start("EUR_USD").await,
        Err(StreamError::Unauthorized)
    ));
    assert!(connector.dialed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn starting_without_an_instrument_is_rejected() {
    let (session, connector, _remotes) = build_session(Arc::new(AlwaysAuthorized));
    assert!(matches!(
        session.start("  ").await,
        Err(StreamError::NoInstrumentSelected)
    ));
    assert!(matches!(
        session.subscribe("").await,
        Err(StreamError::InvalidInstrument(_))
    ));
    assert!(connector.dialed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn ticks_flow_through_the_window_into_a_signal() {
    let (session, _connector, mut remotes) = build_session(Arc::new(AlwaysAuthorized));
    let mut ticks = session.take_price_updates().await.unwrap();
    let mut signals = session.take_signals().await.unwrap();
    let mut connection = session.connection_changes();

    session.start("EUR_USD").await.unwrap();
    assert!(session.is_running().await);
    let remote = remotes.recv().await.unwrap();
    connection.wait_for(|connected| *connected).await.unwrap();

    // A flat book, then one catastrophic drop: deep oversold RSI plus a
    // close far below the lower band is a primary-policy BUY.
    for _ in 0..40 {
        remote.send(&quote(100.0));
    }
    remote.send(&quote(60.0));

    for i in 0..41 {
        let tick = ticks.recv().await.unwrap();
        assert_eq!(tick.instrument.as_str(), "EUR_USD");
        let expected = if i < 40 { 100.0 } else { 60.0 };
        assert_eq!(tick.price, expected);
    }

    let signal = signals.recv().await.unwrap();
    assert_eq!(signal.instrument.as_str(), "EUR_USD");
    assert_eq!(signal.direction, SignalDirection::Buy);
    assert!(signal.confidence >= 0.6 && signal.confidence <= 0.95);
    assert!(signal.rsi < 30.0);
    assert_eq!(signal.price, 60.0);

    // The cadence gate holds: an identical follow-up tick inside the
    // interval does not produce a second signal.
    remote.send(&quote(60.0));
    let tick = ticks.recv().await.unwrap();
    assert_eq!(tick.price, 60.0);
    assert!(signals.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn unusable_prices_are_dropped_before_the_window() {
    let (session, _connector, mut remotes) = build_session(Arc::new(AlwaysAuthorized));
    let mut ticks = session.take_price_updates().await.unwrap();

    session.start("EUR_USD").await.unwrap();
    let remote = remotes.recv().await.unwrap();

    remote.send(&quote(0.0));
    remote.send(&quote(-2.5));
    remote.send(&quote(1.0845));

    let tick = ticks.recv().await.unwrap();
    assert_eq!(tick.price, 1.0845);
}

#[tokio::test(start_paused = true)]
async fn channels_are_single_subscriber() {
    let (session, _connector, _remotes) = build_session(Arc::new(AlwaysAuthorized));
    assert!(session.take_price_updates().await.is_some());
    assert!(session.take_price_updates().await.is_none());
    assert!(session.take_signals().await.is_some());
    assert!(session.take_signals().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_disconnects_and_halts_the_pump() {
    let (session, connector, mut remotes) = build_session(Arc::new(AlwaysAuthorized));
    let mut connection = session.connection_changes();

    session.start("EUR_USD").await.unwrap();
    let _remote = remotes.recv().await.unwrap();
    connection.wait_for(|connected| *connected).await.unwrap();

    session.stop().await;
    assert!(!session.is_running().await);

    let mut states = session.connection_states();
    states
        .wait_for(|s| *s == quotrix::services::quotex::ConnectionState::ManuallyDisconnected)
        .await
        .unwrap();
    assert_eq!(connector.dialed().len(), 1);
}
