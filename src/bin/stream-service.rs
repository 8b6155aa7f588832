//! Quotrix Stream Service
//!
//! Maintains the long-lived connection to the quote feed, keeps the
//! per-instrument price history, and logs every signal the engine produces.
//! This service should run as a singleton (one instance).

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use quotrix::config::{self, SessionConfig, StreamConfig};
use quotrix::logging;
use quotrix::services::license::AlwaysAuthorized;
use quotrix::services::quotex::{QuotexClient, WsConnector};
use quotrix::services::session::StreamingSession;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let environment = config::get_environment();
    info!(environment = %environment, "Starting Quotrix Stream Service");

    let instruments: Vec<String> = env::var("INSTRUMENTS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if instruments.is_empty() {
        warn!("no instruments configured - set INSTRUMENTS=EUR_USD,GBP_USD");
        return Ok(());
    }

    let stream_config = StreamConfig::from_env();
    let session_config = SessionConfig::from_env();
    info!(
        endpoints = stream_config.endpoints.len(),
        policy = session_config.policy.name,
        "configuration loaded"
    );

    let client = Arc::new(QuotexClient::spawn(stream_config, Arc::new(WsConnector::new()))?);
    let session = StreamingSession::new(client, session_config, Arc::new(AlwaysAuthorized));

    let mut ticks = session
        .take_price_updates()
        .await
        .ok_or("price update channel already taken")?;
    let mut signals = session
        .take_signals()
        .await
        .ok_or("signal channel already taken")?;
    let mut connection = session.connection_changes();

    session.start(&instruments[0]).await?;
    for instrument in &instruments[1..] {
        match session.subscribe(instrument).await {
            Ok(sent) => info!(instrument = %instrument, sent, "subscription requested"),
            Err(e) => error!(instrument = %instrument, error = %e, "failed to subscribe"),
        }
    }

    info!("stream service running, waiting for shutdown signal");
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("shutting down stream service");
                session.stop().await;
                break;
            }
            tick = ticks.recv() => {
                match tick {
                    Some(tick) => debug!(instrument = %tick.instrument, price = tick.price, "tick"),
                    None => break,
                }
            }
            generated = signals.recv() => {
                match generated {
                    Some(signal) => info!(
                        instrument = %signal.instrument,
                        direction = ?signal.direction,
                        confidence = signal.confidence,
                        rsi = signal.rsi,
                        price = signal.price,
                        "signal"
                    ),
                    None => break,
                }
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(connected = *connection.borrow(), "connection state changed");
            }
        }
    }

    Ok(())
}
