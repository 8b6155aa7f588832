//! Error taxonomy for the streaming core.
//!
//! Transport faults are recovered by the connection state machine and only
//! reach callers as state transitions; the variants here are either plumbing
//! errors carried through the transport seam or caller-misuse reports.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport closed")]
    TransportClosed,

    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("no stream endpoints configured")]
    NoEndpoints,

    #[error("session is not authorized")]
    Unauthorized,

    #[error("no instrument selected")]
    NoInstrumentSelected,

    #[error("invalid instrument {0:?}")]
    InvalidInstrument(String),

    #[error("streaming client is not running")]
    NotRunning,
}
