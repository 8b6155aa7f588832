//! Quote-feed integration: wire protocol, transport seam, and the
//! resilient streaming client.

pub mod client;
pub mod connector;
pub mod protocol;
pub mod subscriptions;

pub use client::{ClientEvent, ConnectionState, ConnectionStatus, QuotexClient};
pub use connector::{Connector, MockConnector, MockOutcome, MockRemote, WsConnector};
pub use protocol::Frame;
pub use subscriptions::SubscriptionSet;
