//! Service layer: transport, connection management, session orchestration.

pub mod license;
pub mod quotex;
pub mod session;

pub use license::{AlwaysAuthorized, LicenseGate};
pub use session::StreamingSession;
