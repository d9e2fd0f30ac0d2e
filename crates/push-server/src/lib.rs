//! WebSocket push server for live currency rates
//!
//! Admission-controlled fan-out: authenticated browser sessions open a
//! WebSocket after page load, receive the current snapshot immediately
//! and every accepted rate change afterwards.

pub mod broadcast;
pub mod gate;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod server;
pub mod settings;

pub use broadcast::Broadcaster;
pub use gate::{ConnectionGate, SessionAuth, SessionContext, SessionCookieAuth};
pub use registry::{ClientConnection, ConnectionRegistry};
pub use routes::{create_router, AppState};
pub use server::PushServer;
