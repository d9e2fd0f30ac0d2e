//! Rate refresh subsystem
//!
//! Features:
//! - HTTP fetch of the upstream daily rates document
//! - Single process-wide snapshot store with atomic replace
//! - Fixed-interval background poller with change detection
//! - Cooperative shutdown between ticks

pub mod poller;
pub mod source;
pub mod store;

pub use poller::RatePoller;
pub use source::{CbrRateSource, RateSource};
pub use store::RateStore;
