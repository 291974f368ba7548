//! Emergency-response coordination core.
//!
//! The `dispatch` module carries the SOS pipeline: priority scoring, geo
//! proximity responder lookup, blood-group eligibility filtering, the
//! orchestrating service, the real-time event bus, and the incident report
//! renderer. Storage and outbound messaging sit behind traits so the service
//! can be exercised with in-memory adapters.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod telemetry;
