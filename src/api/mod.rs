//! API layer
//!
//! HTTP handlers for:
//! - ActivityPub (actors, inbox/outbox, objects)
//! - Well-known discovery
//! - Metrics (Prometheus)

mod activitypub;
mod converters;
mod dto;
pub mod metrics;
mod wellknown;

pub use converters::*;
pub use dto::*;

pub use activitypub::activitypub_router;
pub use metrics::{metrics_router, track_metrics};
pub use wellknown::wellknown_router;
