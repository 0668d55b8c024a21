//! Core types, form controller, and service wiring for registering Ecoleta collection points.

/// Form state controller and its events and effects.
pub mod form;
/// Map viewport math.
pub mod map;
/// Domain models and identifiers shared by all backends.
pub mod model;
/// Traits describing the backend interfaces.
pub mod ports;
/// Backoff policy for transient failures.
pub mod retry;
/// High-level service facade used by clients.
pub mod service;

pub use form::*;
pub use model::*;
pub use ports::*;
pub use retry::*;
pub use service::*;
