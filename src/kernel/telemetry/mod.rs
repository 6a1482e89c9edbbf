//! Controller diagnostics.
//!
//! Telemetry is a READ-ONLY side-effect layer: the session state machine writes
//! to it but never reads from it when deciding a transition.
//! Events carry ids, counts and kinds only, never sampled values.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{AgentEvent, Boundary};
pub use metrics::TelemetrySnapshot;
pub use recorder::{TelemetryHandle, TelemetryRecorder};
