pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod kernel;
pub mod sampler;
pub mod services;

// Re-export the pieces a driver needs
pub use config::AgentConfig;
pub use kernel::controller::{Collaborators, SessionController, Transition};
pub use kernel::datapoint::{DataPoint, DataPointKind, SampleValue};
pub use kernel::session::SessionState;
