pub mod controller;
pub mod datapoint;
pub mod handle;
pub mod queue;
pub mod session;
pub mod telemetry;
pub mod time;
