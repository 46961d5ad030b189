//! Shared state for running import tasks.

mod registry;

pub use registry::TaskRegistry;
