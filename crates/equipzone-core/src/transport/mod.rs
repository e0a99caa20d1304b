//! Built-in transport implementations
//!
//! - [`MemoryTransport`]: in-process zones, used for tests and embedding

pub mod memory;

pub use memory::{MemoryTransport, MemoryTransportFactory};
