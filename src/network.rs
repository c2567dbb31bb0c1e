//! Representation and handling of combinational netlists

mod gates;
pub mod generators;
mod network;
mod signal;
pub mod stats;

pub use gates::{Gate, GateType};
pub use network::{Network, NetworkError};
pub use signal::{Direction, Driver, Net};
