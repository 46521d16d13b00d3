//! Core type definitions using newtype patterns for type safety.

mod port;
mod target;

pub use port::{Port, PortSet, PortSpecError};
pub use target::{Target, TargetError};
