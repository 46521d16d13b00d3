//! Configuration management for salmap.

mod settings;

pub use settings::{Paths, Settings};
