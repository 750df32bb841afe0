//! Configuration types.
//!
//! All settings are plain values passed explicitly into each component; there
//! is no process-wide settings store.

mod print_config;

pub use print_config::PrintConfig;
