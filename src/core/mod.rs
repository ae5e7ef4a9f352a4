//! Core constants and error types for the BLINK protocol.

mod constants;
mod error;

pub use constants::*;
pub use error::*;
