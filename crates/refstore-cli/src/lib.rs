//! refstore-cli library
//!
//! Exposes the argument parser and command implementations so they can be
//! tested without spawning the binary.

pub mod cli;

// Make commands module available for internal tests only
#[doc(hidden)]
pub mod commands;

pub use cli::{Cli, Commands};
