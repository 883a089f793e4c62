//! Subcommand implementations.

pub mod arbiter;
pub mod config;
pub mod event;
pub mod joystick;
pub mod network;
