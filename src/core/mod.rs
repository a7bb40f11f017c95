//! Core application: event loop, state and input handling

pub mod app;
pub mod events;
pub mod state;
