//! Photofinish - race station controller
//!
//! Browser-side controller for a race camera station: paging through captured
//! race images, live camera preview, starting and stopping races, and finish-line
//! calibration, kept consistent with status events pushed by the station server.
//!
//! The controller is platform independent. Inputs are [`message::Message`]s,
//! outputs are [`effect::Effect`]s; the `wasm` module binds both to the page.

mod app;
pub mod config;
pub mod constants;
pub mod effect;
mod handlers;
pub mod keybindings;
pub mod message;
pub mod model;
pub mod push;
pub mod state;
pub mod storage;

pub use app::StationApp;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;

#[cfg(test)]
mod tests;
