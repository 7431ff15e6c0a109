//! # twinlight controller
//!
//! Controller side of the twin: reads the registry document, reconciles
//! desired vs. reported into a [`DisplayState`](twinlight_core::DisplayState)
//! and requests new desired values. A small dashboard exposes both
//! operations over HTTP.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod dashboard;

pub use config::ControllerConfig;
pub use controller::{ControllerError, ReadFailurePolicy, ReadOutcome, TwinController};
pub use dashboard::{router, Dashboard};
