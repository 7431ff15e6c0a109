//! # twinlight core
//!
//! Device twin model and the controller/device-agnostic parts of twin
//! synchronization.
//!
//! This crate provides:
//! - The registry document model (`status.twins`) and desired-value patches
//! - A last-known-good cache for reported values
//! - Reconciliation of desired vs. reported into a display state
//! - Multi-shape command parsing tolerant of protocol version drift

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod command;
pub mod display;
pub mod document;
pub mod label;

pub use cache::TwinCache;
pub use command::{CommandParser, Shape};
pub use display::{reconcile, DisplayState};
pub use document::{DeviceTwin, TwinDocument, TwinEntry, TwinPatch, TwinValue};
pub use label::LabelTable;

/// Property tracked by default.
pub const DEFAULT_PROPERTY: &str = "color";

/// Device addressed by default.
pub const DEFAULT_DEVICE_ID: &str = "light-01";

/// Value a device holds before any command arrives.
pub const WAITING: &str = "WAITING";

/// Value the controller shows before any report has been observed.
pub const OFF: &str = "OFF";

/// Declared metadata type for twin values.
pub const STRING_TYPE: &str = "string";
