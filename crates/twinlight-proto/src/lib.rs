//! # twinlight protocol
//!
//! Wire messages and MQTT topic scheme between a device and its edge core.
//!
//! ## Messages
//!
//! - `ReportMessage`: the device's periodic `actual` value report
//! - `CommandShape`: the three layouts a desired-value update arrives in
//!
//! ## MQTT Topics
//!
//! - Commands: `$hw/events/device/{device_id}/twin/update/document`
//! - Reports: `$hw/events/device/{device_id}/twin/update`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod messages;
pub mod topics;

pub use messages::{CommandShape, ReportMessage};
pub use topics::TopicScheme;
