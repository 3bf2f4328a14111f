//! Mauther handheld firmware.
//!
//! Everything except the hardware wiring lives in this library so that
//! `cargo test` runs on the host:
//!
//! - `ui::input`   - debounced button events
//! - `alarm`       - hysteresis proximity alarm
//! - `features`    - capability table
//! - `ui::nav`     - screen state machine
//! - `control`     - per-tick orchestration
//! - `drivers`     - `embedded-hal` drivers for the on-board chips
//! - `hid`         - keyboard reports and the keystroke script
//!
//! With the `embedded` feature the crate also provides the SSD1306
//! renderer, the nRF button pins and the USB keyboard used by `main.rs`.

#![cfg_attr(not(test), no_std)]

pub mod alarm;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod features;
pub mod hid;
pub mod peripherals;
pub mod ui;

#[cfg(feature = "embedded")]
pub mod usb;

pub use error::Error;
pub use features::{Capability, Features};
