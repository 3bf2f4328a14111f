//! USB Device subsystem - presents a HID keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. A single boot-protocol keyboard interface is exposed;
//! it stays idle until the keyboard-emulation feature is triggered from
//! the menu.

pub mod hid_device;
