//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and thresholds
//! live here so they can be tuned in one place.

use crate::hid::script::TargetOs;

/// Name shown on the boot splash.
pub const PROJECT_NAME: &str = "Mauther";

/// Firmware version (from `Cargo.toml`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Buttons

/// Confirm delay for a raw button transition (ms).
pub const BUTTON_DEBOUNCE_MS: u32 = 20;

/// Held time after which a press counts as a long press (ms).
pub const BUTTON_LONG_PRESS_MS: u64 = 800;

// Control loop

/// Period of the main control loop (ms). Buttons are sampled every tick.
pub const TICK_MS: u64 = 10;

/// Minimum time between two navigation updates / redraws (ms).
pub const DISPLAY_UPDATE_MS: u64 = 100;

/// Inactivity period after which any sub-screen returns to Home (ms).
pub const MENU_TIMEOUT_MS: u64 = 30_000;

/// Rows of the root menu visible at once on the 128×64 panel.
pub const MENU_VISIBLE_ROWS: usize = 5;

// Distance sensor

/// Readings strictly below this raise the proximity alarm (mm).
pub const DISTANCE_ALARM_THRESHOLD_MM: u16 = 1000;

/// Readings strictly above this clear the alarm (mm). Must exceed the
/// threshold; the gap is the hysteresis dead band.
pub const DISTANCE_ALARM_CLEAR_MM: u16 = 1100;

/// Largest distance shown as a number; anything above renders as `---`.
pub const DISTANCE_MAX_RANGE_MM: u16 = 1200;

/// Sentinel for "no valid reading" (sensor timeout or bus error).
pub const DISTANCE_NO_READING_MM: u16 = DISTANCE_MAX_RANGE_MM + 1;

/// Distance passed to the Home screen when the sensor is not fitted.
pub const DISTANCE_NO_SENSOR_MM: u16 = 9999;

/// Interval between two range samples (ms).
pub const SENSOR_POLL_MS: u64 = 100;

/// A sensor without a fresh sample for this long is reported stale (ms).
pub const SENSOR_TIMEOUT_MS: u64 = 500;

// Screens

/// How long the sleep message stays up before the panel powers down (ms).
pub const SLEEP_MESSAGE_MS: u32 = 1000;

/// Settle time after waking, swallows the tail of the wake press (ms).
pub const WAKE_SETTLE_MS: u32 = 100;

/// Settle time after kicking off the keyboard action (ms).
pub const BADUSB_SETTLE_MS: u32 = 500;

/// Boot splash hold time (ms).
pub const SPLASH_MS: u64 = 1000;

// Buzzer (boot sound only)

/// Boot tone frequency (Hz).
pub const BUZZER_BOOT_FREQ_HZ: u32 = 400;

/// Boot tone length (ms).
pub const BUZZER_BOOT_MS: u32 = 100;

/// Per-colour step of the boot LED self test (ms).
pub const LED_SELF_TEST_STEP_MS: u64 = 200;

// Keyboard emulation

/// Host OS the predefined keyboard action targets.
pub const BADUSB_TARGET: TargetOs = if cfg!(feature = "badusb-windows") {
    TargetOs::Windows
} else {
    TargetOs::MacOs
};

/// URL typed by the predefined keyboard action.
pub const BADUSB_URL: &str = "https://www.youtube.com/watch?v=e-xoYTHebs8&autoplay=1&mute=1";

// I²C addresses

pub const OLED_I2C_ADDR: u8 = 0x3C;
pub const VL53L0X_I2C_ADDR: u8 = 0x29;
pub const DS3231_I2C_ADDR: u8 = 0x68;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "mauther";
pub const USB_PRODUCT: &str = "Mauther Keyboard";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 10;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` pins are
// picked in `main.rs`.  Adjust for your custom PCB.
//
//   Button UP      → P0.11   (active low, internal pull-up)
//   Button DOWN    → P0.12
//   Button SELECT  → P0.24
//   I²C SDA        → P0.26   (OLED, VL53L0X, DS3231 share the bus)
//   I²C SCL        → P0.27
//   LED R / G / B  → P0.13 / P0.14 / P0.15   (active high)
//   Laser          → P0.16
//   Buzzer         → P0.17
