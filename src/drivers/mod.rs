//! Peripheral drivers, generic over `embedded-hal` 1.0 so they run against
//! mocks on the host and against `embassy-nrf` on the target.

pub mod buzzer;
pub mod ds3231;
pub mod laser;
pub mod rgb_led;
pub mod vl53l0x;

pub use buzzer::Buzzer;
pub use ds3231::{DateTime, Ds3231};
pub use laser::LaserPointer;
pub use rgb_led::RgbLed;
pub use vl53l0x::Vl53l0x;
