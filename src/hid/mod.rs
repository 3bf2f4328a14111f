//! USB HID keyboard reports and the keystroke scripts built from them.

pub mod keyboard;
pub mod script;


pub use keyboard::KeyboardReport;
pub use script::{Action, Playback, Step, TargetOs};
