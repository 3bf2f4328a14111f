//! nRF GPIO lines for the three buttons.
//!
//! Active-low with internal pull-ups:
//!   - UP     - previous menu entry / toggle / cycle
//!   - DOWN   - next menu entry / laser toggle on Home
//!   - SELECT - open menu / activate entry / back
//!
//! The pins are polled by `ui::input::Buttons` from the control loop.

use embassy_nrf::gpio::{AnyPin, Input, Pull};

/// Button pins in `[up, down, select]` order.
pub type ButtonPins = [Input<'static>; 3];

pub fn button_pins(up: AnyPin, down: AnyPin, select: AnyPin) -> ButtonPins {
    [
        Input::new(up, Pull::Up),
        Input::new(down, Pull::Up),
        Input::new(select, Pull::Up),
    ]
}
