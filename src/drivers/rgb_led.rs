//! Status indicator on three GPIO lines (common-cathode RGB LED).
//!
//! Each channel is either on or off; a channel lights when its colour
//! component is at least half scale.

use embedded_hal::digital::{OutputPin, PinState};

use crate::peripherals::{Color, Indicator};

pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    color: Color,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> RgbLed<R, G, B> {
    /// Takes the three pins and drives them all low.
    pub fn new(red: R, green: G, blue: B) -> Self {
        let mut led = Self {
            red,
            green,
            blue,
            color: Color::OFF,
        };
        led.apply(Color::OFF);
        led
    }

    pub fn color(&self) -> Color {
        self.color
    }

    fn apply(&mut self, color: Color) {
        // A stuck line only affects one channel; keep driving the others.
        let _ = self.red.set_state(level(color.r));
        let _ = self.green.set_state(level(color.g));
        let _ = self.blue.set_state(level(color.b));
        self.color = color;
    }
}

fn level(component: u8) -> PinState {
    PinState::from(component >= 0x80)
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> Indicator for RgbLed<R, G, B> {
    fn set_color(&mut self, color: Color) {
        self.apply(color);
    }
}
