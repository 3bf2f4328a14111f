//! Collaborator interfaces consumed by the navigation engine.
//!
//! Every call is synchronous and may block for bounded hardware-timing
//! reasons; the engine does not move on until it returns.

use core::fmt::Write as _;

use crate::config::DISTANCE_NO_READING_MM;
use crate::error::Error;

/// Fixed-capacity text for clock readouts (`HH:MM:SS`, `YYYY-MM-DD`).
pub type ClockString = heapless::String<16>;

/// 24-bit colour for the status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const OFF: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_off(&self) -> bool {
        *self == Color::OFF
    }
}

/// The OLED panel.
pub trait Renderer {
    /// Two centred lines (boot splash, sleep message).
    fn show_splash(&mut self, line1: &str, line2: &str);

    /// Idle screen: clock, RTC temperature, distance (mm) and laser state.
    fn draw_home(&mut self, time: &str, temperature: f32, distance_mm: u16, laser_on: bool);

    /// Titled list with a cursor on `selected`.
    fn draw_menu(&mut self, title: &str, items: &[&str], selected: usize);

    fn draw_centered(&mut self, text: &str);

    /// Top-aligned lines of plain text.
    fn draw_lines(&mut self, lines: &[&str]);

    fn power_on(&mut self);

    fn power_off(&mut self);
}

/// RGB status indicator.
pub trait Indicator {
    fn set_color(&mut self, color: Color);

    fn off(&mut self) {
        self.set_color(Color::OFF);
    }

    fn red(&mut self) {
        self.set_color(Color::RED);
    }

    fn green(&mut self) {
        self.set_color(Color::GREEN);
    }

    fn blue(&mut self) {
        self.set_color(Color::BLUE);
    }

    fn yellow(&mut self) {
        self.set_color(Color::YELLOW);
    }
}

pub trait Laser {
    fn on(&mut self);

    fn off(&mut self);

    fn is_on(&self) -> bool;

    fn toggle(&mut self) {
        if self.is_on() {
            self.off();
        } else {
            self.on();
        }
    }
}

/// USB keyboard emulation.
pub trait KeyboardEmulation {
    /// Start the predefined keystroke sequence. Fire-and-forget: a call while
    /// a sequence is still being typed does nothing.
    fn run_predefined_action(&mut self);

    /// A sequence is currently being typed.
    fn is_busy(&self) -> bool;
}

/// Real-time clock.
pub trait ClockSource {
    fn now_string(&mut self) -> ClockString;

    fn date_string(&mut self) -> ClockString;

    /// Die temperature in °C.
    fn temperature(&mut self) -> f32;
}

/// Time-of-flight range sensor.
pub trait RangeSensor {
    /// Latest range in millimetres, `Err(Error::NotReady)` when no new
    /// sample is available yet.
    fn read_mm(&mut self) -> Result<u16, Error>;
}

/// A clock that failed to initialise shows midnight and 0 °C.
impl<C: ClockSource> ClockSource for Option<C> {
    fn now_string(&mut self) -> ClockString {
        match self {
            Some(clock) => clock.now_string(),
            None => clock_text("00:00:00"),
        }
    }

    fn date_string(&mut self) -> ClockString {
        match self {
            Some(clock) => clock.date_string(),
            None => clock_text("----------"),
        }
    }

    fn temperature(&mut self) -> f32 {
        match self {
            Some(clock) => clock.temperature(),
            None => 0.0,
        }
    }
}

impl<S: RangeSensor> RangeSensor for Option<S> {
    fn read_mm(&mut self) -> Result<u16, Error> {
        match self {
            Some(sensor) => sensor.read_mm(),
            None => Ok(DISTANCE_NO_READING_MM),
        }
    }
}

pub(crate) fn clock_text(text: &str) -> ClockString {
    let mut s = ClockString::new();
    let _ = s.write_str(text);
    s
}
