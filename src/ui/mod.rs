//! User interface subsystem - OLED display + physical buttons.
//!
//! The navigation engine maintains a state machine that reacts to button
//! events and the proximity alarm, rendering the current view on the OLED.
//!
//! ## Components
//!
//! - **Input**: 3 tactile switches with confirm-delay debouncing (UP, DOWN, SELECT)
//! - **Menu**: root menu entries derived from the capability table
//! - **Nav**: the screen state machine
//! - **Display**: SSD1306 128×64 OLED via I²C (embedded builds)

#[cfg(feature = "embedded")]
pub mod buttons;
#[cfg(feature = "embedded")]
pub mod display;
pub mod input;
pub mod menu;
pub mod nav;

#[cfg(test)]
mod tests;

/// Screens (views) the UI can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavState {
    /// Idle - clock, temperature, distance, laser indicator.
    Home,
    /// Root menu list.
    RootMenu,
    /// Live distance readout.
    DistanceView,
    /// Laser on/off.
    LaserView,
    /// Status LED colour cycling.
    LedTest,
    /// Keyboard emulation trigger.
    BadUsbView,
    /// Date / firmware info.
    SettingsView,
    /// Display and indicators off until any button is pressed.
    Sleep,
}

/// Physical buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Up,
    Down,
    Select,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Up, Channel::Down, Channel::Select];

    pub const fn index(self) -> usize {
        match self {
            Channel::Up => 0,
            Channel::Down => 1,
            Channel::Select => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    Press,
    Release,
    LongPress,
}

/// Button event after debouncing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvent {
    pub channel: Channel,
    pub kind: EventKind,
}

impl InputEvent {
    pub const fn new(channel: Channel, kind: EventKind) -> Self {
        Self { channel, kind }
    }

    /// The button this event activates. Screens act on a completed press:
    /// a short release or a long press.
    pub fn activated(&self) -> Option<Channel> {
        match self.kind {
            EventKind::Release | EventKind::LongPress => Some(self.channel),
            EventKind::Press => None,
        }
    }
}
