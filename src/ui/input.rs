//! Polled button input with confirm-delay debouncing.
//!
//! Three buttons, active low with pull-ups. Every poll samples each line;
//! a level that differs from the last accepted one is re-sampled after the
//! debounce interval (blocking the loop for that long) and dropped as
//! bounce if the two samples disagree.
//!
//! Only completed presses produce events. Releasing after more than the
//! debounce interval yields `Release`. Holding past the long-press threshold
//! yields `LongPress` as soon as a poll sees it, while the button is still
//! down; the release that ends such a press is silent.
//!
//! One pending event is kept; a newer event overwrites an unread one.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, PinState};

use crate::config::{BUTTON_DEBOUNCE_MS, BUTTON_LONG_PRESS_MS};
use crate::ui::{Channel, EventKind, InputEvent};

/// Raw access to the button lines.
pub trait ButtonLines {
    fn level(&mut self, channel: Channel) -> PinState;
}

/// Pins ordered `[up, down, select]`. A pin that fails to read is treated
/// as released.
impl<P: InputPin> ButtonLines for [P; 3] {
    fn level(&mut self, channel: Channel) -> PinState {
        match self[channel.index()].is_low() {
            Ok(true) => PinState::Low,
            _ => PinState::High,
        }
    }
}

/// Debounce state of one button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonChannel {
    pub channel: Channel,
    /// Last confirmed raw level.
    pub raw_level: PinState,
    /// Debounced "held" state.
    pub pressed: bool,
    pub press_start_ms: u64,
    pub long_press_fired: bool,
}

impl ButtonChannel {
    const fn released(channel: Channel) -> Self {
        Self {
            channel,
            raw_level: PinState::High,
            pressed: false,
            press_start_ms: 0,
            long_press_fired: false,
        }
    }
}

pub struct Buttons<L, D> {
    lines: L,
    delay: D,
    channels: [ButtonChannel; 3],
    pending: Option<InputEvent>,
    debounce_ms: u32,
    long_press_ms: u64,
}

impl<L: ButtonLines, D: DelayNs> Buttons<L, D> {
    pub fn new(lines: L, delay: D) -> Self {
        Self::with_timing(lines, delay, BUTTON_DEBOUNCE_MS, BUTTON_LONG_PRESS_MS)
    }

    pub fn with_timing(lines: L, delay: D, debounce_ms: u32, long_press_ms: u64) -> Self {
        Self {
            lines,
            delay,
            channels: Channel::ALL.map(ButtonChannel::released),
            pending: None,
            debounce_ms,
            long_press_ms,
        }
    }

    /// Sample all three buttons. `now_ms` is the tick's timestamp.
    pub fn poll(&mut self, now_ms: u64) {
        for channel in Channel::ALL {
            if let Some(event) = self.poll_channel(channel, now_ms) {
                #[cfg(feature = "defmt")]
                defmt::debug!("Button: {}", event);
                self.pending = Some(event);
            }
        }
    }

    fn poll_channel(&mut self, channel: Channel, now_ms: u64) -> Option<InputEvent> {
        let idx = channel.index();
        let first = self.lines.level(channel);

        if first == self.channels[idx].raw_level {
            return self.check_held(idx, now_ms);
        }

        self.delay.delay_ms(self.debounce_ms);
        let confirm = self.lines.level(channel);
        if confirm != first {
            #[cfg(feature = "defmt")]
            defmt::trace!("Button {}: bounce dropped", channel);
            return None;
        }

        let debounce_ms = u64::from(self.debounce_ms);
        let long_press_ms = self.long_press_ms;
        let state = &mut self.channels[idx];
        state.raw_level = confirm;

        match confirm {
            PinState::Low => {
                state.pressed = true;
                state.press_start_ms = now_ms;
                state.long_press_fired = false;
                None
            }
            PinState::High => {
                let held_ms = now_ms.saturating_sub(state.press_start_ms);
                let already_fired = state.long_press_fired;
                state.pressed = false;
                state.long_press_fired = false;

                if already_fired {
                    None
                } else if held_ms > long_press_ms {
                    Some(InputEvent::new(channel, EventKind::LongPress))
                } else if held_ms > debounce_ms {
                    Some(InputEvent::new(channel, EventKind::Release))
                } else {
                    None
                }
            }
        }
    }

    fn check_held(&mut self, idx: usize, now_ms: u64) -> Option<InputEvent> {
        let state = &mut self.channels[idx];
        if !state.pressed || state.long_press_fired {
            return None;
        }
        if now_ms.saturating_sub(state.press_start_ms) > self.long_press_ms {
            state.long_press_fired = true;
            return Some(InputEvent::new(state.channel, EventKind::LongPress));
        }
        None
    }

    /// Take the pending event, if any.
    pub fn consume_event(&mut self) -> Option<InputEvent> {
        self.pending.take()
    }

    /// Debounced level of `channel`; does not touch the pending event.
    pub fn is_held(&self, channel: Channel) -> bool {
        self.channels[channel.index()].pressed
    }

    pub fn channel(&self, channel: Channel) -> &ButtonChannel {
        &self.channels[channel.index()]
    }
}
