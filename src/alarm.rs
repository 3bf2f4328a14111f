//! Proximity alarm with hysteresis.
//!
//! The alarm raises when something comes closer than the low threshold and
//! only drops once it is further away than the clear threshold. Readings in
//! between keep the previous state so a target hovering at the boundary
//! does not make the indicator chatter.
//!
//! A reading of `0` means "no reading": it never raises the alarm and, since
//! it does not exceed the clear threshold, never clears it either.

use crate::config::{DISTANCE_ALARM_CLEAR_MM, DISTANCE_ALARM_THRESHOLD_MM};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmDetector {
    low_mm: u16,
    clear_mm: u16,
    active: bool,
}

impl AlarmDetector {
    /// `clear_mm` must be strictly greater than `low_mm`.
    pub const fn new(low_mm: u16, clear_mm: u16) -> Self {
        assert!(clear_mm > low_mm, "clear threshold must exceed alarm threshold");
        Self {
            low_mm,
            clear_mm,
            active: false,
        }
    }

    /// Feed one distance sample and return the new alarm state.
    pub fn update(&mut self, distance_mm: u16) -> bool {
        if !self.active && distance_mm > 0 && distance_mm < self.low_mm {
            self.active = true;
            #[cfg(feature = "defmt")]
            defmt::info!("Alarm: raised at {=u16} mm", distance_mm);
        } else if self.active && distance_mm > self.clear_mm {
            self.active = false;
            #[cfg(feature = "defmt")]
            defmt::info!("Alarm: cleared at {=u16} mm", distance_mm);
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Default for AlarmDetector {
    fn default() -> Self {
        Self::new(DISTANCE_ALARM_THRESHOLD_MM, DISTANCE_ALARM_CLEAR_MM)
    }
}
