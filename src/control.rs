//! Control loop: one `tick` per loop iteration.
//!
//! Buttons are sampled on every tick; the range sensor and the navigation
//! engine run at their own slower rates. The loop never stops on a
//! peripheral error.

use embedded_hal::delay::DelayNs;

use crate::alarm::AlarmDetector;
use crate::config::{DISPLAY_UPDATE_MS, DISTANCE_NO_READING_MM, SENSOR_POLL_MS, SENSOR_TIMEOUT_MS};
use crate::error::Error;
use crate::features::{Capability, Features};
use crate::peripherals::{ClockSource, Indicator, KeyboardEmulation, Laser, RangeSensor, Renderer};
use crate::ui::input::{ButtonLines, Buttons};
use crate::ui::nav::Navigator;

/// Rate-limited range sampling.
///
/// Holds the last good reading. A sensor with no fresh sample for longer
/// than the timeout, or one whose read fails on the bus, reports
/// [`DISTANCE_NO_READING_MM`].
pub struct RangePoller<S> {
    sensor: S,
    poll_ms: u64,
    timeout_ms: u64,
    last_poll_ms: Option<u64>,
    last_sample_ms: u64,
    distance_mm: u16,
}

impl<S: RangeSensor> RangePoller<S> {
    pub fn new(sensor: S) -> Self {
        Self::with_timing(sensor, SENSOR_POLL_MS, SENSOR_TIMEOUT_MS)
    }

    pub fn with_timing(sensor: S, poll_ms: u64, timeout_ms: u64) -> Self {
        Self {
            sensor,
            poll_ms,
            timeout_ms,
            last_poll_ms: None,
            last_sample_ms: 0,
            distance_mm: DISTANCE_NO_READING_MM,
        }
    }

    /// Read the sensor if the poll interval has elapsed. Returns the
    /// current distance either way.
    pub fn poll(&mut self, now_ms: u64) -> u16 {
        let due = match self.last_poll_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.poll_ms,
        };
        if !due {
            return self.distance_mm;
        }
        if self.last_poll_ms.is_none() {
            self.last_sample_ms = now_ms;
        }
        self.last_poll_ms = Some(now_ms);

        match self.sensor.read_mm() {
            Ok(mm) => {
                self.distance_mm = mm;
                self.last_sample_ms = now_ms;
            }
            Err(Error::NotReady) => {
                if now_ms.saturating_sub(self.last_sample_ms) > self.timeout_ms {
                    self.distance_mm = DISTANCE_NO_READING_MM;
                }
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Range read failed: {}", _e);
                self.distance_mm = DISTANCE_NO_READING_MM;
            }
        }
        self.distance_mm
    }

    pub fn distance_mm(&self) -> u16 {
        self.distance_mm
    }
}

/// Everything the main loop drives.
pub struct Controller<B, S, N> {
    buttons: B,
    range: RangePoller<S>,
    alarm: AlarmDetector,
    nav: N,
    features: Features,
    ui_interval_ms: u64,
    last_ui_ms: Option<u64>,
}

impl<L, BD, S, R, I, Lz, K, C, D> Controller<Buttons<L, BD>, S, Navigator<R, I, Lz, K, C, D>>
where
    L: ButtonLines,
    BD: DelayNs,
    S: RangeSensor,
    R: Renderer,
    I: Indicator,
    Lz: Laser,
    K: KeyboardEmulation,
    C: ClockSource,
    D: DelayNs,
{
    pub fn new(
        buttons: Buttons<L, BD>,
        range: RangePoller<S>,
        nav: Navigator<R, I, Lz, K, C, D>,
    ) -> Self {
        let features = *nav.features();
        Self {
            buttons,
            range,
            alarm: AlarmDetector::default(),
            nav,
            features,
            ui_interval_ms: DISPLAY_UPDATE_MS,
            last_ui_ms: None,
        }
    }

    /// Override the navigation update interval (0 runs it on every tick).
    pub fn with_ui_interval(mut self, interval_ms: u64) -> Self {
        self.ui_interval_ms = interval_ms;
        self
    }

    /// Show the first Home frame.
    pub fn start(&mut self, now_ms: u64) {
        self.nav.start(now_ms);
    }

    pub fn tick(&mut self, now_ms: u64) {
        self.buttons.poll(now_ms);

        if self.features.is_enabled(Capability::DistanceSensor) {
            let distance = self.range.poll(now_ms);
            let was_active = self.alarm.is_active();
            let active = self.alarm.update(distance);
            if active != was_active {
                #[cfg(feature = "defmt")]
                defmt::info!("Proximity alarm {} at {} mm", active, distance);
            }
        }

        let due = match self.last_ui_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.ui_interval_ms,
        };
        if due {
            self.last_ui_ms = Some(now_ms);
            let event = self.buttons.consume_event();
            self.nav.update(
                now_ms,
                event,
                self.range.distance_mm(),
                self.alarm.is_active(),
            );
        }
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn distance_mm(&self) -> u16 {
        self.range.distance_mm()
    }

    pub fn navigator(&self) -> &Navigator<R, I, Lz, K, C, D> {
        &self.nav
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator<R, I, Lz, K, C, D> {
        &mut self.nav
    }
}
