//! Capability table - which optional peripherals this firmware drives.
//!
//! Presence is fixed at build time through Cargo features; a present
//! capability can still be knocked out at start-up when its peripheral
//! fails to answer. The navigation engine only ever asks this table, it
//! never looks at feature flags itself.

use crate::error::Error;

/// An optional, peripheral-backed feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Capability {
    DistanceSensor = 0,
    RealTimeClock = 1,
    KeyboardEmulation = 2,
    StatusLed = 3,
    Laser = 4,
    Buzzer = 5,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::DistanceSensor,
        Capability::RealTimeClock,
        Capability::KeyboardEmulation,
        Capability::StatusLed,
        Capability::Laser,
        Capability::Buzzer,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Capability::DistanceSensor => "distance sensor",
            Capability::RealTimeClock => "RTC",
            Capability::KeyboardEmulation => "keyboard emulation",
            Capability::StatusLed => "status LED",
            Capability::Laser => "laser",
            Capability::Buzzer => "buzzer",
        }
    }
}

/// Runtime capability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Features {
    present: u8,
    failed: u8,
}

impl Features {
    /// No optional capability at all.
    pub const fn none() -> Self {
        Self {
            present: 0,
            failed: 0,
        }
    }

    /// Every capability present.
    pub const fn all() -> Self {
        Self::none()
            .with(Capability::DistanceSensor)
            .with(Capability::RealTimeClock)
            .with(Capability::KeyboardEmulation)
            .with(Capability::StatusLed)
            .with(Capability::Laser)
            .with(Capability::Buzzer)
    }

    /// Table matching the Cargo features this crate was built with.
    pub const fn from_build() -> Self {
        let mut features = Self::none();
        if cfg!(feature = "distance-sensor") {
            features = features.with(Capability::DistanceSensor);
        }
        if cfg!(feature = "rtc") {
            features = features.with(Capability::RealTimeClock);
        }
        if cfg!(feature = "badusb") {
            features = features.with(Capability::KeyboardEmulation);
        }
        if cfg!(feature = "led") {
            features = features.with(Capability::StatusLed);
        }
        if cfg!(feature = "laser") {
            features = features.with(Capability::Laser);
        }
        if cfg!(feature = "buzzer") {
            features = features.with(Capability::Buzzer);
        }
        features
    }

    pub const fn with(mut self, cap: Capability) -> Self {
        self.present |= cap.bit();
        self
    }

    pub const fn without(mut self, cap: Capability) -> Self {
        self.present &= !cap.bit();
        self
    }

    /// Built into this firmware. Decides whether the menu shows the entry.
    pub const fn is_present(&self, cap: Capability) -> bool {
        self.present & cap.bit() != 0
    }

    /// Present and initialised successfully.
    pub const fn is_enabled(&self, cap: Capability) -> bool {
        self.is_present(cap) && self.failed & cap.bit() == 0
    }

    /// Record that `cap` failed to initialise. Permanent for this power cycle.
    pub fn mark_unavailable(&mut self, cap: Capability) {
        self.failed |= cap.bit();
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Bring up an optional peripheral.
///
/// Absent capabilities are not initialised at all. On failure the error is
/// logged, the capability disabled, and `None` returned so the caller keeps
/// running with a placeholder.
pub fn init_optional<T>(
    features: &mut Features,
    cap: Capability,
    init: impl FnOnce() -> Result<T, Error>,
) -> Option<T> {
    if !features.is_present(cap) {
        return None;
    }
    match init() {
        Ok(device) => Some(device),
        Err(_err) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} disabled: {}", cap, _err);
            features.mark_unavailable(cap);
            None
        }
    }
}
