//! Laser diode switched by one GPIO (active high).

use embedded_hal::digital::OutputPin;

use crate::peripherals::Laser;

pub struct LaserPointer<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> LaserPointer<P> {
    /// Takes the pin and switches the laser off.
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin, on: false }
    }
}

impl<P: OutputPin> Laser for LaserPointer<P> {
    fn on(&mut self) {
        if self.pin.set_high().is_ok() {
            self.on = true;
        }
    }

    fn off(&mut self) {
        // Record off even if the write failed, so the UI never claims a
        // laser is on after an explicit off.
        let _ = self.pin.set_low();
        self.on = false;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
