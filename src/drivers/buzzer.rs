//! Passive buzzer driven by toggling a GPIO.
//!
//! Only used for the boot beep, so the tone is generated by busy-waiting
//! rather than tying up a PWM instance.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::Error;

pub struct Buzzer<P> {
    pin: P,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin }
    }

    /// Square wave at `freq_hz` for `duration_ms`, blocking. The pin is
    /// left low.
    pub fn tone<D: DelayNs>(&mut self, delay: &mut D, freq_hz: u32, duration_ms: u32) -> Result<(), Error> {
        if freq_hz == 0 {
            delay.delay_ms(duration_ms);
            return Ok(());
        }
        let half_period_us = 500_000 / freq_hz;
        let cycles = u64::from(freq_hz) * u64::from(duration_ms) / 1000;
        for _ in 0..cycles {
            self.pin.set_high().map_err(|_| Error::Bus)?;
            delay.delay_us(half_period_us);
            self.pin.set_low().map_err(|_| Error::Bus)?;
            delay.delay_us(half_period_us);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};
    use std::vec::Vec;

    #[test]
    fn tone_toggles_once_per_cycle() {
        // 1 kHz for 3 ms: three high/low pairs.
        let mut expectations = Vec::from([Transaction::set(State::Low)]);
        for _ in 0..3 {
            expectations.push(Transaction::set(State::High));
            expectations.push(Transaction::set(State::Low));
        }
        let mut pin = Mock::new(&expectations);
        let mut buzzer = Buzzer::new(pin.clone());
        buzzer.tone(&mut NoopDelay::new(), 1000, 3).unwrap();
        pin.done();
    }

    #[test]
    fn zero_frequency_is_silence() {
        let mut pin = Mock::new(&[Transaction::set(State::Low)]);
        let mut buzzer = Buzzer::new(pin.clone());
        buzzer.tone(&mut NoopDelay::new(), 0, 100).unwrap();
        pin.done();
    }
}
