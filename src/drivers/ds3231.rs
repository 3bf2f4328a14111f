//! DS3231 real-time clock driver.
//!
//! Reference: Maxim DS3231 datasheet (19-5170). Time registers are BCD;
//! the hour register may be in 12 h or 24 h mode depending on who set it
//! last. The die temperature is a 10-bit two's complement value in
//! 0.25 °C steps.

use core::fmt::Write as _;

use embedded_hal::i2c::I2c;

use crate::config::DS3231_I2C_ADDR;
use crate::error::Error;
use crate::features::Capability;
use crate::peripherals::{ClockSource, ClockString};

/// REG00..REG06: seconds, minutes, hours, weekday, date, month/century, year.
pub const REG_SECONDS: u8 = 0x00;
/// REG0F: status (OSF, EN32kHz, BSY, A2F, A1F).
pub const REG_STATUS: u8 = 0x0F;
/// REG11: temperature MSB (integer part, signed).
pub const REG_TEMP_MSB: u8 = 0x11;

/// Oscillator-stop flag: time is not trustworthy.
pub const STATUS_OSF: u8 = 1 << 7;
/// 12 h mode bit in the hour register.
const HOUR_12H: u8 = 1 << 6;
/// PM bit in 12 h mode.
const HOUR_PM: u8 = 1 << 5;
/// Century bit in the month register.
const MONTH_CENTURY: u8 = 1 << 7;

#[inline]
pub const fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

#[inline]
pub const fn bin_to_bcd(bin: u8) -> u8 {
    ((bin / 10) << 4) | (bin % 10)
}

/// Decode the hour register into 0..=23.
pub const fn decode_hour(raw: u8) -> u8 {
    if raw & HOUR_12H != 0 {
        let hour = bcd_to_bin(raw & 0x1F) % 12;
        if raw & HOUR_PM != 0 {
            hour + 12
        } else {
            hour
        }
    } else {
        bcd_to_bin(raw & 0x3F)
    }
}

/// Decode REG11/REG12 into °C.
pub fn decode_temperature(msb: u8, lsb: u8) -> f32 {
    let quarter_degrees = ((msb as i8 as i16) << 2) | i16::from(lsb >> 6);
    f32::from(quarter_degrees) * 0.25
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self { year, month, day, hour, minute, second }
    }

    /// Within the range the chip can store (2000-2199).
    pub fn is_valid(&self) -> bool {
        (2000..2200).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Decode REG00..REG06.
    pub fn from_registers(regs: &[u8; 7]) -> Result<Self, Error> {
        let century = if regs[5] & MONTH_CENTURY != 0 { 100 } else { 0 };
        let dt = Self {
            second: bcd_to_bin(regs[0] & 0x7F),
            minute: bcd_to_bin(regs[1] & 0x7F),
            hour: decode_hour(regs[2]),
            day: bcd_to_bin(regs[4] & 0x3F),
            month: bcd_to_bin(regs[5] & 0x1F),
            year: 2000 + century + u16::from(bcd_to_bin(regs[6])),
        };
        if dt.is_valid() {
            Ok(dt)
        } else {
            Err(Error::InvalidData)
        }
    }

    /// Encode into REG00..REG06, always in 24 h mode. The weekday register
    /// is not tracked and written as 1.
    pub fn to_registers(&self) -> [u8; 7] {
        let offset = self.year.saturating_sub(2000);
        let century = if offset >= 100 { MONTH_CENTURY } else { 0 };
        [
            bin_to_bcd(self.second),
            bin_to_bcd(self.minute),
            bin_to_bcd(self.hour),
            1,
            bin_to_bcd(self.day),
            bin_to_bcd(self.month) | century,
            bin_to_bcd((offset % 100) as u8),
        ]
    }

    /// `HH:MM:SS`
    pub fn time_string(&self) -> ClockString {
        let mut s = ClockString::new();
        let _ = write!(s, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        s
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> ClockString {
        let mut s = ClockString::new();
        let _ = write!(s, "{:04}-{:02}-{:02}", self.year, self.month, self.day);
        s
    }
}

pub struct Ds3231<I2C> {
    i2c: I2C,
    address: u8,
    /// Last time read successfully, shown when a read fails.
    last: DateTime,
}

impl<I2C: I2c> Ds3231<I2C> {
    /// Probe the chip at its fixed address and take a first reading.
    pub fn new(i2c: I2C) -> Result<Self, Error> {
        let mut rtc = Self {
            i2c,
            address: DS3231_I2C_ADDR,
            last: DateTime::new(2000, 1, 1, 0, 0, 0),
        };
        rtc.read_register(REG_STATUS)
            .map_err(|_| Error::Unavailable(Capability::RealTimeClock))?;
        if let Ok(now) = rtc.now() {
            rtc.last = now;
        }
        Ok(rtc)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(buf[0])
    }

    pub fn now(&mut self) -> Result<DateTime, Error> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(self.address, &[REG_SECONDS], &mut regs)
            .map_err(|_| Error::Bus)?;
        DateTime::from_registers(&regs)
    }

    /// Set the time and clear the oscillator-stop flag.
    pub fn set(&mut self, dt: &DateTime) -> Result<(), Error> {
        if !dt.is_valid() {
            return Err(Error::InvalidData);
        }
        let regs = dt.to_registers();
        let mut frame = [0u8; 8];
        frame[0] = REG_SECONDS;
        frame[1..].copy_from_slice(&regs);
        self.i2c.write(self.address, &frame).map_err(|_| Error::Bus)?;

        let status = self.read_register(REG_STATUS)?;
        self.i2c
            .write(self.address, &[REG_STATUS, status & !STATUS_OSF])
            .map_err(|_| Error::Bus)?;
        self.last = *dt;
        Ok(())
    }

    /// The oscillator stopped at some point (e.g. battery ran flat).
    pub fn lost_power(&mut self) -> Result<bool, Error> {
        Ok(self.read_register(REG_STATUS)? & STATUS_OSF != 0)
    }

    pub fn read_temperature(&mut self) -> Result<f32, Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_TEMP_MSB], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(decode_temperature(buf[0], buf[1]))
    }

    fn refresh(&mut self) -> DateTime {
        match self.now() {
            Ok(now) => self.last = now,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("RTC read failed: {}", _e);
            }
        }
        self.last
    }

}

impl<I2C: I2c> ClockSource for Ds3231<I2C> {
    fn now_string(&mut self) -> ClockString {
        self.refresh().time_string()
    }

    fn date_string(&mut self) -> ClockString {
        self.refresh().date_string()
    }

    fn temperature(&mut self) -> f32 {
        self.read_temperature().unwrap_or(0.0)
    }
}
