//! VL53L0X time-of-flight ranging sensor.
//!
//! Bring-up follows ST's reference API (UM2039): data init, static init
//! (reference SPAD selection, default tuning settings, interrupt setup,
//! timing budget) and the VHV/phase reference calibrations. After that the
//! chip runs back-to-back continuous ranging and samples are fetched as
//! they become ready.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::{SENSOR_TIMEOUT_MS, VL53L0X_I2C_ADDR};
use crate::error::Error;
use crate::features::Capability;
use crate::peripherals::RangeSensor;

pub const REG_SYSRANGE_START: u8 = 0x00;
pub const REG_SYSTEM_SEQUENCE_CONFIG: u8 = 0x01;
pub const REG_SYSTEM_INTERRUPT_CONFIG_GPIO: u8 = 0x0A;
pub const REG_SYSTEM_INTERRUPT_CLEAR: u8 = 0x0B;
pub const REG_RESULT_INTERRUPT_STATUS: u8 = 0x13;
/// Range in mm, big-endian, inside the RESULT_RANGE_STATUS block (0x14 + 10).
pub const REG_RESULT_RANGE_MM: u8 = 0x1E;
pub const REG_FINAL_RANGE_MIN_COUNT_RATE_RTN_LIMIT: u8 = 0x44;
pub const REG_MSRC_CONFIG_TIMEOUT_MACROP: u8 = 0x46;
pub const REG_PRE_RANGE_CONFIG_VCSEL_PERIOD: u8 = 0x50;
pub const REG_PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI: u8 = 0x51;
pub const REG_MSRC_CONFIG_CONTROL: u8 = 0x60;
pub const REG_FINAL_RANGE_CONFIG_VCSEL_PERIOD: u8 = 0x70;
pub const REG_FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI: u8 = 0x71;
pub const REG_GPIO_HV_MUX_ACTIVE_HIGH: u8 = 0x84;
pub const REG_I2C_STANDARD_MODE: u8 = 0x88;
pub const REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV: u8 = 0x89;
pub const REG_DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD: u8 = 0x4E;
pub const REG_DYNAMIC_SPAD_REF_EN_START_OFFSET: u8 = 0x4F;
pub const REG_GLOBAL_CONFIG_SPAD_ENABLES_REF_0: u8 = 0xB0;
pub const REG_GLOBAL_CONFIG_REF_EN_START_SELECT: u8 = 0xB6;
pub const REG_IDENTIFICATION_MODEL_ID: u8 = 0xC0;

pub const MODEL_ID: u8 = 0xEE;

/// SYSRANGE_START: back-to-back continuous mode.
const MODE_BACK_TO_BACK: u8 = 0x02;
/// SYSTEM_INTERRUPT_CONFIG_GPIO: new sample ready.
const GPIO_NEW_SAMPLE_READY: u8 = 0x04;
/// Return signal rate limit, 0.25 MCPS in 9.7 fixed point.
const SIGNAL_RATE_LIMIT: u16 = 32;
/// MSRC and TCC off, DSS, pre-range and final range on.
const SEQUENCE_RANGING: u8 = 0xE8;

const IO_TIMEOUT_MS: u32 = SENSOR_TIMEOUT_MS as u32;

/// Default tuning settings from the reference API, written during static
/// init. Register 0xFF selects the page.
#[rustfmt::skip]
pub const DEFAULT_TUNING: &[(u8, u8)] = &[
    (0xFF, 0x01), (0x00, 0x00),
    (0xFF, 0x00), (0x09, 0x00), (0x10, 0x00), (0x11, 0x00),
    (0x24, 0x01), (0x25, 0xFF), (0x75, 0x00),
    (0xFF, 0x01), (0x4E, 0x2C), (0x48, 0x00), (0x30, 0x20),
    (0xFF, 0x00), (0x30, 0x09), (0x54, 0x00), (0x31, 0x04), (0x32, 0x03),
    (0x40, 0x83), (0x46, 0x25), (0x60, 0x00), (0x27, 0x00), (0x50, 0x06),
    (0x51, 0x00), (0x52, 0x96), (0x56, 0x08), (0x57, 0x30), (0x61, 0x00),
    (0x62, 0x00), (0x64, 0x00), (0x65, 0x00), (0x66, 0xA0),
    (0xFF, 0x01), (0x22, 0x32), (0x47, 0x14), (0x49, 0xFF), (0x4A, 0x00),
    (0xFF, 0x00), (0x7A, 0x0A), (0x7B, 0x00), (0x78, 0x21),
    (0xFF, 0x01), (0x23, 0x34), (0x42, 0x00), (0x44, 0xFF), (0x45, 0x26),
    (0x46, 0x05), (0x40, 0x40), (0x0E, 0x06), (0x20, 0x1A), (0x43, 0x40),
    (0xFF, 0x00), (0x34, 0x03), (0x35, 0x44),
    (0xFF, 0x01), (0x31, 0x04), (0x4B, 0x09), (0x4C, 0x05), (0x4D, 0x04),
    (0xFF, 0x00), (0x44, 0x00), (0x45, 0x20), (0x47, 0x08), (0x48, 0x28),
    (0x67, 0x00), (0x70, 0x04), (0x71, 0x01), (0x72, 0xFE), (0x76, 0x00),
    (0x77, 0x00),
    (0xFF, 0x01), (0x0D, 0x01),
    (0xFF, 0x00), (0x80, 0x01), (0x01, 0xF8),
    (0xFF, 0x01), (0x8E, 0x01), (0x00, 0x01), (0xFF, 0x00), (0x80, 0x00),
];

// Timing budget overheads in µs.
const START_OVERHEAD_US: u32 = 1910;
const END_OVERHEAD_US: u32 = 960;
const MSRC_OVERHEAD_US: u32 = 660;
const TCC_OVERHEAD_US: u32 = 590;
const DSS_OVERHEAD_US: u32 = 690;
const PRE_RANGE_OVERHEAD_US: u32 = 660;
const FINAL_RANGE_OVERHEAD_US: u32 = 550;
const MIN_TIMING_BUDGET_US: u32 = 20_000;

/// Which steps of the ranging sequence are enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceSteps {
    pub tcc: bool,
    pub msrc: bool,
    pub dss: bool,
    pub pre_range: bool,
    pub final_range: bool,
}

impl SequenceSteps {
    pub fn from_config(config: u8) -> Self {
        Self {
            tcc: config & 0x10 != 0,
            dss: config & 0x08 != 0,
            msrc: config & 0x04 != 0,
            pre_range: config & 0x40 != 0,
            final_range: config & 0x80 != 0,
        }
    }
}

/// Step timeouts as read back from the chip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceTimeouts {
    pub pre_range_vcsel_pclks: u8,
    pub final_range_vcsel_pclks: u8,
    pub msrc_dss_tcc_us: u32,
    pub pre_range_mclks: u32,
    pub pre_range_us: u32,
    pub final_range_us: u32,
}

fn decode_vcsel_period(reg: u8) -> u8 {
    reg.wrapping_add(1) << 1
}

/// Macro period in ns for a VCSEL period in PCLKs.
fn macro_period_ns(vcsel_pclks: u8) -> u32 {
    (2304 * u32::from(vcsel_pclks) * 1655 + 500) / 1000
}

fn decode_timeout(reg: u16) -> u32 {
    (u32::from(reg & 0x00FF) << (reg >> 8)) + 1
}

fn encode_timeout(mclks: u32) -> u16 {
    if mclks == 0 {
        return 0;
    }
    let mut lsb = mclks - 1;
    let mut msb = 0u16;
    while lsb & 0xFFFF_FF00 != 0 {
        lsb >>= 1;
        msb += 1;
    }
    (msb << 8) | (lsb & 0xFF) as u16
}

fn timeout_mclks_to_us(mclks: u32, vcsel_pclks: u8) -> u32 {
    let macro_ns = macro_period_ns(vcsel_pclks);
    (mclks * macro_ns + 500) / 1000
}

fn timeout_us_to_mclks(us: u32, vcsel_pclks: u8) -> u32 {
    let macro_ns = macro_period_ns(vcsel_pclks);
    (us * 1000 + macro_ns / 2) / macro_ns
}

/// Budget spent by every enabled step except the final range.
fn budget_before_final_us(steps: SequenceSteps, timeouts: &SequenceTimeouts) -> u32 {
    let mut used = START_OVERHEAD_US + END_OVERHEAD_US;
    if steps.tcc {
        used += timeouts.msrc_dss_tcc_us + TCC_OVERHEAD_US;
    }
    if steps.dss {
        used += 2 * (timeouts.msrc_dss_tcc_us + DSS_OVERHEAD_US);
    } else if steps.msrc {
        used += timeouts.msrc_dss_tcc_us + MSRC_OVERHEAD_US;
    }
    if steps.pre_range {
        used += timeouts.pre_range_us + PRE_RANGE_OVERHEAD_US;
    }
    used
}

/// Total measurement time for the given sequence.
pub fn timing_budget_us(steps: SequenceSteps, timeouts: &SequenceTimeouts) -> u32 {
    let mut budget = budget_before_final_us(steps, timeouts);
    if steps.final_range {
        budget += timeouts.final_range_us + FINAL_RANGE_OVERHEAD_US;
    }
    budget
}

/// Final range timeout register value that makes the whole sequence take
/// `budget_us`.
pub fn final_range_timeout(
    budget_us: u32,
    steps: SequenceSteps,
    timeouts: &SequenceTimeouts,
) -> Result<u16, Error> {
    if budget_us < MIN_TIMING_BUDGET_US {
        return Err(Error::InvalidData);
    }
    let used = budget_before_final_us(steps, timeouts) + FINAL_RANGE_OVERHEAD_US;
    if used > budget_us {
        return Err(Error::InvalidData);
    }
    let mut mclks = timeout_us_to_mclks(budget_us - used, timeouts.final_range_vcsel_pclks);
    if steps.pre_range {
        mclks += timeouts.pre_range_mclks;
    }
    Ok(encode_timeout(mclks))
}

/// Keep `count` reference SPADs enabled, starting at the first SPAD of the
/// right type, and clear every other bit of the factory map.
pub fn select_reference_spads(map: &mut [u8; 6], count: u8, aperture: bool) {
    let first = if aperture { 12 } else { 0 };
    let mut enabled = 0u8;
    for i in 0..48usize {
        let bit = 1u8 << (i % 8);
        if i < first || enabled == count {
            map[i / 8] &= !bit;
        } else if map[i / 8] & bit != 0 {
            enabled += 1;
        }
    }
}

pub struct Vl53l0x<I2C> {
    i2c: I2C,
    address: u8,
    /// Private register value the start sequence has to restore.
    stop_variable: u8,
    timing_budget_us: u32,
}

impl<I2C: I2c> Vl53l0x<I2C> {
    /// Identify the chip, load its tuning and calibrate. Does not start
    /// ranging.
    pub fn new<D: DelayNs>(i2c: I2C, delay: &mut D) -> Result<Self, Error> {
        let mut sensor = Self {
            i2c,
            address: VL53L0X_I2C_ADDR,
            stop_variable: 0,
            timing_budget_us: 0,
        };

        let id = sensor
            .read_register(REG_IDENTIFICATION_MODEL_ID)
            .map_err(|_| Error::Unavailable(Capability::DistanceSensor))?;
        if id != MODEL_ID {
            #[cfg(feature = "defmt")]
            defmt::warn!("VL53L0X: unexpected model id {=u8:#x}", id);
            return Err(Error::InvalidData);
        }

        sensor.data_init()?;
        sensor.static_init(delay)?;
        sensor.reference_calibration(delay)?;

        #[cfg(feature = "defmt")]
        defmt::info!("VL53L0X: ready, timing budget {=u32} us", sensor.timing_budget_us);
        Ok(sensor)
    }

    fn data_init(&mut self) -> Result<(), Error> {
        // 2V8 I/O mode.
        let pad = self.read_register(REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV)?;
        self.write_register(REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, pad | 0x01)?;

        self.write_register(REG_I2C_STANDARD_MODE, 0x00)?;
        self.enter_private_page()?;
        self.stop_variable = self.read_register(0x91)?;
        self.leave_private_page()?;

        // No MSRC / pre-range signal rate limit checks.
        let msrc = self.read_register(REG_MSRC_CONFIG_CONTROL)?;
        self.write_register(REG_MSRC_CONFIG_CONTROL, msrc | 0x12)?;
        self.write_register_u16(REG_FINAL_RANGE_MIN_COUNT_RATE_RTN_LIMIT, SIGNAL_RATE_LIMIT)?;
        self.write_register(REG_SYSTEM_SEQUENCE_CONFIG, 0xFF)
    }

    fn static_init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        let (count, aperture) = self.spad_info(delay)?;
        let mut map = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_GLOBAL_CONFIG_SPAD_ENABLES_REF_0], &mut map)
            .map_err(|_| Error::Bus)?;

        self.write_register(0xFF, 0x01)?;
        self.write_register(REG_DYNAMIC_SPAD_REF_EN_START_OFFSET, 0x00)?;
        self.write_register(REG_DYNAMIC_SPAD_NUM_REQUESTED_REF_SPAD, 0x2C)?;
        self.write_register(0xFF, 0x00)?;
        self.write_register(REG_GLOBAL_CONFIG_REF_EN_START_SELECT, 0xB4)?;

        select_reference_spads(&mut map, count, aperture);
        let mut frame = [0u8; 7];
        frame[0] = REG_GLOBAL_CONFIG_SPAD_ENABLES_REF_0;
        frame[1..].copy_from_slice(&map);
        self.i2c.write(self.address, &frame).map_err(|_| Error::Bus)?;

        for &(reg, value) in DEFAULT_TUNING {
            self.write_register(reg, value)?;
        }

        self.write_register(REG_SYSTEM_INTERRUPT_CONFIG_GPIO, GPIO_NEW_SAMPLE_READY)?;
        // Interrupt pin active low.
        let mux = self.read_register(REG_GPIO_HV_MUX_ACTIVE_HIGH)?;
        self.write_register(REG_GPIO_HV_MUX_ACTIVE_HIGH, mux & !0x10)?;
        self.write_register(REG_SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        let budget = self.measurement_timing_budget()?;
        self.write_register(REG_SYSTEM_SEQUENCE_CONFIG, SEQUENCE_RANGING)?;
        self.set_measurement_timing_budget(budget)
    }

    /// Reference SPAD count and type from the chip's NVM.
    fn spad_info<D: DelayNs>(&mut self, delay: &mut D) -> Result<(u8, bool), Error> {
        self.enter_private_page()?;
        self.write_register(0xFF, 0x06)?;
        let r83 = self.read_register(0x83)?;
        self.write_register(0x83, r83 | 0x04)?;
        self.write_register(0xFF, 0x07)?;
        self.write_register(0x81, 0x01)?;
        self.write_register(0x80, 0x01)?;
        self.write_register(0x94, 0x6B)?;
        self.write_register(0x83, 0x00)?;

        self.wait_for(delay, |s| Ok(s.read_register(0x83)? != 0x00))?;

        self.write_register(0x83, 0x01)?;
        let info = self.read_register(0x92)?;

        self.write_register(0x81, 0x00)?;
        self.write_register(0xFF, 0x06)?;
        let r83 = self.read_register(0x83)?;
        self.write_register(0x83, r83 & !0x04)?;
        self.write_register(0xFF, 0x01)?;
        self.leave_private_page()?;

        Ok((info & 0x7F, info & 0x80 != 0))
    }

    fn reference_calibration<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        // VHV, then phase.
        self.write_register(REG_SYSTEM_SEQUENCE_CONFIG, 0x01)?;
        self.single_calibration(delay, 0x40)?;
        self.write_register(REG_SYSTEM_SEQUENCE_CONFIG, 0x02)?;
        self.single_calibration(delay, 0x00)?;
        self.write_register(REG_SYSTEM_SEQUENCE_CONFIG, SEQUENCE_RANGING)
    }

    fn single_calibration<D: DelayNs>(&mut self, delay: &mut D, vhv_init: u8) -> Result<(), Error> {
        self.write_register(REG_SYSRANGE_START, 0x01 | vhv_init)?;
        self.wait_for(delay, |s| s.sample_ready())?;
        self.write_register(REG_SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        self.write_register(REG_SYSRANGE_START, 0x00)
    }

    fn sequence(&mut self) -> Result<(SequenceSteps, SequenceTimeouts), Error> {
        let steps = SequenceSteps::from_config(self.read_register(REG_SYSTEM_SEQUENCE_CONFIG)?);

        let pre_vcsel = decode_vcsel_period(self.read_register(REG_PRE_RANGE_CONFIG_VCSEL_PERIOD)?);
        let msrc_mclks = u32::from(self.read_register(REG_MSRC_CONFIG_TIMEOUT_MACROP)?) + 1;
        let pre_range_mclks =
            decode_timeout(self.read_register_u16(REG_PRE_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);
        let final_vcsel =
            decode_vcsel_period(self.read_register(REG_FINAL_RANGE_CONFIG_VCSEL_PERIOD)?);
        let mut final_range_mclks =
            decode_timeout(self.read_register_u16(REG_FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI)?);
        if steps.pre_range {
            final_range_mclks = final_range_mclks.saturating_sub(pre_range_mclks);
        }

        let timeouts = SequenceTimeouts {
            pre_range_vcsel_pclks: pre_vcsel,
            final_range_vcsel_pclks: final_vcsel,
            msrc_dss_tcc_us: timeout_mclks_to_us(msrc_mclks, pre_vcsel),
            pre_range_mclks,
            pre_range_us: timeout_mclks_to_us(pre_range_mclks, pre_vcsel),
            final_range_us: timeout_mclks_to_us(final_range_mclks, final_vcsel),
        };
        Ok((steps, timeouts))
    }

    fn measurement_timing_budget(&mut self) -> Result<u32, Error> {
        let (steps, timeouts) = self.sequence()?;
        Ok(timing_budget_us(steps, &timeouts))
    }

    fn set_measurement_timing_budget(&mut self, budget_us: u32) -> Result<(), Error> {
        let (steps, timeouts) = self.sequence()?;
        if steps.final_range {
            let timeout = final_range_timeout(budget_us, steps, &timeouts)?;
            self.write_register_u16(REG_FINAL_RANGE_CONFIG_TIMEOUT_MACROP_HI, timeout)?;
        }
        self.timing_budget_us = budget_us;
        Ok(())
    }

    pub fn timing_budget_us(&self) -> u32 {
        self.timing_budget_us
    }

    /// Start continuous ranging; samples are then fetched with `read_mm`.
    pub fn start_continuous(&mut self) -> Result<(), Error> {
        self.enter_private_page()?;
        self.write_register(0x91, self.stop_variable)?;
        self.leave_private_page()?;
        self.write_register(REG_SYSRANGE_START, MODE_BACK_TO_BACK)
    }

    /// A new sample is waiting.
    pub fn sample_ready(&mut self) -> Result<bool, Error> {
        Ok(self.read_register(REG_RESULT_INTERRUPT_STATUS)? & 0x07 != 0)
    }

    /// Poll `done` once per millisecond until it holds or the I/O timeout
    /// runs out.
    fn wait_for<D: DelayNs>(
        &mut self,
        delay: &mut D,
        mut done: impl FnMut(&mut Self) -> Result<bool, Error>,
    ) -> Result<(), Error> {
        for _ in 0..=IO_TIMEOUT_MS {
            if done(self)? {
                return Ok(());
            }
            delay.delay_ms(1);
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("VL53L0X: timeout");
        Err(Error::Timeout)
    }

    fn enter_private_page(&mut self) -> Result<(), Error> {
        self.write_register(0x80, 0x01)?;
        self.write_register(0xFF, 0x01)?;
        self.write_register(0x00, 0x00)
    }

    fn leave_private_page(&mut self) -> Result<(), Error> {
        self.write_register(0x00, 0x01)?;
        self.write_register(0xFF, 0x00)?;
        self.write_register(0x80, 0x00)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(buf[0])
    }

    fn read_register_u16(&mut self, reg: u8) -> Result<u16, Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| Error::Bus)
    }

    fn write_register_u16(&mut self, reg: u8, value: u16) -> Result<(), Error> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(|_| Error::Bus)
    }
}

impl<I2C: I2c> RangeSensor for Vl53l0x<I2C> {
    fn read_mm(&mut self) -> Result<u16, Error> {
        if !self.sample_ready()? {
            return Err(Error::NotReady);
        }
        let range = self.read_register_u16(REG_RESULT_RANGE_MM)?;
        self.write_register(REG_SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        Ok(range)
    }
}
