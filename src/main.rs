//! Mauther firmware entry point (nRF52840).
//!
//! Brings up the shared I²C bus and the optional peripherals, records
//! which of them answered in the capability table, then drives the
//! control loop every `TICK_MS`.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin as _};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Delay, Instant, Timer};
use embassy_usb::class::hid::HidWriter;
use embassy_usb::UsbDevice;
use embedded_hal_bus::i2c::RefCellDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mauther::config::{
    BADUSB_TARGET, BUZZER_BOOT_FREQ_HZ, BUZZER_BOOT_MS, LED_SELF_TEST_STEP_MS, PROJECT_NAME,
    SPLASH_MS, TICK_MS, VERSION,
};
use mauther::control::{Controller, RangePoller};
use mauther::drivers::{Buzzer, Ds3231, LaserPointer, RgbLed, Vl53l0x};
use mauther::features::init_optional;
use mauther::hid::keyboard::KEYBOARD_REPORT_SIZE;
use mauther::peripherals::{Color, Indicator, Renderer};
use mauther::ui::buttons::button_pins;
use mauther::ui::display::OledRenderer;
use mauther::ui::input::Buttons;
use mauther::ui::nav::{Devices, Navigator};
use mauther::usb::hid_device::{self, UsbDriver, UsbKeyboard};
use mauther::{Capability, Features};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

type I2cBus = RefCell<twim::Twim<'static, TWISPI0>>;

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("{} v{} booting", PROJECT_NAME, VERSION);

    let mut features = Features::from_build();

    // OLED, VL53L0X and DS3231 share one bus.
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let bus: &'static I2cBus = I2C_BUS.init(RefCell::new(twim::Twim::new(
        p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config,
    )));

    let mut display = OledRenderer::new(RefCellDevice::new(bus));
    if let Err(e) = display.init() {
        warn!("OLED init failed: {}", e);
    }
    display.show_splash(PROJECT_NAME, VERSION);

    let mut indicator = RgbLed::new(
        Output::new(p.P0_13, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_14, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_15, Level::Low, OutputDrive::Standard),
    );
    let laser = LaserPointer::new(Output::new(p.P0_16, Level::Low, OutputDrive::Standard));
    let mut buzzer = Buzzer::new(Output::new(p.P0_17, Level::Low, OutputDrive::Standard));

    let clock = init_optional(&mut features, Capability::RealTimeClock, || {
        Ds3231::new(RefCellDevice::new(bus))
    });
    let sensor = init_optional(&mut features, Capability::DistanceSensor, || {
        let mut sensor = Vl53l0x::new(RefCellDevice::new(bus), &mut Delay)?;
        sensor.start_continuous()?;
        Ok(sensor)
    });

    if features.is_present(Capability::KeyboardEmulation) {
        let usb = hid_device::init(p.USBD);
        spawner.must_spawn(usb_task(usb.device));
        spawner.must_spawn(keyboard_task(usb.keyboard_writer));
    }

    if features.is_enabled(Capability::StatusLed) {
        for color in [Color::RED, Color::GREEN, Color::BLUE] {
            indicator.set_color(color);
            Timer::after_millis(LED_SELF_TEST_STEP_MS).await;
        }
        indicator.off();
    }

    if features.is_enabled(Capability::Buzzer) {
        if let Err(e) = buzzer.tone(&mut Delay, BUZZER_BOOT_FREQ_HZ, BUZZER_BOOT_MS) {
            warn!("Boot tone failed: {}", e);
        }
    }

    Timer::after_millis(SPLASH_MS).await;

    let buttons = Buttons::new(
        button_pins(p.P0_11.degrade(), p.P0_12.degrade(), p.P0_24.degrade()),
        Delay,
    );
    let devices = Devices {
        display,
        indicator,
        laser,
        keyboard: UsbKeyboard,
        clock,
    };
    let nav = Navigator::new(devices, Delay, features);
    let mut controller = Controller::new(buttons, RangePoller::new(sensor), nav);

    info!("Capabilities: {}", features);
    controller.start(Instant::now().as_millis());

    loop {
        controller.tick(Instant::now().as_millis());
        Timer::after_millis(TICK_MS).await;
    }
}

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn keyboard_task(writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>) -> ! {
    hid_device::keyboard_task(writer, BADUSB_TARGET).await
}
