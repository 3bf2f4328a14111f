//! USB HID keyboard used by the keyboard-emulation feature.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral with a single boot keyboard endpoint. The UI side only sets
//! a flag and raises a signal; the keyboard task plays the script.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use crate::config;
use crate::hid::keyboard::{KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};
use crate::hid::script::{open_url, Action, Playback, TargetOs};
use crate::peripherals::KeyboardEmulation;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

static KB_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// Raised by the UI to start the predefined action.
static RUN_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();
/// Set from trigger until the last report of the script is written.
static BUSY: AtomicBool = AtomicBool::new(false);

/// Handle given to the navigation engine.
pub struct UsbKeyboard;

impl KeyboardEmulation for UsbKeyboard {
    fn run_predefined_action(&mut self) {
        if BUSY.swap(true, Ordering::AcqRel) {
            info!("BadUSB: already running");
            return;
        }
        RUN_SIGNAL.signal(());
    }

    fn is_busy(&self) -> bool {
        BUSY.load(Ordering::Acquire)
    }
}

/// Build result containing the USB device runner and the keyboard writer.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>,
}

/// Initialise the USB stack and create the keyboard device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbHidDevice {
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let keyboard_writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let device = builder.build();

    info!("USB HID keyboard initialised");

    UsbHidDevice {
        device,
        keyboard_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Wait for a trigger, then type the script for `target`.
pub async fn keyboard_task(
    mut keyboard: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>,
    target: TargetOs,
) -> ! {
    info!("Keyboard task started - target {}", target);

    loop {
        RUN_SIGNAL.wait().await;
        info!("BadUSB: running");

        let steps = open_url(target);
        for action in Playback::new(&steps) {
            match action {
                Action::Send(report) => {
                    if keyboard.write(&report.to_bytes()).await.is_err() {
                        warn!("USB keyboard write failed");
                    }
                }
                Action::Wait(ms) => Timer::after_millis(u64::from(ms)).await,
            }
        }

        BUSY.store(false, Ordering::Release);
        info!("BadUSB: done");
    }
}
