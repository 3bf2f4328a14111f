//! Screen state machine.
//!
//! One update per UI tick: check the inactivity timeout, render the active
//! screen, then apply at most one button event. Peripherals are only
//! touched through the collaborator traits and only when the capability
//! table says they work.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;

use crate::config::{
    BADUSB_SETTLE_MS, DISTANCE_MAX_RANGE_MM, DISTANCE_NO_SENSOR_MM, MENU_TIMEOUT_MS,
    SLEEP_MESSAGE_MS, VERSION, WAKE_SETTLE_MS,
};
use crate::features::{Capability, Features};
use crate::peripherals::{
    clock_text, ClockSource, Color, Indicator, KeyboardEmulation, Laser, Renderer,
};
use crate::ui::menu::MenuModel;
use crate::ui::{Channel, InputEvent, NavState};

/// LED test palette, cycled in order by Up/Down.
pub const LED_PALETTE: [(&str, Color); 5] = [
    ("OFF", Color::OFF),
    ("RED", Color::RED),
    ("GRN", Color::GREEN),
    ("BLU", Color::BLUE),
    ("YEL", Color::YELLOW),
];

/// Colour of the proximity alert on the Home screen.
pub const ALERT_COLOR: Color = Color::RED;

/// Who last drove the indicator to a visible colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lit {
    Dark,
    /// Home, for the proximity alert.
    Alarm,
    /// A sub-screen (LED test).
    Screen,
}

/// Peripherals owned by the navigation engine.
pub struct Devices<R, I, L, K, C> {
    pub display: R,
    pub indicator: I,
    pub laser: L,
    pub keyboard: K,
    pub clock: C,
}

pub struct Navigator<R, I, L, K, C, D> {
    devices: Devices<R, I, L, K, C>,
    delay: D,
    features: Features,
    menu: MenuModel,
    state: NavState,
    selection: usize,
    last_activity_ms: u64,
    palette_index: usize,
    lit: Lit,
    /// Sleep entry effect already ran.
    asleep: bool,
}

impl<R, I, L, K, C, D> Navigator<R, I, L, K, C, D>
where
    R: Renderer,
    I: Indicator,
    L: Laser,
    K: KeyboardEmulation,
    C: ClockSource,
    D: DelayNs,
{
    pub fn new(devices: Devices<R, I, L, K, C>, delay: D, features: Features) -> Self {
        Self {
            devices,
            delay,
            menu: MenuModel::from_features(&features),
            features,
            state: NavState::Home,
            selection: 0,
            last_activity_ms: 0,
            palette_index: 0,
            lit: Lit::Dark,
            asleep: false,
        }
    }

    /// Start on Home with the indicator dark.
    pub fn start(&mut self, now_ms: u64) {
        self.state = NavState::Home;
        self.selection = 0;
        self.last_activity_ms = now_ms;
        self.indicator_off();
    }

    /// Run one UI tick.
    ///
    /// `distance_mm` is the latest range sample and `alarm` the proximity
    /// alarm state derived from it.
    pub fn update(&mut self, now_ms: u64, event: Option<InputEvent>, distance_mm: u16, alarm: bool) {
        self.check_timeout(now_ms);

        let pressed = event.and_then(|e| e.activated());
        match self.state {
            NavState::Home => self.home(now_ms, pressed, distance_mm, alarm),
            NavState::RootMenu => self.root_menu(now_ms, pressed),
            NavState::DistanceView => self.distance_view(now_ms, pressed, distance_mm),
            NavState::LaserView => self.laser_view(now_ms, pressed),
            NavState::LedTest => self.led_test(now_ms, pressed),
            NavState::BadUsbView => self.bad_usb_view(now_ms, pressed),
            NavState::SettingsView => self.settings_view(now_ms, pressed),
            NavState::Sleep => self.sleep_tick(now_ms, pressed),
        }
    }

    /// Enter Sleep: show the message, then turn everything off.
    ///
    /// Runs once per sleep; repeated calls before a wake do nothing.
    pub fn enter_sleep(&mut self) {
        self.state = NavState::Sleep;
        if self.asleep {
            return;
        }

        self.devices.display.show_splash("Sleep Mode", "Press any btn");
        self.delay.delay_ms(SLEEP_MESSAGE_MS);

        self.indicator_off();
        if self.enabled(Capability::Laser) {
            self.devices.laser.off();
        }
        self.devices.display.power_off();
        self.asleep = true;

        #[cfg(feature = "defmt")]
        defmt::info!("Nav: asleep");
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Cursor position in the root menu.
    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn menu(&self) -> &MenuModel {
        &self.menu
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    pub fn devices(&self) -> &Devices<R, I, L, K, C> {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices<R, I, L, K, C> {
        &mut self.devices
    }

    fn enabled(&self, cap: Capability) -> bool {
        self.features.is_enabled(cap)
    }

    /// Drive the indicator and record who owns the colour. Off is never
    /// owned, so Home re-asserts the alert after anyone turns it off.
    fn indicator_set(&mut self, color: Color, owner: Lit) {
        if !self.enabled(Capability::StatusLed) {
            return;
        }
        self.devices.indicator.set_color(color);
        self.lit = if color.is_off() { Lit::Dark } else { owner };
    }

    fn indicator_off(&mut self) {
        self.indicator_set(Color::OFF, Lit::Dark);
    }

    fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    fn go(&mut self, next: NavState, now_ms: u64) {
        #[cfg(feature = "defmt")]
        defmt::info!("Nav: {} -> {}", self.state, next);
        self.state = next;
        self.touch(now_ms);
    }

    /// Every way back to Home ends here, so a timeout and a manual exit
    /// leave the peripherals in the same state.
    fn go_home(&mut self, now_ms: u64) {
        self.selection = 0;
        if self.lit == Lit::Screen {
            self.indicator_off();
        }
        self.go(NavState::Home, now_ms);
    }

    fn check_timeout(&mut self, now_ms: u64) {
        if matches!(self.state, NavState::Home | NavState::Sleep) {
            return;
        }
        if now_ms.saturating_sub(self.last_activity_ms) > MENU_TIMEOUT_MS {
            #[cfg(feature = "defmt")]
            defmt::info!("Nav: inactivity timeout in {}", self.state);
            self.go_home(now_ms);
        }
    }

    fn home(&mut self, now_ms: u64, pressed: Option<Channel>, distance_mm: u16, alarm: bool) {
        let time = if self.enabled(Capability::RealTimeClock) {
            self.devices.clock.now_string()
        } else {
            clock_text("00:00:00")
        };
        let temperature = if self.enabled(Capability::RealTimeClock) {
            self.devices.clock.temperature()
        } else {
            0.0
        };
        let distance_mm = if self.enabled(Capability::DistanceSensor) {
            distance_mm
        } else {
            DISTANCE_NO_SENSOR_MM
        };

        if self.enabled(Capability::DistanceSensor) {
            if alarm && self.lit != Lit::Alarm {
                self.indicator_set(ALERT_COLOR, Lit::Alarm);
            } else if !alarm && self.lit == Lit::Alarm {
                self.indicator_off();
            }
        }

        let laser_on = self.devices.laser.is_on();
        self.devices
            .display
            .draw_home(time.as_str(), temperature, distance_mm, laser_on);

        match pressed {
            Some(Channel::Select) => {
                self.selection = 0;
                self.go(NavState::RootMenu, now_ms);
            }
            Some(Channel::Down) if self.enabled(Capability::Laser) => {
                self.devices.laser.toggle();
            }
            _ => {}
        }
    }

    fn root_menu(&mut self, now_ms: u64, pressed: Option<Channel>) {
        let labels = self.menu.labels();
        self.devices
            .display
            .draw_menu("MENU", labels.as_slice(), self.selection);

        match pressed {
            Some(Channel::Up) => {
                self.selection = self.menu.select_prev(self.selection);
                self.touch(now_ms);
            }
            Some(Channel::Down) => {
                self.selection = self.menu.select_next(self.selection);
                self.touch(now_ms);
            }
            Some(Channel::Select) => match self.menu.target(self.selection) {
                NavState::Home => self.go_home(now_ms),
                NavState::LedTest => {
                    self.palette_index = 0;
                    self.go(NavState::LedTest, now_ms);
                }
                NavState::Sleep => {
                    self.asleep = false;
                    self.go(NavState::Sleep, now_ms);
                }
                target => self.go(target, now_ms),
            },
            None => {}
        }
    }

    fn distance_view(&mut self, now_ms: u64, pressed: Option<Channel>, distance_mm: u16) {
        let mut text: heapless::String<12> = heapless::String::new();
        if !self.enabled(Capability::DistanceSensor) {
            let _ = text.push_str("N/A");
        } else if distance_mm > DISTANCE_MAX_RANGE_MM {
            let _ = text.push_str("---");
        } else {
            let _ = write!(text, "{}mm", distance_mm);
        }
        self.devices.display.draw_centered(text.as_str());

        if pressed == Some(Channel::Select) {
            self.go(NavState::RootMenu, now_ms);
        }
    }

    fn laser_view(&mut self, now_ms: u64, pressed: Option<Channel>) {
        let label = if self.devices.laser.is_on() { "ON" } else { "OFF" };
        self.devices.display.draw_centered(label);

        match pressed {
            Some(Channel::Up | Channel::Down) => {
                if self.enabled(Capability::Laser) {
                    self.devices.laser.toggle();
                }
                self.touch(now_ms);
            }
            Some(Channel::Select) => self.go(NavState::RootMenu, now_ms),
            None => {}
        }
    }

    fn led_test(&mut self, now_ms: u64, pressed: Option<Channel>) {
        let (label, _) = LED_PALETTE[self.palette_index];
        self.devices
            .display
            .draw_lines(&[label, "UP/DN", "SEL:Back"]);

        match pressed {
            Some(Channel::Up | Channel::Down) => {
                self.palette_index = (self.palette_index + 1) % LED_PALETTE.len();
                self.touch(now_ms);
                let (_, color) = LED_PALETTE[self.palette_index];
                self.indicator_set(color, Lit::Screen);
            }
            Some(Channel::Select) => {
                self.indicator_off();
                self.go(NavState::RootMenu, now_ms);
            }
            None => {}
        }
    }

    fn bad_usb_view(&mut self, now_ms: u64, pressed: Option<Channel>) {
        let available = self.enabled(Capability::KeyboardEmulation);
        if !available {
            self.devices.display.draw_centered("N/A");
        } else if self.devices.keyboard.is_busy() {
            self.devices.display.draw_centered("Run...");
        } else {
            self.devices
                .display
                .draw_lines(&["BadUSB", "UP/DN:Run", "SEL:Back"]);
        }

        match pressed {
            Some(Channel::Up | Channel::Down) if available => {
                self.devices.display.draw_centered("Run...");
                self.devices.keyboard.run_predefined_action();
                self.touch(now_ms);
                self.delay.delay_ms(BADUSB_SETTLE_MS);
            }
            Some(Channel::Select) => self.go(NavState::RootMenu, now_ms),
            _ => {}
        }
    }

    fn settings_view(&mut self, now_ms: u64, pressed: Option<Channel>) {
        if self.enabled(Capability::RealTimeClock) {
            let date = self.devices.clock.date_string();
            self.devices.display.draw_centered(date.as_str());
        } else {
            let mut text: heapless::String<16> = heapless::String::new();
            let _ = write!(text, "v{}", VERSION);
            self.devices.display.draw_centered(text.as_str());
        }

        if pressed == Some(Channel::Select) {
            self.go(NavState::RootMenu, now_ms);
        }
    }

    fn sleep_tick(&mut self, now_ms: u64, pressed: Option<Channel>) {
        self.enter_sleep();

        if pressed.is_some() {
            self.devices.display.power_on();
            self.asleep = false;
            self.go_home(now_ms);
            self.delay.delay_ms(WAKE_SETTLE_MS);
        }
    }
}
