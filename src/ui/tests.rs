//! Navigation engine scenarios.
//!
//! These tests run on the host (not embedded) and drive the state machine
//! with synthetic time and synthetic button events against recording fakes.

use embedded_hal_mock::eh1::delay::NoopDelay;

use super::nav::{Devices, Navigator, LED_PALETTE};
use super::{Channel, EventKind, InputEvent, NavState};
use crate::config::{DISTANCE_NO_SENSOR_MM, MENU_TIMEOUT_MS, VERSION};
use crate::features::{Capability, Features};
use crate::peripherals::{
    ClockSource, ClockString, Color, Indicator, KeyboardEmulation, Laser, Renderer,
};

// ═══════════════════════════════════════════════════════════════════════════
// Fakes
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
enum Frame {
    Splash(String, String),
    Home {
        time: String,
        temperature: f32,
        distance_mm: u16,
        laser_on: bool,
    },
    Menu(Vec<String>, usize),
    Centered(String),
    Lines(Vec<String>),
}

#[derive(Default)]
struct FakeDisplay {
    frames: Vec<Frame>,
    power_offs: usize,
    power_ons: usize,
}

impl FakeDisplay {
    fn last(&self) -> &Frame {
        self.frames.last().expect("nothing rendered")
    }
}

impl Renderer for FakeDisplay {
    fn show_splash(&mut self, line1: &str, line2: &str) {
        self.frames
            .push(Frame::Splash(line1.to_string(), line2.to_string()));
    }

    fn draw_home(&mut self, time: &str, temperature: f32, distance_mm: u16, laser_on: bool) {
        self.frames.push(Frame::Home {
            time: time.to_string(),
            temperature,
            distance_mm,
            laser_on,
        });
    }

    fn draw_menu(&mut self, _title: &str, items: &[&str], selected: usize) {
        let items = items.iter().map(|s| s.to_string()).collect();
        self.frames.push(Frame::Menu(items, selected));
    }

    fn draw_centered(&mut self, text: &str) {
        self.frames.push(Frame::Centered(text.to_string()));
    }

    fn draw_lines(&mut self, lines: &[&str]) {
        let lines = lines.iter().map(|s| s.to_string()).collect();
        self.frames.push(Frame::Lines(lines));
    }

    fn power_on(&mut self) {
        self.power_ons += 1;
    }

    fn power_off(&mut self) {
        self.power_offs += 1;
    }
}

#[derive(Default)]
struct FakeLed {
    colors: Vec<Color>,
}

impl FakeLed {
    fn current(&self) -> Color {
        self.colors.last().copied().unwrap_or(Color::OFF)
    }
}

impl Indicator for FakeLed {
    fn set_color(&mut self, color: Color) {
        self.colors.push(color);
    }
}

#[derive(Default)]
struct FakeLaser {
    on: bool,
    switches: usize,
}

impl Laser for FakeLaser {
    fn on(&mut self) {
        self.on = true;
        self.switches += 1;
    }

    fn off(&mut self) {
        self.on = false;
        self.switches += 1;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

#[derive(Default)]
struct FakeKeyboard {
    runs: usize,
    busy: bool,
}

impl KeyboardEmulation for FakeKeyboard {
    fn run_predefined_action(&mut self) {
        if !self.busy {
            self.runs += 1;
        }
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

struct FakeClock;

impl ClockSource for FakeClock {
    fn now_string(&mut self) -> ClockString {
        ClockString::try_from("12:34:56").unwrap()
    }

    fn date_string(&mut self) -> ClockString {
        ClockString::try_from("2026-10-16").unwrap()
    }

    fn temperature(&mut self) -> f32 {
        23.5
    }
}

type TestNav = Navigator<FakeDisplay, FakeLed, FakeLaser, FakeKeyboard, FakeClock, NoopDelay>;

const FAR: u16 = 1500;

fn nav_with(features: Features) -> TestNav {
    let devices = Devices {
        display: FakeDisplay::default(),
        indicator: FakeLed::default(),
        laser: FakeLaser::default(),
        keyboard: FakeKeyboard::default(),
        clock: FakeClock,
    };
    let mut nav = Navigator::new(devices, NoopDelay::new(), features);
    nav.start(0);
    nav
}

fn nav() -> TestNav {
    nav_with(Features::all())
}

fn release(channel: Channel) -> Option<InputEvent> {
    Some(InputEvent::new(channel, EventKind::Release))
}

fn press(nav: &mut TestNav, t: u64, channel: Channel) {
    nav.update(t, release(channel), FAR, false);
}

fn idle(nav: &mut TestNav, t: u64) {
    nav.update(t, None, FAR, false);
}

/// From Home, open the root menu and select the entry leading to `target`.
fn open(nav: &mut TestNav, t: &mut u64, target: NavState) {
    assert_eq!(nav.state(), NavState::Home);
    *t += 100;
    press(nav, *t, Channel::Select);
    while nav.menu().target(nav.selection()) != target {
        *t += 100;
        press(nav, *t, Channel::Down);
        assert_ne!(nav.selection(), 0, "{:?} not in menu", target);
    }
    *t += 100;
    press(nav, *t, Channel::Select);
    assert_eq!(nav.state(), target);
}

fn leds(nav: &TestNav) -> &FakeLed {
    &nav.devices().indicator
}

// ═══════════════════════════════════════════════════════════════════════════
// Home / root menu
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn starts_on_home_with_indicator_off() {
    let nav = nav();
    assert_eq!(nav.state(), NavState::Home);
    assert_eq!(leds(&nav).colors, [Color::OFF]);
}

#[test]
fn home_renders_clock_and_distance() {
    let mut nav = nav();
    nav.update(10, None, 742, false);
    assert_eq!(
        *nav.devices().display.last(),
        Frame::Home {
            time: "12:34:56".to_string(),
            temperature: 23.5,
            distance_mm: 742,
            laser_on: false,
        }
    );
}

#[test]
fn home_placeholders_without_rtc_and_sensor() {
    let mut features = Features::all().without(Capability::DistanceSensor);
    features.mark_unavailable(Capability::RealTimeClock);
    let mut nav = nav_with(features);
    nav.update(10, None, 742, false);
    assert_eq!(
        *nav.devices().display.last(),
        Frame::Home {
            time: "00:00:00".to_string(),
            temperature: 0.0,
            distance_mm: DISTANCE_NO_SENSOR_MM,
            laser_on: false,
        }
    );
}

#[test]
fn select_opens_menu_at_first_entry() {
    let mut nav = nav();
    press(&mut nav, 100, Channel::Select);
    assert_eq!(nav.state(), NavState::RootMenu);
    assert_eq!(nav.selection(), 0);
    idle(&mut nav, 200);
    match nav.devices().display.last() {
        Frame::Menu(items, selected) => {
            assert_eq!(items[0], "Back");
            assert_eq!(items.last().map(String::as_str), Some("Sleep"));
            assert_eq!(*selected, 0);
        }
        other => panic!("expected menu, got {:?}", other),
    }
}

#[test]
fn home_down_toggles_laser() {
    let mut nav = nav();
    press(&mut nav, 100, Channel::Down);
    assert!(nav.devices().laser.on);
    press(&mut nav, 200, Channel::Up);
    assert!(nav.devices().laser.on, "Up does nothing on Home");
    press(&mut nav, 300, Channel::Down);
    assert!(!nav.devices().laser.on);
    assert_eq!(nav.state(), NavState::Home);
}

#[test]
fn unavailable_laser_is_not_driven() {
    let mut features = Features::all();
    features.mark_unavailable(Capability::Laser);
    let mut nav = nav_with(features);
    press(&mut nav, 100, Channel::Down);
    assert_eq!(nav.devices().laser.switches, 0);
}

#[test]
fn back_round_trip_has_no_indicator_side_effects() {
    let mut nav = nav();
    idle(&mut nav, 50);
    let before = leds(&nav).colors.len();

    press(&mut nav, 100, Channel::Select);
    press(&mut nav, 200, Channel::Select);

    assert_eq!(nav.state(), NavState::Home);
    assert_eq!(nav.selection(), 0);
    assert_eq!(leds(&nav).colors.len(), before);
    assert!(!nav.devices().laser.on);
}

#[test]
fn selection_wraps_and_stays_in_range() {
    let mut nav = nav();
    let len = nav.menu().len();
    press(&mut nav, 100, Channel::Select);

    press(&mut nav, 200, Channel::Up);
    assert_eq!(nav.selection(), len - 1);
    press(&mut nav, 300, Channel::Down);
    assert_eq!(nav.selection(), 0);

    let mut t = 400;
    for i in 0..50 {
        let channel = if i % 3 == 0 { Channel::Up } else { Channel::Down };
        press(&mut nav, t, channel);
        assert!(nav.selection() < len);
        t += 50;
    }
}

#[test]
fn every_entry_reaches_its_screen() {
    let features = Features::all();
    let entries = nav_with(features).menu().entries().to_vec();
    for entry in entries.iter().skip(1) {
        let mut nav = nav_with(features);
        let mut t = 0;
        open(&mut nav, &mut t, entry.target);
    }
}

#[test]
fn menu_shrinks_with_capabilities() {
    let nav = nav_with(Features::none().with(Capability::Laser));
    let labels = nav.menu().labels();
    assert_eq!(labels.as_slice(), ["Back", "Laser", "Sleep"]);
}

#[test]
fn press_events_are_ignored_and_long_press_acts() {
    let mut nav = nav();
    nav.update(100, Some(InputEvent::new(Channel::Select, EventKind::Press)), FAR, false);
    assert_eq!(nav.state(), NavState::Home);
    nav.update(200, Some(InputEvent::new(Channel::Select, EventKind::LongPress)), FAR, false);
    assert_eq!(nav.state(), NavState::RootMenu);
}

// ═══════════════════════════════════════════════════════════════════════════
// Alarm coupling
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn alarm_edges_drive_indicator_on_home() {
    let mut nav = nav();
    nav.update(100, None, 500, true);
    nav.update(200, None, 500, true);
    assert_eq!(leds(&nav).colors, [Color::OFF, Color::RED]);
    nav.update(300, None, 1200, false);
    assert_eq!(leds(&nav).colors, [Color::OFF, Color::RED, Color::OFF]);
}

#[test]
fn alarm_ignored_outside_home() {
    let mut nav = nav();
    press(&mut nav, 100, Channel::Select);
    nav.update(200, None, 500, true);
    assert_eq!(leds(&nav).colors, [Color::OFF]);
}

#[test]
fn alarm_needs_working_sensor() {
    let mut features = Features::all();
    features.mark_unavailable(Capability::DistanceSensor);
    let mut nav = nav_with(features);
    nav.update(100, None, 500, true);
    assert_eq!(leds(&nav).colors, [Color::OFF]);
}

#[test]
fn alarm_reasserted_after_led_test_borrowed_indicator() {
    let mut nav = nav();
    let mut t = 100;
    nav.update(t, None, 500, true);
    assert_eq!(leds(&nav).current(), Color::RED);

    open(&mut nav, &mut t, NavState::LedTest);
    t += 100;
    press(&mut nav, t, Channel::Up);
    t += 100;
    press(&mut nav, t, Channel::Select);
    assert_eq!(leds(&nav).current(), Color::OFF);

    // Back to Home via the menu's Back entry.
    while nav.selection() != 0 {
        t += 100;
        press(&mut nav, t, Channel::Up);
    }
    t += 100;
    press(&mut nav, t, Channel::Select);
    assert_eq!(nav.state(), NavState::Home);

    t += 100;
    nav.update(t, None, 500, true);
    assert_eq!(leds(&nav).current(), Color::RED);
}

/// Press with the proximity alarm held active on every tick.
fn press_near(nav: &mut TestNav, t: u64, channel: Channel) {
    nav.update(t, release(channel), 500, true);
}

/// Open LedTest and leave it again without cycling, alarm active throughout.
fn led_test_untouched_with_alarm(nav: &mut TestNav, t: &mut u64) {
    *t += 100;
    press_near(nav, *t, Channel::Select);
    while nav.menu().target(nav.selection()) != NavState::LedTest {
        *t += 100;
        press_near(nav, *t, Channel::Down);
    }
    *t += 100;
    press_near(nav, *t, Channel::Select);
    assert_eq!(nav.state(), NavState::LedTest);
}

#[test]
fn alarm_survives_led_test_left_without_cycling() {
    let mut nav = nav();
    let mut t = 100;
    nav.update(t, None, 500, true);
    assert_eq!(leds(&nav).current(), Color::RED);

    led_test_untouched_with_alarm(&mut nav, &mut t);
    t += 100;
    press_near(&mut nav, t, Channel::Select);
    assert_eq!(nav.state(), NavState::RootMenu);
    assert_eq!(leds(&nav).current(), Color::OFF);

    while nav.selection() != 0 {
        t += 100;
        press_near(&mut nav, t, Channel::Up);
    }
    t += 100;
    press_near(&mut nav, t, Channel::Select);
    assert_eq!(nav.state(), NavState::Home);

    t += 100;
    nav.update(t, None, 500, true);
    assert_eq!(leds(&nav).current(), Color::RED);
}

#[test]
fn alarm_after_led_test_same_for_timeout_and_manual_exit() {
    let mut timed = nav();
    let mut t = 100;
    timed.update(t, None, 500, true);
    led_test_untouched_with_alarm(&mut timed, &mut t);
    t += MENU_TIMEOUT_MS + 1;
    timed.update(t, None, 500, true);
    assert_eq!(timed.state(), NavState::Home);
    t += 100;
    timed.update(t, None, 500, true);

    let mut manual = nav();
    let mut m = 100;
    manual.update(m, None, 500, true);
    led_test_untouched_with_alarm(&mut manual, &mut m);
    m += 100;
    press_near(&mut manual, m, Channel::Select);
    while manual.selection() != 0 {
        m += 100;
        press_near(&mut manual, m, Channel::Up);
    }
    m += 100;
    press_near(&mut manual, m, Channel::Select);
    m += 100;
    manual.update(m, None, 500, true);

    assert_eq!(manual.state(), NavState::Home);
    assert_eq!(leds(&timed).current(), Color::RED);
    assert_eq!(leds(&manual).current(), Color::RED);

    // Alarm gone by the time either path is back on Home.
    timed.update(t + 100, None, FAR, false);
    manual.update(m + 100, None, FAR, false);
    assert_eq!(leds(&timed).current(), Color::OFF);
    assert_eq!(leds(&manual).current(), Color::OFF);
}

// ═══════════════════════════════════════════════════════════════════════════
// Sub-screens
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn led_test_cycles_palette_and_clears_on_exit() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::LedTest);
    for _ in 0..LED_PALETTE.len() {
        t += 100;
        press(&mut nav, t, Channel::Up);
    }
    assert_eq!(
        leds(&nav).colors[1..],
        [Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW, Color::OFF]
    );

    t += 100;
    press(&mut nav, t, Channel::Down);
    t += 100;
    press(&mut nav, t, Channel::Select);
    assert_eq!(nav.state(), NavState::RootMenu);
    assert_eq!(leds(&nav).current(), Color::OFF);
}

#[test]
fn led_test_restarts_at_off() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::LedTest);
    t += 100;
    press(&mut nav, t, Channel::Up);
    t += 100;
    press(&mut nav, t, Channel::Select);
    t += 100;
    press(&mut nav, t, Channel::Select);
    assert_eq!(nav.state(), NavState::LedTest);
    t += 100;
    idle(&mut nav, t);
    assert_eq!(
        *nav.devices().display.last(),
        Frame::Lines(vec!["OFF".into(), "UP/DN".into(), "SEL:Back".into()])
    );
}

#[test]
fn distance_view_formats_reading() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::DistanceView);
    nav.update(t + 100, None, 850, false);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("850mm".into()));
    nav.update(t + 200, None, 1300, false);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("---".into()));
    nav.update(t + 300, release(Channel::Select), 850, false);
    assert_eq!(nav.state(), NavState::RootMenu);
}

#[test]
fn distance_view_without_sensor_shows_na() {
    let mut features = Features::all();
    features.mark_unavailable(Capability::DistanceSensor);
    let mut nav = nav_with(features);
    let mut t = 0;
    open(&mut nav, &mut t, NavState::DistanceView);
    nav.update(t + 100, None, 850, false);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("N/A".into()));
}

#[test]
fn laser_view_toggles() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::LaserView);
    press(&mut nav, t + 100, Channel::Up);
    assert!(nav.devices().laser.on);
    idle(&mut nav, t + 200);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("ON".into()));
    press(&mut nav, t + 300, Channel::Down);
    assert!(!nav.devices().laser.on);
    press(&mut nav, t + 400, Channel::Select);
    assert_eq!(nav.state(), NavState::RootMenu);
}

#[test]
fn bad_usb_runs_keyboard_action() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::BadUsbView);
    press(&mut nav, t + 100, Channel::Down);
    assert_eq!(nav.devices().keyboard.runs, 1);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("Run...".into()));
    press(&mut nav, t + 200, Channel::Up);
    assert_eq!(nav.devices().keyboard.runs, 2);
    assert_eq!(nav.state(), NavState::BadUsbView);
}

#[test]
fn bad_usb_shows_progress_while_typing() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::BadUsbView);
    idle(&mut nav, t + 100);
    assert_eq!(
        *nav.devices().display.last(),
        Frame::Lines(vec!["BadUSB".into(), "UP/DN:Run".into(), "SEL:Back".into()])
    );
    nav.devices_mut().keyboard.busy = true;
    idle(&mut nav, t + 200);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("Run...".into()));
}

#[test]
fn bad_usb_unavailable_shows_na() {
    let mut features = Features::all();
    features.mark_unavailable(Capability::KeyboardEmulation);
    let mut nav = nav_with(features);
    let mut t = 0;
    open(&mut nav, &mut t, NavState::BadUsbView);
    press(&mut nav, t + 100, Channel::Down);
    assert_eq!(nav.devices().keyboard.runs, 0);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("N/A".into()));
    press(&mut nav, t + 200, Channel::Select);
    assert_eq!(nav.state(), NavState::RootMenu);
}

#[test]
fn settings_shows_date_or_version() {
    let mut nav = nav();
    let mut t = 0;
    open(&mut nav, &mut t, NavState::SettingsView);
    idle(&mut nav, t + 100);
    assert_eq!(*nav.devices().display.last(), Frame::Centered("2026-10-16".into()));

    let mut features = Features::all();
    features.mark_unavailable(Capability::RealTimeClock);
    let mut nav = nav_with(features);
    let mut t = 0;
    open(&mut nav, &mut t, NavState::SettingsView);
    idle(&mut nav, t + 100);
    let expected = std::format!("v{}", VERSION);
    assert_eq!(*nav.devices().display.last(), Frame::Centered(expected));
}

// ═══════════════════════════════════════════════════════════════════════════
// Timeout
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn timeout_returns_home_from_menu() {
    let mut nav = nav();
    press(&mut nav, 1000, Channel::Select);
    press(&mut nav, 1100, Channel::Down);
    idle(&mut nav, 1100 + MENU_TIMEOUT_MS);
    assert_eq!(nav.state(), NavState::RootMenu, "boundary is strict");
    idle(&mut nav, 1101 + MENU_TIMEOUT_MS);
    assert_eq!(nav.state(), NavState::Home);
    assert_eq!(nav.selection(), 0);
}

#[test]
fn selection_change_resets_timer() {
    let mut nav = nav();
    press(&mut nav, 0, Channel::Select);
    press(&mut nav, MENU_TIMEOUT_MS, Channel::Down);
    assert_eq!(nav.last_activity_ms(), MENU_TIMEOUT_MS);
    idle(&mut nav, MENU_TIMEOUT_MS + 10);
    assert_eq!(nav.state(), NavState::RootMenu);
}

#[test]
fn home_never_times_out() {
    let mut nav = nav();
    nav.update(10 * MENU_TIMEOUT_MS, None, FAR, true);
    assert_eq!(nav.state(), NavState::Home);
    assert_eq!(leds(&nav).current(), Color::RED, "alarm untouched by timer");
}

#[test]
fn timeout_from_led_test_matches_manual_exit() {
    // Timeout path.
    let mut timed = nav();
    let mut t = 0;
    open(&mut timed, &mut t, NavState::LedTest);
    for _ in 0..3 {
        t += 100;
        press(&mut timed, t, Channel::Up);
    }
    assert_eq!(leds(&timed).current(), Color::BLUE);
    idle(&mut timed, t + MENU_TIMEOUT_MS + 1);

    // Manual path: Select back to the menu, walk to Back, Select.
    let mut manual = nav();
    let mut m = 0;
    open(&mut manual, &mut m, NavState::LedTest);
    for _ in 0..3 {
        m += 100;
        press(&mut manual, m, Channel::Up);
    }
    m += 100;
    press(&mut manual, m, Channel::Select);
    while manual.selection() != 0 {
        m += 100;
        press(&mut manual, m, Channel::Up);
    }
    m += 100;
    press(&mut manual, m, Channel::Select);

    assert_eq!(timed.state(), NavState::Home);
    assert_eq!(manual.state(), NavState::Home);
    assert_eq!(leds(&timed).current(), Color::OFF);
    assert_eq!(leds(&timed).colors, leds(&manual).colors);
    assert_eq!(timed.selection(), manual.selection());
}

// ═══════════════════════════════════════════════════════════════════════════
// Sleep
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn sleep_entry_runs_once() {
    let mut nav = nav();
    let mut t = 0;
    press(&mut nav, 100, Channel::Down); // laser on
    open(&mut nav, &mut t, NavState::Sleep);
    assert_eq!(nav.devices().display.power_offs, 0, "entry effect runs on the next tick");

    idle(&mut nav, t + 100);
    assert!(nav.is_asleep());
    assert_eq!(nav.devices().display.power_offs, 1);
    assert!(!nav.devices().laser.on);
    assert_eq!(leds(&nav).current(), Color::OFF);
    assert!(nav
        .devices()
        .display
        .frames
        .contains(&Frame::Splash("Sleep Mode".into(), "Press any btn".into())));

    idle(&mut nav, t + 200);
    nav.enter_sleep();
    nav.enter_sleep();
    assert_eq!(nav.devices().display.power_offs, 1);
}

#[test]
fn sleep_does_not_time_out() {
    let mut nav = nav();
    nav.enter_sleep();
    idle(&mut nav, 100 * MENU_TIMEOUT_MS);
    assert_eq!(nav.state(), NavState::Sleep);
}

#[test]
fn any_button_wakes() {
    for channel in Channel::ALL {
        let mut nav = nav();
        nav.enter_sleep();
        press(&mut nav, 500, channel);
        assert_eq!(nav.state(), NavState::Home);
        assert!(!nav.is_asleep());
        assert_eq!(nav.devices().display.power_ons, 1);
        assert!(!nav.devices().laser.on, "wake press is swallowed");

        nav.enter_sleep();
        assert_eq!(nav.devices().display.power_offs, 2, "new sleep after wake");
    }
}
