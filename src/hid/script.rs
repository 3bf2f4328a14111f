//! Keystroke scripts played by the keyboard emulation.
//!
//! A script is a short list of [`Step`]s. [`Playback`] expands it into the
//! flat sequence of reports to send and pauses to observe, so the USB task
//! only has to write reports and sleep.

use heapless::Deque;

use crate::config::BADUSB_URL;
use crate::hid::keyboard::{usage, KeyboardReport, MOD_LEFT_GUI};

/// Host operating system the launcher chord is chosen for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetOs {
    /// GUI+Space opens Spotlight.
    MacOs,
    /// GUI+R opens the Run dialog.
    Windows,
}

impl TargetOs {
    /// Launcher chord as `(modifier, usage)`.
    pub const fn launcher_chord(self) -> (u8, u8) {
        match self {
            TargetOs::MacOs => (MOD_LEFT_GUI, usage::SPACE),
            TargetOs::Windows => (MOD_LEFT_GUI, usage::R),
        }
    }

    /// Time the launcher needs before it accepts typing.
    pub const fn launcher_open_ms(self) -> u32 {
        match self {
            TargetOs::MacOs => 1000,
            TargetOs::Windows => 700,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Wait(u32),
    /// Hold `keycode` with `modifier` for `hold_ms`, then release all.
    Chord { modifier: u8, keycode: u8, hold_ms: u32 },
    /// Type text on a US layout; unmappable characters are skipped.
    Type(&'static str),
}

/// What the USB task does next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Send(KeyboardReport),
    Wait(u32),
}

/// Open the launcher, type the configured URL and press Enter.
pub fn open_url(target: TargetOs) -> [Step; 6] {
    let (modifier, keycode) = target.launcher_chord();
    [
        Step::Wait(500),
        Step::Chord { modifier, keycode, hold_ms: 100 },
        Step::Wait(target.launcher_open_ms()),
        Step::Type(BADUSB_URL),
        Step::Wait(600),
        Step::Chord { modifier: 0, keycode: usage::ENTER, hold_ms: 200 },
    ]
}

/// Iterator over the actions of a script.
pub struct Playback<'a> {
    steps: core::slice::Iter<'a, Step>,
    typing: Option<core::str::Chars<'static>>,
    queue: Deque<Action, 3>,
}

impl<'a> Playback<'a> {
    pub fn new(steps: &'a [Step]) -> Self {
        Self {
            steps: steps.iter(),
            typing: None,
            queue: Deque::new(),
        }
    }

    fn push(&mut self, action: Action) {
        // At most three actions are queued per expansion.
        let _ = self.queue.push_back(action);
    }

    fn expand(&mut self, step: Step) {
        match step {
            Step::Wait(ms) => self.push(Action::Wait(ms)),
            Step::Chord { modifier, keycode, hold_ms } => {
                self.push(Action::Send(KeyboardReport::key(modifier, keycode)));
                self.push(Action::Wait(hold_ms));
                self.push(Action::Send(KeyboardReport::empty()));
            }
            Step::Type(text) => self.typing = Some(text.chars()),
        }
    }
}

impl Iterator for Playback<'_> {
    type Item = Action;

    fn next(&mut self) -> Option<Action> {
        loop {
            if let Some(action) = self.queue.pop_front() {
                return Some(action);
            }

            if let Some(chars) = self.typing.as_mut() {
                match chars.next() {
                    Some(c) => {
                        if let Some(report) = KeyboardReport::from_ascii(c) {
                            self.push(Action::Send(report));
                            self.push(Action::Send(KeyboardReport::empty()));
                        }
                        continue;
                    }
                    None => self.typing = None,
                }
            }

            let step = *self.steps.next()?;
            self.expand(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn play(steps: &[Step]) -> Vec<Action> {
        Playback::new(steps).collect()
    }

    #[test]
    fn chord_is_press_hold_release() {
        let actions = play(&[Step::Chord {
            modifier: MOD_LEFT_GUI,
            keycode: usage::R,
            hold_ms: 100,
        }]);
        assert_eq!(
            actions,
            [
                Action::Send(KeyboardReport::key(MOD_LEFT_GUI, usage::R)),
                Action::Wait(100),
                Action::Send(KeyboardReport::empty()),
            ]
        );
    }

    #[test]
    fn typing_releases_between_characters() {
        let actions = play(&[Step::Type("aa")]);
        let a = KeyboardReport::key(0, usage::A);
        let up = KeyboardReport::empty();
        assert_eq!(
            actions,
            [Action::Send(a), Action::Send(up), Action::Send(a), Action::Send(up)]
        );
    }

    #[test]
    fn unmappable_characters_are_skipped() {
        let actions = play(&[Step::Type("é"), Step::Wait(5)]);
        assert_eq!(actions, [Action::Wait(5)]);
    }

    #[test]
    fn macos_script_opens_spotlight() {
        let actions = play(&open_url(TargetOs::MacOs));
        assert_eq!(actions[0], Action::Wait(500));
        assert_eq!(
            actions[1],
            Action::Send(KeyboardReport::key(MOD_LEFT_GUI, usage::SPACE))
        );
        assert_eq!(actions[4], Action::Wait(1000));
    }

    #[test]
    fn windows_script_opens_run_dialog() {
        let actions = play(&open_url(TargetOs::Windows));
        assert_eq!(
            actions[1],
            Action::Send(KeyboardReport::key(MOD_LEFT_GUI, usage::R))
        );
        assert_eq!(actions[4], Action::Wait(700));
    }

    #[test]
    fn script_types_url_then_enter() {
        let actions = play(&open_url(TargetOs::MacOs));
        let presses = actions
            .iter()
            .filter(|a| matches!(a, Action::Send(r) if !r.is_empty()))
            .count();
        // Launcher chord + one press per URL character + Enter.
        assert_eq!(presses, 1 + BADUSB_URL.len() + 1);

        let tail = &actions[actions.len() - 4..];
        assert_eq!(
            tail,
            [
                Action::Wait(600),
                Action::Send(KeyboardReport::key(0, usage::ENTER)),
                Action::Wait(200),
                Action::Send(KeyboardReport::empty()),
            ]
        );
    }

    #[test]
    fn every_report_ends_released() {
        let actions = play(&open_url(TargetOs::Windows));
        let last_send = actions
            .iter()
            .rev()
            .find_map(|a| match a {
                Action::Send(r) => Some(*r),
                Action::Wait(_) => None,
            })
            .unwrap();
        assert!(last_send.is_empty());
    }
}
