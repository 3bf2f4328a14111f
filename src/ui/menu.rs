//! Root menu model.
//!
//! The entry list is derived from the capability table in one place, so the
//! labels drawn on screen and the screen each index leads to can never go
//! out of step when a capability is built out.

use core::ops::Range;

use heapless::Vec;

use crate::features::{Capability, Features};
use crate::ui::NavState;

/// Upper bound on root menu entries (Back + five optional + Sleep).
pub const MAX_MENU_ITEMS: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub target: NavState,
}

/// Optional entries in display order, with the capability gating each.
const OPTIONAL_ENTRIES: [(Capability, MenuEntry); 5] = [
    (
        Capability::DistanceSensor,
        MenuEntry { label: "Distance", target: NavState::DistanceView },
    ),
    (
        Capability::Laser,
        MenuEntry { label: "Laser", target: NavState::LaserView },
    ),
    (
        Capability::StatusLed,
        MenuEntry { label: "LED", target: NavState::LedTest },
    ),
    (
        Capability::KeyboardEmulation,
        MenuEntry { label: "BadUSB", target: NavState::BadUsbView },
    ),
    (
        Capability::RealTimeClock,
        MenuEntry { label: "Info", target: NavState::SettingsView },
    ),
];

const BACK: MenuEntry = MenuEntry {
    label: "Back",
    target: NavState::Home,
};

const SLEEP: MenuEntry = MenuEntry {
    label: "Sleep",
    target: NavState::Sleep,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuModel {
    entries: Vec<MenuEntry, MAX_MENU_ITEMS>,
}

impl MenuModel {
    pub fn from_features(features: &Features) -> Self {
        let mut entries = Vec::new();
        // Capacity covers every entry; pushes cannot fail.
        let _ = entries.push(BACK);
        for (cap, entry) in OPTIONAL_ENTRIES {
            if features.is_present(cap) {
                let _ = entries.push(entry);
            }
        }
        let _ = entries.push(SLEEP);
        Self { entries }
    }

    /// Always at least 2 (Back and Sleep).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Screen reached by selecting `index`; out-of-range falls back to Home.
    pub fn target(&self, index: usize) -> NavState {
        self.entries
            .get(index)
            .map_or(NavState::Home, |entry| entry.target)
    }

    pub fn labels(&self) -> Vec<&'static str, MAX_MENU_ITEMS> {
        self.entries.iter().map(|entry| entry.label).collect()
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Move the cursor one item up, wrapping to the last item.
    pub fn select_prev(&self, selected: usize) -> usize {
        let len = self.len();
        (selected % len + len - 1) % len
    }

    /// Move the cursor one item down, wrapping to the first item.
    pub fn select_next(&self, selected: usize) -> usize {
        (selected + 1) % self.len()
    }
}

/// Rows to draw so that `selected` stays on screen.
///
/// The list scrolls only once the cursor moves past the last visible row,
/// and never past the end of the list.
pub fn visible_window(count: usize, selected: usize, max_visible: usize) -> Range<usize> {
    let offset = if count > max_visible && selected >= max_visible {
        (selected + 1 - max_visible).min(count - max_visible)
    } else {
        0
    };
    offset..count.min(offset + max_visible)
}
