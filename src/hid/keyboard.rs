//! USB HID keyboard report (boot protocol compatible).
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

pub const MOD_LEFT_CTRL: u8 = 0x01;
pub const MOD_LEFT_SHIFT: u8 = 0x02;
pub const MOD_LEFT_ALT: u8 = 0x04;
pub const MOD_LEFT_GUI: u8 = 0x08;

/// Usage IDs from the Keyboard/Keypad page (0x07) used by the crate.
pub mod usage {
    pub const A: u8 = 0x04;
    pub const R: u8 = 0x15;
    pub const Z: u8 = 0x1D;
    pub const DIGIT_1: u8 = 0x1E;
    pub const DIGIT_0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2A;
    pub const TAB: u8 = 0x2B;
    pub const SPACE: u8 = 0x2C;
    pub const MINUS: u8 = 0x2D;
    pub const EQUAL: u8 = 0x2E;
    pub const LEFT_BRACKET: u8 = 0x2F;
    pub const RIGHT_BRACKET: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const SEMICOLON: u8 = 0x33;
    pub const QUOTE: u8 = 0x34;
    pub const GRAVE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const PERIOD: u8 = 0x37;
    pub const SLASH: u8 = 0x38;
}

/// Standard USB HID boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// All keys released.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// One key held together with `modifier`.
    pub const fn key(modifier: u8, keycode: u8) -> Self {
        Self {
            modifier,
            reserved: 0,
            keycodes: [keycode, 0, 0, 0, 0, 0],
        }
    }

    /// Report typing `c` on a US layout, `None` for characters the layout
    /// cannot produce.
    pub fn from_ascii(c: char) -> Option<Self> {
        ascii_to_key(c).map(|(modifier, keycode)| Self::key(modifier, keycode))
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        self.serialize(&mut buf);
        buf
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}

/// US-layout mapping of a printable ASCII character (plus `\n` and `\t`)
/// to `(modifier, usage)`.
pub fn ascii_to_key(c: char) -> Option<(u8, u8)> {
    use usage::*;

    let shifted = |k| Some((MOD_LEFT_SHIFT, k));
    let plain = |k| Some((0, k));

    match c {
        'a'..='z' => plain(A + (c as u8 - b'a')),
        'A'..='Z' => shifted(A + (c as u8 - b'A')),
        '0' => plain(DIGIT_0),
        '1'..='9' => plain(DIGIT_1 + (c as u8 - b'1')),
        '\n' => plain(ENTER),
        '\t' => plain(TAB),
        ' ' => plain(SPACE),
        '-' => plain(MINUS),
        '_' => shifted(MINUS),
        '=' => plain(EQUAL),
        '+' => shifted(EQUAL),
        '[' => plain(LEFT_BRACKET),
        '{' => shifted(LEFT_BRACKET),
        ']' => plain(RIGHT_BRACKET),
        '}' => shifted(RIGHT_BRACKET),
        '\\' => plain(BACKSLASH),
        '|' => shifted(BACKSLASH),
        ';' => plain(SEMICOLON),
        ':' => shifted(SEMICOLON),
        '\'' => plain(QUOTE),
        '"' => shifted(QUOTE),
        '`' => plain(GRAVE),
        '~' => shifted(GRAVE),
        ',' => plain(COMMA),
        '<' => shifted(COMMA),
        '.' => plain(PERIOD),
        '>' => shifted(PERIOD),
        '/' => plain(SLASH),
        '?' => shifted(SLASH),
        '!' => shifted(DIGIT_1),
        '@' => shifted(DIGIT_1 + 1),
        '#' => shifted(DIGIT_1 + 2),
        '$' => shifted(DIGIT_1 + 3),
        '%' => shifted(DIGIT_1 + 4),
        '^' => shifted(DIGIT_1 + 5),
        '&' => shifted(DIGIT_1 + 6),
        '*' => shifted(DIGIT_1 + 7),
        '(' => shifted(DIGIT_1 + 8),
        ')' => shifted(DIGIT_0),
        _ => None,
    }
}

// USB HID report descriptor for a boot-protocol keyboard

/// USB HID Report Descriptor for a standard keyboard.
///
/// This descriptor tells the USB host that we are a keyboard with:
///   - 8 modifier key bits (input)
///   - 1 reserved byte
///   - 5 LED indicators (output)
///   - 6 key code bytes (input)
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Reserved byte -
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - padding
    //
    //   - LED output (5 bits + 3 padding) -
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant) - padding
    //
    //   - Key codes (6 bytes) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    //
    0xC0, // End Collection
];
