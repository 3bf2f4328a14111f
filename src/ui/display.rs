//! SSD1306 OLED renderer.

use core::fmt::Write as _;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::config::{DISTANCE_MAX_RANGE_MM, MENU_VISIBLE_ROWS, OLED_I2C_ADDR};
use crate::error::Error;
use crate::peripherals::Renderer;
use crate::ui::menu::visible_window;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const LINE_HEIGHT: i32 = 10;

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

pub struct OledRenderer<I2C> {
    display: Display<I2C>,
}

impl<I2C> OledRenderer<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Wrap the panel. No bus traffic until [`init`](Self::init).
    pub fn new(i2c: I2C) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, OLED_I2C_ADDR);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        Self { display }
    }

    /// Initialise the panel and clear the screen.
    pub fn init(&mut self) -> Result<(), Error> {
        self.display.init().map_err(|_| Error::Display)?;
        self.display.clear_buffer();
        self.display.flush().map_err(|_| Error::Display)
    }

    /// Text with its top-left corner at `(x, y)`.
    fn text(&mut self, text: &str, x: i32, y: i32) {
        let _ = Text::with_baseline(text, Point::new(x, y), text_style(), Baseline::Top)
            .draw(&mut self.display);
    }

    fn flush(&mut self) {
        if self.display.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("OLED flush failed");
        }
    }
}

impl<I2C> Renderer for OledRenderer<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show_splash(&mut self, line1: &str, line2: &str) {
        self.display.clear_buffer();
        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let _ = Text::with_text_style(line1, Point::new(64, 22), text_style(), centered)
            .draw(&mut self.display);
        let _ = Text::with_text_style(line2, Point::new(64, 38), text_style(), centered)
            .draw(&mut self.display);
        self.flush();
    }

    fn draw_home(&mut self, time: &str, temperature: f32, distance_mm: u16, laser_on: bool) {
        self.display.clear_buffer();
        self.text(time, 0, 0);

        let mut buf: heapless::String<12> = heapless::String::new();
        let _ = write!(buf, "{:.1}C", temperature);
        self.text(buf.as_str(), 0, 20);

        buf.clear();
        if distance_mm > DISTANCE_MAX_RANGE_MM {
            let _ = buf.push_str("---");
        } else {
            let _ = write!(buf, "{}mm", distance_mm);
        }
        self.text(buf.as_str(), 0, 35);

        if laser_on {
            self.text("LSR", 0, 50);
        }
        self.flush();
    }

    fn draw_menu(&mut self, title: &str, items: &[&str], selected: usize) {
        self.display.clear_buffer();
        self.text(title, 0, 0);

        let window = visible_window(items.len(), selected, MENU_VISIBLE_ROWS);
        let first = window.start;
        for (i, item) in items[window].iter().enumerate() {
            let y = 12 + (i as i32) * LINE_HEIGHT;
            if first + i == selected {
                self.text(">", 0, y);
            }
            self.text(item, 8, y);
        }
        self.flush();
    }

    fn draw_centered(&mut self, text: &str) {
        self.display.clear_buffer();
        let style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        let _ = Text::with_text_style(text, Point::new(64, 32), text_style(), style)
            .draw(&mut self.display);
        self.flush();
    }

    fn draw_lines(&mut self, lines: &[&str]) {
        self.display.clear_buffer();
        for (row, line) in lines.iter().enumerate() {
            self.text(line, 0, row as i32 * LINE_HEIGHT * 2);
        }
        self.flush();
    }

    fn power_on(&mut self) {
        let _ = self.display.set_display_on(true);
    }

    fn power_off(&mut self) {
        self.display.clear_buffer();
        self.flush();
        let _ = self.display.set_display_on(false);
    }
}
