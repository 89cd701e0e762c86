/*
 * @file hardware/gpio.rs
 * @brief Raspberry Pi body: gpio-cdev LEDs and button, PCF8574 I2C LCD
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Raspberry Pi backend.
//!
//! Pin reference (BCM numbering):
//! - GPIO 17 red eye, GPIO 27 blue eye, GPIO 22 green eye
//! - GPIO 18 ear button, active high with pull-down
//! - I2C address 0x27 for the 1602 LCD backpack

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::gpio_cdev::{Chip, EventRequestFlags, LineHandle, LineRequestFlags};
use linux_embedded_hal::I2cdev;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{blocking_io, Eyes, Face, Trigger};
use crate::config::HardwareSettings;
use crate::mood::EyePattern;

/// PCF8574 bit wired to the HD44780 register-select line.
const LCD_RS: u8 = 0x01;
/// PCF8574 bit wired to the HD44780 enable strobe.
const LCD_EN: u8 = 0x04;
/// PCF8574 bit that powers the backlight.
const LCD_BACKLIGHT: u8 = 0x08;

const LCD_CLEAR: u8 = 0x01;
const LCD_ENTRY_LEFT: u8 = 0x06;
const LCD_DISPLAY_ON: u8 = 0x0C;
const LCD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const LCD_SET_DDRAM: u8 = 0x80;
const LCD_ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

const GPIO_CONSUMER: &str = "snowy";

/// Opens the LCD, the three eye LEDs and the ear button.
///
/// # Errors
/// Returns an error if the GPIO chip, any line, or the I2C bus cannot be opened.
pub fn open_body(
    settings: &HardwareSettings,
) -> Result<(Box<dyn Face>, Box<dyn Eyes>, Box<dyn Trigger>)> {
    let mut chip = Chip::new(&settings.gpio_chip)
        .with_context(|| format!("opening GPIO chip {}", settings.gpio_chip))?;
    let eyes = GpioEyes::open(&mut chip, settings)?;
    let trigger = GpioTrigger::open(&mut chip, settings.button_pin)?;
    let face = LcdFace::open(&settings.i2c_bus, settings.lcd_address)?;
    Ok((Box::new(face), Box::new(eyes), Box::new(trigger)))
}

/// Three push-pull LED outputs.
pub struct GpioEyes {
    red: LineHandle,
    blue: LineHandle,
    green: LineHandle,
}

impl GpioEyes {
    /// Claims the three LED lines as outputs, all low.
    ///
    /// # Errors
    /// Returns an error if any line is already claimed.
    fn open(chip: &mut Chip, settings: &HardwareSettings) -> Result<Self> {
        Ok(Self {
            red: output_line(chip, settings.red_pin)?,
            blue: output_line(chip, settings.blue_pin)?,
            green: output_line(chip, settings.green_pin)?,
        })
    }
}

/// Requests `offset` as a push-pull output starting low.
fn output_line(chip: &mut Chip, offset: u32) -> Result<LineHandle> {
    chip.get_line(offset)
        .with_context(|| format!("getting GPIO line {}", offset))?
        .request(LineRequestFlags::OUTPUT, 0, GPIO_CONSUMER)
        .with_context(|| format!("requesting GPIO line {} as output", offset))
}

impl Eyes for GpioEyes {
    fn apply(&mut self, pattern: EyePattern) -> Result<()> {
        self.red.set_value(u8::from(pattern.red))?;
        self.blue.set_value(u8::from(pattern.blue))?;
        self.green.set_value(u8::from(pattern.green))?;
        Ok(())
    }
}

/// Rising-edge button events forwarded from a watcher thread.
pub struct GpioTrigger {
    presses: mpsc::Receiver<()>,
}

impl GpioTrigger {
    /// Requests rising-edge events on the button line and starts the watcher
    /// thread.
    ///
    /// # Errors
    /// Returns an error if the line or the thread cannot be set up.
    fn open(chip: &mut Chip, offset: u32) -> Result<Self> {
        let events = chip
            .get_line(offset)
            .with_context(|| format!("getting button line {}", offset))?
            .events(LineRequestFlags::INPUT, EventRequestFlags::RISING_EDGE, GPIO_CONSUMER)
            .with_context(|| format!("requesting edge events on line {}", offset))?;
        let (tx, presses) = mpsc::channel(8);
        thread::Builder::new()
            .name("ear-button".to_string())
            .spawn(move || {
                for event in events {
                    match event {
                        Ok(event) => {
                            debug!(timestamp = event.timestamp(), "ear button edge");
                            if tx.blocking_send(()).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "ear button watcher stopped");
                            break;
                        }
                    }
                }
            })
            .context("spawning ear button watcher")?;
        Ok(Self { presses })
    }
}

#[async_trait]
impl Trigger for GpioTrigger {
    async fn wait_for_trigger(&mut self) -> Result<bool> {
        // Presses made while Snowy was busy do not count.
        while self.presses.try_recv().is_ok() {}
        Ok(self.presses.recv().await.is_some())
    }
}

/// HD44780 1602 LCD behind a PCF8574 I2C backpack, driven in 4-bit mode.
pub struct LcdFace {
    i2c: I2cdev,
    address: u8,
}

impl LcdFace {
    /// Opens the backpack on `bus` and runs the 4-bit init sequence.
    ///
    /// # Errors
    /// Returns an error if the bus cannot be opened or the LCD does not ack.
    fn open(bus: &str, address: u8) -> Result<Self> {
        let i2c = I2cdev::new(bus).with_context(|| format!("opening I2C bus {}", bus))?;
        let mut lcd = Self { i2c, address };
        blocking_io(|| lcd.init())?;
        Ok(lcd)
    }

    /// HD44780 power-on sequence into 4-bit, two-line mode.
    fn init(&mut self) -> Result<()> {
        thread::sleep(Duration::from_millis(50));
        for _ in 0..3 {
            self.pulse(0x30)?;
            thread::sleep(Duration::from_millis(5));
        }
        self.pulse(0x20)?;
        self.command(LCD_FUNCTION_4BIT_2LINE)?;
        self.command(LCD_DISPLAY_ON)?;
        self.command(LCD_ENTRY_LEFT)?;
        self.blank()
    }

    /// Clears and writes both rows.
    fn redraw(&mut self, top: &str, bottom: &str) -> Result<()> {
        self.blank()?;
        self.write_row(0, top)?;
        if !bottom.is_empty() {
            self.write_row(1, bottom)?;
        }
        Ok(())
    }

    /// The clear command needs about 1.5ms before the next write.
    fn blank(&mut self) -> Result<()> {
        self.command(LCD_CLEAR)?;
        thread::sleep(Duration::from_millis(2));
        Ok(())
    }

    /// Sends an instruction byte (RS low).
    fn command(&mut self, value: u8) -> Result<()> {
        self.send(value, 0)
    }

    /// Moves to the start of `row` and writes `text` through the character ROM.
    fn write_row(&mut self, row: usize, text: &str) -> Result<()> {
        self.command(LCD_SET_DDRAM | LCD_ROW_OFFSETS[row])?;
        for ch in text.chars() {
            self.send(rom_byte(ch), LCD_RS)?;
        }
        Ok(())
    }

    /// Sends a byte as two nibbles.
    fn send(&mut self, value: u8, mode: u8) -> Result<()> {
        for nibble in nibbles(value, mode) {
            self.pulse(nibble)?;
        }
        Ok(())
    }

    /// Latches one nibble with an enable strobe.
    fn pulse(&mut self, bits: u8) -> Result<()> {
        let bits = bits | LCD_BACKLIGHT;
        self.expander(bits | LCD_EN)?;
        thread::sleep(Duration::from_micros(1));
        self.expander(bits & !LCD_EN)?;
        thread::sleep(Duration::from_micros(50));
        Ok(())
    }

    /// Writes the raw PCF8574 port byte.
    fn expander(&mut self, byte: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[byte])
            .map_err(|err| anyhow!("LCD I2C write failed: {:?}", err))
    }
}

// Every write settles with short sleeps, so it runs through `blocking_io`.
impl Face for LcdFace {
    fn show(&mut self, top: &str, bottom: &str) -> Result<()> {
        blocking_io(|| self.redraw(top, bottom))
    }

    fn clear(&mut self) -> Result<()> {
        blocking_io(|| self.blank())
    }
}

/// Splits a byte into the high and low nibble frames for the expander.
fn nibbles(value: u8, mode: u8) -> [u8; 2] {
    [(value & 0xF0) | mode, ((value << 4) & 0xF0) | mode]
}

/// Maps a character onto the HD44780 ASCII range.
fn rom_byte(ch: char) -> u8 {
    if ch.is_ascii() && !ch.is_ascii_control() {
        ch as u8
    } else {
        b'?'
    }
}
