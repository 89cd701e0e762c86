/*
 * @file hardware/console.rs
 * @brief Terminal stand-ins for the LCD, LEDs and ear button
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

//! Console body for running Snowy without a Raspberry Pi.
//!
//! The screen and eyes print to stdout; pressing Enter is the ear button.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use super::{blocking_io, Eyes, Face, Trigger};
use crate::mood::EyePattern;
use crate::pager::LCD_COLUMNS;

/// Line reader over stdin shared by the trigger and typed ears.
///
/// Lines are read on a plain thread and forwarded over a channel, so a read
/// still pending at shutdown never holds the runtime open.
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<io::Result<String>>>>,
}

impl ConsoleInput {
    /// Starts reading stdin.
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    /// Starts a reader thread over `reader`.
    ///
    /// The thread ends at end of input, after the first read error, or once
    /// every clone of the returned input is dropped and a line arrives.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, lines) = mpsc::unbounded_channel();
        let spawned = thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "cannot start console reader; input is closed");
        }
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Reads the next line, or `None` at end of input.
    ///
    /// # Errors
    /// Returns an error if the underlying read failed.
    pub async fn read_line(&self) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        match lines.recv().await {
            None => Ok(None),
            Some(line) => line.map(Some).context("Failed to read from stdin"),
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws the 16x2 screen as a framed box.
pub struct ConsoleFace;

impl ConsoleFace {
    /// Frames both rows in a box one column wider than the LCD on each side.
    fn render(top: &str, bottom: &str) -> String {
        let border = format!("+{}+", "-".repeat(LCD_COLUMNS));
        format!(
            "{border}\n|{:<width$}|\n|{:<width$}|\n{border}",
            top,
            bottom,
            width = LCD_COLUMNS
        )
    }
}

impl Face for ConsoleFace {
    fn show(&mut self, top: &str, bottom: &str) -> Result<()> {
        let screen = Self::render(top, bottom);
        blocking_io(|| {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", screen)?;
            out.flush()?;
            Ok(())
        })
    }

    fn clear(&mut self) -> Result<()> {
        self.show("", "")
    }
}

/// Prints the LED state as three lamps.
pub struct ConsoleEyes;

impl ConsoleEyes {
    /// One letter per lit channel, `.` for dark.
    fn render(pattern: EyePattern) -> String {
        let lamp = |on: bool, label: char| if on { label } else { '.' };
        format!(
            "eyes [{}{}{}]",
            lamp(pattern.red, 'R'),
            lamp(pattern.blue, 'B'),
            lamp(pattern.green, 'G')
        )
    }
}

impl Eyes for ConsoleEyes {
    fn apply(&mut self, pattern: EyePattern) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", Self::render(pattern))?;
        out.flush()?;
        Ok(())
    }
}

/// Enter on stdin presses the ear.
pub struct ConsoleTrigger {
    input: ConsoleInput,
}

impl ConsoleTrigger {
    /// Presses the ear on every line read from `input`.
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Trigger for ConsoleTrigger {
    async fn wait_for_trigger(&mut self) -> Result<bool> {
        println!("(press Enter to press Snowy's ear)");
        Ok(self.input.read_line().await?.is_some())
    }
}
