/*
 * @file hardware/mod.rs
 * @brief Hardware seams for Snowy's face, eyes and ear button
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

//! Snowy's body.
//!
//! The session loop only talks to [`Body`]; the concrete face, eyes and
//! trigger come from [`console`] (simulation) or `gpio` (Raspberry Pi).

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::mood::{self, EyePattern, Mood};
use crate::pager::{Page, Pager, LCD_COLUMNS};

pub mod console;
#[cfg(all(feature = "gpio", target_os = "linux"))]
pub mod gpio;

/// A two-row character display.
pub trait Face: Send {
    /// Clears the screen and writes both rows.
    fn show(&mut self, top: &str, bottom: &str) -> Result<()>;

    /// Blanks both rows.
    fn clear(&mut self) -> Result<()>;
}

/// Three independent LED channels.
pub trait Eyes: Send {
    /// Overwrites all three channels at once.
    fn apply(&mut self, pattern: EyePattern) -> Result<()>;
}

/// The single edge-triggered input.
#[async_trait]
pub trait Trigger: Send {
    /// Waits for the next press.
    ///
    /// # Returns
    /// `Ok(true)` on a press, `Ok(false)` once the input can never fire again.
    async fn wait_for_trigger(&mut self) -> Result<bool>;
}

/// Runs a short blocking device write from async code.
///
/// On a multi-threaded runtime the worker hands its other tasks off first;
/// elsewhere `io` runs in place.
///
/// # Returns
/// Whatever `io` returns.
pub(crate) fn blocking_io<T>(io: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(io)
        }
        _ => io(),
    }
}

/// Face, eyes and ear button with the state they currently show.
pub struct Body {
    face: Box<dyn Face>,
    eyes: Box<dyn Eyes>,
    trigger: Box<dyn Trigger>,
    width: usize,
    mood: Mood,
    screen: Page,
}

impl Body {
    /// Assembles a body and switches every LED off.
    ///
    /// # Errors
    /// Returns an error if the LEDs cannot be driven.
    pub fn new(face: Box<dyn Face>, eyes: Box<dyn Eyes>, trigger: Box<dyn Trigger>) -> Result<Self> {
        let mut body = Self {
            face,
            eyes,
            trigger,
            width: LCD_COLUMNS,
            mood: Mood::Off,
            screen: Page::default(),
        };
        body.set_mood(Mood::Off)?;
        Ok(body)
    }

    /// Replaces the screen with `top`/`bottom`, each cut to the screen width.
    pub fn show_face(&mut self, top: &str, bottom: &str) -> Result<()> {
        self.show_page(&Page::new(top, bottom))
    }

    /// Shows `page` cut to the screen width and remembers it.
    ///
    /// # Errors
    /// Returns an error if the display write fails.
    pub fn show_page(&mut self, page: &Page) -> Result<()> {
        let fitted = page.fitted(self.width);
        self.face.show(&fitted.top, &fitted.bottom)?;
        self.screen = fitted;
        Ok(())
    }

    /// Lights the eyes for `mood` at once.
    ///
    /// # Errors
    /// Returns an error if an LED line cannot be driven.
    pub fn set_mood(&mut self, mood: Mood) -> Result<()> {
        self.eyes.apply(mood.pattern())?;
        self.mood = mood;
        Ok(())
    }

    /// Blinks `mood` and leaves it showing.
    pub async fn blink(&mut self, mood: Mood, times: u32, interval: Duration) -> Result<()> {
        mood::blink(self.eyes.as_mut(), mood, times, interval).await?;
        self.mood = mood;
        Ok(())
    }

    /// Pages `text` across the screen at the pager's cadence.
    pub async fn scroll_text(&mut self, pager: &Pager, text: &str) -> Result<()> {
        let script = pager.paginate(text);
        pager.play(script, self).await
    }

    /// Waits for the ear button.
    ///
    /// # Returns
    /// `Ok(false)` once the button input is closed.
    pub async fn wait_for_trigger(&mut self) -> Result<bool> {
        self.trigger.wait_for_trigger().await
    }

    /// Clears the screen and turns every LED off.
    pub fn power_down(&mut self) -> Result<()> {
        self.face.clear()?;
        self.screen = Page::default();
        self.set_mood(Mood::Off)
    }

    /// The mood the eyes show now.
    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// The page the face shows now.
    pub fn screen(&self) -> &Page {
        &self.screen
    }
}

impl Face for Body {
    fn show(&mut self, top: &str, bottom: &str) -> Result<()> {
        self.show_face(top, bottom)
    }

    fn clear(&mut self) -> Result<()> {
        self.face.clear()?;
        self.screen = Page::default();
        Ok(())
    }
}

/// Recording fakes shared by the unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    pub(crate) struct RecordingFace {
        screens: Arc<Mutex<Vec<Page>>>,
    }

    impl RecordingFace {
        pub(crate) fn screens(&self) -> Vec<Page> {
            self.screens.lock().unwrap().clone()
        }
    }

    impl Face for RecordingFace {
        fn show(&mut self, top: &str, bottom: &str) -> Result<()> {
            self.screens.lock().unwrap().push(Page::new(top, bottom));
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.screens.lock().unwrap().push(Page::default());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct RecordingEyes {
        history: Arc<Mutex<Vec<EyePattern>>>,
    }

    impl RecordingEyes {
        pub(crate) fn history(&self) -> Vec<EyePattern> {
            self.history.lock().unwrap().clone()
        }
    }

    impl Eyes for RecordingEyes {
        fn apply(&mut self, pattern: EyePattern) -> Result<()> {
            self.history.lock().unwrap().push(pattern);
            Ok(())
        }
    }

    /// Fires `presses` times, then reports the input closed.
    pub(crate) struct CountedTrigger {
        pub(crate) presses: usize,
    }

    #[async_trait]
    impl Trigger for CountedTrigger {
        async fn wait_for_trigger(&mut self) -> Result<bool> {
            if self.presses == 0 {
                return Ok(false);
            }
            self.presses -= 1;
            Ok(true)
        }
    }

    /// A body wired to recording fakes.
    pub(crate) fn recording_body(presses: usize) -> (Body, RecordingFace, RecordingEyes) {
        let face = RecordingFace::default();
        let eyes = RecordingEyes::default();
        let body = Body::new(
            Box::new(face.clone()),
            Box::new(eyes.clone()),
            Box::new(CountedTrigger { presses }),
        )
        .unwrap();
        (body, face, eyes)
    }
}
