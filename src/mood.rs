/*
 * @file mood.rs
 * @brief Mood table and eye blinking for Snowy's LED eyes
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

//! Moods and the LED patterns that show them.
//!
//! Red + green reads as yellow, red + blue as purple.

use std::fmt;
use std::time::Duration;

use anyhow::Result;

use crate::hardware::Eyes;

/// The closed set of moods Snowy can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Thinking,
    Curious,
    Playful,
    Grumpy,
    Sleepy,
    Off,
}

/// On/off state of the three eye channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EyePattern {
    pub red: bool,
    pub blue: bool,
    pub green: bool,
}

impl EyePattern {
    pub const OFF: EyePattern = EyePattern::new(false, false, false);

    pub const fn new(red: bool, blue: bool, green: bool) -> Self {
        Self { red, blue, green }
    }
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Happy,
        Mood::Thinking,
        Mood::Curious,
        Mood::Playful,
        Mood::Grumpy,
        Mood::Sleepy,
        Mood::Off,
    ];

    /// Looks a mood up by name. Unknown names fall back to [`Mood::Off`].
    pub fn from_tag(tag: &str) -> Mood {
        match tag.trim().to_ascii_lowercase().as_str() {
            "happy" => Mood::Happy,
            "thinking" => Mood::Thinking,
            "curious" => Mood::Curious,
            "playful" => Mood::Playful,
            "grumpy" => Mood::Grumpy,
            "sleepy" => Mood::Sleepy,
            _ => Mood::Off,
        }
    }

    /// The lowercase tag accepted by [`Mood::from_tag`].
    pub fn tag(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Thinking => "thinking",
            Mood::Curious => "curious",
            Mood::Playful => "playful",
            Mood::Grumpy => "grumpy",
            Mood::Sleepy => "sleepy",
            Mood::Off => "off",
        }
    }

    /// The fixed LED pattern for this mood.
    pub const fn pattern(self) -> EyePattern {
        match self {
            Mood::Happy => EyePattern::new(true, false, true),
            Mood::Thinking => EyePattern::new(false, true, false),
            Mood::Curious => EyePattern::new(false, false, true),
            Mood::Playful => EyePattern::new(true, true, false),
            Mood::Grumpy => EyePattern::new(true, false, false),
            Mood::Sleepy => EyePattern::new(false, true, false),
            Mood::Off => EyePattern::OFF,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Alternates `mood` with off `times` times, `interval` per half cycle,
/// and leaves the eyes showing `mood`.
pub async fn blink(eyes: &mut dyn Eyes, mood: Mood, times: u32, interval: Duration) -> Result<()> {
    for _ in 0..times {
        eyes.apply(mood.pattern())?;
        tokio::time::sleep(interval).await;
        eyes.apply(EyePattern::OFF)?;
        tokio::time::sleep(interval).await;
    }
    eyes.apply(mood.pattern())
}
