/*
 * @file config.rs
 * @brief Command line, settings file and environment for Snowy
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

//! Runtime configuration.
//!
//! The API key comes from the environment (optionally via `.env`); everything
//! else has a default and may be overridden in a JSON settings file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::pager::OverflowPolicy;

/// Environment variable holding the chat provider key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable that overrides the chat model.
pub const MODEL_VAR: &str = "SNOWY_MODEL";

/// Settings file read when `--config` is not given.
pub const DEFAULT_SETTINGS_PATH: &str = "snowy.json";

/// Stable model with a generous free tier.
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Snowy the snow leopard: press the ear, ask a question, read the answer.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON settings file.
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    pub config: PathBuf,

    /// Use the terminal body even when GPIO hardware is available.
    #[arg(long)]
    pub simulate: bool,

    /// Type questions instead of speaking them.
    #[arg(long)]
    pub typed: bool,
}

/// Everything the binary needs to start.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub settings: Settings,
    pub simulate: bool,
    pub typed: bool,
}

impl Config {
    /// Loads `.env`, the environment and the settings file named by `cli`.
    ///
    /// # Errors
    /// [`ConfigError::MissingApiKey`] when no key is set, or
    /// [`ConfigError::InvalidSetting`] for unusable settings.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let settings = load_settings(&cli.config);
        let mut config = Self::from_parts(env::var(API_KEY_VAR).ok(), env::var(MODEL_VAR).ok(), settings)?;
        config.simulate = cli.simulate;
        config.typed = cli.typed;
        Ok(config)
    }

    /// Builds a validated configuration from already-read values.
    pub fn from_parts(
        api_key: Option<String>,
        model_override: Option<String>,
        mut settings: Settings,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        if let Some(model) = model_override.filter(|model| !model.trim().is_empty()) {
            settings.model = model.trim().to_string();
        }
        settings.validate()?;
        Ok(Self {
            api_key,
            settings,
            simulate: false,
            typed: false,
        })
    }
}

/// Values from the settings file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub overflow: OverflowPolicy,
    pub hardware: HardwareSettings,
    pub timings: Timings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            overflow: OverflowPolicy::default(),
            hardware: HardwareSettings::default(),
            timings: Timings::default(),
        }
    }
}

impl Settings {
    /// Rejects settings the hardware or provider cannot use.
    ///
    /// # Errors
    /// [`ConfigError::InvalidSetting`] naming the first bad field.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.hardware.lcd_address > 0x7F {
            return Err(ConfigError::InvalidSetting {
                name: "hardware.lcd_address",
                reason: format!("{:#x} is not a 7-bit I2C address", self.hardware.lcd_address),
            });
        }
        if self.timings.quota_probe_interval.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: "timings.quota_probe_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// GPIO and I2C wiring.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HardwareSettings {
    pub gpio_chip: String,
    pub red_pin: u32,
    pub blue_pin: u32,
    pub green_pin: u32,
    pub button_pin: u32,
    pub i2c_bus: String,
    pub lcd_address: u8,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            gpio_chip: "/dev/gpiochip0".to_string(),
            red_pin: 17,
            blue_pin: 27,
            green_pin: 22,
            button_pin: 18,
            i2c_bus: "/dev/i2c-1".to_string(),
            lcd_address: 0x27,
        }
    }
}

/// Pacing of the session loop. Durations are written in milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timings {
    #[serde(rename = "page_pause_ms", with = "millis")]
    pub page_pause: Duration,
    #[serde(rename = "notice_hold_ms", with = "millis")]
    pub notice_hold: Duration,
    #[serde(rename = "greeting_hold_ms", with = "millis")]
    pub greeting_hold: Duration,
    #[serde(rename = "heard_hold_ms", with = "millis")]
    pub heard_hold: Duration,
    #[serde(rename = "farewell_hold_ms", with = "millis")]
    pub farewell_hold: Duration,
    pub blink_times: u32,
    #[serde(rename = "blink_interval_ms", with = "millis")]
    pub blink_interval: Duration,
    #[serde(rename = "listen_timeout_ms", with = "millis")]
    pub listen_timeout: Duration,
    #[serde(rename = "phrase_limit_ms", with = "millis")]
    pub phrase_limit: Duration,
    #[serde(rename = "silence_pause_ms", with = "millis")]
    pub silence_pause: Duration,
    #[serde(rename = "quota_probe_interval_ms", with = "millis")]
    pub quota_probe_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            page_pause: Duration::from_millis(2500),
            notice_hold: Duration::from_secs(2),
            greeting_hold: Duration::from_secs(2),
            heard_hold: Duration::from_secs(1),
            farewell_hold: Duration::from_secs(2),
            blink_times: 4,
            blink_interval: Duration::from_millis(300),
            listen_timeout: Duration::from_secs(6),
            phrase_limit: Duration::from_secs(8),
            silence_pause: Duration::from_millis(2500),
            quota_probe_interval: Duration::from_secs(30 * 60),
        }
    }
}

impl Timings {
    /// No holds or pauses at all; blinking still happens once.
    pub fn instant() -> Self {
        Self {
            page_pause: Duration::ZERO,
            notice_hold: Duration::ZERO,
            greeting_hold: Duration::ZERO,
            heard_hold: Duration::ZERO,
            farewell_hold: Duration::ZERO,
            blink_times: 1,
            blink_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Reads the settings file, falling back to defaults when it is missing or
/// malformed.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match read_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{:#}", err), "settings load error, using defaults");
            Settings::default()
        }
    }
}

/// Reads and parses the settings file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid JSON.
fn read_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
