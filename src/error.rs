/*
 * @file error.rs
 * @brief Error taxonomy shared by Snowy's body, ears and brain
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

//! Typed failures that cross module boundaries.
//!
//! Hardware plumbing reports through [`anyhow::Error`]; the variants here are
//! the ones the session loop branches on.

use thiserror::Error;

/// Startup configuration problems. Fatal before the loop begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The chat provider credential was not found in the environment.
    #[error("GEMINI_API_KEY not found")]
    MissingApiKey,

    /// A setting parsed but holds an unusable value.
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

impl ConfigError {
    /// Human-readable remediation steps printed before exiting.
    pub fn remediation(&self) -> String {
        match self {
            ConfigError::MissingApiKey => [
                "You need to create a .env file like this:",
                "   1. Open a terminal on the Pi",
                "   2. Go to the Snowy folder: cd ~/Snowy",
                "   3. Run: nano .env",
                "   4. Type this (with your real key):",
                "        GEMINI_API_KEY=AIzaxxxxx",
                "   5. Save: Ctrl+O, Enter, Ctrl+X",
                "",
                "Get a free key at: aistudio.google.com/apikey",
            ]
            .join("\n"),
            ConfigError::InvalidSetting { name, .. } => {
                format!("Fix `{}` in the settings file or remove it to use the default.", name)
            }
        }
    }
}

/// Outcome classes of a failed chat call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The provider reported its usage limit is reached.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Network, auth, malformed response, or any other failure.
    #[error("chat service error: {0}")]
    Service(String),
}

impl ChatError {
    /// Classifies a failure from its HTTP status (if any) and payload text.
    ///
    /// Status 429 or a resource-exhaustion/quota marker anywhere in the
    /// payload means quota; everything else is a service error. Bare digits
    /// in the payload are never read as a status.
    ///
    /// # Parameters
    /// * `status` - HTTP status of the reply, `None` for transport failures.
    /// * `payload` - Error body or transport error text.
    ///
    /// # Returns
    /// [`ChatError::QuotaExhausted`] or [`ChatError::Service`] carrying `payload`.
    pub fn classify(status: Option<u16>, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        if status == Some(429) || has_quota_marker(&payload) {
            ChatError::QuotaExhausted(payload)
        } else {
            ChatError::Service(payload)
        }
    }

    /// Returns `true` for [`ChatError::QuotaExhausted`].
    pub fn is_quota(&self) -> bool {
        matches!(self, ChatError::QuotaExhausted(_))
    }
}

/// Returns `true` when `text` carries a provider quota/rate-limit marker.
pub fn has_quota_marker(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("resource_exhausted")
        || lower.contains("quota")
        || lower.contains("rate limit")
}

/// Failures of the transcription adapter.
///
/// "Heard nothing" is not an error: it is an empty transcript.
#[derive(Debug, Error)]
pub enum HearError {
    /// The recognition request itself failed.
    #[error("speech recognition unavailable: {0}")]
    ServiceUnavailable(String),

    /// The capture device or input stream failed.
    #[error("capture device error: {0}")]
    Device(String),
}
