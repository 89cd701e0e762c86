/*
 * @file ears.rs
 * @brief Snowy's ears: typed or spoken questions turned into text
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

//! Transcription adapters.
//!
//! An empty string means nothing intelligible was heard. A failed
//! recognition request is a [`HearError`] so the loop can log it apart from
//! silence.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

use crate::audio::encode_wav;
use crate::error::HearError;
use crate::gemini::{Content, GeminiClient, GenerateRequest, Part};
use crate::hardware::console::ConsoleInput;

/// Reply the model gives when a recording holds no words.
const NO_SPEECH: &str = "<none>";

const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the spoken words in this recording exactly, \
in the language spoken. Reply with the transcript only, without quotes or commentary. \
If no words are intelligible, reply with exactly: <none>";

/// Captures one question and returns its text.
#[async_trait]
pub trait Ears: Send {
    /// Waits at most `start_timeout` for the question to begin and records
    /// at most `phrase_limit` of it.
    async fn listen(&mut self, start_timeout: Duration, phrase_limit: Duration) -> Result<String, HearError>;
}

/// Questions typed at the terminal.
pub struct TypedEars {
    input: ConsoleInput,
}

impl TypedEars {
    /// Reads questions from the shared console input.
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Ears for TypedEars {
    /// Typing is slower than speaking, so both windows are allowed for it.
    async fn listen(&mut self, start_timeout: Duration, phrase_limit: Duration) -> Result<String, HearError> {
        println!("Type your question and press Enter:");
        let line = tokio::time::timeout(start_timeout + phrase_limit, self.input.read_line()).await;
        match line {
            Err(_) => Ok(String::new()),
            Ok(Ok(line)) => Ok(line.unwrap_or_default().trim().to_string()),
            Ok(Err(err)) => Err(HearError::Device(format!("{:#}", err))),
        }
    }
}

/// Speech-to-text through the chat provider, with the audio sent inline.
#[derive(Clone)]
pub struct GeminiTranscriber {
    client: GeminiClient,
}

impl GeminiTranscriber {
    /// Transcribes through `client`'s model.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Turns recorded PCM into text.
    ///
    /// # Errors
    /// [`HearError::ServiceUnavailable`] if the request fails.
    pub async fn transcribe(&self, samples: &[i16]) -> Result<String, HearError> {
        if samples.is_empty() {
            return Ok(String::new());
        }
        let request = transcription_request(samples)?;
        let reply = self
            .client
            .generate(&request)
            .await
            .map_err(|err| HearError::ServiceUnavailable(err.to_string()))?;
        Ok(clean_transcript(&reply))
    }
}

/// Builds a `generateContent` request carrying `samples` as inline WAV.
pub fn transcription_request(samples: &[i16]) -> Result<GenerateRequest, HearError> {
    let wav = encode_wav(samples).map_err(|err| HearError::Device(format!("{:#}", err)))?;
    let audio = general_purpose::STANDARD.encode(&wav);
    debug!(bytes = wav.len(), "sending recording for transcription");
    Ok(GenerateRequest {
        system_instruction: None,
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(TRANSCRIBE_INSTRUCTION), Part::inline("audio/wav", audio)],
        }],
    })
}

/// Maps the model's no-speech marker to empty and trims the rest.
fn clean_transcript(reply: &str) -> String {
    let text = reply.trim().trim_matches('"').trim();
    if text.eq_ignore_ascii_case(NO_SPEECH) {
        String::new()
    } else {
        text.to_string()
    }
}

#[cfg(feature = "mic")]
pub use microphone::MicEars;

#[cfg(feature = "mic")]
mod microphone {
    use std::time::Duration;

    use async_trait::async_trait;
    use tracing::info;

    use super::{Ears, GeminiTranscriber};
    use crate::audio::{self, PhraseGate};
    use crate::error::HearError;

    /// How long the room is sampled at startup.
    const CALIBRATION_WINDOW: Duration = Duration::from_secs(1);

    /// The USB microphone.
    pub struct MicEars {
        transcriber: GeminiTranscriber,
        threshold: f32,
        silence_pause: Duration,
    }

    impl MicEars {
        /// Opens the default microphone and calibrates for background noise.
        ///
        /// # Errors
        /// [`HearError::Device`] when no microphone can be opened.
        pub async fn calibrate(transcriber: GeminiTranscriber, silence_pause: Duration) -> Result<Self, HearError> {
            info!("Calibrating microphone... (stay quiet for a moment!)");
            let ambient = tokio::task::spawn_blocking(|| audio::measure_ambient(CALIBRATION_WINDOW))
                .await
                .map_err(|err| HearError::Device(err.to_string()))?
                .map_err(|err| HearError::Device(format!("{:#}", err)))?;
            let threshold = audio::threshold_for_ambient(ambient);
            info!(ambient, threshold, "Microphone ready! *ear twitch*");
            Ok(Self {
                transcriber,
                threshold,
                silence_pause,
            })
        }
    }

    #[async_trait]
    impl Ears for MicEars {
        async fn listen(&mut self, start_timeout: Duration, phrase_limit: Duration) -> Result<String, HearError> {
            let gate = PhraseGate::new(self.threshold, start_timeout, phrase_limit, self.silence_pause);
            let samples = tokio::task::spawn_blocking(move || audio::record_phrase(gate))
                .await
                .map_err(|err| HearError::Device(err.to_string()))?
                .map_err(|err| HearError::Device(format!("{:#}", err)))?;
            self.transcriber.transcribe(&samples).await
        }
    }
}

/// Replays canned transcription results.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    pub(crate) struct ScriptedEars {
        pub(crate) replies: VecDeque<Result<String, HearError>>,
    }

    impl ScriptedEars {
        pub(crate) fn new(replies: Vec<Result<String, HearError>>) -> Self {
            Self {
                replies: replies.into(),
            }
        }
    }

    #[async_trait]
    impl Ears for ScriptedEars {
        async fn listen(&mut self, _: Duration, _: Duration) -> Result<String, HearError> {
            self.replies.pop_front().unwrap_or_else(|| Ok(String::new()))
        }
    }
}
