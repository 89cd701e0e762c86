/*
 * @file audio.rs
 * @brief Microphone capture, speech gating and WAV encoding
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

//! Audio capture for Snowy's ears.
//!
//! Recording runs on a blocking thread: wait for speech to begin, keep
//! recording until a pause or the phrase limit, then hand back 16-bit PCM.

use std::io::Cursor;
use std::time::Duration;

use anyhow::Result;
use hound::{WavSpec, WavWriter};

/// Sample rate for audio recording (16kHz).
pub const SAMPLE_RATE: u32 = 16000;

/// Number of audio channels (mono).
pub const CHANNELS: u16 = 1;

/// Bits per sample for WAV encoding.
const BITS_PER_SAMPLE: u16 = 16;

/// Minimum RMS amplitude considered speech.
///
/// Calibration can raise the threshold for noisy rooms but never lowers it
/// below this floor.
pub const SILENCE_RMS_THRESHOLD: f32 = 150.0;

/// Headroom applied to the measured ambient level during calibration.
const AMBIENT_HEADROOM: f32 = 1.5;

/// How often the capture loop inspects new samples.
pub const GATE_STEP: Duration = Duration::from_millis(100);

/// Root mean square of a block of samples. Empty input is silent.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy = samples
        .iter()
        .map(|sample| (*sample as f32).powi(2))
        .sum::<f32>()
        / samples.len() as f32;
    energy.sqrt()
}

/// Speech threshold for a room whose background level is `ambient_rms`.
pub fn threshold_for_ambient(ambient_rms: f32) -> f32 {
    (ambient_rms * AMBIENT_HEADROOM).max(SILENCE_RMS_THRESHOLD)
}

/// Encodes mono 16 kHz PCM as an in-memory WAV file.
///
/// # Errors
/// Returns an error if the WAV writer fails.
pub fn encode_wav(samples: &[i16]) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(bytes)
}

/// Where a capture stands after the latest block of audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// No speech yet.
    Waiting,
    Recording,
    /// Speech ended with a pause or hit the phrase limit.
    Finished,
    /// Nobody started speaking in time.
    TimedOut,
}

/// Decides when a spoken phrase starts and ends from per-block RMS levels.
#[derive(Clone, Debug)]
pub struct PhraseGate {
    threshold: f32,
    start_timeout: Duration,
    phrase_limit: Duration,
    silence_pause: Duration,
    started_at: Option<Duration>,
    last_voice: Duration,
}

impl PhraseGate {
    /// Creates a gate waiting for speech.
    ///
    /// # Parameters
    /// * `threshold` - RMS level that counts as speech.
    /// * `start_timeout` - How long to wait for speech to begin.
    /// * `phrase_limit` - Longest phrase recorded once speech began.
    /// * `silence_pause` - Quiet time that ends a phrase.
    pub fn new(threshold: f32, start_timeout: Duration, phrase_limit: Duration, silence_pause: Duration) -> Self {
        Self {
            threshold,
            start_timeout,
            phrase_limit,
            silence_pause,
            started_at: None,
            last_voice: Duration::ZERO,
        }
    }

    /// Feeds the RMS of the block ending at `elapsed` since listening began.
    pub fn observe(&mut self, level: f32, elapsed: Duration) -> GateState {
        let voiced = level >= self.threshold;
        let Some(started) = self.started_at else {
            if voiced {
                self.started_at = Some(elapsed);
                self.last_voice = elapsed;
                return GateState::Recording;
            }
            return if elapsed >= self.start_timeout {
                GateState::TimedOut
            } else {
                GateState::Waiting
            };
        };
        if voiced {
            self.last_voice = elapsed;
        }
        let too_long = elapsed.saturating_sub(started) >= self.phrase_limit;
        let paused = elapsed.saturating_sub(self.last_voice) >= self.silence_pause;
        if too_long || paused {
            GateState::Finished
        } else {
            GateState::Recording
        }
    }
}

#[cfg(feature = "mic")]
pub use capture::{measure_ambient, record_phrase};

#[cfg(feature = "mic")]
mod capture {
    use std::sync::{Arc, Mutex, MutexGuard};
    use std::time::{Duration, Instant};

    use anyhow::{anyhow, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Device, Stream, StreamConfig, StreamError};
    use tracing::warn;

    use super::{rms, GateState, PhraseGate, CHANNELS, GATE_STEP, SAMPLE_RATE};

    type SharedSamples = Arc<Mutex<Vec<i16>>>;

    /// Records `duration` of room noise and returns its RMS level.
    ///
    /// # Errors
    /// Returns an error when no microphone is available.
    pub fn measure_ambient(duration: Duration) -> Result<f32> {
        let samples = shared_samples();
        let stream = open_stream(samples.clone())?;
        stream.play()?;
        std::thread::sleep(duration);
        drop(stream);
        let level = rms(&lock(&samples));
        Ok(level)
    }

    /// Listens until a phrase is spoken and finished.
    ///
    /// # Returns
    /// The phrase as PCM, or an empty vector if speech never began.
    ///
    /// # Errors
    /// Returns an error when the microphone cannot be opened.
    pub fn record_phrase(mut gate: PhraseGate) -> Result<Vec<i16>> {
        let samples = shared_samples();
        let stream = open_stream(samples.clone())?;
        stream.play()?;
        let began = Instant::now();
        let mut inspected = 0;
        let mut phrase_start = None;
        loop {
            std::thread::sleep(GATE_STEP);
            let buffer = lock(&samples);
            let level = rms(&buffer[inspected..]);
            let block_start = inspected;
            inspected = buffer.len();
            drop(buffer);
            match gate.observe(level, began.elapsed()) {
                GateState::Waiting => {}
                GateState::Recording => {
                    phrase_start.get_or_insert(block_start);
                }
                GateState::TimedOut => return Ok(Vec::new()),
                GateState::Finished => break,
            }
        }
        drop(stream);
        let buffer = lock(&samples);
        Ok(buffer[phrase_start.unwrap_or(0)..].to_vec())
    }

    /// Opens the default input device at 16 kHz mono.
    ///
    /// # Errors
    /// Returns an error if no input device exists or the stream cannot be built.
    fn open_stream(samples: SharedSamples) -> Result<Stream> {
        let device = default_input_device()?;
        build_input_stream(&device, &input_config(), samples)
    }

    /// Returns the host's default microphone.
    fn default_input_device() -> Result<Device> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device"))
    }

    /// 16 kHz mono with the device's default buffer size.
    fn input_config() -> StreamConfig {
        StreamConfig {
            channels: CHANNELS,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        }
    }

    /// An empty sample buffer shared with the capture callback.
    fn shared_samples() -> SharedSamples {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Locks the buffer, recovering it if a callback panicked.
    fn lock(samples: &SharedSamples) -> MutexGuard<'_, Vec<i16>> {
        samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Builds the f32 input stream that feeds `samples`.
    ///
    /// # Errors
    /// Returns an error if the device rejects the configuration.
    fn build_input_stream(device: &Device, config: &StreamConfig, samples: SharedSamples) -> Result<Stream> {
        device
            .build_input_stream(
                config,
                move |data: &[f32], _: &_| push_samples(&samples, data),
                log_stream_error,
                None,
            )
            .map_err(|err| anyhow!(err))
    }

    /// Converts a callback chunk to i16 and appends it.
    fn push_samples(buffer: &SharedSamples, data: &[f32]) {
        let mut guard = lock(buffer);
        for &sample in data {
            guard.push((sample * i16::MAX as f32) as i16);
        }
    }

    /// Reports capture errors from the audio thread.
    fn log_stream_error(error: StreamError) {
        warn!(%error, "audio stream error");
    }

}
