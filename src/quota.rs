/*
 * @file quota.rs
 * @brief Shared quota flag and the background recovery probe
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

//! Quota tracking.
//!
//! [`QuotaStatus`] is the only state shared between the session loop and
//! the probe task. It is written by the chat session after every call and by
//! the probe after every probe it actually sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::brain::{ChatBackend, Turn};

/// Instruction for the probe call; keeps the reply and token cost tiny.
const PROBE_PERSONA: &str = "Reply with the single word: ok";
const PROBE_QUESTION: &str = "ping";

/// `true` while the provider accepts calls.
#[derive(Clone, Debug)]
pub struct QuotaStatus {
    ok: Arc<AtomicBool>,
}

impl QuotaStatus {
    /// Starts out ok.
    pub fn new() -> Self {
        Self {
            ok: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns `true` unless the last quota signal was exhaustion.
    pub fn is_ok(&self) -> bool {
        self.ok.load(Ordering::Acquire)
    }

    /// Records a successful call. Logs only when this is a change.
    pub fn mark_ok(&self) {
        if !self.ok.swap(true, Ordering::AcqRel) {
            info!("quota recovered");
        }
    }

    /// Records a quota failure. Logs only when this is a change.
    pub fn mark_exhausted(&self) {
        if self.ok.swap(false, Ordering::AcqRel) {
            info!("quota exhausted");
        }
    }
}

impl Default for QuotaStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// What a single probe round did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Quota was fine; nothing was sent.
    Skipped,
    Recovered,
    StillExhausted,
    /// A non-quota failure; the status was left alone.
    Inconclusive,
}

/// Periodically re-tests the quota while it is exhausted.
pub struct QuotaProbe<B> {
    backend: Arc<B>,
    status: QuotaStatus,
}

impl<B: ChatBackend + 'static> QuotaProbe<B> {
    /// Creates a probe that re-tests `backend` and writes into `status`.
    ///
    /// # Parameters
    /// * `backend` - The same provider the chat session uses.
    /// * `status` - A clone of the session's quota cell.
    pub fn new(backend: Arc<B>, status: QuotaStatus) -> Self {
        Self { backend, status }
    }

    /// Sends one probe if the quota is exhausted and records the result.
    pub async fn probe_once(&self) -> ProbeOutcome {
        if self.status.is_ok() {
            return ProbeOutcome::Skipped;
        }
        let turns = [Turn::user(PROBE_QUESTION)];
        match self.backend.send(PROBE_PERSONA, &turns).await {
            Ok(_) => {
                self.status.mark_ok();
                ProbeOutcome::Recovered
            }
            Err(err) if err.is_quota() => {
                debug!("quota probe: still exhausted");
                ProbeOutcome::StillExhausted
            }
            Err(err) => {
                debug!(error = %err, "quota probe inconclusive");
                ProbeOutcome::Inconclusive
            }
        }
    }

    /// Runs [`Self::probe_once`] every `interval` on a background task.
    ///
    /// The first probe happens one full interval after spawning.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = self.probe_once().await;
                debug!(?outcome, "quota probe round");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MockChatBackend;
    use crate::error::ChatError;

    fn probe_with(backend: MockChatBackend, status: &QuotaStatus) -> QuotaProbe<MockChatBackend> {
        QuotaProbe::new(Arc::new(backend), status.clone())
    }

    #[test]
    fn clones_share_one_flag() {
        let status = QuotaStatus::new();
        let other = status.clone();
        assert!(other.is_ok());
        status.mark_exhausted();
        assert!(!other.is_ok());
        other.mark_ok();
        assert!(status.is_ok());
    }

    #[tokio::test]
    async fn healthy_quota_is_not_probed() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let status = QuotaStatus::new();
        assert_eq!(probe_with(backend, &status).probe_once().await, ProbeOutcome::Skipped);
    }

    #[tokio::test]
    async fn successful_probe_recovers() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().times(1).returning(|_, _| Ok("ok".to_string()));
        let status = QuotaStatus::new();
        status.mark_exhausted();
        assert_eq!(probe_with(backend, &status).probe_once().await, ProbeOutcome::Recovered);
        assert!(status.is_ok());
    }

    #[tokio::test]
    async fn quota_error_keeps_exhausted() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::QuotaExhausted("RESOURCE_EXHAUSTED".into())));
        let status = QuotaStatus::new();
        status.mark_exhausted();
        assert_eq!(probe_with(backend, &status).probe_once().await, ProbeOutcome::StillExhausted);
        assert!(!status.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_probe_waits_one_interval_then_recovers() {
        let interval = Duration::from_secs(30 * 60);
        let mut backend = MockChatBackend::new();
        backend.expect_send().times(1).returning(|_, _| Ok("ok".to_string()));
        let status = QuotaStatus::new();
        status.mark_exhausted();
        let handle = probe_with(backend, &status).spawn(interval);

        tokio::time::sleep(interval - Duration::from_secs(1)).await;
        assert!(!status.is_ok());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(status.is_ok());

        // Later rounds see a healthy quota and send nothing.
        tokio::time::sleep(interval * 3).await;
        assert!(status.is_ok());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn network_blip_changes_nothing() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::Service("connection reset".into())));
        let status = QuotaStatus::new();
        status.mark_exhausted();
        let probe = probe_with(backend, &status);
        for _ in 0..3 {
            assert_eq!(probe.probe_once().await, ProbeOutcome::Inconclusive);
            assert!(!status.is_ok());
        }
    }
}
