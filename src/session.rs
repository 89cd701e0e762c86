/*
 * @file session.rs
 * @brief Session loop: Snowy's idle, listening, thinking and answering states
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

//! Session loop.
//!
//! One turn is: wait for the ear button, listen, think, answer, go back to
//! idle. Every move between [`SessionState`]s goes through [`transition`]
//! and redraws both the face and the eyes before the next blocking wait.

use std::future::Future;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

use crate::brain::{is_forget_request, ChatBackend, ChatSession};
use crate::config::Timings;
use crate::ears::Ears;
use crate::error::HearError;
use crate::hardware::Body;
use crate::mood::Mood;
use crate::pager::{Page, Pager};

const GREETING: (&str, &str) = ("Hello! I am", "Snowy! ^..^");
const IDLE_READY: (&str, &str) = ("Press my ear", "then speak!");
const IDLE_NO_CREDITS: (&str, &str) = ("No credits!", "Try tomorrow");
const LISTENING: (&str, &str) = ("Listening...", "Speak now! :)");
const THINKING: (&str, &str) = ("Hmm let me", "think... *paw*");
const HEARD_NOTHING: (&str, &str) = ("Hmm? I didn't", "catch that!");
const CONFUSED: (&str, &str) = ("Oops! Brain", "got confused!");
const FORGOTTEN: (&str, &str) = ("Memory wiped!", "Fresh start ^..^");
const FAREWELL: (&str, &str) = ("Goodbye!", "Purrrr... zzz");
const HEARD_LABEL: &str = "I heard:";

/// Where Snowy is within a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Thinking,
    Answering,
    Shutdown,
}

/// Something that moves the session along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Trigger,
    HeardNothing,
    Heard,
    Forgot,
    Answered,
    QuotaExhausted,
    ServiceFailed,
    Displayed,
    Interrupt,
}

/// The transition table. `None` means the event is not valid in `state`.
pub fn transition(state: SessionState, event: Event) -> Option<SessionState> {
    use Event::*;
    use SessionState::*;
    match (state, event) {
        (Shutdown, _) => None,
        (_, Interrupt) => Some(Shutdown),
        (Idle, Trigger) => Some(Capturing),
        (Capturing, HeardNothing | Forgot) => Some(Idle),
        (Capturing, Heard) => Some(Thinking),
        (Thinking, Answered) => Some(Answering),
        (Thinking, QuotaExhausted | ServiceFailed) => Some(Idle),
        (Answering, Displayed) => Some(Idle),
        _ => None,
    }
}

/// Whether the loop should wait for another turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The trigger input is gone for good.
    Stop,
}

/// Snowy's body, ears and brain driven through the state machine.
pub struct Session<B> {
    body: Body,
    ears: Box<dyn Ears>,
    brain: ChatSession<B>,
    pager: Pager,
    timings: Timings,
    state: SessionState,
}

impl<B: ChatBackend> Session<B> {
    /// Assembles a session that starts in [`SessionState::Idle`].
    ///
    /// # Parameters
    /// * `body` - Face, eyes and ear button.
    /// * `ears` - Turns a question into text.
    /// * `brain` - Conversation and quota status.
    /// * `pager` - Screen width, page pause and overflow policy.
    /// * `timings` - Holds, blink cadence and listening windows.
    pub fn new(body: Body, ears: Box<dyn Ears>, brain: ChatSession<B>, pager: Pager, timings: Timings) -> Self {
        Self {
            body,
            ears,
            brain,
            pager,
            timings,
            state: SessionState::Idle,
        }
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The body, with the screen and mood it shows.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The conversation so far.
    pub fn brain(&self) -> &ChatSession<B> {
        &self.brain
    }

    /// Greets, serves turns until `shutdown` resolves or the trigger closes,
    /// then says goodbye and powers down.
    ///
    /// The goodbye runs even if serving failed.
    ///
    /// # Errors
    /// Returns the first of the serving error and the power-down error.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let served = self.serve(shutdown).await;
        let slept = self.shut_down().await;
        served.and(slept)
    }

    /// Greets, then loops over turns until `shutdown` resolves or the
    /// trigger closes. A failed turn is logged and the face returns to idle.
    ///
    /// # Errors
    /// Only a failed greeting.
    async fn serve<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.greet().await?;
        tokio::pin!(shutdown);
        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => None,
                flow = self.turn() => Some(flow),
            };
            match outcome {
                None => {
                    info!("Putting Snowy to sleep... *purr*");
                    return Ok(());
                }
                Some(Ok(Flow::Continue)) => {}
                Some(Ok(Flow::Stop)) => {
                    info!("ear button input closed");
                    return Ok(());
                }
                Some(Err(err)) => {
                    error!(error = %format!("{:#}", err), "turn failed");
                    self.recover().await;
                }
            }
        }
    }

    /// Shows the greeting with happy eyes, then the idle screen.
    async fn greet(&mut self) -> Result<()> {
        self.show(GREETING)?;
        self.body.set_mood(Mood::Happy)?;
        tokio::time::sleep(self.timings.greeting_hold).await;
        self.state = SessionState::Idle;
        self.render().await?;
        info!("Snowy is ready!");
        Ok(())
    }

    /// Runs one full turn from the button press back to idle.
    ///
    /// # Errors
    /// Only hardware failures; chat and hearing failures are shown on the
    /// face instead.
    pub async fn turn(&mut self) -> Result<Flow> {
        debug!("waiting for button press");
        if !self.body.wait_for_trigger().await? {
            return Ok(Flow::Stop);
        }
        info!("Button pressed! Listening...");
        self.advance(Event::Trigger).await?;

        let question = self.hear().await;
        if question.is_empty() {
            self.notice(HEARD_NOTHING, Mood::Sleepy).await?;
            self.advance(Event::HeardNothing).await?;
            return Ok(Flow::Continue);
        }

        info!(%question, "heard");
        self.body.show_face(HEARD_LABEL, &question)?;
        tokio::time::sleep(self.timings.heard_hold).await;

        if is_forget_request(&question) {
            self.brain.reset();
            self.notice(FORGOTTEN, Mood::Playful).await?;
            self.advance(Event::Forgot).await?;
            return Ok(Flow::Continue);
        }

        self.advance(Event::Heard).await?;
        match self.brain.ask(&question).await {
            Ok(answer) => {
                info!(%answer, "Snowy says");
                self.advance(Event::Answered).await?;
                self.body.scroll_text(&self.pager, &answer).await?;
                self.advance(Event::Displayed).await?;
            }
            Err(err) if err.is_quota() => {
                warn!(error = %err, "out of chat quota");
                self.notice(IDLE_NO_CREDITS, Mood::Grumpy).await?;
                self.advance(Event::QuotaExhausted).await?;
            }
            Err(err) => {
                warn!(error = %err, "chat call failed");
                self.notice(CONFUSED, Mood::Grumpy).await?;
                self.advance(Event::ServiceFailed).await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Listens for a question; every failure reads as "heard nothing".
    async fn hear(&mut self) -> String {
        let heard = self
            .ears
            .listen(self.timings.listen_timeout, self.timings.phrase_limit)
            .await;
        match heard {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    info!("heard nothing");
                }
                text
            }
            Err(HearError::ServiceUnavailable(reason)) => {
                warn!(%reason, "speech recognition unavailable");
                String::new()
            }
            Err(HearError::Device(reason)) => {
                warn!(%reason, "microphone failed");
                String::new()
            }
        }
    }

    /// Moves along the transition table and redraws.
    ///
    /// # Errors
    /// Returns an error if `event` is not valid in the current state or the
    /// redraw fails.
    async fn advance(&mut self, event: Event) -> Result<()> {
        let next = transition(self.state, event)
            .ok_or_else(|| anyhow!("no transition from {:?} on {:?}", self.state, event))?;
        debug!(from = ?self.state, ?event, to = ?next, "session transition");
        self.state = next;
        self.render().await
    }

    /// Draws the current state on the face and eyes.
    async fn render(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => {
                if self.brain.quota().is_ok() {
                    self.show(IDLE_READY)?;
                    self.body.set_mood(Mood::Curious)
                } else {
                    self.show(IDLE_NO_CREDITS)?;
                    self.body.set_mood(Mood::Grumpy)
                }
            }
            SessionState::Capturing => {
                self.show(LISTENING)?;
                self.body.set_mood(Mood::Curious)
            }
            SessionState::Thinking => {
                self.show(THINKING)?;
                let timings = &self.timings;
                self.body
                    .blink(Mood::Thinking, timings.blink_times, timings.blink_interval)
                    .await
            }
            // The answer pages follow straight away.
            SessionState::Answering => self.body.set_mood(Mood::Happy),
            SessionState::Shutdown => {
                self.body.set_mood(Mood::Sleepy)?;
                self.show(FAREWELL)?;
                tokio::time::sleep(self.timings.farewell_hold).await;
                Ok(())
            }
        }
    }

    /// Shows a transient page with `mood` and holds it.
    async fn notice(&mut self, lines: (&str, &str), mood: Mood) -> Result<()> {
        self.show(lines)?;
        self.body.set_mood(mood)?;
        tokio::time::sleep(self.timings.notice_hold).await;
        Ok(())
    }

    /// Shows a fixed two-row message.
    fn show(&mut self, (top, bottom): (&str, &str)) -> Result<()> {
        self.body.show_page(&Page::new(top, bottom))
    }

    /// Puts the face back on idle after a failed turn.
    async fn recover(&mut self) {
        self.state = SessionState::Idle;
        if let Err(err) = self.render().await {
            error!(error = %format!("{:#}", err), "could not redraw idle screen");
        }
    }

    /// Sleepy eyes, goodbye page, hold, then screen and LEDs off.
    ///
    /// Power-down runs even if the goodbye failed.
    ///
    /// # Errors
    /// The first of the goodbye and power-down errors.
    async fn shut_down(&mut self) -> Result<()> {
        let farewell = if self.state == SessionState::Shutdown {
            Ok(())
        } else {
            self.advance(Event::Interrupt).await
        };
        let off = self.body.power_down();
        info!("Snowy is asleep. Goodnight!");
        farewell.and(off)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ears::testing::ScriptedEars;
    use crate::error::ChatError;
    use crate::hardware::testing::{recording_body, CountedTrigger, RecordingEyes, RecordingFace};
    use crate::hardware::{Eyes, Face, Trigger};
    use crate::mood::EyePattern;
    use crate::brain::MockChatBackend;
    use crate::quota::QuotaStatus;

    const ALL_STATES: [SessionState; 5] = [
        SessionState::Idle,
        SessionState::Capturing,
        SessionState::Thinking,
        SessionState::Answering,
        SessionState::Shutdown,
    ];

    struct Harness {
        session: Session<MockChatBackend>,
        face: RecordingFace,
        eyes: RecordingEyes,
        quota: QuotaStatus,
    }

    fn harness(presses: usize, heard: Vec<Result<String, HearError>>, backend: MockChatBackend) -> Harness {
        let (body, face, eyes) = recording_body(presses);
        let quota = QuotaStatus::new();
        let brain = ChatSession::new(Arc::new(backend), quota.clone());
        let timings = Timings::instant();
        let pager = Pager {
            pause: timings.page_pause,
            ..Pager::default()
        };
        let session = Session::new(body, Box::new(ScriptedEars::new(heard)), brain, pager, timings);
        Harness {
            session,
            face,
            eyes,
            quota,
        }
    }

    fn page((top, bottom): (&str, &str)) -> Page {
        Page::new(top, bottom)
    }

    #[test]
    fn transition_table_covers_the_turn() {
        use Event::*;
        use SessionState::*;
        assert_eq!(transition(Idle, Trigger), Some(Capturing));
        assert_eq!(transition(Capturing, HeardNothing), Some(Idle));
        assert_eq!(transition(Capturing, Forgot), Some(Idle));
        assert_eq!(transition(Capturing, Heard), Some(Thinking));
        assert_eq!(transition(Thinking, Answered), Some(Answering));
        assert_eq!(transition(Thinking, QuotaExhausted), Some(Idle));
        assert_eq!(transition(Thinking, ServiceFailed), Some(Idle));
        assert_eq!(transition(Answering, Displayed), Some(Idle));
    }

    #[test]
    fn states_cannot_be_skipped() {
        use Event::*;
        use SessionState::*;
        assert_eq!(transition(Idle, Heard), None);
        assert_eq!(transition(Idle, Answered), None);
        assert_eq!(transition(Capturing, Answered), None);
        assert_eq!(transition(Thinking, Trigger), None);
        assert_eq!(transition(Answering, Trigger), None);
    }

    #[test]
    fn interrupt_always_shuts_down_and_shutdown_is_terminal() {
        for state in ALL_STATES {
            let expected = (state != SessionState::Shutdown).then_some(SessionState::Shutdown);
            assert_eq!(transition(state, Event::Interrupt), expected, "{state:?}");
            if state == SessionState::Shutdown {
                assert_eq!(transition(state, Event::Trigger), None);
            }
        }
    }

    #[tokio::test]
    async fn empty_transcription_shows_notice_without_asking() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let mut h = harness(1, vec![Ok("  ".to_string())], backend);

        assert_eq!(h.session.turn().await.unwrap(), Flow::Continue);

        let screens = h.face.screens();
        assert_eq!(screens[0], page(LISTENING));
        assert_eq!(screens[1], page(HEARD_NOTHING));
        assert_eq!(screens.last(), Some(&page(IDLE_READY)));
        assert_eq!(h.session.state(), SessionState::Idle);
        assert_eq!(h.session.body().mood(), Mood::Curious);
        assert!(h.eyes.history().contains(&Mood::Sleepy.pattern()));
    }

    #[tokio::test]
    async fn recognition_outage_reads_as_heard_nothing() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let heard = vec![Err(HearError::ServiceUnavailable("dns failure".into()))];
        let mut h = harness(1, heard, backend);

        h.session.turn().await.unwrap();

        assert!(h.face.screens().contains(&page(HEARD_NOTHING)));
        assert_eq!(h.session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn answer_is_paged_then_back_to_idle() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .times(1)
            .returning(|_, _| Ok("The quick brown fox jumps over the lazy dog".to_string()));
        let mut h = harness(1, vec![Ok("tell me a pangram".to_string())], backend);

        h.session.turn().await.unwrap();

        assert_eq!(
            h.face.screens(),
            vec![
                page(LISTENING),
                Page::new(HEARD_LABEL, "tell me a pangra"),
                page(THINKING),
                Page::new("The quick brown", "fox jumps over"),
                Page::new("the lazy dog", ""),
                page(IDLE_READY),
            ]
        );
        let history = h.eyes.history();
        let thinking = history.iter().position(|p| *p == Mood::Thinking.pattern()).unwrap();
        let happy = history.iter().position(|p| *p == Mood::Happy.pattern()).unwrap();
        assert!(thinking < happy);
        assert_eq!(history.last(), Some(&Mood::Curious.pattern()));
        assert_eq!(h.session.brain().transcript().len(), 2);
    }

    #[tokio::test]
    async fn quota_error_degrades_the_idle_screen() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::classify(Some(429), "RESOURCE_EXHAUSTED")));
        let mut h = harness(1, vec![Ok("what is snow".to_string())], backend);

        h.session.turn().await.unwrap();

        assert!(!h.quota.is_ok());
        assert_eq!(h.session.state(), SessionState::Idle);
        assert_eq!(h.session.body().screen(), &page(IDLE_NO_CREDITS));
        assert_eq!(h.session.body().mood(), Mood::Grumpy);
        assert_eq!(h.eyes.history().last(), Some(&Mood::Grumpy.pattern()));
    }

    #[tokio::test]
    async fn service_error_shows_confused_then_ready() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::Service("401 Unauthorized".into())));
        let mut h = harness(1, vec![Ok("hello".to_string())], backend);

        h.session.turn().await.unwrap();

        let screens = h.face.screens();
        assert!(screens.contains(&page(CONFUSED)));
        assert_eq!(screens.last(), Some(&page(IDLE_READY)));
        assert!(h.quota.is_ok());
        assert_eq!(h.session.body().mood(), Mood::Curious);
    }

    #[tokio::test]
    async fn success_after_exhaustion_restores_ready_idle() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().returning(|_, _| Ok("Purr, I'm back.".to_string()));
        let mut h = harness(1, vec![Ok("are you awake".to_string())], backend);
        h.quota.mark_exhausted();

        h.session.turn().await.unwrap();

        assert!(h.quota.is_ok());
        assert_eq!(h.session.body().screen(), &page(IDLE_READY));
        assert_eq!(h.session.body().mood(), Mood::Curious);
    }

    #[tokio::test]
    async fn forget_request_resets_without_asking() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().times(1).returning(|_, _| Ok("Hi!".to_string()));
        let heard = vec![Ok("hello".to_string()), Ok("please start over".to_string())];
        let mut h = harness(2, heard, backend);

        h.session.turn().await.unwrap();
        assert_eq!(h.session.brain().transcript().len(), 2);
        h.session.turn().await.unwrap();

        assert!(h.session.brain().transcript().is_empty());
        assert!(h.face.screens().contains(&page(FORGOTTEN)));
        assert!(h.eyes.history().contains(&Mood::Playful.pattern()));
        assert_eq!(h.session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn closed_trigger_ends_with_goodbye_and_darkness() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let mut h = harness(0, Vec::new(), backend);

        h.session.run(std::future::pending()).await.unwrap();

        let screens = h.face.screens();
        assert_eq!(screens[0], page(GREETING));
        assert_eq!(screens[1], page(IDLE_READY));
        assert_eq!(screens[screens.len() - 2], page(FAREWELL));
        assert_eq!(screens.last(), Some(&Page::default()));
        let history = h.eyes.history();
        assert_eq!(history[history.len() - 2], Mood::Sleepy.pattern());
        assert_eq!(history.last(), Some(&EyePattern::OFF));
        assert_eq!(h.session.state(), SessionState::Shutdown);
    }

    /// Fails the first `failures` requests to light `pattern`.
    struct FlakyEyes {
        inner: RecordingEyes,
        pattern: EyePattern,
        failures: usize,
    }

    impl Eyes for FlakyEyes {
        fn apply(&mut self, pattern: EyePattern) -> Result<()> {
            if pattern == self.pattern && self.failures > 0 {
                self.failures -= 1;
                return Err(anyhow!("LED line busy"));
            }
            self.inner.apply(pattern)
        }
    }

    /// Fails once when asked to show a page whose top row is `top`.
    struct FlakyFace {
        inner: RecordingFace,
        top: &'static str,
        failed: bool,
    }

    impl Face for FlakyFace {
        fn show(&mut self, top: &str, bottom: &str) -> Result<()> {
            if top == self.top && !self.failed {
                self.failed = true;
                return Err(anyhow!("LCD I2C write failed"));
            }
            self.inner.show(top, bottom)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn failed_turn_returns_to_idle_and_keeps_serving() {
        let face = RecordingFace::default();
        let eyes = RecordingEyes::default();
        let flaky = FlakyEyes {
            inner: eyes.clone(),
            pattern: Mood::Sleepy.pattern(),
            failures: 1,
        };
        let body = Body::new(
            Box::new(face.clone()),
            Box::new(flaky),
            Box::new(CountedTrigger { presses: 2 }),
        )
        .unwrap();
        let mut backend = MockChatBackend::new();
        backend.expect_send().times(1).returning(|_, _| Ok("Snow is frozen water.".to_string()));
        let heard = vec![Ok(String::new()), Ok("what is snow".to_string())];
        let brain = ChatSession::new(Arc::new(backend), QuotaStatus::new());
        let mut session = Session::new(
            body,
            Box::new(ScriptedEars::new(heard)),
            brain,
            Pager::default(),
            Timings::instant(),
        );

        session.run(std::future::pending()).await.unwrap();

        let screens = face.screens();
        let notice = screens.iter().position(|p| *p == page(HEARD_NOTHING)).unwrap();
        assert_eq!(screens[notice + 1], page(IDLE_READY));
        assert!(screens.contains(&Page::new("Snow is frozen", "water.")));
        assert_eq!(session.brain().transcript().len(), 2);
        assert_eq!(session.state(), SessionState::Shutdown);
        assert_eq!(eyes.history().last(), Some(&EyePattern::OFF));
    }

    #[tokio::test]
    async fn goodbye_runs_even_when_greeting_fails() {
        let face = RecordingFace::default();
        let eyes = RecordingEyes::default();
        let flaky = FlakyFace {
            inner: face.clone(),
            top: GREETING.0,
            failed: false,
        };
        let body = Body::new(Box::new(flaky), Box::new(eyes.clone()), Box::new(StuckTrigger)).unwrap();
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let brain = ChatSession::new(Arc::new(backend), QuotaStatus::new());
        let mut session = Session::new(
            body,
            Box::new(ScriptedEars::new(Vec::new())),
            brain,
            Pager::default(),
            Timings::instant(),
        );

        let outcome = session.run(std::future::pending()).await;

        assert!(outcome.is_err());
        assert_eq!(session.state(), SessionState::Shutdown);
        assert_eq!(face.screens(), vec![page(FAREWELL), Page::default()]);
        let history = eyes.history();
        assert_eq!(history[history.len() - 2], Mood::Sleepy.pattern());
        assert_eq!(history.last(), Some(&EyePattern::OFF));
    }

    struct StuckTrigger;

    #[async_trait]
    impl Trigger for StuckTrigger {
        async fn wait_for_trigger(&mut self) -> Result<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn interrupt_while_waiting_shuts_down() {
        let face = RecordingFace::default();
        let eyes = RecordingEyes::default();
        let body = Body::new(Box::new(face.clone()), Box::new(eyes.clone()), Box::new(StuckTrigger)).unwrap();
        let brain = ChatSession::new(Arc::new(MockChatBackend::new()), QuotaStatus::new());
        let mut session = Session::new(
            body,
            Box::new(ScriptedEars::new(Vec::new())),
            brain,
            Pager::default(),
            Timings::instant(),
        );

        session.run(async {}).await.unwrap();

        assert_eq!(session.state(), SessionState::Shutdown);
        assert!(face.screens().contains(&page(FAREWELL)));
        assert_eq!(eyes.history().last(), Some(&EyePattern::OFF));
    }
}
