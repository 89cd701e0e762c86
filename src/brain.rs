/*
 * @file brain.rs
 * @brief Snowy's chat session: persona, transcript and quota-aware asking
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

//! Chat session with the cloud model.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::quota::QuotaStatus;

/// Who Snowy is. Sent as the system instruction with every call.
pub const SNOWY_PERSONA: &str = "\
You are Snowy, a snow leopard from the Himalayas. You are friendly, curious and \
genuinely knowledgeable, and you speak clearly and helpfully rather than childishly. \
A little snow leopard personality is welcome but keep it subtle: at most one purr per answer.

How to answer:
1. Always give the real answer first. Never dodge a question.
2. You have no live weather data. For weather questions give the typical seasonal \
weather for that place, for example: Paris in spring is usually 10-15C and mild with some rain.
3. Answer facts about history, science, maths and geography directly and accurately.
4. For things you cannot know, like today's news, live scores or current prices, say \
briefly what you do know and admit the live part is beyond you.
5. Keep answers to one or two short sentences. They are shown on a tiny 16x2 screen.
6. Speak naturally, not like a children's TV show.";

/// Phrases that wipe the conversation instead of asking the model.
const FORGET_PHRASES: [&str; 3] = ["forget everything", "start over", "new conversation"];

/// Speaker of one transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

/// One entry in the conversation transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    /// A question from the person at the kiosk.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// An answer from Snowy.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// A provider that answers the latest user turn given the whole transcript.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Answers the last turn of `turns` under the system `persona`.
    ///
    /// # Errors
    /// [`ChatError::QuotaExhausted`] or [`ChatError::Service`].
    async fn send(&self, persona: &str, turns: &[Turn]) -> Result<String, ChatError>;
}

/// Conversation with context kept for the life of the process.
pub struct ChatSession<B> {
    backend: Arc<B>,
    persona: String,
    transcript: Vec<Turn>,
    quota: QuotaStatus,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Starts an empty conversation with Snowy's persona.
    pub fn new(backend: Arc<B>, quota: QuotaStatus) -> Self {
        info!("Snowy's brain is online! *purr*");
        Self {
            backend,
            persona: SNOWY_PERSONA.to_string(),
            transcript: Vec::new(),
            quota,
        }
    }

    /// Asks one question in the context of every earlier turn.
    ///
    /// Success always marks the quota as ok. A quota failure marks it
    /// exhausted. Failed turns are not added to the transcript.
    ///
    /// # Errors
    /// [`ChatError::QuotaExhausted`] or [`ChatError::Service`].
    pub async fn ask(&mut self, question: &str) -> Result<String, ChatError> {
        let mut turns = self.transcript.clone();
        turns.push(Turn::user(question));
        match self.backend.send(&self.persona, &turns).await {
            Ok(answer) => {
                self.quota.mark_ok();
                let answer = answer.trim().to_string();
                if answer.is_empty() {
                    return Err(ChatError::Service("empty reply".to_string()));
                }
                turns.push(Turn::model(answer.clone()));
                self.transcript = turns;
                debug!(turns = self.transcript.len(), "conversation extended");
                Ok(answer)
            }
            Err(err) => {
                if err.is_quota() {
                    self.quota.mark_exhausted();
                }
                Err(err)
            }
        }
    }

    /// Forgets the conversation; the persona stays.
    pub fn reset(&mut self) {
        self.transcript.clear();
        info!("Snowy's memory cleared. Fresh start!");
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn quota(&self) -> &QuotaStatus {
        &self.quota
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }
}

/// Checks whether the user asked Snowy to forget the conversation.
pub fn is_forget_request(text: &str) -> bool {
    let normalized = text.to_lowercase();
    FORGET_PHRASES.iter().any(|phrase| normalized.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(backend: MockChatBackend) -> ChatSession<MockChatBackend> {
        ChatSession::new(Arc::new(backend), QuotaStatus::new())
    }

    #[tokio::test]
    async fn ask_sends_history_and_records_the_exchange() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .withf(|persona, turns| persona == SNOWY_PERSONA && turns.len() == 1)
            .times(1)
            .returning(|_, _| Ok(" Purr, hello! \n".to_string()));
        backend
            .expect_send()
            .withf(|_, turns| {
                turns.len() == 3 && turns[1] == Turn::model("Purr, hello!") && turns[2].text == "again"
            })
            .times(1)
            .returning(|_, _| Ok("Hello again.".to_string()));
        let mut brain = session(backend);
        assert_eq!(brain.ask("hi").await.unwrap(), "Purr, hello!");
        assert_eq!(brain.ask("again").await.unwrap(), "Hello again.");
        assert_eq!(brain.transcript().len(), 4);
    }

    #[tokio::test]
    async fn quota_failure_marks_exhausted_and_keeps_transcript() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::classify(Some(429), "RESOURCE_EXHAUSTED")));
        let mut brain = session(backend);
        let err = brain.ask("hi").await.unwrap_err();
        assert!(err.is_quota());
        assert!(!brain.quota().is_ok());
        assert!(brain.transcript().is_empty());
    }

    #[tokio::test]
    async fn service_failure_leaves_quota_alone() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(ChatError::Service("timeout".into())));
        let mut brain = session(backend);
        brain.quota().mark_exhausted();
        assert!(!brain.ask("hi").await.unwrap_err().is_quota());
        assert!(!brain.quota().is_ok());
    }

    #[tokio::test]
    async fn success_after_exhaustion_recovers_immediately() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().returning(|_, _| Ok("Back again!".to_string()));
        let mut brain = session(backend);
        brain.quota().mark_exhausted();
        brain.ask("are you there?").await.unwrap();
        assert!(brain.quota().is_ok());
    }

    #[tokio::test]
    async fn empty_reply_is_a_service_error() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().returning(|_, _| Ok("   ".to_string()));
        let mut brain = session(backend);
        assert_eq!(
            brain.ask("hi").await.unwrap_err(),
            ChatError::Service("empty reply".to_string())
        );
        assert!(brain.transcript().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_the_transcript() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .withf(|_, turns| turns.len() == 1)
            .times(2)
            .returning(|_, _| Ok("Hi!".to_string()));
        let mut brain = session(backend);
        brain.ask("hello").await.unwrap();
        brain.reset();
        assert!(brain.transcript().is_empty());
        brain.ask("hello").await.unwrap();
    }

    #[test]
    fn forget_phrases_are_detected() {
        assert!(is_forget_request("Snowy, FORGET everything please"));
        assert!(is_forget_request("let's start over"));
        assert!(!is_forget_request("what do snow leopards eat"));
    }
}
