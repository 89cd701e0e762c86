/*
 * @file gemini.rs
 * @brief HTTP client for the Gemini generateContent endpoint
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

//! Minimal Gemini REST client.
//!
//! Only `generateContent` is used: for chat turns and for transcribing
//! recorded audio passed inline.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::brain::{ChatBackend, Turn, TurnRole};
use crate::error::ChatError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound for a single request, including audio upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A `contents` entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Text or inline binary data.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Part {
    /// A plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline binary part; `data` is already base64.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

impl Content {
    /// Maps a transcript turn onto the provider's `user`/`model` roles.
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(turn.text.clone())],
        }
    }
}

/// Builds the request for a chat turn.
pub fn chat_request(persona: &str, turns: &[Turn]) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(persona)],
        }),
        contents: turns.iter().map(Content::from_turn).collect(),
    }
}

/// Joins the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
    Some(text)
}

/// Shared HTTP client bound to one API key and model.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for `model`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE.to_string(),
        })
    }

    /// The model every request goes to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// `generateContent` URL for the configured model.
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends one `generateContent` request and returns the reply text.
    ///
    /// # Errors
    /// Non-2xx replies are classified by status and body; transport and
    /// decoding failures are [`ChatError::Service`].
    pub async fn generate(&self, request: &GenerateRequest) -> Result<String, ChatError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| ChatError::Service(format!("request failed: {}", err)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::classify(Some(status.as_u16()), format!("{}: {}", status, body)));
        }
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|err| ChatError::Service(format!("malformed response: {}", err)))?;
        response_text(parsed).ok_or_else(|| ChatError::Service("response had no candidates".to_string()))
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn send(&self, persona: &str, turns: &[Turn]) -> Result<String, ChatError> {
        self.generate(&chat_request(persona, turns)).await
    }
}
