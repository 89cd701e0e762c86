/*
 * @file lib.rs
 * @brief Snowy library root
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

//! Snowy the snow leopard: a press-to-talk chat kiosk.
//!
//! Press Snowy's ear, ask a question, and read the answer two lines at a
//! time on a 16x2 character LCD while three LED eyes show a mood.
//!
//! - [`session`] drives the idle, listening, thinking and answering loop
//! - [`brain`] keeps the conversation and talks to Gemini through [`gemini`]
//! - [`quota`] tracks whether the free-tier credits are used up
//! - [`ears`] turns speech (or typed lines) into text
//! - [`hardware`] is the body: LCD face, LED eyes, ear button
//! - [`pager`] splits answers into screen pages
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use anyhow::Result;
//! use snowy::brain::ChatSession;
//! use snowy::config::Timings;
//! use snowy::ears::TypedEars;
//! use snowy::gemini::GeminiClient;
//! use snowy::hardware::console::{ConsoleEyes, ConsoleFace, ConsoleInput, ConsoleTrigger};
//! use snowy::hardware::Body;
//! use snowy::pager::Pager;
//! use snowy::quota::QuotaStatus;
//! use snowy::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(GeminiClient::new("key", "gemini-2.0-flash-lite")?);
//!     let brain = ChatSession::new(client, QuotaStatus::new());
//!     let input = ConsoleInput::new();
//!     let body = Body::new(
//!         Box::new(ConsoleFace),
//!         Box::new(ConsoleEyes),
//!         Box::new(ConsoleTrigger::new(input.clone())),
//!     )?;
//!     let ears = Box::new(TypedEars::new(input));
//!     let mut session = Session::new(body, ears, brain, Pager::default(), Timings::default());
//!     session.run(async { tokio::signal::ctrl_c().await.ok(); }).await
//! }
//! ```

pub mod audio;
pub mod brain;
pub mod config;
pub mod ears;
pub mod error;
pub mod gemini;
pub mod hardware;
pub mod mood;
pub mod pager;
pub mod quota;
pub mod session;
