/*
 * @file main.rs
 * @brief Snowy binary entry point
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

//! Binary entry point: loads configuration, picks the body and ears this
//! build and machine support, and runs Snowy until Ctrl+C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use snowy::brain::ChatSession;
use snowy::config::{Cli, Config};
use snowy::ears::{Ears, TypedEars};
use snowy::gemini::GeminiClient;
use snowy::hardware::console::{ConsoleEyes, ConsoleFace, ConsoleInput, ConsoleTrigger};
use snowy::hardware::Body;
use snowy::pager::{Pager, LCD_COLUMNS};
use snowy::quota::{QuotaProbe, QuotaStatus};
use snowy::session::Session;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", err.remediation());
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Snowy stopped");
            ExitCode::FAILURE
        }
    }
}

/// Wires the session together and runs it until Ctrl+C or the input closes.
async fn run(config: Config) -> Result<()> {
    let settings = &config.settings;
    let client = GeminiClient::new(config.api_key.clone(), settings.model.clone())
        .context("building Gemini client")?;
    info!(model = client.model(), "using chat model");

    let backend = Arc::new(client.clone());
    let quota = QuotaStatus::new();
    let probe = QuotaProbe::new(Arc::clone(&backend), quota.clone())
        .spawn(settings.timings.quota_probe_interval);
    let brain = ChatSession::new(backend, quota);

    let console = ConsoleInput::new();
    let body = open_body(&config, console.clone())?;
    let ears = open_ears(&config, client, console).await;
    let pager = Pager {
        width: LCD_COLUMNS,
        pause: settings.timings.page_pause,
        overflow: settings.overflow,
    };

    let mut session = Session::new(body, ears, brain, pager, settings.timings.clone());
    let outcome = session.run(interrupted()).await;
    probe.abort();
    outcome
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Opens the Raspberry Pi body when possible, else the console simulation.
fn open_body(config: &Config, console: ConsoleInput) -> Result<Body> {
    #[cfg(all(feature = "gpio", target_os = "linux"))]
    {
        if !config.simulate {
            match snowy::hardware::gpio::open_body(&config.settings.hardware) {
                Ok((face, eyes, trigger)) => {
                    info!("hardware body ready");
                    return Body::new(face, eyes, trigger);
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "hardware unavailable, simulating on the console");
                }
            }
        }
    }
    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    {
        if !config.simulate {
            info!("built without GPIO support, simulating on the console");
        }
    }
    Body::new(
        Box::new(ConsoleFace),
        Box::new(ConsoleEyes),
        Box::new(ConsoleTrigger::new(console)),
    )
}

/// Calibrates the microphone when possible, else reads typed questions.
async fn open_ears(config: &Config, client: GeminiClient, console: ConsoleInput) -> Box<dyn Ears> {
    #[cfg(feature = "mic")]
    {
        if !config.typed {
            use snowy::ears::{GeminiTranscriber, MicEars};

            let transcriber = GeminiTranscriber::new(client);
            match MicEars::calibrate(transcriber, config.settings.timings.silence_pause).await {
                Ok(ears) => return Box::new(ears),
                Err(err) => warn!(error = %err, "microphone unavailable, reading typed questions"),
            }
        }
    }
    #[cfg(not(feature = "mic"))]
    {
        drop(client);
        if !config.typed {
            info!("built without microphone support, reading typed questions");
        }
    }
    Box::new(TypedEars::new(console))
}
