// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Netraa Link console application

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netraa_link::bluetooth;
use netraa_link::cli::CliArgs;
use netraa_link::config::Config;
use netraa_link::connection::ConnectionManager;
use netraa_link::dispatch::Dispatcher;
use netraa_link::events::{AppEvent, EventProcessor};
use netraa_link::remote::ServiceClient;
use netraa_link::session::SessionStore;
use netraa_link::speech;
use netraa_link::state::AppState;
use netraa_link::ui::{self, ConsoleAction};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log_directive().parse()?))
        .init();

    info!("Starting Netraa Link v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = args.resolve_config_path();
    let mut config = Config::load_from(&config_path)?;
    args.apply(&mut config);
    info!("Configuration loaded from {:?}", config_path);

    let transport = bluetooth::create_transport(&config.bluetooth).await?;
    info!("Transport: {}", transport.backend_name());

    let session = SessionStore::new();
    let connections = Arc::new(ConnectionManager::new(session.clone(), transport.clone()));
    let dispatcher = Arc::new(Dispatcher::with_terminator(
        session,
        transport,
        config.bluetooth.line_terminator.clone(),
    ));

    let service = ServiceClient::new(&config.assistant)?;
    info!("Assistant service: {}", service.base_url());

    let recognizer = speech::create_recognizer(&config.speech)?;
    info!("Speech recognizer: {}", recognizer.backend_name());

    let state = AppState::new(config.history.max_entries);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut processor = EventProcessor::new(
        connections.clone(),
        dispatcher,
        service,
        recognizer,
        config.speech.locale.clone(),
        state,
        event_tx,
    );

    let mut action_rx = ui::run_console()?;

    println!("{}", ui::HELP);
    info!("Ready.");

    loop {
        let event = tokio::select! {
            Some(action) = action_rx.recv() => match action {
                ConsoleAction::Event(event) => event,
                ConsoleAction::Help => {
                    println!("{}", ui::HELP);
                    continue;
                }
                ConsoleAction::Quit => {
                    info!("Quit requested");
                    break;
                }
            },
            Some(event) = event_rx.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        if let Some(notice) = processor.process_event(event).await {
            ui::print_notice(&notice);
        }
    }

    processor.process_event(AppEvent::StopListening).await;
    if let Err(e) = connections.disconnect().await {
        warn!("Disconnect on exit failed: {}", e);
    }

    info!("Netraa Link stopped");
    Ok(())
}
