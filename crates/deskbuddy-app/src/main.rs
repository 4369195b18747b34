//! DeskBuddy application binary - composition root.
//!
//! Ties together all DeskBuddy crates into a single executable:
//! 1. Parse CLI args and load configuration from TOML
//! 2. Start the axum HTTP server (answers 503 until the device is attached)
//! 3. Build the simulated device, actuator guard, scheduler and task store
//! 4. Attach the dispatcher to the HTTP state
//! 5. Run the keystroke control loop on stdin (or wait for Ctrl-C headless)

mod cli;
mod control;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use deskbuddy_action::{
    ActionContext, ActionScheduler, ActuatorGuard, Dispatcher, SqliteMirror, TaskMirror, TaskStore,
};
use deskbuddy_api::{routes, AppState};
use deskbuddy_core::config::DeskBuddyConfig;
use deskbuddy_input::InputStateMachine;

use cli::CliArgs;
use control::{ControlLoop, Exit};

/// How long shutdown waits for running actions after the reset.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn build_dispatcher(config: &DeskBuddyConfig) -> Arc<Dispatcher> {
    let guard = Arc::new(ActuatorGuard::simulated());
    let scheduler = Arc::new(ActionScheduler::new(ActionContext::new(
        guard,
        &config.actions,
    )));
    let tasks = Arc::new(TaskStore::new());
    let dispatcher = Dispatcher::new(scheduler, tasks, config);

    match open_mirror(config) {
        Some(mirror) => Arc::new(dispatcher.with_mirror(mirror)),
        None => Arc::new(dispatcher),
    }
}

/// The SQLite mirror is optional; failing to open it only disables mirroring.
fn open_mirror(config: &DeskBuddyConfig) -> Option<Arc<dyn TaskMirror>> {
    if !config.tasks.mirror_enabled {
        return None;
    }
    let data_dir = cli::expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!(path = %data_dir.display(), error = %e, "Failed to create data directory; task mirror disabled");
        return None;
    }
    let path = data_dir.join(&config.tasks.mirror_file);
    match SqliteMirror::open(&path) {
        Ok(mirror) => {
            tracing::info!(path = %path.display(), "Task mirror opened");
            Some(Arc::new(mirror))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Task mirror disabled");
            None
        }
    }
}

/// Reset the actuators and give running actions a moment to finish.
async fn shutdown(dispatcher: &Dispatcher) {
    let scheduler = dispatcher.scheduler();
    match scheduler.stop_all() {
        Ok(still_running) => tracing::info!(still_running, "Actuators reset"),
        Err(e) => tracing::warn!(error = %e, "Actuator reset failed"),
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!(
            still_running = scheduler.active_count(),
            "Exiting with actions still running"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = DeskBuddyConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting DeskBuddy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.validate()?;

    // === HTTP server ===

    let state = AppState::new(config.clone());
    let server = if config.server.enabled {
        let server_config = config.clone();
        let server_state = state.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = routes::start_server(&server_config, server_state).await {
                tracing::error!(error = %e, "HTTP server stopped");
            }
        }))
    } else {
        tracing::info!("HTTP server disabled");
        None
    };

    // === Device ===

    let dispatcher = build_dispatcher(&config);
    state.attach(Arc::clone(&dispatcher));

    // === Control loop ===

    if args.headless {
        tracing::info!("Headless mode; press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    } else {
        let machine = InputStateMachine::new(&config.input)?;
        let cadence = Duration::from_millis(
            config
                .input
                .char_cooldown_ms
                .max(config.input.control_cooldown_ms),
        );
        let mut control = ControlLoop::new(machine, Arc::clone(&dispatcher), cadence);
        tracing::info!("Keyboard control ready; Q quits");
        match control.run(tokio::io::stdin()).await? {
            Exit::Quit => tracing::info!("Shutting down"),
            Exit::EndOfInput => tracing::info!("Input closed; shutting down"),
        }
    }

    shutdown(&dispatcher).await;
    if let Some(server) = server {
        server.abort();
    }

    Ok(())
}
