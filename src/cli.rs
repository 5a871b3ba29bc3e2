//! Command-line driver over the command surface.
//!
//! One-shot commands print their `CommandResult` as JSON. `start` and `run`
//! stay in the foreground, printing session events until Ctrl-C, and stop
//! the session on the way out.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    session::commands::{self, CommandResult},
    AppState,
};

/// Desktop time tracker with periodic screenshots
#[derive(Parser, Debug)]
#[command(name = "tracktime")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the credential
    Login {
        email: String,
        #[arg(long, env = "TRACKTIME_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Stop any open session and forget the credential
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List projects assigned to the signed-in user
    Projects,

    /// List tasks of a project
    Tasks { project_id: String },

    /// List time logs in a date range (inclusive, YYYY-MM-DD)
    Logs {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// List screenshots recorded for a time log
    Screenshots { session_id: String },

    /// Start tracking a task and stay in the foreground until Ctrl-C
    Start {
        task_id: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Stop the open session
    Stop {
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the local and server view of the session
    Status,

    /// Resume any open session and keep capturing until Ctrl-C
    Run,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    local: crate::session::SessionSnapshot,
    remote: CommandResult<crate::models::CurrentSession>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result<T: Serialize>(result: &CommandResult<T>) -> Result<bool> {
    print_json(result)?;
    Ok(result.success)
}

pub async fn dispatch(command: Command, state: &AppState) -> Result<bool> {
    match command {
        Command::Login { email, password } => {
            print_result(&commands::login(state, &email, &password).await)
        }
        Command::Logout => print_result(&commands::logout(state).await),
        Command::Whoami => print_result(&commands::get_user_data(state).await),
        Command::Projects => print_result(&commands::get_projects(state).await),
        Command::Tasks { project_id } => {
            print_result(&commands::get_tasks(state, &project_id).await)
        }
        Command::Logs { from, to } => {
            print_result(&commands::get_time_logs(state, from, to).await)
        }
        Command::Screenshots { session_id } => {
            print_result(&commands::get_screenshots(state, &session_id).await)
        }
        Command::Stop { notes } => {
            print_result(&commands::stop_tracking(state, notes.as_deref()).await)
        }
        Command::Status => {
            let remote = match state.core.remote_session().await {
                Ok(current) => CommandResult::ok(current),
                Err(err) => CommandResult::fail(err.user_message("Failed to fetch current time log")),
            };
            let success = remote.success;
            print_json(&StatusReport {
                local: state.core.snapshot().await,
                remote,
            })?;
            Ok(success)
        }
        Command::Start { task_id, notes } => {
            let started = commands::start_tracking(state, &task_id, notes.as_deref()).await;
            if !print_result(&started)? {
                return Ok(false);
            }
            serve_until_interrupt(state).await
        }
        Command::Run => {
            state.core.init().await;
            serve_until_interrupt(state).await
        }
    }
}

async fn serve_until_interrupt(state: &AppState) -> Result<bool> {
    let mut events = state.core.subscribe();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    log::info!("Tracking in the foreground; press Ctrl-C to stop");
    loop {
        tokio::select! {
            signal = &mut interrupt => {
                if let Err(err) = signal {
                    log::error!("Failed to listen for Ctrl-C: {}", err);
                }
                break;
            }
            event = events.recv() => match event {
                Ok(event) => print_json(&event)?,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Dropped {} session events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    log::info!("Shutting down...");
    state.core.teardown().await;
    Ok(true)
}
