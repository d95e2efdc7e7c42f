// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! elevq - truck unloading queue for grain elevators.
//!
//! This is the binary entry point: configuration, logging and the
//! subcommands.

mod admin;
mod serve;
mod shutdown;

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use elevq_config::model::LoggingConfig;
use elevq_core::NewElevator;

/// elevq - truck unloading queue for grain elevators.
#[derive(Parser, Debug)]
#[command(name = "elevq", version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bots and the notification loop.
    Serve,
    /// Run one notification pass and exit.
    Notify,
    /// Create the database and apply migrations.
    InitDb,
    /// Manage elevators.
    #[command(subcommand)]
    Elevator(ElevatorCommand),
    /// Export a day's bookings as CSV.
    Export {
        /// Day to export (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only bookings of this elevator.
        #[arg(long)]
        elevator: Option<String>,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ElevatorCommand {
    /// Register an elevator.
    Add {
        #[arg(long)]
        name: String,
        /// Work day start (HH:MM).
        #[arg(long, value_parser = admin::parse_hm)]
        start: NaiveTime,
        /// Work day end (HH:MM).
        #[arg(long, value_parser = admin::parse_hm)]
        end: NaiveTime,
        /// Maximum number of bookable slots per day.
        #[arg(long)]
        slots: u32,
    },
    /// List elevators.
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match elevq_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            elevq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Notify => serve::run_notify(config).await,
        Commands::InitDb => admin::init_db(&config).await,
        Commands::Elevator(ElevatorCommand::Add {
            name,
            start,
            end,
            slots,
        }) => admin::add_elevator(
            &config,
            NewElevator {
                name,
                work_day_start: start,
                work_day_end: end,
                bookable_slots_per_day: slots,
            },
        )
        .await
        .map(|e| println!("added elevator {} ({})", e.name, e.id)),
        Commands::Elevator(ElevatorCommand::List) => admin::list_elevators(&config)
            .await
            .map(|elevators| print!("{}", admin::render_elevators(&elevators))),
        Commands::Export {
            date,
            elevator,
            output,
        } => admin::export(&config, date, elevator.as_deref(), output.as_deref()).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("elevq: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the configured level.
fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("elevq={level},warn", level = config.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
