use std::{io::Write as _, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    DeleteError, HttpStudentsApi, RosterController, StudentForm, SubmitError, UpdateError,
    WriteOutcome,
};
use shared::domain::{Student, StudentChanges, StudentId};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod shell;

use config::load_settings;
use render::{render_notice, render_roster, render_validation};

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Student roster backed by a public users API")]
struct Cli {
    /// Base URL of the users API; overrides roster.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and print the roster.
    List,
    /// Add a student.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change fields of an existing student.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a student.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Interactive session keeping the roster in memory.
    Shell,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn print_state(roster: &RosterController) {
    if let Some(notice) = roster.visible_notice(Utc::now()) {
        println!("{}", render_notice(notice));
    }
    println!("{}", render_roster(roster.state()));
}

pub(crate) fn report_submit(result: Result<WriteOutcome<Student>, SubmitError>) {
    match result {
        Ok(_) => {}
        Err(SubmitError::Validation(err))
        | Err(SubmitError::Update(UpdateError::Validation(err))) => {
            println!("Invalid input:\n{}", render_validation(&err));
        }
        Err(err) => println!("{err}"),
    }
}

pub(crate) fn report_delete(result: Result<WriteOutcome<Student>, DeleteError>) {
    if let Err(err) = result {
        println!("{err}");
    }
}

fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    match std::io::stdin().read_line(&mut answer) {
        Ok(_) => shell::is_yes(&answer),
        Err(err) => {
            warn!("failed to read confirmation: {err}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    init_tracing(&settings.log_filter);

    let api = HttpStudentsApi::new(&settings.api_base_url)
        .with_context(|| format!("invalid api url '{}'", settings.api_base_url))?;
    let mut roster = RosterController::new(Arc::new(api)).with_notice_ttl_ms(settings.notice_ttl_ms);

    // The remote does not keep writes, so every one-shot command starts from
    // a fresh load. A failed load leaves an empty roster to work on.
    let _ = roster.load().await;

    match cli.command {
        Command::List => {
            print_state(&roster);
            if roster.state().needs_retry() {
                bail!("no student data available");
            }
        }
        Command::Add {
            name,
            course,
            email,
            phone,
        } => {
            let form = StudentForm {
                name,
                course,
                email,
                phone,
            };
            report_submit(roster.submit(&form).await);
            print_state(&roster);
        }
        Command::Edit {
            id,
            name,
            course,
            email,
            phone,
        } => {
            let changes = StudentChanges {
                name,
                course,
                email,
                phone,
                ..StudentChanges::default()
            };
            if changes.is_empty() {
                bail!("nothing to change; pass at least one of --name, --course, --email, --phone");
            }
            report_submit(
                roster
                    .update(StudentId(id), &changes)
                    .await
                    .map_err(SubmitError::from),
            );
            print_state(&roster);
        }
        Command::Delete { id, yes } => {
            let outcome = roster
                .delete_with(StudentId(id), |prompt| yes || confirm_on_stdin(prompt))
                .await;
            match outcome {
                Ok(None) => println!("Delete cancelled."),
                Ok(Some(_)) => print_state(&roster),
                Err(err) => report_delete(Err(err)),
            }
        }
        Command::Shell => shell::run(&mut roster).await?,
    }

    Ok(())
}
