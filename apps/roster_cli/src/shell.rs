//! Interactive session. The roster lives in memory for as long as the shell
//! runs, so local additions and edits survive between commands.

use anyhow::Result;
use client_core::{DeleteConfirmation, RosterController, StudentForm};
use shared::domain::StudentId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{print_state, report_delete, report_submit};

pub const HELP: &str = "\
commands:
  list                          show the roster
  reload                        fetch the roster again from the server
  add <name> | <course> [| <email> [| <phone>]]
  edit <id>                     open a student for editing
  save <name> | <course> [| <email> [| <phone>]]
                                submit the open edit (or add when none is open)
  cancel                        close the open edit
  delete <id>                   delete a student after confirmation
  help                          show this help
  quit                          leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    List,
    Reload,
    Add(StudentForm),
    Edit(StudentId),
    Save(StudentForm),
    Cancel,
    Delete(StudentId),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Ok(ShellCommand::Empty),
        "list" | "ls" => Ok(ShellCommand::List),
        "reload" => Ok(ShellCommand::Reload),
        "add" => parse_form(rest).map(ShellCommand::Add),
        "save" => parse_form(rest).map(ShellCommand::Save),
        "edit" => parse_id(rest).map(ShellCommand::Edit),
        "delete" | "rm" => parse_id(rest).map(ShellCommand::Delete),
        "cancel" => Ok(ShellCommand::Cancel),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

fn parse_id(raw: &str) -> Result<StudentId, String> {
    raw.parse::<i64>()
        .map(StudentId)
        .map_err(|_| format!("expected a numeric student id, got `{raw}`"))
}

/// `name | course [| email [| phone]]`. Values are validated later.
fn parse_form(raw: &str) -> Result<StudentForm, String> {
    let mut parts = raw.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let Some(course) = parts.next() else {
        return Err("expected `<name> | <course>`".to_string());
    };

    let mut form = StudentForm::new(name, course);
    form.email = parts.next().filter(|v| !v.is_empty()).map(str::to_string);
    form.phone = parts.next().filter(|v| !v.is_empty()).map(str::to_string);
    Ok(form)
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn prompt(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn run(roster: &mut RosterController) -> Result<()> {
    println!("{HELP}\n");
    print_state(roster);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<DeleteConfirmation> = None;

    prompt("roster> ").await?;
    while let Some(line) = lines.next_line().await? {
        if let Some(confirmation) = pending.take() {
            if is_yes(&line) {
                report_delete(roster.confirm_delete(confirmation.token).await);
                print_state(roster);
            } else {
                roster.cancel_delete(confirmation.token);
                println!("Delete cancelled.");
            }
            prompt("roster> ").await?;
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                prompt("roster> ").await?;
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::List => print_state(roster),
            ShellCommand::Reload => {
                // Failures are logged and reflected in the rendered state.
                let _ = roster.load().await;
                print_state(roster);
            }
            ShellCommand::Add(form) => {
                roster.begin_add();
                report_submit(roster.submit(&form).await);
                print_state(roster);
            }
            ShellCommand::Save(form) => {
                report_submit(roster.submit(&form).await);
                print_state(roster);
            }
            ShellCommand::Edit(id) => match roster.begin_edit(id) {
                Some(student) => println!(
                    "Editing {} ({} | {}). Use `save` to submit or `cancel`.",
                    student.id, student.name, student.course
                ),
                None => println!("No student with id {id}."),
            },
            ShellCommand::Cancel => {
                roster.cancel_edit();
                println!("Edit closed.");
            }
            ShellCommand::Delete(id) => match roster.request_delete(id) {
                Ok(confirmation) => {
                    prompt(&format!("{} [y/N] ", confirmation.prompt)).await?;
                    pending = Some(confirmation);
                    continue;
                }
                Err(err) => println!("{err}"),
            },
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
        prompt("roster> ").await?;
    }

    // Input ended while a delete prompt was open.
    if let Some(confirmation) = pending.take() {
        roster.cancel_delete(confirmation.token);
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
