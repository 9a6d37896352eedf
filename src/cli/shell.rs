use std::fs::File;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::LedgerSession;
use crate::io::Exporter;

use super::describe_error;

const HELP: &str = "\
Commands:
  add               append a blank row
  set N [AMOUNT]    type AMOUNT into row N (omit AMOUNT to clear it)
  commit N          leave row N (normalizes the amount)
  remove N          delete row N (the last row always stays)
  calc              calculate the levy
  reset             start over with one blank row
  list              show rows, result and error
  export [FILE]     write a JSON snapshot (stdout without FILE)
  export --csv [FILE]
                    write the rows as CSV instead
  help              show this help
  quit              leave the shell";

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add,
    Set { row: usize, text: String },
    Commit { row: usize },
    Remove { row: usize },
    Calc,
    Reset,
    List,
    Export { path: Option<PathBuf>, csv: bool },
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let row = |arg: Option<&str>| -> Result<usize, String> {
            let arg = arg.ok_or_else(|| format!("'{}' needs a row number", verb))?;
            arg.parse()
                .map_err(|_| format!("'{}' is not a row number", arg))
        };

        let command = match verb.to_lowercase().as_str() {
            "add" => ShellCommand::Add,
            "set" => ShellCommand::Set {
                row: row(words.next())?,
                text: words.next().unwrap_or("").to_string(),
            },
            "commit" => ShellCommand::Commit {
                row: row(words.next())?,
            },
            "remove" | "rm" => ShellCommand::Remove {
                row: row(words.next())?,
            },
            "calc" => ShellCommand::Calc,
            "reset" => ShellCommand::Reset,
            "list" | "ls" => ShellCommand::List,
            "export" => {
                let mut arg = words.next();
                let csv = arg == Some("--csv");
                if csv {
                    arg = words.next();
                }
                ShellCommand::Export {
                    path: arg.map(PathBuf::from),
                    csv,
                }
            }
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };

        if words.next().is_some() {
            return Err(format!("Too many arguments for '{}'", verb));
        }
        Ok(Some(command))
    }
}

/// Drive a session from line-oriented input until `quit` or end of input.
pub fn run_shell<R: BufRead, W: Write>(
    session: &mut LedgerSession,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "Type 'help' for commands.")?;
    write_rows(session, &mut output)?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "{}", message)?;
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }
        execute(session, command, &mut output)?;
    }

    Ok(())
}

fn execute<W: Write>(session: &mut LedgerSession, command: ShellCommand, output: &mut W) -> Result<()> {
    match command {
        ShellCommand::Add => {
            let row = session.add_row();
            writeln!(output, "Added {}", session.row_label(row))?;
        }

        ShellCommand::Set { row, text } => {
            if let Err(e) = session.edit_row(row, &text) {
                writeln!(output, "{}", describe_error(&e))?;
            }
        }

        ShellCommand::Commit { row } => match session.commit_row(row) {
            Ok(_) => write_rows(session, output)?,
            Err(e) => writeln!(output, "{}", describe_error(&e))?,
        },

        ShellCommand::Remove { row } => match session.remove_row(row) {
            Ok(true) => write_rows(session, output)?,
            Ok(false) => writeln!(output, "The last row cannot be removed")?,
            Err(e) => writeln!(output, "{}", describe_error(&e))?,
        },

        ShellCommand::Calc => match session.calculate() {
            Ok(result) => writeln!(
                output,
                "{}: {} {}",
                session.config().result_label,
                result.amount_text,
                result.currency_symbol
            )?,
            Err(e) => writeln!(output, "{}", describe_error(&e))?,
        },

        ShellCommand::Reset => {
            session.reset();
            write_rows(session, output)?;
        }

        ShellCommand::List => {
            write_rows(session, output)?;
            if let Some(result) = session.visible_result() {
                writeln!(
                    output,
                    "{}: {} {}",
                    session.config().result_label,
                    result.amount_text,
                    result.currency_symbol
                )?;
            }
            if let Some(message) = session.error_message() {
                writeln!(output, "{}", message)?;
            }
        }

        ShellCommand::Export { path, csv } => {
            let exporter = Exporter::new(session);
            match path {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Cannot create {}", path.display()))?;
                    if csv {
                        exporter.export_rows_csv(file)?;
                    } else {
                        exporter.export_json(file)?;
                    }
                    writeln!(output, "Exported to {}", path.display())?;
                }
                None if csv => {
                    exporter.export_rows_csv(&mut *output)?;
                }
                None => exporter.export_json(&mut *output)?,
            }
        }

        ShellCommand::Help => writeln!(output, "{}", HELP)?,

        ShellCommand::Quit => {}
    }

    Ok(())
}

fn write_rows<W: Write>(session: &LedgerSession, output: &mut W) -> Result<()> {
    for row in session.rows() {
        writeln!(
            output,
            "  {:<10} {}",
            session.row_label(row.number),
            row.entry.text
        )?;
    }
    Ok(())
}
