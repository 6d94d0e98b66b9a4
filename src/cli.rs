//! Interactive REPL for driving the simulated panel

use anyhow::{bail, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::debug;

use crate::mixer::Direction;

/// Command entered at the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rotate an encoder by some detents
    Turn {
        channel: usize,
        direction: Direction,
        detents: u32,
    },
    /// Press an encoder switch
    Press { channel: usize },
    /// Press an auxiliary button
    Button { index: usize },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
  cw <ch> [n]     turn channel clockwise n detents (default 1)
  ccw <ch> [n]    turn channel counter-clockwise n detents
  press <ch>      press the channel's encoder switch (mute toggle)
  button <idx>    press an auxiliary button
  status          show channel volumes, mute and brightness
  help            show this help
  quit | exit     leave";

fn parse_index(token: Option<&str>, what: &str) -> Result<usize> {
    let token = token.with_context(|| format!("Missing {}", what))?;
    token
        .parse()
        .with_context(|| format!("Invalid {}: {}", what, token))
}

impl Command {
    /// Parse one REPL line
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            bail!("Empty command");
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "cw" | "ccw" => {
                let channel = parse_index(tokens.next(), "channel")?;
                let detents = match tokens.next() {
                    Some(n) => n.parse().with_context(|| format!("Invalid detent count: {}", n))?,
                    None => 1,
                };
                let direction = if verb.eq_ignore_ascii_case("cw") {
                    Direction::Up
                } else {
                    Direction::Down
                };
                Command::Turn {
                    channel,
                    direction,
                    detents,
                }
            }
            "press" => Command::Press {
                channel: parse_index(tokens.next(), "channel")?,
            },
            "button" => Command::Button {
                index: parse_index(tokens.next(), "button")?,
            },
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("Unknown command: {}", other),
        };

        if tokens.next().is_some() {
            bail!("Too many arguments for '{}'", verb);
        }
        Ok(command)
    }
}

/// Read commands until `quit` or EOF, forwarding them to the control loop
///
/// Blocking; run it on a dedicated thread.
pub fn run_repl(tx: mpsc::Sender<Command>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("mixer> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    debug!("Failed to record history entry: {}", e);
                }
                match Command::parse(&line) {
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(command) => {
                        let quit = command == Command::Quit;
                        if tx.blocking_send(command).is_err() || quit {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                if tx.blocking_send(Command::Quit).is_err() {
                    debug!("Control loop already stopped");
                }
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_turns() {
        assert_eq!(
            Command::parse("cw 2").unwrap(),
            Command::Turn {
                channel: 2,
                direction: Direction::Up,
                detents: 1
            }
        );
        assert_eq!(
            Command::parse("  CCW 0 5 ").unwrap(),
            Command::Turn {
                channel: 0,
                direction: Direction::Down,
                detents: 5
            }
        );
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(Command::parse("press 4").unwrap(), Command::Press { channel: 4 });
        assert_eq!(Command::parse("button 1").unwrap(), Command::Button { index: 1 });
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
        assert_eq!(Command::parse("?").unwrap(), Command::Help);
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("cw").is_err());
        assert!(Command::parse("cw x").is_err());
        assert!(Command::parse("cw 1 -2").is_err());
        assert!(Command::parse("press 1 2").is_err());
        assert!(Command::parse("jump 1").is_err());
    }
}
