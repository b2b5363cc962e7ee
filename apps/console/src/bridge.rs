//! Bridges between the async pipeline, stdin, and the control loop.

use crossbeam_channel::Sender;
use tokio::sync::broadcast;
use tracing::debug;

use pipeline::PipelineEvent;
use shared::events::OperatorEvent;

#[derive(Debug)]
pub enum ConsoleCommand {
    Operator(OperatorEvent),
    Quit,
    Unknown(String),
}

/// Forwards worker-side pipeline completions into the control loop's channel.
pub fn forward_pipeline_events(
    mut rx: broadcast::Receiver<PipelineEvent>,
    tx: Sender<PipelineEvent>,
) {
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if tx.send(event).is_err() {
                break;
            }
        }
        debug!("pipeline event bridge closed");
    });
}

/// Reads operator lines from stdin on a plain thread.
pub fn spawn_stdin_reader(tx: Sender<ConsoleCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => {
                    let _ = tx.send(ConsoleCommand::Quit);
                    break;
                }
                Ok(_) => {
                    let command = parse_console_line(line.trim());
                    let quit = matches!(command, ConsoleCommand::Quit);
                    if tx.send(command).is_err() || quit {
                        break;
                    }
                }
                Err(_) => {
                    let _ = tx.send(ConsoleCommand::Quit);
                    break;
                }
            }
        }
    });
}

pub fn parse_console_line(line: &str) -> ConsoleCommand {
    match line.to_ascii_lowercase().as_str() {
        "up" | "k" => ConsoleCommand::Operator(OperatorEvent::Up),
        "down" | "j" => ConsoleCommand::Operator(OperatorEvent::Down),
        "left" | "h" => ConsoleCommand::Operator(OperatorEvent::Left),
        "right" | "l" => ConsoleCommand::Operator(OperatorEvent::Right),
        "enter" | "go" | "" => ConsoleCommand::Operator(OperatorEvent::Enter),
        "clear" => ConsoleCommand::Operator(OperatorEvent::ClearLive),
        "undo" => ConsoleCommand::Operator(OperatorEvent::Undo),
        "redo" => ConsoleCommand::Operator(OperatorEvent::Redo),
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        other => {
            if let Some(number) = other
                .strip_prefix("verse ")
                .or_else(|| other.strip_prefix('v'))
                .or(Some(other))
                .and_then(|n| n.parse::<u8>().ok())
            {
                ConsoleCommand::Operator(OperatorEvent::Verse { number })
            } else {
                ConsoleCommand::Unknown(other.to_string())
            }
        }
    }
}
