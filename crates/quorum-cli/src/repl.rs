//! Interactive shell: mode menu, command loop and terminal confirmations.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use quorum::{Command, Confirmation, ConsensusMode, Engine, LoopEvent, Operator, Session};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::render;

/// Line-oriented terminal shared by the command loop and the operator prompts.
pub struct Terminal {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl Terminal {
    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn stdio() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout())
    }

    pub fn say(&self, text: &str) {
        if let Ok(mut out) = self.output.lock() {
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }

    /// Print `text` without a newline and read one line. `None` on end of input.
    pub fn prompt(&self, text: &str) -> Option<String> {
        if let Ok(mut out) = self.output.lock() {
            let _ = write!(out, "{text}");
            let _ = out.flush();
        }
        let mut line = String::new();
        let mut input = self.input.lock().ok()?;
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn ask_yes_no(&self, question: &str) -> bool {
        self.prompt(&format!("{question} (y/n): "))
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
    }
}

impl Operator for Terminal {
    fn confirm(&self, request: &Confirmation<'_>) -> bool {
        match request {
            Confirmation::UnfilteredScan { sql } => {
                self.say(&format!("Query: {sql}"));
                self.say("Warning: this query reads a whole table without a filter.");
                self.ask_yes_no("Do you want to continue anyway?")
            }
            Confirmation::ForceAfterPrecheck { .. } => {
                self.ask_yes_no("Do you want to force execution anyway?")
            }
        }
    }

    fn notify(&self, event: &LoopEvent<'_>) {
        match event {
            LoopEvent::PrecheckRejected { reason } => {
                self.say(&format!("Input does not look like a database request: {reason}"))
            }
            LoopEvent::AttemptFailed { attempt, .. } => {
                self.say(&format!("Attempt {attempt} failed. Retrying..."))
            }
        }
    }
}

/// Ask until a valid mode is chosen. `None` on end of input.
pub fn select_mode(terminal: &Terminal) -> Option<ConsensusMode> {
    loop {
        terminal.say("\nSelect voting mode:");
        for mode in ConsensusMode::ALL {
            terminal.say(&format!("{}. {}", mode.menu_number(), mode.description()));
        }
        let choice = terminal.prompt("Enter 1, 2 or 3 to select a mode: ")?;
        if let Some(mode) = ConsensusMode::from_token(&choice) {
            return Some(mode);
        }
    }
}

/// Run commands until `exit` or end of input.
pub async fn run(engine: &Engine, session: &mut Session, terminal: &Terminal) {
    while let Some(line) = terminal.prompt("\nEnter your command: ") {
        match Command::parse(&line) {
            Command::Exit => break,
            Command::SwitchMode(mode) => {
                session.set_mode(mode);
                terminal.say(&format!("Change mode to {mode} mode"));
            }
            Command::Invalid => terminal.say("Invalid input. Try again"),
            Command::Query(query) => {
                let span = info_span!("command", id = %Uuid::new_v4(), mode = %session.mode());
                let outcome = engine
                    .handle(session, &query, terminal)
                    .instrument(span)
                    .await;
                if let Some(text) = render::outcome(&outcome) {
                    terminal.say(&text);
                }
            }
        }
    }
}
