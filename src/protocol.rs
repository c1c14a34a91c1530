//! Line-oriented text protocol for driving a match.
//!
//! Framing follows the GTP convention: each command may carry a numeric id,
//! and each response is `=[id] text` on success or `?[id] text` on failure,
//! followed by a blank line. Positions are 1-indexed at this boundary.
//!
//! ## Supported Commands
//!
//! - `name`, `version` - Engine identification
//! - `list_commands`, `known_command <cmd>`, `help`
//! - `new` - Start a new match with the same player names
//! - `show` - Render the board next to the position reference
//! - `status` - Whose turn it is, phases and piece counts
//! - `place <p>` - Place a piece
//! - `move <from> <to>` - Move (or fly) a piece
//! - `capture <p>` - Remove an opponent piece after forming a mill
//! - `save <file>`, `load <file>` - Persist the match as JSON
//! - `quit` - End the session
//!
//! ## Example
//!
//! ```
//! use morris_rust::protocol::TextEngine;
//!
//! let mut engine = TextEngine::new();
//! let mut out = Vec::new();
//! engine.run("place 1\nstatus\n".as_bytes(), &mut out).unwrap();
//! let text = String::from_utf8(out).unwrap();
//! assert!(text.contains("Dark"));
//! ```

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::constants::NUM_POSITIONS;
use crate::game::{Action, Match, Phase, TurnOutcome};
use crate::persist;
use crate::piece::Color;
use crate::topology::Point;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "capture",
    "help",
    "known_command",
    "list_commands",
    "load",
    "move",
    "name",
    "new",
    "place",
    "quit",
    "save",
    "show",
    "status",
    "version",
];

const HELP: &str = "\
place <p>          put a piece on position p (1-24)
move <from> <to>   move a piece; any empty target while flying
capture <p>        remove an opponent piece after a mill
show               draw the board
status             turn, phases and piece counts
new                start over
save <file>        write the match to a JSON file
load <file>        read a match from a JSON file
quit               leave";

/// Text protocol state: the match being driven.
pub struct TextEngine {
    game: Match,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self::with_match(Match::new())
    }

    /// Drive an existing match, e.g. one loaded from disk.
    pub fn with_match(game: Match) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((first, args)) = parts.split_first() else {
                continue;
            };
            let command = first.to_lowercase();

            let (success, message) = self.execute(&command, args);
            if !success {
                warn!(%command, %message, "command rejected");
            }

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Parse a 1-indexed position.
    fn parse_pos(arg: &str) -> Result<Point, String> {
        match arg.parse::<usize>() {
            Ok(p) if (1..=NUM_POSITIONS).contains(&p) => Ok(p - 1),
            _ => Err(format!("invalid position '{arg}' (expected 1-{NUM_POSITIONS})")),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, "morris-rust".to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&arg.to_lowercase().as_str());
                (true, known.to_string())
            }

            "help" => (true, HELP.to_string()),

            "quit" => (true, String::new()),

            "new" => {
                let light = self.game.player(Color::Light).name().to_string();
                let dark = self.game.player(Color::Dark).name().to_string();
                self.game = Match::with_names(light, dark);
                (true, self.prompt())
            }

            "show" => (true, format!("\n{}", self.game.board().render_with_reference())),

            "status" => (true, self.status()),

            "place" => {
                let [p] = args else {
                    return (false, "usage: place <p>".to_string());
                };
                match Self::parse_pos(p) {
                    Ok(to) => self.apply(Action::Place { to }),
                    Err(e) => (false, e),
                }
            }

            "move" => {
                let [a, b] = args else {
                    return (false, "usage: move <from> <to>".to_string());
                };
                match (Self::parse_pos(a), Self::parse_pos(b)) {
                    (Ok(from), Ok(to)) => self.apply(Action::Move { from, to }),
                    (Err(e), _) | (_, Err(e)) => (false, e),
                }
            }

            "capture" => {
                let [p] = args else {
                    return (false, "usage: capture <p>".to_string());
                };
                let pos = match Self::parse_pos(p) {
                    Ok(pos) => pos,
                    Err(e) => return (false, e),
                };
                match self.game.capture(pos) {
                    Ok(outcome) => (true, self.describe(outcome)),
                    Err(e) => (false, e.to_string()),
                }
            }

            "save" => {
                let [path] = args else {
                    return (false, "usage: save <file>".to_string());
                };
                match persist::save_to_file(&self.game, path) {
                    Ok(()) => (true, format!("saved to {path}")),
                    Err(e) => (false, format!("{e:#}")),
                }
            }

            "load" => {
                let [path] = args else {
                    return (false, "usage: load <file>".to_string());
                };
                match persist::load_from_file(path) {
                    Ok(game) => {
                        self.game = game;
                        (true, self.prompt())
                    }
                    Err(e) => (false, format!("{e:#}")),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn apply(&mut self, action: Action) -> (bool, String) {
        match self.game.play(action) {
            Ok(outcome) => (true, self.describe(outcome)),
            Err(e) => (false, e.to_string()),
        }
    }

    fn describe(&self, outcome: TurnOutcome) -> String {
        match outcome {
            TurnOutcome::Won(color) => {
                format!("{} ({color}) wins the game", self.game.player(color).name())
            }
            TurnOutcome::CaptureRequired(color) => {
                let choices: Vec<String> = self
                    .game
                    .removable()
                    .iter()
                    .map(|p| (p + 1).to_string())
                    .collect();
                format!("mill! {color} captures one of: {}", choices.join(" "))
            }
            TurnOutcome::NextTurn(_) => self.prompt(),
        }
    }

    /// What the current player is expected to do.
    fn prompt(&self) -> String {
        let color = self.game.current();
        if let Some(winner) = self.game.winner() {
            return format!("{} ({winner}) has won", self.game.player(winner).name());
        }
        if self.game.pending_capture() {
            return format!("{color} to capture");
        }
        let verb = match self.game.phase(color) {
            Phase::Placing => "place",
            Phase::Moving => "move",
            Phase::Flying => "fly",
        };
        format!("{color} to {verb}")
    }

    fn status(&self) -> String {
        let mut lines = vec![self.prompt()];
        for color in Color::ALL {
            let p = self.game.player(color);
            lines.push(format!(
                "{color} ({}): {}, on board {}, in hand {}, lost {}",
                p.name(),
                self.game.phase(color),
                p.active_pieces(),
                p.available_to_place(),
                p.captured()
            ));
        }
        lines.join("\n")
    }
}
