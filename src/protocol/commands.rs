//! Module `commands`
//!
//! Defines the control protocol commands, their status and results, and the
//! parser that turns a raw line into a `Command`.
//!
//! Fields after the command word are TAB-separated so paths may contain
//! spaces. Backslashes in path fields are normalized to `/`.

use crate::storage::validation::normalize_separators;

/// Represents a command parsed from the client input.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    PWD,
    LIST(Option<String>), // Browse a directory, default: current directory
    MKFILE {
        path: String,
        size: u64, // Bytes of UTF-8 content following the line
    },
    DEL(String),   // Delete a file
    MKDIR(String), // Create a folder
    UPLOAD {
        dir: String,
        original_name: Option<String>,
        size: Option<u64>, // Payload bytes following the line
        desired_name: Option<String>,
    },
    COPY {
        source: String,
        target: String,
    },
    MOVE {
        source: String,
        target: String,
    },
    INVALID(String), // Known command with bad arguments
    UNKNOWN,         // Unknown or unsupported command
}

impl Command {
    /// Number of payload bytes the client sends after this command line.
    pub fn payload_len(&self) -> Option<u64> {
        match self {
            Command::MKFILE { size, .. } => Some(*size),
            Command::UPLOAD { size, .. } => *size,
            _ => None,
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Parses a raw command line received from a client into the `Command` enum.
///
/// Validates required arguments and returns `INVALID` if a known command is
/// misused.
pub fn parse_command(raw: &str) -> Command {
    let line = raw.trim_end_matches(['\r', '\n']).trim_start();
    let (word, rest) = match line.find([' ', '\t']) {
        Some(idx) => (&line[..idx], &line[idx + 1..]),
        None => (line, ""),
    };
    let fields: Vec<&str> = rest.split('\t').map(str::trim).collect();
    let field = |i: usize| fields.get(i).copied().unwrap_or("");
    let path = |i: usize| normalize_separators(field(i));

    match word.to_ascii_uppercase().as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "PWD" => Command::PWD,
        "LIST" | "LS" => {
            if field(0).is_empty() {
                Command::LIST(None)
            } else {
                Command::LIST(Some(path(0)))
            }
        }
        "MKFILE" if !field(0).is_empty() => match parse_size(field(1)) {
            Ok(size) => Command::MKFILE {
                path: path(0),
                size: size.unwrap_or(0),
            },
            Err(msg) => Command::INVALID(msg),
        },
        "DEL" if !field(0).is_empty() => Command::DEL(path(0)),
        "MKDIR" if !field(0).is_empty() => Command::MKDIR(path(0)),
        "UPLOAD" => match parse_size(field(2)) {
            Ok(size) => Command::UPLOAD {
                dir: path(0),
                original_name: non_empty(field(1)),
                size,
                desired_name: non_empty(field(3)),
            },
            Err(msg) => Command::INVALID(msg),
        },
        "COPY" | "MOVE" if !field(0).is_empty() && !field(1).is_empty() => {
            let (source, target) = (path(0), path(1));
            if word.eq_ignore_ascii_case("COPY") {
                Command::COPY { source, target }
            } else {
                Command::MOVE { source, target }
            }
        }
        "MKFILE" | "DEL" | "MKDIR" => Command::INVALID(format!("{} requires a path", word)),
        "COPY" | "MOVE" => Command::INVALID(format!("{} requires a source and a target", word)),
        _ => Command::UNKNOWN,
    }
}

fn parse_size(field: &str) -> Result<Option<u64>, String> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<u64>()
        .map(Some)
        .map_err(|_| format!("invalid size '{}'", field))
}

fn non_empty(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}
