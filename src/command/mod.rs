//! The line protocol shared by the TCP and UDP front ends.
//!
//! A request is one line of text: a keyword followed by arguments, each
//! separated by a single space. Parsing and execution are free of I/O so both
//! transports run the exact same code.

use crate::store::{SharedStore, render_values};

pub const PUT_OK: &str = "Put operation successful";
pub const DELETE_OK: &str = "Delete operation successful";
pub const DELETE_NOT_FOUND: &str = "Key not found. Delete operation failed.";
pub const SHUTTING_DOWN: &str = "Server shutting down.";

/// Why a request line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCommand {
    Put,
    Get,
    Delete,
    Unknown,
}

impl InvalidCommand {
    pub fn message(self) -> &'static str {
        match self {
            InvalidCommand::Put => "Invalid put command",
            InvalidCommand::Get => "Invalid get command",
            InvalidCommand::Delete => "Invalid delete command",
            InvalidCommand::Unknown => "Invalid command",
        }
    }
}

/// One decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Dump,
    Shutdown,
    Invalid(InvalidCommand),
}

impl Command {
    /// Decode one request line.
    ///
    /// Tokens are split on single spaces, so consecutive spaces yield empty
    /// tokens; trailing empty tokens are dropped. The keyword is matched
    /// case-insensitively, arguments are taken verbatim.
    pub fn parse(line: &str) -> Command {
        let mut parts: Vec<&str> = line.split(' ').collect();
        while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }

        let args = &parts[1..];
        match parts[0].to_ascii_lowercase().as_str() {
            "put" => {
                if args.len() >= 2 {
                    Command::Put {
                        key: args[0].to_string(),
                        value: args[1..].join(" "),
                    }
                } else {
                    Command::Invalid(InvalidCommand::Put)
                }
            }
            "get" => match args {
                [key] => Command::Get {
                    key: key.to_string(),
                },
                _ => Command::Invalid(InvalidCommand::Get),
            },
            "del" => match args {
                [key] => Command::Delete {
                    key: key.to_string(),
                },
                _ => Command::Invalid(InvalidCommand::Delete),
            },
            "store" => Command::Dump,
            "exit" => Command::Shutdown,
            _ => Command::Invalid(InvalidCommand::Unknown),
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Put { .. } => "put",
            Command::Get { .. } => "get",
            Command::Delete { .. } => "del",
            Command::Dump => "store",
            Command::Shutdown => "exit",
            Command::Invalid(_) => "invalid",
        }
    }
}

/// The reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
    /// Set by `exit`: the transport must stop the server once the reply is out.
    pub shutdown: bool,
}

impl Response {
    pub fn new(text: impl Into<String>) -> Self {
        Response {
            text: text.into(),
            shutdown: false,
        }
    }

    fn shutdown() -> Self {
        Response {
            text: SHUTTING_DOWN.to_string(),
            shutdown: true,
        }
    }
}

/// Run a command against the store. The store lock is held for the whole
/// command, so every command is atomic with respect to every other.
pub async fn execute(command: Command, store: &SharedStore) -> Response {
    match command {
        Command::Put { key, value } => {
            store.lock().await.put(key, value);
            Response::new(PUT_OK)
        }
        Command::Get { key } => {
            let store = store.lock().await;
            Response::new(render_values(store.get(&key)))
        }
        Command::Delete { key } => {
            if store.lock().await.delete(&key) {
                Response::new(DELETE_OK)
            } else {
                Response::new(DELETE_NOT_FOUND)
            }
        }
        Command::Dump => Response::new(store.lock().await.dump()),
        Command::Shutdown => Response::shutdown(),
        Command::Invalid(reason) => Response::new(reason.message()),
    }
}

/// Parse and execute one request line.
pub async fn process_line(line: &str, store: &SharedStore) -> Response {
    let command = Command::parse(line);
    tracing::trace!(command = command.name(), "executing");
    execute(command, store).await
}
