//! Command handlers module for the scoped file manager.
//!
//! Maps each parsed command onto one `FileManager` operation and turns the
//! outcome into a reply. Successful mutations move the session to the
//! directory the caller should see next.

use crate::client::Client;
use crate::error::StorageError;
use crate::error::handlers::error_to_reply_code;
use crate::protocol::responses::{self, format_listing, format_response, quote_dir};
use crate::protocol::{Command, CommandResult, CommandStatus};
use crate::storage::{FileManager, MutationResult, Upload};
use log::warn;

/// Dispatches a received command to its corresponding handler.
///
/// `payload` carries the bytes read after the command line for commands
/// that declare one.
pub fn handle_command(
    client: &mut Client,
    command: &Command,
    payload: Option<Vec<u8>>,
    manager: &FileManager,
) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::PWD => handle_cmd_pwd(client),
        Command::LIST(dir) => handle_cmd_list(client, dir.as_deref(), manager),
        Command::MKFILE { path, .. } => handle_cmd_mkfile(client, path, payload, manager),
        Command::DEL(path) => {
            let result = manager.delete_file(path);
            finish_mutation(client, result, "File deleted.")
        }
        Command::MKDIR(path) => {
            let result = manager.create_folder(path);
            finish_mutation(client, result, "Folder created.")
        }
        Command::UPLOAD {
            dir,
            original_name,
            desired_name,
            ..
        } => {
            let upload = match (original_name, payload) {
                (Some(name), Some(bytes)) => Some(Upload {
                    original_name: name.clone(),
                    bytes,
                }),
                _ => None,
            };
            let result = manager.upload_write(dir, upload.as_ref(), desired_name.as_deref());
            finish_mutation(client, result, "File uploaded.")
        }
        Command::COPY { source, target } => {
            let result = manager.copy_file(source, target);
            finish_mutation(client, result, "File copied.")
        }
        Command::MOVE { source, target } => {
            let result = manager.move_file(source, target);
            finish_mutation(client, result, "File moved.")
        }
        Command::INVALID(reason) => CommandResult {
            status: CommandStatus::Failure(reason.clone()),
            message: Some(format_response(responses::SYNTAX_ERROR, reason)),
        },
        Command::UNKNOWN => CommandResult {
            status: CommandStatus::Failure("Unknown command".into()),
            message: Some(format_response(
                responses::COMMAND_UNRECOGNIZED,
                "Unknown command",
            )),
        },
    }
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(responses::GOODBYE, "Goodbye")),
    }
}

/// Handles the PWD command: reports the session's current directory.
fn handle_cmd_pwd(client: &Client) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(
            responses::CURRENT_DIRECTORY,
            &format!("{} is the current directory", quote_dir(client.current_dir())),
        )),
    }
}

/// Handles the LIST command: lists a directory and makes it current.
fn handle_cmd_list(client: &mut Client, dir: Option<&str>, manager: &FileManager) -> CommandResult {
    let dir = dir.unwrap_or(client.current_dir()).to_string();

    match manager.list(&dir) {
        Ok(listing) => {
            client.set_current_dir(listing.directory.relative().to_string());
            CommandResult {
                status: CommandStatus::Success,
                message: Some(format_listing(&listing)),
            }
        }
        Err(e) => storage_failure(client, e),
    }
}

/// Handles the MKFILE command: the payload is the file's text content.
fn handle_cmd_mkfile(
    client: &mut Client,
    path: &str,
    payload: Option<Vec<u8>>,
    manager: &FileManager,
) -> CommandResult {
    let content = match String::from_utf8(payload.unwrap_or_default()) {
        Ok(content) => content,
        Err(_) => {
            return CommandResult {
                status: CommandStatus::Failure("Content is not valid UTF-8".into()),
                message: Some(format_response(
                    responses::SYNTAX_ERROR,
                    "Content is not valid UTF-8",
                )),
            };
        }
    };

    let result = manager.create_file(path, &content);
    finish_mutation(client, result, "File created.")
}

fn finish_mutation(
    client: &mut Client,
    result: Result<MutationResult, StorageError>,
    confirmation: &str,
) -> CommandResult {
    match result {
        Ok(done) => {
            client.set_current_dir(done.navigate_to);
            CommandResult {
                status: CommandStatus::Success,
                message: Some(format_response(
                    responses::ACTION_OK,
                    &format!(
                        "{} Current directory: {}",
                        confirmation,
                        quote_dir(client.current_dir())
                    ),
                )),
            }
        }
        Err(e) => storage_failure(client, e),
    }
}

fn storage_failure(client: &Client, err: StorageError) -> CommandResult {
    let addr = client
        .client_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    warn!("Request from {} rejected: {}", addr, err);

    let text = err.to_string();
    CommandResult {
        message: Some(format_response(error_to_reply_code(&err), &text)),
        status: CommandStatus::Failure(text),
    }
}
