use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry};
use crate::config::ServerConfig;
use crate::middleware::logging::{log_command, log_disconnect};
use crate::protocol::responses::{self, format_response};
use crate::protocol::{CommandStatus, handle_command, parse_command};
use crate::storage::FileManager;

/// Handles a client session using the Tokio async runtime.
///
/// - Reads command lines (bounded by `max_command_length`) with a BufReader.
/// - Reads the declared payload for MKFILE/UPLOAD, refusing oversized ones
///   before any payload byte is read.
/// - Dispatches commands using `handle_command` against session-local state.
/// - Removes the client from `registry` when the session ends.
pub async fn handle_client(
    cmd_stream: TcpStream,
    client_addr: SocketAddr,
    registry: Arc<Mutex<ClientRegistry>>,
    manager: Arc<FileManager>,
    config: Arc<ServerConfig>,
) {
    let (read_half, mut write_half) = cmd_stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    let mut client = Client::new(client_addr);

    let max_command_length = config.startup.max_command_length;
    let max_upload = config.runtime.max_upload_size_bytes();

    loop {
        line.clear();
        let mut limited = (&mut reader).take(max_command_length as u64 + 1);
        match limited.read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                if line.len() > max_command_length {
                    warn!("Command from {} exceeds {} bytes", client_addr, max_command_length);
                    let reply = format_response(responses::COMMAND_UNRECOGNIZED, "Command too long");
                    let _ = write_half.write_all(reply.as_bytes()).await;
                    break;
                }

                if line.trim().is_empty() {
                    continue;
                }

                let command = parse_command(&line);
                log_command(&client_addr, &command);

                let payload = match command.payload_len() {
                    Some(len) if len > max_upload => {
                        warn!(
                            "Payload of {} bytes from {} exceeds limit of {} bytes",
                            len, client_addr, max_upload
                        );
                        let reply = format_response(
                            responses::PAYLOAD_TOO_LARGE,
                            &format!("Payload too large (max {} bytes)", max_upload),
                        );
                        let _ = write_half.write_all(reply.as_bytes()).await;
                        break;
                    }
                    Some(len) => {
                        let mut bytes = vec![0u8; len as usize];
                        if let Err(e) = reader.read_exact(&mut bytes).await {
                            error!("Failed to read payload from {}: {}", client_addr, e);
                            break;
                        }
                        Some(bytes)
                    }
                    None => None,
                };

                let result = handle_command(&mut client, &command, payload, &manager);

                if let Some(msg) = &result.message {
                    if let Err(e) = write_half.write_all(msg.as_bytes()).await {
                        error!("Failed to reply to {}: {}", client_addr, e);
                        break;
                    }
                }

                if result.status == CommandStatus::CloseConnection {
                    info!("Client {} requested to quit", client_addr);
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let connected_since = registry.lock().await.remove(&client_addr);
    log_disconnect(&client_addr, connected_since.map(|t| t.elapsed()));
}
