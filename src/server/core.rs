use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::logging::log_connection;
use crate::protocol::responses::{self, format_response};
use crate::storage::{FileManager, Sandbox};

pub struct Server {
    registry: Arc<Mutex<ClientRegistry>>,
    manager: Arc<FileManager>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Prepares the storage root and binds the control listener.
    ///
    /// The storage root is created if missing and canonicalized, so the
    /// sandbox boundary is fixed for the lifetime of the server.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root = config.startup.storage_root_path();
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        info!("Storage root: {}", root.display());

        let manager = Arc::new(FileManager::new(Sandbox::new(root)?));

        let socket = config.startup.control_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            ServerError::NetworkError(format!("Failed to bind to {}: {}", socket, e))
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            registry: Arc::new(Mutex::new(ClientRegistry::new())),
            manager,
            listener,
            config: Arc::new(config),
        })
    }

    /// Address the control listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, one task per client.
    pub async fn start(&self) {
        info!(
            "Starting scoped file manager on {} (max {} clients)",
            self.config.startup.control_socket(),
            self.config.runtime.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    let manager = Arc::clone(&self.manager);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, registry, manager, config).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Handles a new client: enforces the connection limit, greets, and hands
/// off to the session loop.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    registry: Arc<Mutex<ClientRegistry>>,
    manager: Arc<FileManager>,
    config: Arc<ServerConfig>,
) -> Result<(), std::io::Error> {
    let max_clients = config.runtime.max_clients;

    let active = {
        let mut clients = registry.lock().await;
        if !clients.try_register(client_addr, max_clients) {
            drop(clients);
            warn!("Rejecting {}: too many connections", client_addr);
            let reply = format_response(
                responses::SERVICE_UNAVAILABLE,
                "Too many connections. Try again later.",
            );
            stream.write_all(reply.as_bytes()).await?;
            return Ok(());
        }
        clients.len()
    };
    log_connection(&client_addr, active, max_clients);

    let greeting = format_response(responses::READY, "Scoped file manager ready");
    if let Err(e) = stream.write_all(greeting.as_bytes()).await {
        registry.lock().await.remove(&client_addr);
        return Err(e);
    }

    handle_client(stream, client_addr, registry, manager, config).await;
    Ok(())
}
