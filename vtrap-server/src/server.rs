/*
 * vTrap SMTP ingestion gateway
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::{
    cleanup,
    dispatch::{Dispatcher, WorkerExecutor},
    pool::{BufferPool, PayloadPool},
    receiver::{handle_connection, Connection},
    registry::{SessionInfo, SessionRegistry},
};
use vtrap_common::StorageMode;
use vtrap_config::{log_channel::RECEIVER, Config};

/// The minimal capability set a session needs: worker dispatch, buffer
/// recycling and the session registry. Injected instead of a back-pointer
/// to the whole server.
#[derive(Clone)]
pub struct Handles {
    /// serializes events and interprets worker replies.
    pub dispatcher: std::sync::Arc<Dispatcher>,
    /// DATA buffer recycling.
    pub buffers: std::sync::Arc<BufferPool>,
    /// process-wide session map.
    pub registry: std::sync::Arc<SessionRegistry>,
}

/// TCP/IP server
#[allow(clippy::module_name_repetitions)]
pub struct ServerVTrap {
    listener: tokio::net::TcpListener,
    config: std::sync::Arc<Config>,
    executor: std::sync::Arc<dyn WorkerExecutor>,
    handles: Handles,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl ServerVTrap {
    /// Create a server with the configuration provided, the socket bound.
    ///
    /// # Errors
    ///
    /// * the configured address cannot be bound
    pub async fn new(
        config: std::sync::Arc<Config>,
        executor: std::sync::Arc<dyn WorkerExecutor>,
    ) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
        let (shutdown, _) = tokio::sync::watch::channel(false);

        let handles = Handles {
            dispatcher: std::sync::Arc::new(Dispatcher::new(
                executor.clone(),
                std::sync::Arc::new(PayloadPool::default()),
            )),
            buffers: std::sync::Arc::new(BufferPool::default()),
            registry: std::sync::Arc::new(SessionRegistry::default()),
        };

        if config.attachment_storage.mode == StorageMode::Tempfile {
            cleanup::start(config.clone(), shutdown.subscribe());
        }

        Ok(Self {
            listener,
            config,
            executor,
            handles,
            shutdown,
        })
    }

    /// Get the local address of the tcp listener.
    #[must_use]
    pub fn addr(&self) -> std::net::SocketAddr {
        self.listener
            .local_addr()
            .expect("cannot retrieve local address")
    }

    /// Capability set shared with the sessions, also the surface the
    /// operational RPC consumes (list-sessions, close-session).
    #[must_use]
    pub fn handles(&self) -> Handles {
        self.handles.clone()
    }

    /// Worker executor handle, exposed for the operational RPC
    /// (reset-pool, worker-count).
    #[must_use]
    pub fn executor(&self) -> std::sync::Arc<dyn WorkerExecutor> {
        self.executor.clone()
    }

    /// Main loop of vTrap's server.
    ///
    /// # Errors
    ///
    /// * none under normal operation; the loop ends on [`ServerVTrap::shutdown`]
    pub async fn listen_and_serve(&self) -> anyhow::Result<()> {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, client_addr)) => self.accept_client(stream, client_addr),
                    Err(error) => {
                        log::error!(target: RECEIVER, "error accepting socket: {}", error);
                    }
                },
                _ = shutdown.changed() => {
                    log::warn!(target: RECEIVER, "listener stopped accepting connections");
                    return Ok(());
                }
            }
        }
    }

    fn accept_client(&self, stream: tokio::net::TcpStream, client_addr: std::net::SocketAddr) {
        let uuid = uuid::Uuid::new_v4().to_string();
        log::warn!(
            target: RECEIVER,
            "{{ uuid: {} }} connection from: {}",
            uuid,
            client_addr
        );

        self.handles.registry.insert(SessionInfo {
            uuid: uuid.clone(),
            client_addr,
            connected_at: std::time::SystemTime::now(),
        });

        let task = tokio::spawn(Self::run_session(
            uuid.clone(),
            stream,
            client_addr,
            self.config.clone(),
            self.handles.clone(),
        ));
        self.handles.registry.arm(&uuid, task.abort_handle());
    }

    async fn run_session(
        uuid: String,
        stream: tokio::net::TcpStream,
        client_addr: std::net::SocketAddr,
        config: std::sync::Arc<Config>,
        handles: Handles,
    ) {
        let begin = std::time::SystemTime::now();

        let mut conn = Connection::new(uuid.clone(), client_addr, config, stream);
        match handle_connection(&mut conn, &handles).await {
            Ok(()) => {
                log::warn!(
                    target: RECEIVER,
                    "{{ uuid: {}, elapsed: {:?} }} connection {} closed cleanly",
                    uuid,
                    begin.elapsed(),
                    client_addr,
                );
            }
            Err(error) => {
                log::error!(
                    target: RECEIVER,
                    "{{ uuid: {}, elapsed: {:?} }} connection {} closed with an error {}",
                    uuid,
                    begin.elapsed(),
                    client_addr,
                    error,
                );
            }
        }

        handles.registry.remove(&uuid);
        drop(conn);
    }

    /// Stop accepting connections and wait for in-flight sessions.
    ///
    /// # Errors
    ///
    /// * the deadline elapsed; remaining sessions are aborted in the
    ///   background and the error reports how many
    pub async fn shutdown(&self, deadline: std::time::Duration) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);

        let registry = self.handles.registry.clone();
        let drained = async move {
            while !registry.is_empty() {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        };

        if tokio::time::timeout(deadline, drained).await.is_err() {
            let aborted = self.handles.registry.kill_all();
            anyhow::bail!(
                "shutdown deadline of {:?} exceeded, {} session(s) aborted",
                deadline,
                aborted
            );
        }

        log::warn!(target: RECEIVER, "server stopped gracefully");
        Ok(())
    }
}
