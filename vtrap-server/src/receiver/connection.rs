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
use vtrap_common::SMTPReplyCode;
use vtrap_config::{log_channel::RECEIVER, Config};

/// Instance containing one client connection's information.
pub struct Connection<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    /// session id, minted when the connection was accepted.
    pub id: String,
    /// connection timestamp.
    pub timestamp: std::time::SystemTime,
    /// server's configuration.
    pub config: std::sync::Arc<Config>,
    /// peer socket address.
    pub client_addr: std::net::SocketAddr,
    inner: S,
    read_buffer: Vec<u8>,
}

impl<S> Connection<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    ///
    pub fn new(
        id: String,
        client_addr: std::net::SocketAddr,
        config: std::sync::Arc<Config>,
        stream: S,
    ) -> Self {
        Self {
            id,
            timestamp: std::time::SystemTime::now(),
            config,
            client_addr,
            inner: stream,
            read_buffer: Vec::new(),
        }
    }

    /// Read one line from the client, terminator stripped.
    ///
    /// # Errors
    ///
    /// * `TimedOut` after `read_timeout` without a complete line
    /// * `UnexpectedEof` when the client closed the connection
    /// * stream's error
    pub async fn read_line(&mut self) -> std::io::Result<String> {
        loop {
            if let Some(position) = self.read_buffer.iter().position(|&b| b == b'\n') {
                let mut line = self.read_buffer.drain(..=position).collect::<Vec<_>>();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }

            let mut chunk = [0; 1024];
            let read = tokio::time::timeout(
                self.config.server.read_timeout,
                tokio::io::AsyncReadExt::read(&mut self.inner, &mut chunk),
            )
            .await
            .map_err(|elapsed| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, elapsed)
            })??;

            if read == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by the client",
                ));
            }
            self.read_buffer.extend_from_slice(&chunk[..read]);
        }
    }

    /// Send a raw reply.
    ///
    /// # Errors
    ///
    /// * the flush did not complete within `write_timeout`
    /// * internal connection writer error
    pub async fn send(&mut self, reply: &str) -> anyhow::Result<()> {
        log::info!(
            target: RECEIVER,
            "{{ uuid: {} }} send=\"{}\"",
            self.id,
            reply.trim_end()
        );

        tokio::time::timeout(self.config.server.write_timeout, async {
            tokio::io::AsyncWriteExt::write_all(&mut self.inner, reply.as_bytes()).await?;
            tokio::io::AsyncWriteExt::flush(&mut self.inner).await
        })
        .await
        .map_err(|_| anyhow::anyhow!("timed out sending the reply"))?
        .map_err(anyhow::Error::new)
    }

    /// Send a reply code to the client, substituting the configured
    /// hostname into replies that announce it.
    ///
    /// # Errors
    ///
    /// * see [`Connection::send`]
    pub async fn send_code(&mut self, reply_to_send: SMTPReplyCode) -> anyhow::Result<()> {
        let reply = reply_to_send
            .as_str()
            .replace("{domain}", &self.config.server.hostname);
        self.send(&reply).await
    }
}
