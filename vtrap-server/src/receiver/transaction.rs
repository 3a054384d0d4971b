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
use super::{auth, command::Command, connection::Connection};
use crate::server::Handles;
use vtrap_common::{event::Authentication, event::Envelop, SMTPReplyCode, Verdict};
use vtrap_config::log_channel::RECEIVER;
use vtrap_mail_parser::{MailMimeParser, ParseContext};

/// Abstracted memory of the last client message
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum State {
    /// connection accepted, no HELO/EHLO yet.
    Connect,
    /// greeted, ready for a mail transaction.
    Helo,
    /// return-path recorded.
    MailFrom,
    /// at least one recipient recorded.
    RcptTo,
    /// session over.
    Stop,
}

/// Envelope state of one connection, driven by the client's commands.
pub struct Transaction {
    /// current protocol state.
    pub state: State,
    /// envelope being accumulated.
    pub envelop: Envelop,
    /// captured credentials, kept across transactions until RSET.
    pub authentication: Option<Authentication>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    ///
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Connect,
            envelop: Envelop::default(),
            authentication: None,
        }
    }

    /// clear the mail transaction, keeping helo and the auth capture.
    fn clear_transaction(&mut self) {
        self.envelop.from.clear();
        self.envelop.to.clear();
    }

    /// RSET: zero the envelope and the auth capture, keep helo.
    fn reset(&mut self) {
        self.clear_transaction();
        self.authentication = None;
    }

    async fn process_command<S>(
        &mut self,
        conn: &mut Connection<S>,
        handles: &Handles,
        command: Command,
    ) -> anyhow::Result<()>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
    {
        match (self.state, command) {
            (_, Command::Noop) => conn.send_code(SMTPReplyCode::Code250).await,

            (_, Command::Help) => conn.send_code(SMTPReplyCode::Code214).await,

            (_, Command::Vrfy | Command::Expn) => {
                conn.send_code(SMTPReplyCode::Code502unimplemented).await
            }

            (_, Command::Quit) => {
                self.state = State::Stop;
                conn.send_code(SMTPReplyCode::Code221).await
            }

            (_, Command::Rset) => {
                self.reset();
                if self.state != State::Connect {
                    self.state = State::Helo;
                }
                log::debug!(target: RECEIVER, "{{ uuid: {} }} session reset", conn.id);
                conn.send_code(SMTPReplyCode::Code250).await
            }

            // a new HELO/EHLO aborts any transaction in progress.
            (_, Command::Helo(domain)) => {
                self.envelop.helo = domain;
                self.clear_transaction();
                self.state = State::Helo;
                conn.send_code(SMTPReplyCode::Code250).await
            }

            (_, Command::Ehlo(domain)) => {
                self.envelop.helo = domain;
                self.clear_transaction();
                self.state = State::Helo;
                conn.send_code(SMTPReplyCode::Code250Esmtp).await
            }

            (
                State::Helo,
                Command::Auth {
                    mechanism,
                    initial_response,
                },
            ) => match mechanism.parse::<vtrap_common::auth::Mechanism>() {
                Ok(mechanism) => {
                    if let Some(authentication) =
                        auth::on_authentication(conn, mechanism, initial_response).await?
                    {
                        self.authentication = Some(authentication);
                    }
                    Ok(())
                }
                Err(_) => conn.send_code(SMTPReplyCode::Code504).await,
            },

            (State::Helo, Command::MailFrom(path)) => {
                self.envelop.from = path;
                log::debug!(
                    target: RECEIVER,
                    "{{ uuid: {} }} MAIL FROM (from: {})",
                    conn.id,
                    self.envelop.from
                );
                self.state = State::MailFrom;
                conn.send_code(SMTPReplyCode::Code250).await
            }

            (State::MailFrom | State::RcptTo, Command::RcptTo(path)) => {
                if self.envelop.to.len() >= conn.config.server.max_recipients {
                    return conn
                        .send_code(SMTPReplyCode::Code452TooManyRecipients)
                        .await;
                }
                log::debug!(
                    target: RECEIVER,
                    "{{ uuid: {} }} RCPT TO (to: {})",
                    conn.id,
                    path
                );
                self.envelop.to.push(path);
                self.state = State::RcptTo;
                conn.send_code(SMTPReplyCode::Code250).await
            }

            (State::RcptTo, Command::Data) => {
                conn.send_code(SMTPReplyCode::Code354).await?;

                let code = self.read_and_process_data(conn, handles).await?;
                conn.send_code(code).await?;

                if code == SMTPReplyCode::Code421 {
                    self.state = State::Stop;
                } else if self.state != State::Stop {
                    // ready for the next transaction on this connection.
                    self.clear_transaction();
                    self.state = State::Helo;
                }
                Ok(())
            }

            _ => conn.send_code(SMTPReplyCode::Code503).await,
        }
    }

    /// Accumulate the message body into a pooled buffer, then run the
    /// parse/dispatch pipeline. The buffer goes back to the pool whatever
    /// the outcome.
    async fn read_and_process_data<S>(
        &mut self,
        conn: &mut Connection<S>,
        handles: &Handles,
    ) -> anyhow::Result<SMTPReplyCode>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
    {
        let mut buffer = handles.buffers.get();
        let mut overflowed = false;

        loop {
            let line = match conn.read_line().await {
                Ok(line) => line,
                Err(error) => {
                    handles.buffers.put(buffer);
                    self.state = State::Stop;
                    log::error!(
                        target: RECEIVER,
                        "{{ uuid: {} }} failed to read message body: {}",
                        conn.id,
                        error
                    );
                    return match error.kind() {
                        std::io::ErrorKind::TimedOut => Ok(SMTPReplyCode::Code451Timeout),
                        std::io::ErrorKind::UnexpectedEof => {
                            Err(anyhow::anyhow!("client aborted the connection during DATA"))
                        }
                        _ => Ok(SMTPReplyCode::Code451),
                    };
                }
            };

            if line == "." {
                break;
            }

            // transparency: a leading dot doubled by the client is undone.
            let line = line.strip_prefix('.').unwrap_or(&line);

            if overflowed
                || buffer.len() + line.len() + 2 > conn.config.server.max_message_size
            {
                // the channel stays synchronized: keep consuming up to the
                // terminator, the reply comes after it.
                overflowed = true;
                continue;
            }
            buffer.extend_from_slice(line.as_bytes());
            buffer.extend_from_slice(b"\r\n");
        }

        let code = if overflowed {
            log::warn!(
                target: RECEIVER,
                "{{ uuid: {} }} message exceeds the {} byte limit, rejected",
                conn.id,
                conn.config.server.max_message_size
            );
            SMTPReplyCode::Code552
        } else {
            self.on_data_end(conn, handles, &buffer).await
        };

        handles.buffers.put(buffer);
        Ok(code)
    }

    /// parse → event → dispatch → verdict, mapped to the wire reply.
    async fn on_data_end<S>(
        &mut self,
        conn: &mut Connection<S>,
        handles: &Handles,
        raw: &[u8],
    ) -> SMTPReplyCode
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
    {
        let ctx = ParseContext {
            uuid: conn.id.clone(),
            server: conn.config.server.name.clone(),
            remote_addr: conn.client_addr.to_string(),
            envelop: self.envelop.clone(),
            authentication: self.authentication.clone(),
            include_raw: conn.config.include_raw,
            storage: conn.config.attachment_storage.mode,
            temp_dir: conn.config.attachment_storage.temp_dir.clone(),
        };

        let event = match MailMimeParser::default().parse(raw, &ctx) {
            Ok(event) => event,
            Err(error) => {
                log::error!(
                    target: RECEIVER,
                    "{{ uuid: {} }} failed to parse message: {}",
                    conn.id,
                    error
                );
                return SMTPReplyCode::Code554;
            }
        };

        log::info!(
            target: RECEIVER,
            "{{ uuid: {} }} message received (from: {}, recipients: {}, size: {})",
            conn.id,
            event.envelope.from,
            event.envelope.to.len(),
            raw.len()
        );

        match handles.dispatcher.dispatch(&event).await {
            Ok(Verdict::Continue) => SMTPReplyCode::Code250,
            Ok(Verdict::Close) => {
                log::debug!(
                    target: RECEIVER,
                    "{{ uuid: {} }} worker requested connection close",
                    conn.id
                );
                SMTPReplyCode::Code421
            }
            Err(error) => {
                log::error!(
                    target: RECEIVER,
                    "{{ uuid: {} }} worker dispatch failed: {}",
                    conn.id,
                    error
                );
                SMTPReplyCode::Code451
            }
        }
    }
}

/// Receives the incoming mail of a connection, one command at a time.
///
/// # Errors
///
/// * server failed to send a reply
/// * the client aborted mid-transaction
pub async fn handle_connection<S>(
    conn: &mut Connection<S>,
    handles: &Handles,
) -> anyhow::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    conn.send_code(SMTPReplyCode::Code220).await?;

    let mut transaction = Transaction::new();

    while transaction.state != State::Stop {
        let line = match conn.read_line().await {
            Ok(line) => line,
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => {
                log::debug!(target: RECEIVER, "{{ uuid: {} }} eof", conn.id);
                break;
            }
            Err(error) if error.kind() == std::io::ErrorKind::TimedOut => {
                conn.send_code(SMTPReplyCode::Code451Timeout).await?;
                break;
            }
            Err(error) => return Err(anyhow::Error::new(error)),
        };

        match Command::parse(&line) {
            Ok(command) => {
                transaction.process_command(conn, handles, command).await?;
            }
            Err(code) => conn.send_code(code).await?,
        }
    }

    Ok(())
}
