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
use super::connection::Connection;
use vtrap_common::{auth::Mechanism, event::Authentication, SMTPReplyCode};
use vtrap_config::log_channel::RECEIVER;

/// Run one AUTH exchange, capturing whatever the client sends.
///
/// The gateway is a capture profiler, not an authenticator: every
/// well-formed exchange succeeds with 235. Undecodable base64 answers 501
/// and captures nothing.
///
/// # Errors
///
/// * the connection failed while exchanging challenges
pub async fn on_authentication<S>(
    conn: &mut Connection<S>,
    mechanism: Mechanism,
    initial_response: Option<String>,
) -> anyhow::Result<Option<Authentication>>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    let credentials = match mechanism {
        Mechanism::Plain => {
            let response = match initial_response {
                Some(response) => response,
                None => {
                    conn.send("334 \r\n").await?;
                    conn.read_line().await?
                }
            };
            decode_plain(&response)
        }
        Mechanism::Login => {
            let username = match initial_response {
                Some(response) => response,
                None => {
                    // base64("Username:")
                    conn.send("334 VXNlcm5hbWU6\r\n").await?;
                    conn.read_line().await?
                }
            };
            let username = decode_utf8(&username);

            // base64("Password:")
            conn.send("334 UGFzc3dvcmQ6\r\n").await?;
            let password = decode_utf8(&conn.read_line().await?);

            match (username, password) {
                (Some(username), Some(password)) => Some((username, password)),
                _ => None,
            }
        }
    };

    match credentials {
        Some((username, password)) => {
            log::debug!(
                target: RECEIVER,
                "{{ uuid: {} }} auth {} captured (username: {})",
                conn.id,
                mechanism,
                username
            );
            conn.send_code(SMTPReplyCode::AuthenticationSucceeded).await?;
            Ok(Some(Authentication {
                attempted: true,
                mechanism,
                username,
                password,
            }))
        }
        None => {
            conn.send_code(SMTPReplyCode::Code501).await?;
            Ok(None)
        }
    }
}

/// `authzid NUL authcid NUL passwd`, all base64.
fn decode_plain(response: &str) -> Option<(String, String)> {
    let bytes = base64::decode(response).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;

    let mut split = decoded.split('\0');
    match (split.next(), split.next(), split.next(), split.next()) {
        (Some(_authzid), Some(authcid), Some(passwd), None) => {
            Some((authcid.to_string(), passwd.to_string()))
        }
        _ => None,
    }
}

fn decode_utf8(response: &str) -> Option<String> {
    String::from_utf8(base64::decode(response).ok()?).ok()
}
