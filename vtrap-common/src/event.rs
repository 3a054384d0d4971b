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
use crate::auth::Mechanism;

/// Kind of event submitted to the worker.
///
/// A single kind exists today; the tag is kept explicit so the worker can
/// demultiplex if other kinds are introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EventKind {
    /// a complete email was received and parsed.
    #[serde(rename = "EMAIL_RECEIVED")]
    EmailReceived,
}

/// Data received during the SMTP transaction, distinct from the message
/// headers.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelop {
    /// result of the MAIL FROM command, kept as sent (angle brackets
    /// included), possibly empty.
    pub from: String,
    /// recipients received using the RCPT TO command, in order.
    pub to: Vec<String>,
    /// result of the HELO/EHLO command.
    pub helo: String,
}

/// Credentials captured from an AUTH exchange, never verified.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Authentication {
    /// true whenever this record exists.
    pub attempted: bool,
    /// mechanism announced by the client.
    pub mechanism: Mechanism,
    /// username as decoded from the exchange.
    pub username: String,
    /// password as decoded from the exchange, in plain text.
    pub password: String,
}

/// The parsed message content.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// header name as sent by the client, mapped to its value.
    /// multi-valued headers are collapsed by joining with `", "`.
    pub headers: std::collections::BTreeMap<String, String>,
    /// selected rendering of the body: html when present, text otherwise.
    pub body: String,
    /// the original message bytes, present iff configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// A single extracted attachment.
///
/// Exactly one of `content`/`path` is populated, selected by the storage
/// mode in effect when the message was parsed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    /// filename from the disposition parameters, or `attachment_<n>`.
    pub filename: String,
    /// media type only, parameters stripped.
    pub content_type: String,
    /// size in bytes of the decoded payload.
    pub size: u64,
    /// base64 of the decoded bytes (memory mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// absolute path of the decoded bytes on disk (tempfile mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Record produced for each accepted message, serialized once and handed
/// to the worker executor. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmailEvent {
    /// event kind tag.
    pub event: EventKind,
    /// identifier of the server that accepted the connection.
    pub server: String,
    /// session id, minted when the connection was accepted.
    pub uuid: String,
    /// client socket address, `ip:port`.
    pub remote_addr: String,
    /// instant the message was accepted, RFC 3339.
    pub received_at: chrono::DateTime<chrono::Utc>,
    /// the SMTP envelope at data-finalization.
    pub envelope: Envelop,
    /// captured credentials, absent when the client never issued AUTH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    /// parsed message content.
    pub message: Message,
    /// extracted attachments, an empty list when there are none.
    pub attachments: Vec<Attachment>,
}
