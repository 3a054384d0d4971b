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
    encoding::decode_transfer,
    error::ParserError,
    headers,
    mime_type::{parse_media_type, MediaType},
    multipart,
};
use crate::log_channels::PARSER;
use vtrap_common::{
    event::{Attachment, EmailEvent, Envelop, EventKind, Message},
    re::log,
    StorageMode,
};

/// Session metadata the parser folds into the event.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// session id, also embedded in temp-file names.
    pub uuid: String,
    /// identifier of the accepting server.
    pub server: String,
    /// client socket address.
    pub remote_addr: String,
    /// envelope at data-finalization.
    pub envelop: Envelop,
    /// captured credentials, when the client authenticated.
    pub authentication: Option<vtrap_common::event::Authentication>,
    /// carry the original bytes in the event.
    pub include_raw: bool,
    /// attachment storage policy.
    pub storage: StorageMode,
    /// directory receiving decoded attachments (tempfile mode).
    pub temp_dir: std::path::PathBuf,
}

/// Parser turning raw RFC 5322 bytes into an [`EmailEvent`].
#[derive(Debug, Default)]
pub struct MailMimeParser;

impl MailMimeParser {
    /// Produce the event for one accepted message.
    ///
    /// # Errors
    ///
    /// * the top-level header section is malformed
    /// * a multipart media type has no boundary parameter
    pub fn parse(&self, raw: &[u8], ctx: &ParseContext) -> Result<EmailEvent, ParserError> {
        let (fields, body) = headers::split_message(raw)?;

        let mut event = EmailEvent {
            event: EventKind::EmailReceived,
            server: ctx.server.clone(),
            uuid: ctx.uuid.clone(),
            remote_addr: ctx.remote_addr.clone(),
            received_at: chrono::Utc::now(),
            envelope: ctx.envelop.clone(),
            authentication: ctx.authentication.clone(),
            message: Message {
                headers: headers::collapse(&fields),
                body: String::new(),
                raw: ctx
                    .include_raw
                    .then(|| String::from_utf8_lossy(raw).into_owned()),
            },
            attachments: vec![],
        };

        let content_type = match headers::get(&fields, "Content-Type") {
            // no Content-Type: the remainder of the stream is the body.
            None => {
                event.message.body = String::from_utf8_lossy(body).into_owned();
                return Ok(event);
            }
            Some(value) => value,
        };

        let media_type = match parse_media_type(content_type) {
            Ok(media_type) => media_type,
            Err(error) => {
                log::warn!(
                    target: PARSER,
                    "{{ uuid: {} }} failed to parse Content-Type, treating as plain text: {}",
                    ctx.uuid,
                    error
                );
                event.message.body = String::from_utf8_lossy(body).into_owned();
                return Ok(event);
            }
        };

        if media_type.essence.starts_with("multipart/") {
            let boundary = media_type
                .param("boundary")
                .ok_or(ParserError::MissingBoundary)?;

            self.read_parts(body, boundary, ctx, &mut event);
        } else {
            let encoding = headers::get(&fields, "Content-Transfer-Encoding").unwrap_or("");
            let decoded = decode_transfer(body, encoding).unwrap_or_else(|error| {
                log::warn!(
                    target: PARSER,
                    "{{ uuid: {} }} failed to decode body, using raw: {}",
                    ctx.uuid,
                    error
                );
                body.to_vec()
            });
            event.message.body = String::from_utf8_lossy(&decoded).into_owned();
        }

        Ok(event)
    }

    /// Walk the parts sequentially, routing each to the body slots or the
    /// attachment list. A part that cannot be read is skipped with a
    /// warning; the parse still succeeds.
    fn read_parts(&self, body: &[u8], boundary: &str, ctx: &ParseContext, event: &mut EmailEvent) {
        let mut text_body = String::new();
        let mut html_body = String::new();

        for part in multipart::split(body, boundary) {
            let (fields, content) = match headers::split_message(part) {
                Ok(split) => split,
                Err(error) => {
                    log::warn!(
                        target: PARSER,
                        "{{ uuid: {} }} failed to read multipart section, skipping: {}",
                        ctx.uuid,
                        error
                    );
                    continue;
                }
            };

            let part_type = headers::get(&fields, "Content-Type")
                .and_then(|value| parse_media_type(value).ok())
                .unwrap_or_default();

            let disposition_value = headers::get(&fields, "Content-Disposition").unwrap_or("");
            let disposition = parse_media_type(disposition_value).unwrap_or_default();
            let filename = disposition.param("filename");

            let is_attachment = disposition.essence.starts_with("attachment")
                || (filename.is_some()
                    && part_type.essence != "text/plain"
                    && part_type.essence != "text/html");

            let encoding = headers::get(&fields, "Content-Transfer-Encoding").unwrap_or("");
            let decoded = decode_transfer(content, encoding).unwrap_or_else(|error| {
                log::warn!(
                    target: PARSER,
                    "{{ uuid: {} }} failed to decode part content, using raw: {}",
                    ctx.uuid,
                    error
                );
                content.to_vec()
            });

            if is_attachment {
                let filename = filename.map_or_else(
                    || format!("attachment_{}", event.attachments.len() + 1),
                    str::to_string,
                );

                match self.store_attachment(&decoded, &filename, &part_type, ctx) {
                    Ok(attachment) => event.attachments.push(attachment),
                    Err(error) => {
                        log::warn!(
                            target: PARSER,
                            "{{ uuid: {} }} failed to extract attachment '{}', skipping: {}",
                            ctx.uuid,
                            filename,
                            error
                        );
                    }
                }
            } else {
                match part_type.essence.as_str() {
                    "text/plain" => text_body = String::from_utf8_lossy(&decoded).into_owned(),
                    "text/html" => html_body = String::from_utf8_lossy(&decoded).into_owned(),
                    _ => {}
                }
            }
        }

        // exactly one rendering is selected, html wins when both exist.
        event.message.body = if html_body.is_empty() {
            text_body
        } else {
            html_body
        };
    }

    fn store_attachment(
        &self,
        decoded: &[u8],
        filename: &str,
        part_type: &MediaType,
        ctx: &ParseContext,
    ) -> anyhow::Result<Attachment> {
        let mut attachment = Attachment {
            filename: filename.to_string(),
            content_type: part_type.essence.clone(),
            size: decoded.len() as u64,
            content: None,
            path: None,
        };

        match ctx.storage {
            StorageMode::Memory => {
                attachment.content = Some(base64::encode(decoded));
            }
            StorageMode::Tempfile => {
                let mut builder = std::fs::DirBuilder::new();
                builder.recursive(true);
                std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o755);
                builder.create(&ctx.temp_dir)?;

                let dir = std::fs::canonicalize(&ctx.temp_dir)?;
                let basename = std::path::Path::new(filename).file_name().map_or_else(
                    || "attachment".to_string(),
                    |name| name.to_string_lossy().into_owned(),
                );
                let filepath = dir.join(format!(
                    "{}_{}_{}",
                    ctx.uuid,
                    uuid::Uuid::new_v4(),
                    basename
                ));

                let mut file = std::fs::OpenOptions::new();
                file.write(true).create_new(true);
                std::os::unix::fs::OpenOptionsExt::mode(&mut file, 0o644);
                let mut file = file.open(&filepath)?;
                std::io::Write::write_all(&mut file, decoded)?;

                attachment.path = Some(filepath.to_string_lossy().into_owned());
            }
        }

        Ok(attachment)
    }
}
