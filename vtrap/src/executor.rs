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
use vtrap_common::{payload::Payload, Verdict};
use vtrap_server::WorkerExecutor;

/// Stand-alone terminal worker: logs every event it receives and keeps
/// the connection open. Used when the gateway runs without an external
/// worker pool.
pub struct LogExecutor;

#[async_trait::async_trait]
impl WorkerExecutor for LogExecutor {
    async fn exec(&self, request: &Payload) -> anyhow::Result<Payload> {
        log::info!(
            "email event: {}",
            String::from_utf8_lossy(&request.context)
        );

        Ok(Payload {
            context: Verdict::Continue.as_bytes().to_vec(),
            body: vec![],
            flags: 0,
        })
    }
}
