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
use crate::pool::PayloadPool;
use vtrap_common::{event::EmailEvent, payload::Payload, Verdict};
use vtrap_config::log_channel::DISPATCH;

/// upper bound on one worker round-trip, submission to reply.
pub const DISPATCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Executes one request envelope against the worker pool. Supplied by the
/// external pool collaborator, treated as concurrent-safe.
#[async_trait::async_trait]
pub trait WorkerExecutor: Send + Sync {
    /// submit a request envelope, wait for the reply envelope.
    async fn exec(&self, request: &Payload) -> anyhow::Result<Payload>;
}

/// Why a dispatch did not produce a verdict.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// the event could not be serialized.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// the worker executor failed.
    #[error("worker execution failed: {0}")]
    Executor(#[source] anyhow::Error),

    /// no reply within the dispatch timeout.
    #[error("worker did not reply within {0:?}")]
    Timeout(std::time::Duration),

    /// the worker replied with a stream fragment.
    #[error("streaming is not supported")]
    Streaming,
}

/// Serializes events, submits them to the worker executor and maps the
/// reply bytes to a [`Verdict`]. Safe to invoke from any session; replies
/// are ordered by the worker, not per connection.
pub struct Dispatcher {
    executor: std::sync::Arc<dyn WorkerExecutor>,
    payloads: std::sync::Arc<PayloadPool>,
    timeout: std::time::Duration,
}

impl Dispatcher {
    /// dispatcher with the default 30 second round-trip bound.
    #[must_use]
    pub fn new(
        executor: std::sync::Arc<dyn WorkerExecutor>,
        payloads: std::sync::Arc<PayloadPool>,
    ) -> Self {
        Self::with_timeout(executor, payloads, DISPATCH_TIMEOUT)
    }

    /// dispatcher with an explicit round-trip bound.
    #[must_use]
    pub fn with_timeout(
        executor: std::sync::Arc<dyn WorkerExecutor>,
        payloads: std::sync::Arc<PayloadPool>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            executor,
            payloads,
            timeout,
        }
    }

    /// Submit one event, interpret the reply.
    ///
    /// Anything but the exact `CONTINUE`/`CLOSE` literals in the reply
    /// metadata keeps the connection open, with a warning.
    ///
    /// # Errors
    ///
    /// * the event does not serialize
    /// * the executor fails or times out
    /// * the reply is stream-flagged
    pub async fn dispatch(&self, event: &EmailEvent) -> Result<Verdict, DispatchError> {
        let mut request = self.payloads.get();
        // the event goes in the metadata slot, the body slot stays empty.
        serde_json::to_writer(&mut request.context, event)?;

        let result = tokio::time::timeout(self.timeout, self.executor.exec(&request)).await;
        self.payloads.put(request);

        let reply = result
            .map_err(|_| DispatchError::Timeout(self.timeout))?
            .map_err(DispatchError::Executor)?;

        if reply.is_stream() {
            return Err(DispatchError::Streaming);
        }

        let verdict = Verdict::from_reply(&reply.context).unwrap_or_else(|| {
            log::warn!(
                target: DISPATCH,
                "{{ uuid: {} }} unexpected worker reply '{}', connection continues",
                event.uuid,
                String::from_utf8_lossy(&reply.context)
            );
            Verdict::Continue
        });

        self.payloads.put(reply);
        Ok(verdict)
    }
}
