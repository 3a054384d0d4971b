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
//! boilerplate for the tests

use crate::{
    dispatch::{Dispatcher, WorkerExecutor},
    pool::{BufferPool, PayloadPool},
    receiver::{handle_connection, Connection},
    registry::SessionRegistry,
    server::Handles,
};
use vtrap_common::{
    event::{EmailEvent, Envelop, EventKind, Message},
    payload::{Payload, FLAG_STREAM},
};
use vtrap_config::Config;

/// session id used by every mocked connection.
pub const TEST_SESSION_ID: &str = "bb6bb601-c166-4f97-9b29-f86e3d269f45";

/// A type implementing AsyncRead+AsyncWrite to emulate sockets
pub struct Mock<'a> {
    read_cursor: std::io::Cursor<Vec<u8>>,
    write_cursor: std::io::Cursor<&'a mut Vec<u8>>,
}

impl<'a> Mock<'a> {
    /// Create a new instance
    pub fn new(read: Vec<u8>, write: &'a mut Vec<u8>) -> Self {
        Self {
            read_cursor: std::io::Cursor::new(read),
            write_cursor: std::io::Cursor::new(write),
        }
    }
}

impl tokio::io::AsyncRead for Mock<'_> {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let mut chunk = vec![0; buf.remaining()];
        let read = std::io::Read::read(&mut this.read_cursor, &mut chunk)?;
        buf.put_slice(&chunk[..read]);
        std::task::Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for Mock<'_> {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<Result<usize, std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::write(&mut self.get_mut().write_cursor, buf))
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::flush(&mut self.get_mut().write_cursor))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}

/// Scriptable worker executor recording every event it receives.
pub struct TestExecutor {
    reply: Vec<u8>,
    flags: u8,
    delay: std::time::Duration,
    fail: bool,
    /// events decoded from the request metadata slot, in receipt order.
    pub events: std::sync::Mutex<Vec<EmailEvent>>,
}

impl TestExecutor {
    /// replies with the given metadata bytes.
    pub fn replying(reply: &[u8]) -> Self {
        Self {
            reply: reply.to_vec(),
            flags: 0,
            delay: std::time::Duration::ZERO,
            fail: false,
            events: std::sync::Mutex::new(vec![]),
        }
    }

    /// always `CONTINUE`.
    pub fn continuing() -> Self {
        Self::replying(b"CONTINUE")
    }

    /// always `CLOSE`.
    pub fn closing() -> Self {
        Self::replying(b"CLOSE")
    }

    /// replies with bytes that are not a verdict.
    pub fn garbage() -> Self {
        Self::replying(b"HTTP/1.1 200 OK")
    }

    /// fails every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::continuing()
        }
    }

    /// replies with a stream-flagged envelope.
    pub fn streaming() -> Self {
        Self {
            flags: FLAG_STREAM,
            ..Self::continuing()
        }
    }

    /// sleeps before replying `CONTINUE`.
    pub fn delayed(delay: std::time::Duration) -> Self {
        Self {
            delay,
            ..Self::continuing()
        }
    }
}

#[async_trait::async_trait]
impl WorkerExecutor for TestExecutor {
    async fn exec(&self, request: &Payload) -> anyhow::Result<Payload> {
        let event = serde_json::from_slice::<EmailEvent>(&request.context)?;
        self.events.lock().unwrap().push(event);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            anyhow::bail!("worker exploded");
        }

        Ok(Payload {
            context: self.reply.clone(),
            body: vec![],
            flags: self.flags,
        })
    }
}

/// capability set around a test executor.
pub fn test_handles(executor: std::sync::Arc<dyn WorkerExecutor>) -> Handles {
    Handles {
        dispatcher: std::sync::Arc::new(Dispatcher::new(
            executor,
            std::sync::Arc::new(PayloadPool::default()),
        )),
        buffers: std::sync::Arc::new(BufferPool::default()),
        registry: std::sync::Arc::new(SessionRegistry::default()),
    }
}

/// a complete event, for dispatcher-level tests.
pub fn sample_event() -> EmailEvent {
    EmailEvent {
        event: EventKind::EmailReceived,
        server: "default".to_string(),
        uuid: TEST_SESSION_ID.to_string(),
        remote_addr: "127.0.0.1:53844".to_string(),
        received_at: chrono_now(),
        envelope: Envelop {
            from: "<a@b>".to_string(),
            to: vec!["<c@d>".to_string()],
            helo: "x".to_string(),
        },
        authentication: None,
        message: Message {
            headers: std::collections::BTreeMap::new(),
            body: "hello\r\n".to_string(),
            raw: None,
        },
        attachments: vec![],
    }
}

fn chrono_now() -> vtrap_common::re::chrono::DateTime<vtrap_common::re::chrono::Utc> {
    vtrap_common::re::chrono::Utc::now()
}

/// run a connection over scripted client input and assert the bytes the
/// server wrote back.
///
/// # Errors
///
/// * the outcome of [`handle_connection`]
pub async fn test_receiver_inner(
    smtp_input: &[u8],
    expected_output: &[u8],
    config: Config,
    handles: &Handles,
) -> anyhow::Result<()> {
    let mut written_data = Vec::new();
    let result = {
        let mock = Mock::new(smtp_input.to_vec(), &mut written_data);
        let mut conn = Connection::new(
            TEST_SESSION_ID.to_string(),
            "127.0.0.1:53844".parse().unwrap(),
            std::sync::Arc::new(config),
            mock,
        );
        handle_connection(&mut conn, handles).await
    };

    pretty_assertions::assert_eq!(
        std::str::from_utf8(expected_output).unwrap(),
        std::str::from_utf8(&written_data).unwrap(),
    );

    result
}

/// Call [`test_receiver_inner`]
#[macro_export]
macro_rules! test_receiver {
    ($input:expr, $output:expr) => {
        test_receiver! {
            with_handles => $crate::test_helpers::test_handles(std::sync::Arc::new(
                $crate::test_helpers::TestExecutor::continuing()
            )),
            $input,
            $output
        }
    };
    (with_handles => $handles:expr, $input:expr, $output:expr) => {
        test_receiver! {
            with_config => vtrap_config::Config::local_test(),
            with_handles => $handles,
            $input,
            $output
        }
    };
    (with_config => $config:expr, $input:expr, $output:expr) => {
        test_receiver! {
            with_config => $config,
            with_handles => $crate::test_helpers::test_handles(std::sync::Arc::new(
                $crate::test_helpers::TestExecutor::continuing()
            )),
            $input,
            $output
        }
    };
    (with_config => $config:expr, with_handles => $handles:expr, $input:expr, $output:expr) => {
        $crate::test_helpers::test_receiver_inner(
            $input.as_bytes(),
            $output.as_bytes(),
            $config,
            &$handles,
        )
        .await
    };
}
