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
use crate::test_helpers::{test_handles, TestExecutor};
use crate::{test_receiver, Dispatcher, PayloadPool};
use vtrap_common::auth::Mechanism;
use vtrap_config::Config;


const GREETING: &str = "220 localhost Service ready\r\n";

#[tokio::test]
async fn minimal_plain_email() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "Subject: hi\r\n",
            "\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.envelope.from, "<a@b>");
    assert_eq!(event.envelope.to, vec!["<c@d>".to_string()]);
    assert_eq!(event.envelope.helo, "x");
    assert_eq!(event.message.body, "hello\r\n");
    assert_eq!(event.message.headers.get("Subject").unwrap(), "hi");
    assert!(event.attachments.is_empty());
    assert!(event.authentication.is_none());
    assert_eq!(event.server, "default");
    assert_eq!(event.remote_addr, "127.0.0.1:53844");
}

#[tokio::test]
async fn ehlo_advertises_auth_and_8bitmime() {
    let _ = test_receiver! {
        ["EHLO x\r\n", "QUIT\r\n"].concat(),
        [
            GREETING,
            "250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn recipient_overflow_keeps_the_first_recipients() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let mut config = Config::local_test();
    config.server.max_recipients = 2;

    let _ = test_receiver! {
        with_config => config,
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<one@d>\r\n",
            "RCPT TO:<two@d>\r\n",
            "RCPT TO:<three@d>\r\n",
            "DATA\r\n",
            "Subject: hi\r\n",
            "\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "452 Too many recipients\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    assert_eq!(
        events[0].envelope.to,
        vec!["<one@d>".to_string(), "<two@d>".to_string()]
    );
}

#[tokio::test]
async fn commands_out_of_sequence() {
    let _ = test_receiver! {
        [
            "MAIL FROM:<a@b>\r\n",  // before HELO
            "HELO x\r\n",
            "RCPT TO:<c@d>\r\n",    // before MAIL FROM
            "DATA\r\n",             // before RCPT TO
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "503 Bad sequence of commands\r\n",
            "250 Ok\r\n",
            "503 Bad sequence of commands\r\n",
            "503 Bad sequence of commands\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn unknown_command_and_noop() {
    let _ = test_receiver! {
        ["FOO\r\n", "NOOP\r\n", "QUIT\r\n"].concat(),
        [
            GREETING,
            "500 Syntax error command unrecognized\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn rset_clears_envelope_and_auth() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "EHLO x\r\n",
            "AUTH PLAIN AHVzZXIAcHc=\r\n",
            "MAIL FROM:<old@b>\r\n",
            "RCPT TO:<old@d>\r\n",
            "RSET\r\n",
            "MAIL FROM:<new@b>\r\n",
            "RCPT TO:<new@d>\r\n",
            "DATA\r\n",
            "Subject: hi\r\n",
            "\r\n",
            "fresh\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            "235 2.7.0 Authentication succeeded\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    // the capture was zeroed by RSET: no auth record on the event.
    assert!(events[0].authentication.is_none());
    assert_eq!(events[0].envelope.from, "<new@b>");
    assert_eq!(events[0].envelope.to, vec!["<new@d>".to_string()]);
}

#[tokio::test]
async fn a_second_transaction_reuses_the_connection() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<first@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "one\r\n",
            ".\r\n",
            "MAIL FROM:<second@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "two\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].envelope.from, "<first@b>");
    assert_eq!(events[1].envelope.from, "<second@b>");
    // both events belong to the same session.
    assert_eq!(events[0].uuid, events[1].uuid);
}

#[tokio::test]
async fn worker_timeout_leaves_the_session_usable() {
    let executor = std::sync::Arc::new(TestExecutor::delayed(
        std::time::Duration::from_millis(500),
    ));
    let mut handles = test_handles(executor.clone());
    handles.dispatcher = std::sync::Arc::new(Dispatcher::with_timeout(
        executor.clone(),
        std::sync::Arc::new(PayloadPool::default()),
        std::time::Duration::from_millis(50),
    ));

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "NOOP\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "451 Temporary failure\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn worker_failure_is_a_temporary_error() {
    let handles = test_handles(std::sync::Arc::new(TestExecutor::failing()));

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "451 Temporary failure\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn unknown_worker_reply_continues() {
    let executor = std::sync::Arc::new(TestExecutor::garbage());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn worker_close_verdict_answers_421() {
    let executor = std::sync::Arc::new(TestExecutor::closing());
    let handles = test_handles(executor.clone());

    // anything after the 421 is never processed.
    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "MAIL FROM:<ignored@b>\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "421 Service closing connection\r\n",
        ]
        .concat()
    }
    .unwrap();

    assert_eq!(executor.events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn helo_aborts_the_running_transaction() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "HELO x\r\n",
            "MAIL FROM:<dropped@b>\r\n",
            "HELO y\r\n",
            "MAIL FROM:<kept@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    assert_eq!(events[0].envelope.helo, "y");
    assert_eq!(events[0].envelope.from, "<kept@b>");
}

#[tokio::test]
async fn unknown_auth_mechanism_is_rejected() {
    let _ = test_receiver! {
        ["EHLO x\r\n", "AUTH GSSAPI\r\n", "QUIT\r\n"].concat(),
        [
            GREETING,
            "250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            "504 Command parameter not implemented\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();
}

#[tokio::test]
async fn auth_plain_capture() {
    let executor = std::sync::Arc::new(TestExecutor::continuing());
    let handles = test_handles(executor.clone());

    let _ = test_receiver! {
        with_handles => handles,
        [
            "EHLO x\r\n",
            // base64("\0user\0pw")
            "AUTH PLAIN AHVzZXIAcHc=\r\n",
            "MAIL FROM:<a@b>\r\n",
            "RCPT TO:<c@d>\r\n",
            "DATA\r\n",
            "hello\r\n",
            ".\r\n",
            "QUIT\r\n",
        ]
        .concat(),
        [
            GREETING,
            "250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            "235 2.7.0 Authentication succeeded\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 Ok\r\n",
            "221 Service closing transmission channel\r\n",
        ]
        .concat()
    }
    .unwrap();

    let events = executor.events.lock().unwrap();
    let authentication = events[0].authentication.as_ref().unwrap();
    assert!(authentication.attempted);
    assert_eq!(authentication.mechanism, Mechanism::Plain);
    assert_eq!(authentication.username, "user");
    assert_eq!(authentication.password, "pw");
}
