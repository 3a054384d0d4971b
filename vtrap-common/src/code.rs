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

// see https://datatracker.ietf.org/doc/html/rfc5321#section-4.2

/// SMTP reply sent to the client, one variant per reply the gateway emits.
///
/// Replies embedding the server hostname carry a `{domain}` placeholder,
/// substituted at send time from the configuration.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, strum::EnumIter)]
pub enum SMTPReplyCode {
    /// help message
    Code214,
    /// service ready
    Code220,
    /// service closing transmission channel
    Code221,
    /// authentication succeeded (as a capture, every attempt does)
    AuthenticationSucceeded,
    /// requested mail action okay, completed
    Code250,
    /// ehlo message
    Code250Esmtp,
    /// start mail input
    Code354,
    /// service not available, closing transmission channel
    Code421,
    /// requested action aborted: local error in processing
    Code451,
    /// client timed out between two commands
    Code451Timeout,
    /// requested action not taken: too many recipients
    Code452TooManyRecipients,
    /// syntax error, command unrecognized
    Code500,
    /// syntax error in parameters or arguments
    Code501,
    /// command not implemented
    Code502unimplemented,
    /// bad sequence of commands
    Code503,
    /// command parameter is not implemented
    Code504,
    /// requested mail action aborted: exceeded storage allocation
    Code552,
    /// transaction has failed
    Code554,
}

impl SMTPReplyCode {
    /// folded reply line(s), CRLF terminated.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code214 => "214 joining us https://viridit.com/support\r\n",
            Self::Code220 => "220 {domain} Service ready\r\n",
            Self::Code221 => "221 Service closing transmission channel\r\n",
            Self::AuthenticationSucceeded => "235 2.7.0 Authentication succeeded\r\n",
            Self::Code250 => "250 Ok\r\n",
            Self::Code250Esmtp => "250-{domain}\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            Self::Code354 => "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            Self::Code421 => "421 Service closing connection\r\n",
            Self::Code451 => "451 Temporary failure\r\n",
            Self::Code451Timeout => "451 Timeout - closing connection\r\n",
            Self::Code452TooManyRecipients => "452 Too many recipients\r\n",
            Self::Code500 => "500 Syntax error command unrecognized\r\n",
            Self::Code501 => "501 Syntax error in parameters or arguments\r\n",
            Self::Code502unimplemented => "502 Command not implemented\r\n",
            Self::Code503 => "503 Bad sequence of commands\r\n",
            Self::Code504 => "504 Command parameter not implemented\r\n",
            Self::Code552 => "552 Message too large\r\n",
            Self::Code554 => "554 Failed to parse message\r\n",
        }
    }

    /// is the reply a 4yz or 5yz negative completion.
    #[must_use]
    pub const fn is_error(self) -> bool {
        match self {
            Self::Code214
            | Self::Code220
            | Self::Code221
            | Self::AuthenticationSucceeded
            | Self::Code250
            | Self::Code250Esmtp
            | Self::Code354 => false,
            Self::Code421
            | Self::Code451
            | Self::Code451Timeout
            | Self::Code452TooManyRecipients
            | Self::Code500
            | Self::Code501
            | Self::Code502unimplemented
            | Self::Code503
            | Self::Code504
            | Self::Code552
            | Self::Code554 => true,
        }
    }
}
