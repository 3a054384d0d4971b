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

/// One parsed client command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO <domain>
    Helo(String),
    /// EHLO <domain>
    Ehlo(String),
    /// AUTH <mechanism> [initial-response]
    Auth {
        /// mechanism keyword as sent.
        mechanism: String,
        /// optional initial response, still base64.
        initial_response: Option<String>,
    },
    /// MAIL FROM:<reverse-path>, path kept as sent.
    MailFrom(String),
    /// RCPT TO:<forward-path>, path kept as sent.
    RcptTo(String),
    /// DATA
    Data,
    /// RSET
    Rset,
    /// NOOP
    Noop,
    /// QUIT
    Quit,
    /// HELP
    Help,
    /// VRFY (unimplemented on purpose)
    Vrfy,
    /// EXPN (unimplemented on purpose)
    Expn,
}

impl Command {
    /// Parse one command line, already stripped of its CRLF.
    ///
    /// # Errors
    ///
    /// * the reply code to send for an unknown verb or ill-formed argument
    pub fn parse(line: &str) -> Result<Self, SMTPReplyCode> {
        let trimmed = line.trim_end();
        let (verb, args) = match trimmed.find(' ') {
            Some(at) => (&trimmed[..at], trimmed[at + 1..].trim()),
            None => (trimmed, ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "HELO" => match args {
                "" => Err(SMTPReplyCode::Code501),
                domain => Ok(Self::Helo(domain.to_string())),
            },
            "EHLO" => match args {
                "" => Err(SMTPReplyCode::Code501),
                domain => Ok(Self::Ehlo(domain.to_string())),
            },
            "AUTH" => {
                let mut words = args.split_whitespace();
                match words.next() {
                    Some(mechanism) => Ok(Self::Auth {
                        mechanism: mechanism.to_string(),
                        initial_response: words.next().map(str::to_string),
                    }),
                    None => Err(SMTPReplyCode::Code501),
                }
            }
            "MAIL" => parse_path(args, "FROM:", true).map(Self::MailFrom),
            "RCPT" => parse_path(args, "TO:", false).map(Self::RcptTo),
            "DATA" => match args {
                "" => Ok(Self::Data),
                _ => Err(SMTPReplyCode::Code501),
            },
            "RSET" => Ok(Self::Rset),
            "NOOP" => Ok(Self::Noop),
            "QUIT" => Ok(Self::Quit),
            "HELP" => Ok(Self::Help),
            "VRFY" => Ok(Self::Vrfy),
            "EXPN" => Ok(Self::Expn),
            "STARTTLS" => Err(SMTPReplyCode::Code502unimplemented),
            _ => Err(SMTPReplyCode::Code500),
        }
    }
}

/// Extract the `<path>` of a `FROM:`/`TO:` argument, ESMTP parameters
/// discarded. The path keeps its angle brackets; only MAIL FROM accepts
/// the empty reverse-path `<>`.
fn parse_path(
    args: &str,
    prefix: &str,
    allow_empty: bool,
) -> Result<String, SMTPReplyCode> {
    if args.len() < prefix.len() || !args[..prefix.len()].eq_ignore_ascii_case(prefix) {
        return Err(SMTPReplyCode::Code501);
    }

    let path = args[prefix.len()..]
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or("");

    if !path.starts_with('<') || !path.ends_with('>') || path.len() < 2 {
        return Err(SMTPReplyCode::Code501);
    }
    if path == "<>" && !allow_empty {
        return Err(SMTPReplyCode::Code501);
    }

    Ok(path.to_string())
}
