//! vTrap mail parser
//!
//! Turns the raw bytes accumulated during DATA plus the session metadata
//! into a structured [`vtrap_common::event::EmailEvent`], extracting
//! attachments according to the storage policy.

#![doc(html_no_source)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

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

mod encoding;
mod error;
mod headers;
mod mime_type;
mod multipart;
mod parser;

pub(crate) mod log_channels {
    pub const PARSER: &str = "parser";
}


pub use error::ParserError;
pub use parser::{MailMimeParser, ParseContext};
