//! vTrap common definitions

#![doc(html_no_source)]
#![deny(missing_docs)]
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

/// authentication mechanisms and captured credentials.
pub mod auth;

/// SMTP reply codes sent to the client.
pub mod code;

/// the event record produced for each accepted message.
pub mod event;

/// request/reply envelope exchanged with the worker executor.
pub mod payload;

/// attachment storage policy.
pub mod storage;

/// decision returned by the worker after seeing an event.
pub mod verdict;

pub use code::SMTPReplyCode;
pub use storage::StorageMode;
pub use verdict::Verdict;

/// re-exported dependencies, avoiding a version divergence between crates.
pub mod re {
    pub use anyhow;
    pub use base64;
    pub use chrono;
    pub use log;
    pub use serde_json;
    pub use strum;
}
