//! vTrap server
//!
//! Accepts inbound SMTP connections, drives each through the envelope
//! protocol, and dispatches one event per accepted message to the worker
//! executor.

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

mod cleanup;
mod dispatch;
mod pool;
mod receiver;
mod registry;
mod server;

pub use dispatch::{DispatchError, Dispatcher, WorkerExecutor, DISPATCH_TIMEOUT};
pub use pool::{BufferPool, PayloadPool};
pub use receiver::{handle_connection, Connection, State, Transaction};
pub use registry::{SessionInfo, SessionRegistry};
pub use server::{Handles, ServerVTrap};

#[cfg(test)]
pub mod test_helpers;
