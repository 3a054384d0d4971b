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

/// the reply is a stream fragment. Streaming workers are not supported by
/// the gateway and such replies are rejected.
pub const FLAG_STREAM: u8 = 0b0000_0001;

/// Request/reply envelope exchanged with the worker executor.
///
/// Requests carry the event JSON in the metadata (`context`) slot and leave
/// `body` empty. Replies carry the verdict bytes in `context`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Payload {
    /// metadata slot.
    pub context: Vec<u8>,
    /// body slot, unused by this gateway.
    pub body: Vec<u8>,
    /// envelope flags, see [`FLAG_STREAM`].
    pub flags: u8,
}

impl Payload {
    /// is the stream flag set on this envelope.
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        self.flags & FLAG_STREAM != 0
    }

    /// zero every field so the envelope can go back to its pool without
    /// leaking data across sessions. Lengths are cleared, capacity is kept.
    pub fn reset(&mut self) {
        self.context.clear();
        self.body.clear();
        self.flags = 0;
    }
}
