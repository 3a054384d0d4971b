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
use vtrap_common::payload::Payload;

/// free-list ceiling, anything returned above it is dropped.
const MAX_POOLED: usize = 64;

const BUFFER_CAPACITY: usize = 8 * 1024;

/// Process-wide recycling of DATA accumulation buffers.
///
/// Returned buffers are cleared, their capacity is kept: no data leaks
/// across sessions and the allocation survives.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: std::sync::Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// take a buffer out of the pool, allocating when the pool is dry.
    pub fn get(&self) -> Vec<u8> {
        self.free
            .lock()
            .expect("buffer pool lock poisoned")
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUFFER_CAPACITY))
    }

    /// return a buffer, cleared.
    pub fn put(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut free = self.free.lock().expect("buffer pool lock poisoned");
        if free.len() < MAX_POOLED {
            free.push(buffer);
        }
    }
}

/// Process-wide recycling of worker request envelopes, zeroed on return.
#[derive(Debug, Default)]
pub struct PayloadPool {
    free: std::sync::Mutex<Vec<Payload>>,
}

impl PayloadPool {
    /// take an envelope out of the pool, allocating when the pool is dry.
    pub fn get(&self) -> Payload {
        self.free
            .lock()
            .expect("payload pool lock poisoned")
            .pop()
            .unwrap_or_default()
    }

    /// return an envelope, every field zeroed.
    pub fn put(&self, mut payload: Payload) {
        payload.reset();
        let mut free = self.free.lock().expect("payload pool lock poisoned");
        if free.len() < MAX_POOLED {
            free.push(payload);
        }
    }
}
