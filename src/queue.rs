/*
 * Logtap (C) 2025 - 2026 Logtap contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::entry::LogEntry;
use crate::LOCK_EXPECT;

/// Fixed-capacity FIFO buffer between the ingest handlers and the broadcast
/// loop.
///
/// Any number of producers append concurrently; a single consumer drains.
/// Appending to a full queue evicts the oldest entry, so the length never
/// exceeds the capacity and ingestion never fails or blocks on slow
/// viewers. One mutex guards both sides; it is only ever held for the queue
/// operation itself, never across normalization or I/O.
pub struct LogQueue {
    capacity: usize,
    inner: Mutex<VecDeque<LogEntry>>,
}

impl LogQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends an entry, evicting the oldest one first when full. Cannot
    /// fail; overflow is silent by contract.
    pub fn append(&self, entry: LogEntry) {
        let mut queue = self.inner.lock().expect(LOCK_EXPECT);
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(entry);
    }

    /// Removes and returns the oldest entry.
    pub fn pop(&self) -> Option<LogEntry> {
        self.inner.lock().expect(LOCK_EXPECT).pop_front()
    }

    /// Empties the queue, returning everything in append order.
    pub fn drain_all(&self) -> Vec<LogEntry> {
        self.inner.lock().expect(LOCK_EXPECT).drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect(LOCK_EXPECT).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
