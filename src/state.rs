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

use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::cli::Options;
use crate::queue::LogQueue;

/// The two shared resources of the process: the ingest queue and the viewer
/// registry. Constructed once in `main` and handed to the transport
/// handlers and the consumer loop explicitly.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<LogQueue>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(options: &Options) -> Self {
        Self {
            queue: Arc::new(LogQueue::new(options.queue_capacity)),
            broadcaster: Arc::new(Broadcaster::new(options.send_timeout())),
        }
    }
}
