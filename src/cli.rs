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

use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "logtap",
    bin_name = "logtap",
    about = "Live OTLP log viewer server",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Options {
    #[arg(
        long,
        env = "LOGTAP_ADDR",
        default_value = "0.0.0.0",
        help = "Address to bind all listeners on"
    )]
    pub address: String,

    // OTLP clients default to 4318 for http and 4317 for grpc
    #[arg(
        long,
        env = "LOGTAP_OTLP_HTTP_PORT",
        default_value = "4318",
        help = "Port for the OTLP/HTTP log receiver"
    )]
    pub otlp_http_port: u16,

    #[arg(
        long,
        env = "LOGTAP_OTLP_GRPC_PORT",
        default_value = "4317",
        help = "Port for the OTLP/gRPC log receiver"
    )]
    pub otlp_grpc_port: u16,

    #[arg(
        long,
        env = "LOGTAP_VIEWER_PORT",
        default_value = "8000",
        help = "Port for the viewer WebSocket server"
    )]
    pub viewer_port: u16,

    #[arg(
        long,
        env = "LOGTAP_QUEUE_CAPACITY",
        default_value = "1000",
        help = "Entries buffered between ingestion and broadcast; oldest are dropped beyond this"
    )]
    pub queue_capacity: usize,

    #[arg(
        long,
        env = "LOGTAP_DRAIN_BACKOFF_MS",
        default_value = "100",
        help = "Sleep between polls of an empty queue, in milliseconds"
    )]
    pub drain_backoff_ms: u64,

    #[arg(
        long,
        env = "LOGTAP_SEND_TIMEOUT_SECS",
        default_value = "3",
        help = "Per-viewer delivery timeout before the connection is dropped, in seconds"
    )]
    pub send_timeout_secs: u64,

    #[arg(
        long,
        env = "LOGTAP_CORS",
        default_value = "true",
        help = "Enable permissive CORS on all listeners"
    )]
    pub cors: bool,
}

impl Options {
    pub fn drain_backoff(&self) -> Duration {
        Duration::from_millis(self.drain_backoff_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}
