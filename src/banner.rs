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

use crate::cli::Options;

pub fn print(options: &Options) {
    let ascii_name = r#"
     _             _
    | | ___   __ _| |_ __ _ _ __
    | |/ _ \ / _` | __/ _` | '_ \
    | | (_) | (_| | || (_| | |_) |
    |_|\___/ \__, |\__\__,_| .__/
             |___/         |_|
    "#;

    eprint!("{ascii_name}");
    eprintln!(
        "
    Version:            \"v{}\"
    OTLP/HTTP:          \"{}:{}\" (POST /v1/logs)
    OTLP/gRPC:          \"{}:{}\"
    Viewer:             \"{}:{}\" (GET /view/ws)
    Queue capacity:     \"{}\"
    ",
        env!("CARGO_PKG_VERSION"),
        options.address,
        options.otlp_http_port,
        options.address,
        options.otlp_grpc_port,
        options.address,
        options.viewer_port,
        options.queue_capacity,
    );
}
