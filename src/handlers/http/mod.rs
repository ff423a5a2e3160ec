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

use actix_cors::Cors;
use actix_web::web;

pub mod health_check;
pub mod ingest;
pub mod viewer;

pub const MAX_EVENT_PAYLOAD_SIZE: usize = 10485760;

pub fn cross_origin_config(permissive: bool) -> Cors {
    if permissive || cfg!(debug_assertions) {
        Cors::permissive().block_on_origin_mismatch(false)
    } else {
        Cors::default().block_on_origin_mismatch(false)
    }
}

/// Routes for the OTLP receiver listener.
pub fn configure_receiver(config: &mut web::ServiceConfig) {
    config
        .app_data(web::PayloadConfig::new(MAX_EVENT_PAYLOAD_SIZE))
        .route("/v1/logs", web::post().to(ingest::ingest))
        .route("/", web::get().to(health_check::liveness));
}

/// Routes for the viewer listener.
pub fn configure_viewer(config: &mut web::ServiceConfig) {
    config
        .route("/", web::get().to(viewer::status))
        .route("/view/ws", web::get().to(viewer::websocket));
}
