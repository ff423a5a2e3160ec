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

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use logtap::banner;
use logtap::broadcast::run_consumer;
use logtap::cli::Options;
use logtap::handlers::grpc;
use logtap::handlers::http::{configure_receiver, configure_viewer, cross_origin_config};
use logtap::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logger(LevelFilter::INFO);

    let options = Options::parse();
    banner::print(&options);

    // the queue and the viewer registry are the only shared resources;
    // both live here and are passed down explicitly
    let state = AppState::new(&options);
    let data = web::Data::new(state.clone());
    let permissive_cors = options.cors;

    let receiver_data = data.clone();
    let otlp_http = HttpServer::new(move || {
        App::new()
            .wrap(cross_origin_config(permissive_cors))
            .app_data(receiver_data.clone())
            .configure(configure_receiver)
    })
    .bind((options.address.as_str(), options.otlp_http_port))?
    .run();

    let viewer_data = data.clone();
    let viewer = HttpServer::new(move || {
        App::new()
            .wrap(cross_origin_config(permissive_cors))
            .app_data(viewer_data.clone())
            .configure(configure_viewer)
    })
    .bind((options.address.as_str(), options.viewer_port))?
    .run();

    let grpc_addr: SocketAddr =
        format!("{}:{}", options.address, options.otlp_grpc_port).parse()?;
    let otlp_grpc = grpc::server(state.clone(), grpc_addr, permissive_cors);

    let consumer = run_consumer(
        Arc::clone(&state.queue),
        Arc::clone(&state.broadcaster),
        options.drain_backoff(),
    );

    info!("Ready!");

    tokio::try_join!(
        async { otlp_http.await.map_err(anyhow::Error::from) },
        async { viewer.await.map_err(anyhow::Error::from) },
        async { otlp_grpc.await.map_err(anyhow::Error::from) },
        async {
            consumer.await;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}

pub fn init_logger(default_level: LevelFilter) {
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let fmt_layer = fmt::layer()
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .compact();

    Registry::default()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
