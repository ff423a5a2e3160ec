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

use futures_util::Future;
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_server::{
    LogsService, LogsServiceServer,
};
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tonic_web::GrpcWebLayer;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::otel::logs::ingest_resource_logs;
use crate::state::AppState;

pub struct LogsReceiver {
    state: AppState,
}

#[tonic::async_trait]
impl LogsService for LogsReceiver {
    /// OTLP/gRPC log export. The response is always the empty success
    /// message; records that cannot be normalized are dropped inside the
    /// batch walk.
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let request = request.into_inner();
        debug!(
            "otlp/grpc export with {} resource logs",
            request.resource_logs.len()
        );
        ingest_resource_logs(&request.resource_logs, &self.state.queue);
        Ok(Response::new(ExportLogsServiceResponse::default()))
    }
}

pub fn server(
    state: AppState,
    addr: SocketAddr,
    permissive_cors: bool,
) -> impl Future<Output = Result<(), tonic::transport::Error>> {
    let cors = if permissive_cors {
        CorsLayer::very_permissive().allow_credentials(true)
    } else {
        CorsLayer::new()
    };

    let svc = LogsServiceServer::new(LogsReceiver { state });

    // accept_http1 + grpc-web so browser-side exporters can reach us too
    Server::builder()
        .accept_http1(true)
        .layer(cors)
        .layer(GrpcWebLayer::new())
        .add_service(svc)
        .serve(addr)
}
