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

use std::io::Read;

use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use flate2::read::GzDecoder;
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use opentelemetry_proto::tonic::logs::v1::LogsData;
use prost::Message;
use tracing::debug;

use crate::otel::logs::ingest_resource_logs;
use crate::state::AppState;

const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
const CONTENT_TYPE_JSON: &str = "application/json";

/// OTLP/HTTP log export endpoint (`POST /v1/logs`).
///
/// Accepts protobuf or JSON request bodies, optionally gzip-compressed.
/// The batch is acknowledged once every normalizable record has been
/// appended to the queue; individual dropped records do not fail the call.
pub async fn ingest(
    req: HttpRequest,
    body: Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, PostError> {
    let body = decompress_if_gzipped(&req, body)?;
    let content_type = header_str(&req, header::CONTENT_TYPE).unwrap_or(CONTENT_TYPE_PROTOBUF);

    if content_type.starts_with(CONTENT_TYPE_JSON) {
        let logs: LogsData = serde_json::from_slice(&body)?;
        debug!(
            "otlp/http json export with {} resource logs",
            logs.resource_logs.len()
        );
        ingest_resource_logs(&logs.resource_logs, &state.queue);
        Ok(HttpResponse::Ok().json(ExportLogsServiceResponse::default()))
    } else if content_type.starts_with(CONTENT_TYPE_PROTOBUF) {
        let request = ExportLogsServiceRequest::decode(body.as_ref())?;
        debug!(
            "otlp/http protobuf export with {} resource logs",
            request.resource_logs.len()
        );
        ingest_resource_logs(&request.resource_logs, &state.queue);
        Ok(HttpResponse::Ok()
            .content_type(CONTENT_TYPE_PROTOBUF)
            .body(ExportLogsServiceResponse::default().encode_to_vec()))
    } else {
        Err(PostError::UnsupportedContentType(content_type.to_owned()))
    }
}

// OTLP exporters commonly gzip their payloads
fn decompress_if_gzipped(req: &HttpRequest, body: Bytes) -> Result<Bytes, PostError> {
    let encoding = header_str(req, header::CONTENT_ENCODING).unwrap_or_default();
    if !encoding.eq_ignore_ascii_case("gzip") {
        return Ok(body);
    }

    let mut decoder = GzDecoder::new(body.as_ref());
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed.into())
}

fn header_str<'a>(req: &'a HttpRequest, name: header::HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Could not deserialize OTLP logs JSON, {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Could not decode OTLP protobuf payload, {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Could not decompress request body, {0}")]
    Decompress(#[from] std::io::Error),
    #[error("Unsupported content type {0}")]
    UnsupportedContentType(String),
}

impl actix_web::ResponseError for PostError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostError::SerdeError(_) => StatusCode::BAD_REQUEST,
            PostError::Decode(_) => StatusCode::BAD_REQUEST,
            PostError::Decompress(_) => StatusCode::BAD_REQUEST,
            PostError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        actix_web::HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use actix_web::test::TestRequest;
    use actix_web::ResponseError;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue, KeyValue};
    use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
    use opentelemetry_proto::tonic::resource::v1::Resource;

    use super::*;
    use crate::broadcast::DEFAULT_SEND_TIMEOUT;
    use crate::broadcast::Broadcaster;
    use crate::queue::LogQueue;
    use std::sync::Arc;

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            queue: Arc::new(LogQueue::new(16)),
            broadcaster: Arc::new(Broadcaster::new(DEFAULT_SEND_TIMEOUT)),
        })
    }

    fn sample_export_request() -> ExportLogsServiceRequest {
        ExportLogsServiceRequest {
            resource_logs: vec![ResourceLogs {
                resource: Some(Resource {
                    attributes: vec![KeyValue {
                        key: "service.name".to_string(),
                        value: Some(AnyValue {
                            value: Some(any_value::Value::StringValue("api".to_string())),
                        }),
                    }],
                    ..Default::default()
                }),
                scope_logs: vec![ScopeLogs {
                    log_records: vec![LogRecord {
                        time_unix_nano: 1_700_000_000_000_000_000,
                        body: Some(AnyValue {
                            value: Some(any_value::Value::StringValue("boom".to_string())),
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[actix_web::test]
    async fn protobuf_body_is_decoded_and_queued() {
        let state = test_state();
        let req = TestRequest::post()
            .uri("/v1/logs")
            .insert_header((header::CONTENT_TYPE, CONTENT_TYPE_PROTOBUF))
            .to_http_request();
        let body = Bytes::from(sample_export_request().encode_to_vec());

        let response = ingest(req, body, state.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.queue.pop().unwrap().message, "boom");
    }

    #[actix_web::test]
    async fn gzipped_protobuf_body_is_decompressed_first() {
        let state = test_state();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&sample_export_request().encode_to_vec())
            .unwrap();
        let compressed = encoder.finish().unwrap();

        let req = TestRequest::post()
            .uri("/v1/logs")
            .insert_header((header::CONTENT_TYPE, CONTENT_TYPE_PROTOBUF))
            .insert_header((header::CONTENT_ENCODING, "gzip"))
            .to_http_request();

        let response = ingest(req, Bytes::from(compressed), state.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.queue.len(), 1);
    }

    #[actix_web::test]
    async fn json_body_is_accepted() {
        let state = test_state();
        let payload = serde_json::json!({
            "resourceLogs": [{
                "scopeLogs": [{
                    "logRecords": [{
                        "timeUnixNano": 1700000000000000000u64,
                        "body": {"stringValue": "boom"}
                    }]
                }]
            }]
        });
        let req = TestRequest::post()
            .uri("/v1/logs")
            .insert_header(ContentType::json())
            .to_http_request();

        let response = ingest(req, Bytes::from(payload.to_string()), state.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.queue.pop().unwrap().message, "boom");
    }

    #[actix_web::test]
    async fn undecodable_protobuf_is_a_bad_request() {
        let state = test_state();
        let req = TestRequest::post()
            .uri("/v1/logs")
            .insert_header((header::CONTENT_TYPE, CONTENT_TYPE_PROTOBUF))
            .to_http_request();

        // protobuf with a truncated field
        let err = ingest(req, Bytes::from_static(&[0x0a, 0xff]), state.clone())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(state.queue.is_empty());
    }

    #[actix_web::test]
    async fn unknown_content_type_is_rejected() {
        let state = test_state();
        let req = TestRequest::post()
            .uri("/v1/logs")
            .insert_header((header::CONTENT_TYPE, "text/csv"))
            .to_http_request();

        let err = ingest(req, Bytes::new(), state).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
