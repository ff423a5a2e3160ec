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

use opentelemetry_proto::tonic::common::v1::InstrumentationScope;
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs};
use opentelemetry_proto::tonic::resource::v1::Resource;
use serde_json::{Map, Value};
use tracing::warn;

use super::otel_utils::{convert_epoch_nano_to_timestamp, decode_any_value, merge_attributes};
use crate::entry::LogEntry;
use crate::queue::LogQueue;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("log record carries neither time_unix_nano nor observed_time_unix_nano")]
    MissingTimestamp,
}

/// Turns one OTLP log record, with its resource and scope context, into a
/// flat [`LogEntry`].
///
/// Every canonical field resolves through an ordered fallback chain; the
/// first candidate that is set and non-empty wins. Contexts are shared
/// across sibling records of one export batch and are never mutated.
///
/// proto3 scalars carry no presence bit, so zero IS the wire encoding of an
/// absent timestamp or severity number (severity 0 is UNSPECIFIED). Trace
/// and span ids are present when their byte strings are non-empty.
pub fn normalize(
    resource: Option<&Resource>,
    scope: Option<&InstrumentationScope>,
    record: &LogRecord,
) -> Result<LogEntry, NormalizeError> {
    let timestamp_ns = match (record.time_unix_nano, record.observed_time_unix_nano) {
        (0, 0) => return Err(NormalizeError::MissingTimestamp),
        (0, observed) => observed,
        (sent, _) => sent,
    };
    let timestamp = convert_epoch_nano_to_timestamp(timestamp_ns as i64);

    let attributes = merge_attributes(
        resource.map(|r| r.attributes.as_slice()).unwrap_or_default(),
        scope.map(|s| s.attributes.as_slice()).unwrap_or_default(),
        &record.attributes,
    );

    let level = non_empty(&record.severity_text)
        .map(str::to_owned)
        .or_else(|| attr_str(&attributes, "log.severity_text"));

    let severity = (record.severity_number != 0)
        .then_some(record.severity_number as i64)
        .or_else(|| attr_i64(&attributes, "log.severity_number"));

    let trace_id = (!record.trace_id.is_empty())
        .then(|| hex::encode(&record.trace_id))
        .or_else(|| attr_str(&attributes, "trace_id"));

    let span_id = (!record.span_id.is_empty())
        .then(|| hex::encode(&record.span_id))
        .or_else(|| attr_str(&attributes, "span_id"));

    // a present scope name wins unconditionally over the attribute fallbacks
    let logger = scope
        .and_then(|s| non_empty(&s.name))
        .map(str::to_owned)
        .or_else(|| attr_str(&attributes, "log.logger"))
        .or_else(|| attr_str(&attributes, "logger.name"));

    let module = attr_str(&attributes, "code.module");

    let thread =
        attr_str(&attributes, "thread.name").or_else(|| attr_str(&attributes, "thread.id"));

    let (env, service, process, host, ip) = if attributes.is_empty() {
        (None, None, None, None, None)
    } else {
        (
            attr_str(&attributes, "deployment.environment"),
            attr_str(&attributes, "service.name"),
            attr_str(&attributes, "process.command"),
            attr_str(&attributes, "host.name"),
            attr_str(&attributes, "host.ip"),
        )
    };

    let message = record
        .body
        .as_ref()
        .map(|body| stringify_body(decode_any_value(body)))
        .unwrap_or_default();

    Ok(LogEntry {
        timestamp,
        env,
        level,
        message,
        host,
        service,
        module,
        logger,
        process,
        thread,
        trace_id,
        span_id,
        severity,
        ip,
        attributes,
    })
}

/// Walks an export batch (`resource_logs -> scope_logs -> log_records`),
/// normalizing each record and appending it to the queue. A record that
/// cannot be normalized is logged and skipped; its siblings still go
/// through, and the caller acknowledges the batch as accepted either way.
pub fn ingest_resource_logs(resource_logs: &[ResourceLogs], queue: &LogQueue) {
    for resource_log in resource_logs {
        let resource = resource_log.resource.as_ref();
        for scope_log in &resource_log.scope_logs {
            let scope = scope_log.scope.as_ref();
            for record in &scope_log.log_records {
                match normalize(resource, scope, record) {
                    Ok(entry) => queue.append(entry),
                    Err(err) => warn!("skipping log record: {err}"),
                }
            }
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn attr_str(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    match attributes.get(key)? {
        Value::String(string_val) if !string_val.is_empty() => Some(string_val.clone()),
        Value::Number(number_val) => Some(number_val.to_string()),
        Value::Bool(bool_val) => Some(bool_val.to_string()),
        _ => None,
    }
}

fn attr_i64(attributes: &Map<String, Value>, key: &str) -> Option<i64> {
    attributes.get(key)?.as_i64()
}

fn stringify_body(body: Value) -> String {
    match body {
        Value::Null => String::new(),
        // plain strings pass through without JSON quoting
        Value::String(string_val) => string_val,
        other => other.to_string(),
    }
}
