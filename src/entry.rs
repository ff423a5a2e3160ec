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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat schema every viewer message conforms to.
///
/// OTLP carries logs as deeply nested protobuf; this is the shape they take
/// after field resolution. `message` is never null, every other canonical
/// field is optional. `attributes` is the merged resource/scope/record
/// mapping, including keys that were also promoted to canonical fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub env: Option<String>,
    pub level: Option<String>,
    pub message: String,
    pub host: Option<String>,
    pub service: Option<String>,
    pub module: Option<String>,
    pub logger: Option<String>,
    pub process: Option<String>,
    pub thread: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub severity: Option<i64>,
    pub ip: Option<String>,
    pub attributes: Map<String, Value>,
}
