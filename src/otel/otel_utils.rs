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

use chrono::{DateTime, SecondsFormat};
use opentelemetry_proto::tonic::common::v1::{any_value::Value as OtelValue, AnyValue, KeyValue};
use serde_json::{Map, Value};

/// Recursion limit for `AnyValue` trees. OTLP puts no bound on nesting, so a
/// hostile exporter could otherwise blow the stack; anything deeper decodes
/// to null.
const MAX_DECODE_DEPTH: usize = 64;

/// Decodes an OTLP `AnyValue` into a json value.
///
/// The `oneof` tag set is closed - string, bool, int, double, bytes, array,
/// kvlist - and an unset tag means null. Decoding is total: there is no
/// failure mode, malformed input collapses to null.
pub fn decode_any_value(value: &AnyValue) -> Value {
    decode_at_depth(value, 0)
}

fn decode_at_depth(value: &AnyValue, depth: usize) -> Value {
    if depth >= MAX_DECODE_DEPTH {
        return Value::Null;
    }
    let Some(value) = &value.value else {
        return Value::Null;
    };

    match value {
        OtelValue::StringValue(string_val) => Value::String(string_val.clone()),
        OtelValue::BoolValue(bool_val) => Value::Bool(*bool_val),
        OtelValue::IntValue(int_val) => Value::Number((*int_val).into()),
        OtelValue::DoubleValue(double_val) => serde_json::Number::from_f64(*double_val)
            .map_or(Value::Null, Value::Number),
        // bytes travel to viewers as lowercase hex, same as trace/span ids
        OtelValue::BytesValue(bytes_val) => Value::String(hex::encode(bytes_val)),
        OtelValue::ArrayValue(array_val) => Value::Array(
            array_val
                .values
                .iter()
                .map(|element| decode_at_depth(element, depth + 1))
                .collect(),
        ),
        OtelValue::KvlistValue(kvlist_val) => {
            let mut map = Map::new();
            for key_value in &kvlist_val.values {
                let decoded = key_value
                    .value
                    .as_ref()
                    .map_or(Value::Null, |value| decode_at_depth(value, depth + 1));
                // duplicate keys within one kvlist: last occurrence wins
                map.insert(key_value.key.clone(), decoded);
            }
            Value::Object(map)
        }
    }
}

/// Decodes `attributes` into `map`. Existing keys are overwritten but keep
/// their original position, so first-seen insertion order stays stable.
pub fn insert_attributes(map: &mut Map<String, Value>, attributes: &[KeyValue]) {
    for attribute in attributes {
        let decoded = attribute
            .value
            .as_ref()
            .map_or(Value::Null, decode_any_value);
        map.insert(attribute.key.clone(), decoded);
    }
}

/// Merges the three OTLP attribute tiers into one flat mapping.
///
/// Tiers apply in resource, scope, record order; a later tier overwrites a
/// key present in an earlier one. Inputs are left untouched.
pub fn merge_attributes(
    resource_attrs: &[KeyValue],
    scope_attrs: &[KeyValue],
    record_attrs: &[KeyValue],
) -> Map<String, Value> {
    let mut merged = Map::new();
    insert_attributes(&mut merged, resource_attrs);
    insert_attributes(&mut merged, scope_attrs);
    insert_attributes(&mut merged, record_attrs);
    merged
}

/// Renders epoch nanoseconds as an ISO-8601 UTC timestamp with a numeric
/// offset, e.g. `2023-11-14T22:13:20+00:00`. Sub-second digits appear only
/// when the fraction is non-zero.
pub fn convert_epoch_nano_to_timestamp(epoch_ns: i64) -> String {
    DateTime::from_timestamp_nanos(epoch_ns).to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[cfg(test)]
mod tests {
    use opentelemetry_proto::tonic::common::v1::{ArrayValue, KeyValueList};

    use super::*;

    fn any_string(value: &str) -> AnyValue {
        AnyValue {
            value: Some(OtelValue::StringValue(value.to_string())),
        }
    }

    fn any_int(value: i64) -> AnyValue {
        AnyValue {
            value: Some(OtelValue::IntValue(value)),
        }
    }

    fn key_value(key: &str, value: AnyValue) -> KeyValue {
        KeyValue {
            key: key.to_string(),
            value: Some(value),
        }
    }

    #[test]
    fn decodes_each_tag_to_matching_shape() {
        assert_eq!(decode_any_value(&any_string("x")), Value::String("x".into()));
        assert_eq!(
            decode_any_value(&AnyValue {
                value: Some(OtelValue::BoolValue(true))
            }),
            Value::Bool(true)
        );
        assert_eq!(decode_any_value(&any_int(-7)), serde_json::json!(-7));
        assert_eq!(
            decode_any_value(&AnyValue {
                value: Some(OtelValue::DoubleValue(2.5))
            }),
            serde_json::json!(2.5)
        );
    }

    #[test]
    fn unset_tag_decodes_to_null() {
        assert_eq!(decode_any_value(&AnyValue { value: None }), Value::Null);
    }

    #[test]
    fn non_finite_double_decodes_to_null() {
        let value = AnyValue {
            value: Some(OtelValue::DoubleValue(f64::NAN)),
        };
        assert_eq!(decode_any_value(&value), Value::Null);
    }

    #[test]
    fn bytes_decode_to_lowercase_hex() {
        let value = AnyValue {
            value: Some(OtelValue::BytesValue(vec![0xde, 0xad, 0xbe, 0xef])),
        };
        assert_eq!(decode_any_value(&value), Value::String("deadbeef".into()));
    }

    #[test]
    fn arrays_decode_elementwise_in_order() {
        let value = AnyValue {
            value: Some(OtelValue::ArrayValue(ArrayValue {
                values: vec![any_string("a"), any_int(1), AnyValue { value: None }],
            })),
        };
        assert_eq!(decode_any_value(&value), serde_json::json!(["a", 1, null]));
    }

    #[test]
    fn kvlist_decodes_to_object_with_last_duplicate_winning() {
        let value = AnyValue {
            value: Some(OtelValue::KvlistValue(KeyValueList {
                values: vec![
                    key_value("k", any_string("first")),
                    key_value("other", any_int(3)),
                    key_value("k", any_string("second")),
                ],
            })),
        };
        let decoded = decode_any_value(&value);
        assert_eq!(decoded["k"], "second");
        assert_eq!(decoded["other"], 3);
        // first-seen order preserved for iteration
        let keys: Vec<_> = decoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["k", "other"]);
    }

    #[test]
    fn deeply_nested_arrays_fail_closed_to_null() {
        let mut value = any_string("leaf");
        for _ in 0..200 {
            value = AnyValue {
                value: Some(OtelValue::ArrayValue(ArrayValue {
                    values: vec![value],
                })),
            };
        }
        // must terminate without overflowing the stack; the innermost
        // levels are truncated to null
        let decoded = decode_any_value(&value);
        assert!(decoded.is_array());
    }

    #[test]
    fn merge_gives_record_tier_precedence_over_resource_and_scope() {
        let resource = vec![
            key_value("k", any_string("resource")),
            key_value("resource_only", any_string("r")),
        ];
        let scope = vec![key_value("k", any_string("scope"))];
        let record = vec![key_value("k", any_string("record"))];

        let merged = merge_attributes(&resource, &scope, &record);
        assert_eq!(merged["k"], "record");
        assert_eq!(merged["resource_only"], "r");

        let merged = merge_attributes(&resource, &scope, &[]);
        assert_eq!(merged["k"], "scope");

        let merged = merge_attributes(&resource, &[], &[]);
        assert_eq!(merged["k"], "resource");
    }

    #[test]
    fn merge_keeps_first_seen_key_order() {
        let resource = vec![
            key_value("a", any_string("1")),
            key_value("b", any_string("2")),
        ];
        let record = vec![
            key_value("c", any_string("3")),
            key_value("a", any_string("overwritten")),
        ];

        let merged = merge_attributes(&resource, &[], &record);
        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(merged["a"], "overwritten");
    }

    #[test]
    fn merge_last_duplicate_within_one_tier_wins() {
        let record = vec![
            key_value("k", any_string("first")),
            key_value("k", any_string("last")),
        ];
        let merged = merge_attributes(&[], &[], &record);
        assert_eq!(merged["k"], "last");
    }

    #[test]
    fn epoch_nanos_render_as_iso8601_utc() {
        assert_eq!(
            convert_epoch_nano_to_timestamp(1_700_000_000_000_000_000),
            "2023-11-14T22:13:20+00:00"
        );
        assert_eq!(
            convert_epoch_nano_to_timestamp(1_700_000_000_123_000_000),
            "2023-11-14T22:13:20.123+00:00"
        );
    }
}
