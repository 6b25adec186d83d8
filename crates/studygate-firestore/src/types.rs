//! Firestore REST API types.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: Option<String>,
    pub fields: Option<HashMap<String, Value>>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

// ============================================================================
// Structured queries
// ============================================================================

/// Collection to query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

/// Comparison operator for a field filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    pub op: String,
    pub filters: Vec<Filter>,
}

/// Query filter: a single field comparison or an AND of filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_filter: Option<CompositeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
}

impl Filter {
    /// `field <op> value`.
    pub fn field(path: impl Into<String>, op: FieldOp, value: Value) -> Self {
        Self {
            composite_filter: None,
            field_filter: Some(FieldFilter {
                field: FieldReference {
                    field_path: path.into(),
                },
                op,
                value,
            }),
        }
    }

    /// AND of the given filters. A single filter is returned unwrapped.
    pub fn and(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Self {
            composite_filter: Some(CompositeFilter {
                op: "AND".to_string(),
                filters,
            }),
            field_filter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl StructuredQuery {
    /// Query over a single collection with no filter.
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
                all_descendants: None,
            }],
            r#where: None,
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.r#where = Some(filter);
        self
    }
}

// ============================================================================
// Aggregation queries
// ============================================================================

/// `COUNT(*)` aggregation, optionally capped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountAggregation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub alias: String,
    pub count: CountAggregation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAggregationQuery {
    pub structured_query: StructuredQuery,
    pub aggregations: Vec<Aggregation>,
}

impl StructuredAggregationQuery {
    /// Count the documents matched by `query` under `alias`.
    pub fn count(query: StructuredQuery, alias: impl Into<String>) -> Self {
        Self {
            structured_query: query,
            aggregations: vec![Aggregation {
                alias: alias.into(),
                count: CountAggregation::default(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryRequest {
    pub structured_aggregation_query: StructuredAggregationQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(default)]
    pub aggregate_fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryResponse {
    pub result: Option<AggregationResult>,
    pub read_time: Option<String>,
}

// ============================================================================
// Value conversion
// ============================================================================

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for i64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for u64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) if *f >= 0.0 => Some(*f as u64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_filter_is_not_wrapped() {
        let filter = Filter::and(vec![Filter::field(
            "userId",
            FieldOp::Equal,
            "u1".to_firestore_value(),
        )]);
        assert!(filter.composite_filter.is_none());
        assert!(filter.field_filter.is_some());
    }

    #[test]
    fn test_count_query_wire_format() {
        let since = DateTime::parse_from_rfc3339("2026-10-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let query = StructuredQuery::collection("quizResults").with_filter(Filter::and(vec![
            Filter::field("userId", FieldOp::Equal, "u1".to_firestore_value()),
            Filter::field("completedAt", FieldOp::GreaterThanOrEqual, since.to_firestore_value()),
        ]));
        let request = RunAggregationQueryRequest {
            structured_aggregation_query: StructuredAggregationQuery::count(query, "count"),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "structuredAggregationQuery": {
                    "structuredQuery": {
                        "from": [{ "collectionId": "quizResults" }],
                        "where": {
                            "compositeFilter": {
                                "op": "AND",
                                "filters": [
                                    { "fieldFilter": {
                                        "field": { "fieldPath": "userId" },
                                        "op": "EQUAL",
                                        "value": { "stringValue": "u1" }
                                    }},
                                    { "fieldFilter": {
                                        "field": { "fieldPath": "completedAt" },
                                        "op": "GREATER_THAN_OR_EQUAL",
                                        "value": { "timestampValue": "2026-10-01T00:00:00.000Z" }
                                    }}
                                ]
                            }
                        }
                    },
                    "aggregations": [{ "alias": "count", "count": {} }]
                }
            })
        );
    }

    #[test]
    fn test_parse_aggregation_response() {
        let body = r#"[{"result":{"aggregateFields":{"count":{"integerValue":"4"}}},"readTime":"2026-10-18T10:00:00Z"}]"#;
        let responses: Vec<RunAggregationQueryResponse> = serde_json::from_str(body).unwrap();
        let fields = &responses[0].result.as_ref().unwrap().aggregate_fields;
        assert_eq!(u64::from_firestore_value(&fields["count"]), Some(4));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = DateTime::parse_from_rfc3339("2026-10-18T08:30:15.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = ts.to_firestore_value();
        assert_eq!(value, Value::TimestampValue("2026-10-18T08:30:15.250Z".to_string()));
        assert_eq!(DateTime::<Utc>::from_firestore_value(&value), Some(ts));
    }

    #[test]
    fn test_integer_parsing_rejects_wrong_types() {
        assert_eq!(u64::from_firestore_value(&Value::StringValue("3".into())), None);
        assert_eq!(u64::from_firestore_value(&Value::DoubleValue(-1.0)), None);
        assert_eq!(i64::from_firestore_value(&Value::IntegerValue("-2".into())), Some(-2));
    }
}
