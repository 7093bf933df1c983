//! Response envelope handling for the portal REST API.
//!
//! Endpoints are inconsistent: some return `{ success, data: [...] }`, some
//! nest the list under `data.users` / `data.jobs`, dashboard endpoints expose
//! `recentUsers` and a few return bare arrays. Records are returned as raw
//! JSON so callers can decode them one at a time.

use serde_json::Value;

/// Outcome of looking for a record list inside a response body
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// At least one record was found
    Records(Vec<Value>),
    /// The response was well formed but held no records
    Empty,
    /// `success: false`, or no list could be located
    Unsuccessful(String),
}

impl Extraction {
    pub fn is_records(&self) -> bool {
        matches!(self, Extraction::Records(_))
    }
}

/// Locate the record list in `body`.
///
/// `fields` names the keys that may hold the list (e.g. `["users", "items"]`
/// or `["recentUsers"]`), searched first under `data` and then at the top level.
pub fn extract_records(body: &Value, fields: &[&str]) -> Extraction {
    match body {
        Value::Array(items) => from_list(items),
        Value::Object(map) => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map
                    .get("message")
                    .or_else(|| map.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("request reported success: false");
                tracing::debug!("Unsuccessful envelope: {}", message);
                return Extraction::Unsuccessful(message.to_string());
            }

            if let Some(data) = map.get("data") {
                match data {
                    Value::Array(items) => return from_list(items),
                    Value::Object(inner) => {
                        for field in fields {
                            if let Some(Value::Array(items)) = inner.get(*field) {
                                return from_list(items);
                            }
                        }
                    }
                    Value::Null => return Extraction::Empty,
                    _ => {}
                }
            }

            for field in fields {
                if let Some(Value::Array(items)) = map.get(*field) {
                    return from_list(items);
                }
            }

            Extraction::Unsuccessful(format!(
                "no record list found (looked for data, {})",
                fields.join(", ")
            ))
        }
        Value::Null => Extraction::Empty,
        other => Extraction::Unsuccessful(format!("unexpected response body: {}", kind(other))),
    }
}

/// Server-side total, when the envelope reports one
pub fn extract_total(body: &Value) -> Option<u64> {
    const PATHS: &[&[&str]] = &[
        &["total"],
        &["count"],
        &["totalCount"],
        &["pagination", "total"],
        &["data", "total"],
        &["data", "pagination", "total"],
    ];

    PATHS.iter().find_map(|path| {
        let mut cursor = body;
        for segment in *path {
            cursor = cursor.get(*segment)?;
        }
        cursor.as_u64()
    })
}

fn from_list(items: &[Value]) -> Extraction {
    if items.is_empty() {
        Extraction::Empty
    } else {
        Extraction::Records(items.to_vec())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let body = json!([{"_id": "a"}, {"_id": "b"}]);
        match extract_records(&body, &["users"]) {
            Extraction::Records(records) => assert_eq!(records.len(), 2),
            other => panic!("expected records, got {:?}", other),
        }
    }

    #[test]
    fn test_success_envelope() {
        let body = json!({"success": true, "data": [{"_id": "a"}], "total": 41});
        assert!(extract_records(&body, &["users"]).is_records());
        assert_eq!(extract_total(&body), Some(41));
    }

    #[test]
    fn test_nested_data_field() {
        let body = json!({"success": true, "data": {"users": [{"_id": "a"}], "pagination": {"total": 7}}});
        assert!(extract_records(&body, &["users"]).is_records());
        assert_eq!(extract_total(&body), Some(7));
    }

    #[test]
    fn test_dashboard_stats_recent_users() {
        let body = json!({"success": true, "data": {"totalUsers": 3, "recentUsers": [{"_id": "a"}]}});
        assert!(extract_records(&body, &["recentUsers"]).is_records());

        let top_level = json!({"recentUsers": [{"_id": "a"}]});
        assert!(extract_records(&top_level, &["recentUsers"]).is_records());
    }

    #[test]
    fn test_success_false_is_unsuccessful() {
        let body = json!({"success": false, "message": "Not authorized"});
        assert_eq!(
            extract_records(&body, &["users"]),
            Extraction::Unsuccessful("Not authorized".to_string())
        );
    }

    #[test]
    fn test_empty_list_is_empty() {
        assert_eq!(extract_records(&json!({"success": true, "data": []}), &[]), Extraction::Empty);
        assert_eq!(extract_records(&json!([]), &[]), Extraction::Empty);
    }

    #[test]
    fn test_unrecognized_shape() {
        let body = json!({"hello": "world"});
        assert!(matches!(
            extract_records(&body, &["users"]),
            Extraction::Unsuccessful(_)
        ));
        assert!(matches!(
            extract_records(&json!("oops"), &["users"]),
            Extraction::Unsuccessful(_)
        ));
    }
}
