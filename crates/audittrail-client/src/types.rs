//! Audit log payloads
//!
//! Wire types for the log endpoints. Free-form `details` objects are kept as
//! generic JSON so their keys, value types and nesting survive a round trip.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Free-form structured details attached to a log entry
pub type Details = serde_json::Map<String, Value>;

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a log creation request
///
/// # Examples
/// ```
/// use audittrail_client::{CreateLogRequest, Details};
///
/// let mut details = Details::new();
/// details.insert("ip".to_string(), "192.168.1.1".into());
///
/// let request = CreateLogRequest::new("login").with_details(details);
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["details"]["ip"], "192.168.1.1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLogRequest {
    /// Name of the audited action
    pub action: String,
    /// Optional structured details, omitted from the body when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl CreateLogRequest {
    /// Create a request without details
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            details: None,
        }
    }

    /// Attach details
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }
}

/// A single audit record as returned by the server
///
/// Fields missing from the server response decode to empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Server-assigned identifier
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    /// ISO-8601 timestamp, as received
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Name of the audited action
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    /// Identifier of the acting user
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    /// Structured details
    #[serde(deserialize_with = "null_as_default")]
    pub details: Details,
    /// Server signature, carried opaquely
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
}

impl LogEntry {
    /// Parse the timestamp
    ///
    /// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC). Returns `None`
    /// for anything else.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Look up a top-level detail
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// One page of a log listing
///
/// `next` and `previous` are passed through as received; following them is
/// left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogListResponse {
    /// Total number of matching entries
    #[serde(default)]
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Entries on this page, in server order
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<LogEntry>,
}

impl LogListResponse {
    /// Check if the server advertised a next page
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Check if the server advertised a previous page
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_create_request_without_details() {
        let request = CreateLogRequest::new("logout");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"action": "logout"}));
    }

    #[test]
    fn test_create_request_keeps_empty_action() {
        let request = CreateLogRequest::new("");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"action": ""}));
    }

    #[test]
    fn test_log_entry_nested_details() {
        let raw = json!({
            "_id": "65f1c0ffee",
            "timestamp": "2024-03-13T10:15:30.123456Z",
            "action": "login",
            "user_id": "user-42",
            "details": {
                "ip": "192.168.1.1",
                "attempts": 3,
                "mfa": true,
                "geo": {"country": "PT", "coords": [38.72, -9.14]},
                "note": null
            },
            "signature": "c2lnbmF0dXJl"
        });

        let entry: LogEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.id, "65f1c0ffee");
        assert_eq!(entry.user_id, "user-42");
        assert_eq!(entry.signature, "c2lnbmF0dXJl");
        assert_eq!(entry.detail("attempts"), Some(&json!(3)));
        assert_eq!(entry.detail("mfa"), Some(&json!(true)));
        assert_eq!(entry.details["geo"]["coords"][1], json!(-9.14));
        assert_eq!(entry.detail("note"), Some(&Value::Null));

        // Nothing lost on the way back out
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_log_entry_missing_and_null_fields() {
        let entry: LogEntry =
            serde_json::from_value(json!({"_id": "1", "action": "x", "details": null})).unwrap();
        assert_eq!(entry.id, "1");
        assert!(entry.details.is_empty());
        assert_eq!(entry.signature, "");
        assert_eq!(entry.user_id, "");
    }

    #[test]
    fn test_parsed_timestamp() {
        let mut entry = LogEntry {
            timestamp: "2024-03-13T10:15:30+02:00".to_string(),
            ..Default::default()
        };
        let parsed = entry.parsed_timestamp().unwrap();
        assert_eq!(parsed.hour(), 8);

        entry.timestamp = "2024-03-13T10:15:30.5".to_string();
        let parsed = entry.parsed_timestamp().unwrap();
        assert_eq!(parsed.day(), 13);
        assert_eq!(parsed.hour(), 10);

        entry.timestamp = "yesterday".to_string();
        assert!(entry.parsed_timestamp().is_none());
    }

    #[test]
    fn test_list_response_order_and_cursors() {
        let page: LogListResponse = serde_json::from_value(json!({
            "count": 57,
            "next": "https://api.example.com/api/logs/list/?page=3",
            "previous": null,
            "results": [
                {"_id": "b", "action": "second"},
                {"_id": "a", "action": "first"}
            ]
        }))
        .unwrap();

        assert_eq!(page.count, 57);
        assert!(page.has_next());
        assert!(!page.has_previous());
        let ids: Vec<&str> = page.results.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_list_response_rejects_negative_count() {
        let result = serde_json::from_value::<LogListResponse>(json!({"count": -1, "results": []}));
        assert!(result.is_err());
    }
}
