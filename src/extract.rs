use serde_json::Value;

/// Result of probing a single field path in a raw provider record.
///
/// Provider payloads are loosely typed and drift across versions; the same
/// logical field may be missing, null, nested one level deeper, or present
/// but blank. Callers need to tell "no data" apart from "empty string", so
/// absence is never collapsed into an empty string here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// The path does not resolve, or resolves to null / a non-scalar.
    Missing,
    /// The path resolves to a scalar that is empty after trimming.
    Blank,
    /// The path resolves to a non-empty scalar, stringified and trimmed.
    Text(String),
}

impl FieldValue {
    pub fn into_option(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Resolves a dot-separated path inside an untyped record.
///
/// Numeric segments index into arrays, so `"hiringTeam.0.name"` reaches the
/// first hiring-team member's name.
fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Coerces a scalar JSON value to its trimmed string form.
///
/// Numbers and booleans stringify; null, objects and arrays do not carry a
/// usable scalar and count as missing.
fn stringify_scalar(value: &Value) -> FieldValue {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) | Value::Array(_) => return FieldValue::Missing,
    };

    if text.is_empty() {
        FieldValue::Blank
    } else {
        FieldValue::Text(text)
    }
}

/// Probes one candidate path, classifying the result as missing, blank, or text.
pub fn probe(record: &Value, path: &str) -> FieldValue {
    match resolve_path(record, path) {
        Some(value) => stringify_scalar(value),
        None => FieldValue::Missing,
    }
}

/// Returns the first candidate path that yields a non-empty value.
///
/// Candidates are tried in order; missing and blank values are skipped.
/// `None` means no candidate carried data, which is distinct from a field
/// that was present but empty.
pub fn extract_first(record: &Value, candidates: &[&str]) -> Option<String> {
    for path in candidates {
        if let FieldValue::Text(text) = probe(record, path) {
            return Some(text);
        }
    }
    None
}

/// Resolves a candidate path to its raw JSON value, skipping nulls.
///
/// Used where the caller needs the untyped value itself (employee counts,
/// nested arrays) rather than the stringified form.
pub fn extract_raw<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    for path in candidates {
        if let Some(value) = resolve_path(record, path) {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_path_beats_flat_fallback() {
        let record = json!({
            "company": { "name": "Acme Corp" },
            "companyName": "Stale Name"
        });
        assert_eq!(
            extract_first(&record, &["company.name", "companyName"]),
            Some("Acme Corp".to_string())
        );
    }

    #[test]
    fn blank_value_falls_through_to_next_candidate() {
        let record = json!({ "title": "   ", "jobTitle": "Engineer" });
        assert_eq!(probe(&record, "title"), FieldValue::Blank);
        assert_eq!(
            extract_first(&record, &["title", "jobTitle"]),
            Some("Engineer".to_string())
        );
    }

    #[test]
    fn null_and_missing_are_absent_not_empty() {
        let record = json!({ "salary": null });
        assert_eq!(probe(&record, "salary"), FieldValue::Missing);
        assert_eq!(probe(&record, "nonexistent"), FieldValue::Missing);
        assert_eq!(extract_first(&record, &["salary", "nonexistent"]), None);
    }

    #[test]
    fn numbers_and_booleans_stringify() {
        let record = json!({ "id": 4207551123u64, "remote": true });
        assert_eq!(
            extract_first(&record, &["id"]),
            Some("4207551123".to_string())
        );
        assert_eq!(extract_first(&record, &["remote"]), Some("true".to_string()));
    }

    #[test]
    fn array_index_segments_resolve() {
        let record = json!({
            "hiringTeam": [ { "name": "Dana Reyes" }, { "name": "Lee Park" } ]
        });
        assert_eq!(
            extract_first(&record, &["hiringTeam.0.name"]),
            Some("Dana Reyes".to_string())
        );
        assert_eq!(extract_first(&record, &["hiringTeam.5.name"]), None);
    }

    #[test]
    fn objects_do_not_stringify() {
        let record = json!({ "location": { "parsed": { "text": "Austin, TX" } } });
        assert_eq!(probe(&record, "location"), FieldValue::Missing);
        assert_eq!(
            extract_first(&record, &["location", "location.parsed.text"]),
            Some("Austin, TX".to_string())
        );
    }
}
