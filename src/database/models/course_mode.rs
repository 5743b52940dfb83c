use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Fields accepted from API input, in serialization order
const FIELDS: &[&str] = &[
    "course_id",
    "mode_slug",
    "mode_display_name",
    "min_price",
    "currency",
    "expiration_datetime",
    "expiration_datetime_is_explicit",
    "description",
    "sku",
    "bulk_sku",
];

/// Errors from parsing or patching a course mode payload
#[derive(Debug, thiserror::Error)]
pub enum CourseModeError {
    #[error("Expected JSON object")]
    NotAnObject,
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for field '{field}': expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Field '{0}' identifies the record and cannot be changed")]
    ImmutableField(&'static str),
    #[error("min_price must be non-negative")]
    NegativePrice,
}

/// One enrollment track for one course, identified by (course_id, mode_slug)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourseMode {
    pub course_id: String,
    pub mode_slug: String,
    pub mode_display_name: String,
    pub min_price: i32,
    pub currency: String,
    pub expiration_datetime: Option<DateTime<Utc>>,
    pub expiration_datetime_is_explicit: bool,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub bulk_sku: Option<String>,
}

impl CourseMode {
    /// Build a course mode from a create payload.
    ///
    /// `course_id`, `mode_slug` and `mode_display_name` are required;
    /// `min_price` defaults to 0 and `currency` to "usd"; the remaining
    /// fields default to null/false. Unknown fields are rejected.
    pub fn from_create_payload(payload: Value) -> Result<Self, CourseModeError> {
        let map = match payload {
            Value::Object(map) => map,
            _ => return Err(CourseModeError::NotAnObject),
        };

        reject_unknown_fields(&map)?;

        let min_price = match map.get("min_price") {
            None | Some(Value::Null) => 0,
            Some(value) => parse_price(value)?,
        };

        Ok(Self {
            course_id: require_string(&map, "course_id")?,
            mode_slug: require_string(&map, "mode_slug")?,
            mode_display_name: require_string(&map, "mode_display_name")?,
            min_price,
            currency: optional_string(&map, "currency")?.unwrap_or_else(|| "usd".to_string()),
            expiration_datetime: optional_datetime(&map)?,
            expiration_datetime_is_explicit: optional_bool(&map, "expiration_datetime_is_explicit")?
                .unwrap_or(false),
            description: optional_string(&map, "description")?,
            sku: optional_string(&map, "sku")?,
            bulk_sku: optional_string(&map, "bulk_sku")?,
        })
    }

    /// Apply a merge-patch: only fields present in `patch` change, absent
    /// fields keep their prior value, and an explicit null clears a nullable
    /// field. Natural-key fields may appear only with their current values.
    pub fn apply_merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), CourseModeError> {
        reject_unknown_fields(patch)?;

        for (key, value) in patch {
            match key.as_str() {
                "course_id" => {
                    if value.as_str() != Some(self.course_id.as_str()) {
                        return Err(CourseModeError::ImmutableField("course_id"));
                    }
                }
                "mode_slug" => {
                    if value.as_str() != Some(self.mode_slug.as_str()) {
                        return Err(CourseModeError::ImmutableField("mode_slug"));
                    }
                }
                "mode_display_name" => {
                    self.mode_display_name = parse_string(value, "mode_display_name")?;
                }
                "min_price" => {
                    self.min_price = parse_price(value)?;
                }
                "currency" => {
                    self.currency = parse_string(value, "currency")?;
                }
                "expiration_datetime" => {
                    self.expiration_datetime = parse_nullable_datetime(value)?;
                }
                "expiration_datetime_is_explicit" => {
                    self.expiration_datetime_is_explicit = value.as_bool().ok_or(
                        CourseModeError::InvalidField {
                            field: "expiration_datetime_is_explicit",
                            expected: "boolean",
                        },
                    )?;
                }
                "description" => {
                    self.description = parse_nullable_string(value, "description")?;
                }
                "sku" => {
                    self.sku = parse_nullable_string(value, "sku")?;
                }
                "bulk_sku" => {
                    self.bulk_sku = parse_nullable_string(value, "bulk_sku")?;
                }
                // reject_unknown_fields already ruled everything else out
                _ => unreachable!(),
            }
        }

        Ok(())
    }
}

fn reject_unknown_fields(map: &Map<String, Value>) -> Result<(), CourseModeError> {
    for key in map.keys() {
        if !FIELDS.contains(&key.as_str()) {
            return Err(CourseModeError::UnknownField(key.clone()));
        }
    }
    Ok(())
}

fn require_string(map: &Map<String, Value>, field: &'static str) -> Result<String, CourseModeError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(CourseModeError::MissingField(field)),
        Some(value) => parse_string(value, field),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, CourseModeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_string(value, field).map(Some),
    }
}

fn optional_bool(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, CourseModeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or(CourseModeError::InvalidField {
                field,
                expected: "boolean",
            }),
    }
}

fn optional_datetime(map: &Map<String, Value>) -> Result<Option<DateTime<Utc>>, CourseModeError> {
    match map.get("expiration_datetime") {
        None => Ok(None),
        Some(value) => parse_nullable_datetime(value),
    }
}

fn parse_string(value: &Value, field: &'static str) -> Result<String, CourseModeError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(CourseModeError::InvalidField {
            field,
            expected: "string",
        })
}

fn parse_nullable_string(
    value: &Value,
    field: &'static str,
) -> Result<Option<String>, CourseModeError> {
    match value {
        Value::Null => Ok(None),
        other => parse_string(other, field).map(Some),
    }
}

fn parse_price(value: &Value) -> Result<i32, CourseModeError> {
    let price = value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or(CourseModeError::InvalidField {
            field: "min_price",
            expected: "integer",
        })?;
    if price < 0 {
        return Err(CourseModeError::NegativePrice);
    }
    Ok(price)
}

fn parse_nullable_datetime(value: &Value) -> Result<Option<DateTime<Utc>>, CourseModeError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| CourseModeError::InvalidField {
                field: "expiration_datetime",
                expected: "RFC 3339 timestamp or null",
            }),
        _ => Err(CourseModeError::InvalidField {
            field: "expiration_datetime",
            expected: "RFC 3339 timestamp or null",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prof_ed() -> CourseMode {
        CourseMode {
            course_id: "course-v1:edX+DemoX+Demo_Course".to_string(),
            mode_slug: "prof-ed".to_string(),
            mode_display_name: "Professional Education".to_string(),
            min_price: 100,
            currency: "jpy".to_string(),
            expiration_datetime: None,
            expiration_datetime_is_explicit: false,
            description: None,
            sku: None,
            bulk_sku: None,
        }
    }

    #[test]
    fn create_payload_defaults_optional_fields() {
        let mode = CourseMode::from_create_payload(json!({
            "course_id": "course-v1:edX+DemoX+Demo_Course",
            "mode_slug": "masters",
            "mode_display_name": "Masters",
        }))
        .unwrap();

        assert_eq!(mode.min_price, 0);
        assert_eq!(mode.currency, "usd");
        assert_eq!(mode.expiration_datetime, None);
        assert!(!mode.expiration_datetime_is_explicit);
        assert_eq!(mode.description, None);
        assert_eq!(mode.sku, None);
        assert_eq!(mode.bulk_sku, None);
    }

    #[test]
    fn create_payload_requires_display_name() {
        let err = CourseMode::from_create_payload(json!({
            "course_id": "course-v1:edX+DemoX+Demo_Course",
            "mode_slug": "masters",
        }))
        .unwrap_err();

        assert!(matches!(err, CourseModeError::MissingField("mode_display_name")));
    }

    #[test]
    fn create_payload_rejects_unknown_fields() {
        let err = CourseMode::from_create_payload(json!({
            "course_id": "c",
            "mode_slug": "s",
            "mode_display_name": "S",
            "price": 10,
        }))
        .unwrap_err();

        assert!(matches!(err, CourseModeError::UnknownField(f) if f == "price"));
    }

    #[test]
    fn create_payload_rejects_negative_price() {
        let err = CourseMode::from_create_payload(json!({
            "course_id": "c",
            "mode_slug": "s",
            "mode_display_name": "S",
            "min_price": -5,
        }))
        .unwrap_err();

        assert!(matches!(err, CourseModeError::NegativePrice));
    }

    #[test]
    fn merge_patch_leaves_absent_fields_untouched() {
        let mut mode = prof_ed();
        let patch = json!({
            "min_price": 222,
            "mode_display_name": "Something Else",
        });

        mode.apply_merge_patch(patch.as_object().unwrap()).unwrap();

        assert_eq!(mode.min_price, 222);
        assert_eq!(mode.mode_display_name, "Something Else");
        assert_eq!(mode.currency, "jpy");
    }

    #[test]
    fn merge_patch_null_clears_nullable_field() {
        let mut mode = prof_ed();
        mode.description = Some("old".to_string());

        let patch = json!({ "description": null });
        mode.apply_merge_patch(patch.as_object().unwrap()).unwrap();

        assert_eq!(mode.description, None);
    }

    #[test]
    fn merge_patch_sets_expiration() {
        let mut mode = prof_ed();
        let patch = json!({
            "expiration_datetime": "2030-06-01T00:00:00Z",
            "expiration_datetime_is_explicit": true,
        });

        mode.apply_merge_patch(patch.as_object().unwrap()).unwrap();

        assert_eq!(
            mode.expiration_datetime.unwrap().to_rfc3339(),
            "2030-06-01T00:00:00+00:00"
        );
        assert!(mode.expiration_datetime_is_explicit);
    }

    #[test]
    fn merge_patch_rejects_unknown_field() {
        let mut mode = prof_ed();
        let patch = json!({ "it": "does not matter" });

        let err = mode.apply_merge_patch(patch.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CourseModeError::UnknownField(f) if f == "it"));
    }

    #[test]
    fn merge_patch_rejects_natural_key_change() {
        let mut mode = prof_ed();

        let patch = json!({ "mode_slug": "renamed" });
        let err = mode.apply_merge_patch(patch.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CourseModeError::ImmutableField("mode_slug")));

        // restating the current key is fine
        let patch = json!({ "mode_slug": "prof-ed", "min_price": 1 });
        mode.apply_merge_patch(patch.as_object().unwrap()).unwrap();
        assert_eq!(mode.min_price, 1);
    }

    #[test]
    fn serializes_all_fields_with_null_defaults() {
        let value = serde_json::to_value(prof_ed()).unwrap();
        let map = value.as_object().unwrap();

        assert_eq!(map.len(), FIELDS.len());
        for field in FIELDS {
            assert!(map.contains_key(*field), "missing {}", field);
        }
        assert_eq!(map["expiration_datetime"], Value::Null);
        assert_eq!(map["expiration_datetime_is_explicit"], json!(false));
    }
}
