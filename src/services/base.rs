//! Cross-cutting helpers shared by every service
//!
//! Error normalization, request validation over raw JSON bodies, caller
//! authorization and input sanitization.

use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::error::{FieldViolation, Result, ServiceError, StoreError};

// == Caller ==
/// Identity of whoever issued the request, as established upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Caller {
    pub id: Option<String>,
    pub role: Option<String>,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Some(role.into()),
        }
    }

    /// Only the literal role `admin` counts.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

// == Error Normalization ==
/// Turns any failure into a [`ServiceError`].
///
/// Errors that already are a `ServiceError` pass through untouched, store
/// errors are classified by variant, everything else is internal under
/// `default_code`.
pub fn normalize_error(service: &str, error: anyhow::Error, default_code: &'static str) -> ServiceError {
    error!("Error in {}: {:#}", service, error);

    let error = match error.downcast::<ServiceError>() {
        Ok(service_error) => return service_error,
        Err(other) => other,
    };
    match error.downcast::<StoreError>() {
        Ok(store_error) => from_store_error(store_error, default_code),
        Err(other) => ServiceError::internal(default_code, other),
    }
}

/// Maps a backing-store failure onto the service taxonomy.
pub fn from_store_error(error: StoreError, code: &'static str) -> ServiceError {
    match error {
        StoreError::Unavailable(_) | StoreError::RateLimited(_) => ServiceError::Unavailable {
            code,
            message: error.to_string(),
            original: Some(error.into()),
        },
        StoreError::Backend(_) => ServiceError::internal(code, error.into()),
    }
}

// == Validation ==
/// JSON value kinds accepted by [`validate_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

/// Absent and falsy values: null, `false`, `0`, NaN and `""`.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n == 0.0 || n.is_nan()),
        Some(Value::Bool(true)) | Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

/// Fails with every missing field at once. Falsy values count as missing.
pub fn validate_required(data: &Value, fields: &[&str]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| is_missing(data.get(*field)))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let violations = missing
        .iter()
        .map(|field| FieldViolation::new(*field, format!("Missing required field: {}", field)))
        .collect();
    Err(ServiceError::Validation {
        message: format!("Missing required fields: {}", missing.join(", ")),
        violations,
    })
}

/// Rejects a present field of the wrong kind. Absent fields pass.
pub fn validate_type(data: &Value, field: &str, expected: JsonType) -> Result<()> {
    match data.get(field) {
        Some(value) if !expected.matches(value) => Err(ServiceError::validation(vec![
            FieldViolation::new(
                field,
                format!("Field '{}' must be of type {}", field, expected.name()),
            ),
        ])),
        _ => Ok(()),
    }
}

/// Rejects a present field outside `allowed`. Absent fields pass.
pub fn validate_enum(data: &Value, field: &str, allowed: &[&str]) -> Result<()> {
    match data.get(field) {
        Some(value) if !allowed.iter().any(|a| value.as_str() == Some(*a)) => {
            Err(ServiceError::validation(vec![FieldViolation::new(
                field,
                format!("Field '{}' must be one of: {}", field, allowed.join(", ")),
            )]))
        }
        _ => Ok(()),
    }
}

// == Authorization ==
/// Allows callers holding one of `allowed_roles`, or owning the resource.
pub fn check_authorization(
    caller: Option<&Caller>,
    resource_owner: Option<&str>,
    allowed_roles: &[&str],
) -> Result<()> {
    let Some(caller) = caller else {
        return Err(ServiceError::Unauthorized {
            message: UNAUTHORIZED_MESSAGE.to_string(),
        });
    };

    let has_role = caller
        .role
        .as_deref()
        .is_some_and(|role| allowed_roles.contains(&role));
    let is_owner = match (resource_owner, caller.id.as_deref()) {
        (Some(owner), Some(id)) => owner == id,
        _ => false,
    };

    if has_role || is_owner {
        Ok(())
    } else {
        Err(ServiceError::Forbidden {
            message: FORBIDDEN_MESSAGE.to_string(),
        })
    }
}

const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
const FORBIDDEN_MESSAGE: &str = "Forbidden";

// == Sanitization ==
/// Trims and optionally caps the length (in characters) of a string.
pub fn sanitize_str(input: &str, max_len: Option<usize>) -> String {
    let trimmed = input.trim();
    match max_len {
        Some(max) => trimmed.chars().take(max).collect(),
        None => trimmed.to_string(),
    }
}

/// Like [`sanitize_str`] for JSON input; non-strings pass through unchanged.
pub fn sanitize_string(input: Value, max_len: Option<usize>) -> Value {
    match input {
        Value::String(s) => Value::String(sanitize_str(&s, max_len)),
        other => other,
    }
}

/// Trimmed, lowercased email. Empty or absent input gives `None`.
pub fn sanitize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StatusClass, FORBIDDEN, UNAUTHORIZED};
    use serde_json::json;

    #[test]
    fn test_normalize_passes_service_errors_through() {
        let original = ServiceError::not_found("ACTIVITY_NOT_FOUND", "Activity not found");
        let normalized = normalize_error("Test", original.into(), "FALLBACK");

        assert_eq!(normalized.status_class(), StatusClass::NotFound);
        assert_eq!(normalized.code(), "ACTIVITY_NOT_FOUND");
    }

    #[test]
    fn test_normalize_classifies_store_errors() {
        let err = normalize_error("Test", StoreError::Unavailable("offline".into()).into(), "X");
        assert_eq!(err.status_class(), StatusClass::Unavailable);
        assert_eq!(err.code(), "X");

        let err = normalize_error("Test", StoreError::Backend("boom".into()).into(), "X");
        assert_eq!(err.status_class(), StatusClass::Internal);
        assert!(err.original_error().is_some());
    }

    #[test]
    fn test_normalize_does_not_scan_messages() {
        // A message mentioning "not found" stays an internal failure
        let err = normalize_error("Test", anyhow::anyhow!("config not found, invalid"), "X");
        assert_eq!(err.status_class(), StatusClass::Internal);
        assert_eq!(err.message(), "config not found, invalid");
    }

    #[test]
    fn test_validate_required_reports_all_missing() {
        let data = json!({"title": "Judo", "email": "", "phone": null});
        let err = validate_required(&data, &["title", "email", "phone", "address"]).unwrap_err();

        match err {
            ServiceError::Validation { message, violations } => {
                assert_eq!(message, "Missing required fields: email, phone, address");
                assert_eq!(violations.len(), 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_required_treats_falsy_as_missing() {
        let data = json!({"count": 0, "ratio": 0.0, "flag": false, "tags": [], "extra": {}});
        let err =
            validate_required(&data, &["count", "ratio", "flag", "tags", "extra"]).unwrap_err();
        assert_eq!(err.message(), "Missing required fields: count, ratio, flag");

        let data = json!({"count": 3, "flag": true, "title": " "});
        assert!(validate_required(&data, &["count", "flag", "title"]).is_ok());
    }

    #[test]
    fn test_validate_type_skips_absent() {
        let data = json!({"age": "five"});
        assert!(validate_type(&data, "missing", JsonType::Number).is_ok());
        assert!(validate_type(&data, "age", JsonType::String).is_ok());

        let err = validate_type(&data, "age", JsonType::Number).unwrap_err();
        assert_eq!(err.message(), "Field 'age' must be of type number");
    }

    #[test]
    fn test_validate_enum() {
        let data = json!({"status": "archived"});
        let allowed = ["approved", "pending", "rejected"];

        assert!(validate_enum(&json!({}), "status", &allowed).is_ok());
        assert!(validate_enum(&json!({"status": "pending"}), "status", &allowed).is_ok());
        assert_eq!(
            validate_enum(&data, "status", &allowed).unwrap_err().status_class(),
            StatusClass::BadRequest
        );
    }

    #[test]
    fn test_authorization() {
        let admin = Caller::new("u1", "admin");
        let parent = Caller::new("u2", "parent");

        assert_eq!(
            check_authorization(None, None, &["admin"]).unwrap_err().code(),
            UNAUTHORIZED
        );
        assert!(check_authorization(Some(&admin), None, &["admin"]).is_ok());
        assert!(check_authorization(Some(&parent), Some("u2"), &["admin"]).is_ok());
        assert_eq!(
            check_authorization(Some(&parent), Some("u1"), &["admin"])
                .unwrap_err()
                .code(),
            FORBIDDEN
        );
    }

    #[test]
    fn test_authorization_anonymous_caller_is_not_owner() {
        let anonymous = Caller::default();
        let err = check_authorization(Some(&anonymous), None, &["admin"]).unwrap_err();
        assert_eq!(err.status_class(), StatusClass::Forbidden);
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_str("  hello  ", None), "hello");
        assert_eq!(sanitize_str("  héllo wörld ", Some(5)), "héllo");
        assert_eq!(sanitize_string(json!(" x "), None), json!("x"));
        assert_eq!(sanitize_string(json!(42), Some(1)), json!(42));
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(
            sanitize_email(Some("  Parent@Example.COM ")).as_deref(),
            Some("parent@example.com")
        );
        assert_eq!(sanitize_email(Some("   ")), None);
        assert_eq!(sanitize_email(None), None);
    }
}
