//! Declarative validation of incoming submission payloads.
//!
//! Every required field is checked in a single pass so that callers get one
//! aggregated [`ValidationError`] instead of failing on the first problem.

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::ValidationError;
use crate::models::Submission;

/// Expected JSON shape of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Identity field: must be a string.
    Text,
    /// Descriptive attribute: any non-null value.
    Any,
    Flag,
    /// A string or a list of strings.
    Items,
}

/// All fields a submission must carry, in reporting order.
pub const REQUIRED_FIELDS: &[(&str, FieldKind)] = &[
    ("first_name", FieldKind::Text),
    ("last_name", FieldKind::Text),
    ("birth_date", FieldKind::Text),
    ("status", FieldKind::Any),
    ("address", FieldKind::Any),
    ("phone_number", FieldKind::Any),
    ("height", FieldKind::Any),
    ("nationality", FieldKind::Any),
    ("eye_color", FieldKind::Any),
    ("forbidden_staff", FieldKind::Items),
    ("allowed", FieldKind::Flag),
];

impl Submission {
    /// Validate a raw JSON body and convert it into a [`Submission`].
    ///
    /// Unknown fields are ignored. Missing and `null` fields are reported
    /// together before any type checks run.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|(name, _)| obj.get(*name).map_or(true, Value::is_null))
            .map(|(name, _)| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "submission missing required fields");
            return Err(ValidationError::MissingFields(missing));
        }

        for &(name, kind) in REQUIRED_FIELDS {
            check_kind(obj, name, kind)?;
        }

        serde_json::from_value(value.clone()).map_err(|e| {
            debug!(error = %e, "submission failed to deserialize after shape checks");
            ValidationError::InvalidField {
                field: "body".into(),
                expected: "a submission object",
            }
        })
    }
}

fn check_kind(obj: &Map<String, Value>, name: &str, kind: FieldKind) -> Result<(), ValidationError> {
    let value = &obj[name];
    let ok = match kind {
        FieldKind::Text => value.is_string(),
        FieldKind::Any => true,
        FieldKind::Flag => value.is_boolean(),
        FieldKind::Items => match value {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        },
    };
    if ok {
        return Ok(());
    }
    Err(match kind {
        FieldKind::Items => ValidationError::InvalidForbiddenStaff,
        FieldKind::Text | FieldKind::Any => ValidationError::InvalidField {
            field: name.to_string(),
            expected: "a string",
        },
        FieldKind::Flag => ValidationError::InvalidField {
            field: name.to_string(),
            expected: "a boolean",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForbiddenStaff;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "first_name": "Ana",
            "last_name": "Kovac",
            "birth_date": "01/01/1990",
            "status": "ok",
            "address": "x",
            "phone_number": "123",
            "height": "170",
            "nationality": "HR",
            "eye_color": "brown",
            "forbidden_staff": "knife",
            "allowed": true
        })
    }

    #[test]
    fn test_valid_payload() {
        let sub = Submission::from_json(&payload()).unwrap();
        assert_eq!(sub.first_name, "Ana");
        assert_eq!(sub.forbidden_staff, ForbiddenStaff::Single("knife".into()));
        assert!(sub.allowed);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let mut body = payload();
        body["comment"] = json!("ignored");
        assert!(Submission::from_json(&body).is_ok());
    }

    #[test]
    fn test_missing_and_null_fields_are_aggregated() {
        let mut body = payload();
        let obj = body.as_object_mut().unwrap();
        obj.remove("last_name");
        obj.insert("allowed".into(), Value::Null);

        let err = Submission::from_json(&body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["last_name".into(), "allowed".into()])
        );
    }

    #[test]
    fn test_every_field_is_required() {
        for (name, _) in REQUIRED_FIELDS {
            let mut body = payload();
            body.as_object_mut().unwrap().remove(*name);
            let err = Submission::from_json(&body).unwrap_err();
            assert_eq!(err, ValidationError::MissingFields(vec![name.to_string()]));
        }
    }

    #[test]
    fn test_forbidden_staff_shape() {
        let mut body = payload();
        body["forbidden_staff"] = json!(["knife", "lighter"]);
        assert!(Submission::from_json(&body).is_ok());

        for bad in [json!(7), json!({"item": "knife"}), json!(["knife", 3]), json!(true)] {
            body["forbidden_staff"] = bad;
            assert_eq!(
                Submission::from_json(&body).unwrap_err(),
                ValidationError::InvalidForbiddenStaff
            );
        }
    }

    #[test]
    fn test_non_string_attributes_are_accepted() {
        let mut body = payload();
        body["height"] = json!(170);
        body["phone_number"] = json!(123);
        body["status"] = json!(["ok", "checked"]);

        let sub = Submission::from_json(&body).unwrap();
        assert_eq!(sub.height, json!(170));
        assert_eq!(sub.phone_number, json!(123));
        assert_eq!(serde_json::to_value(&sub).unwrap()["status"], json!(["ok", "checked"]));
    }

    #[test]
    fn test_identity_and_decision_types() {
        let mut body = payload();
        body["birth_date"] = json!(19900101);
        assert!(matches!(
            Submission::from_json(&body),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "birth_date"
        ));

        let mut body = payload();
        body["allowed"] = json!("yes");
        assert!(matches!(
            Submission::from_json(&body),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "allowed"
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            Submission::from_json(&json!([1, 2, 3])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }
}
