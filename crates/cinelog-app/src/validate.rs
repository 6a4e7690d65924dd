//! Strict normalization of JSON request bodies.
//!
//! The body is taken as an untyped JSON object. Every key must be a known
//! field, values are coerced to the field type (numbers may come as strings)
//! and the garde rules of the target type are checked afterwards. All problems
//! are collected, so the client gets the complete list in one response.

use std::ops::{Deref, DerefMut};

use axum::extract::{FromRequest, Request};
use axum::Json;
use cinelog_dal::movie::{CreateMovie, UpdateMovie};
use garde::Validate;
use serde_json::{Map, Value};

use crate::error::{ApiError, Violations};

type Fields = Map<String, Value>;

/// Types that can be built from an untyped field map
pub trait FromFields: Sized {
    fn from_fields(fields: Fields) -> Result<Self, Violations>;
}

/// Extractor for a JSON object body normalized into `T`.
///
/// Rejects with 400 when the body is not a JSON object or when any field
/// violates its rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict<T>(pub T);

impl<T> Deref for Strict<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Strict<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Strict<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Strict<T>
where
    S: Send + Sync,
    T: FromFields,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
        match value {
            Value::Object(fields) => T::from_fields(fields)
                .map(Strict)
                .map_err(ApiError::InvalidInput),
            _ => Err(ApiError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

// (struct field, wire name)
const MOVIE_FIELDS: &[(&str, &str)] = &[
    ("title", "title"),
    ("description", "description"),
    ("release_year", "releaseYear"),
    ("director", "director"),
    ("genre", "genre"),
    ("rating", "rating"),
    ("duration", "duration"),
    ("poster_url", "posterUrl"),
];

fn wire_name(field: &str) -> &str {
    MOVIE_FIELDS
        .iter()
        .find(|(name, wire)| *name == field || *wire == field)
        .map(|(_, wire)| *wire)
        .unwrap_or(field)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text(field: &str, value: Value, violations: &mut Violations) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Null => {
            violations.push(field, "must not be null");
            None
        }
        other => {
            violations.push(
                field,
                format!("must be a string, got {}", type_name(&other)),
            );
            None
        }
    }
}

fn optional_text(field: &str, value: Value, violations: &mut Violations) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        other => text(field, other, violations).map(Some),
    }
}

fn integer(field: &str, value: Value, violations: &mut Violations) -> Option<i32> {
    let number = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null => {
            violations.push(field, "must not be null");
            return None;
        }
        _ => None,
    };
    match number {
        Some(n) => match i32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                violations.push(field, format!("{n} is out of range"));
                None
            }
        },
        None => {
            violations.push(
                field,
                format!("must be an integer, got {}", type_name(&value)),
            );
            None
        }
    }
}

fn real(field: &str, value: Value, violations: &mut Violations) -> Option<f64> {
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Null => {
            violations.push(field, "must not be null");
            return None;
        }
        _ => None,
    };
    if number.is_none() {
        violations.push(
            field,
            format!("must be a number, got {}", type_name(&value)),
        );
    }
    number
}

/// Collects all supplied fields, anything not listed is rejected
fn movie_draft(fields: Fields, violations: &mut Violations) -> UpdateMovie {
    let mut draft = UpdateMovie::default();
    for (key, value) in fields {
        match key.as_str() {
            "title" => draft.title = text(&key, value, violations),
            "description" => draft.description = text(&key, value, violations),
            "releaseYear" => draft.release_year = integer(&key, value, violations),
            "director" => draft.director = text(&key, value, violations),
            "genre" => draft.genre = text(&key, value, violations),
            "rating" => draft.rating = real(&key, value, violations),
            "duration" => draft.duration = integer(&key, value, violations),
            "posterUrl" => draft.poster_url = optional_text(&key, value, violations),
            _ => violations.push(key, "unknown field"),
        }
    }
    draft
}

/// Runs the garde rules of `V`, reporting violations under wire names
fn check_rules<V>(value: &V, violations: &mut Violations)
where
    V: Validate<Context = ()>,
{
    if let Err(report) = value.validate() {
        for (path, error) in report.iter() {
            let path = path.to_string();
            let field = path.split(['.', '[']).next().unwrap_or_default();
            violations.push(wire_name(field), error.message());
        }
    }
}

impl FromFields for UpdateMovie {
    fn from_fields(fields: Fields) -> Result<Self, Violations> {
        let mut violations = Violations::default();
        let draft = movie_draft(fields, &mut violations);
        check_rules(&draft, &mut violations);
        if violations.is_empty() {
            Ok(draft)
        } else {
            Err(violations)
        }
    }
}

impl FromFields for CreateMovie {
    fn from_fields(fields: Fields) -> Result<Self, Violations> {
        let mut violations = Violations::default();
        let draft = movie_draft(fields, &mut violations);
        match CreateMovie::try_from(draft.clone()) {
            Ok(movie) => {
                check_rules(&movie, &mut violations);
                if violations.is_empty() {
                    Ok(movie)
                } else {
                    Err(violations)
                }
            }
            Err(missing) => {
                // supplied fields are still checked, so all problems come at once
                check_rules(&draft, &mut violations);
                for field in missing {
                    let field = wire_name(field);
                    // already reported as having a wrong value
                    if !violations.contains(field) {
                        violations.push(field, "is required");
                    }
                }
                Err(violations)
            }
        }
    }
}
