//! Ordered validation schemas.
//!
//! A schema is a list of fields; each field is a list of steps. Fields are
//! checked in declaration order and steps within a field run in order, so the
//! first failing step decides the message the caller sees.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Validation failure carrying the first violated rule's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub field: String,
    pub message: String,
}

impl Rejection {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}

type TransformFn = Box<dyn Fn(&str) -> String + Send + Sync>;
type PredicateFn = Box<dyn Fn(&str) -> bool + Send + Sync>;

enum Step {
    Transform(TransformFn),
    Check(PredicateFn, String),
}

/// One declared input field.
pub struct Field {
    name: String,
    required: Option<String>,
    steps: Vec<Step>,
}

impl Field {
    /// Field that must be present and non-empty.
    pub fn required(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Some(message.into()),
            steps: Vec::new(),
        }
    }

    /// Field that may be absent. Present values still run every step.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: None,
            steps: Vec::new(),
        }
    }

    /// Append a normalizing transform.
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.steps.push(Step::Transform(Box::new(f)));
        self
    }

    /// Append a predicate with the message reported when it fails.
    pub fn check<P>(mut self, predicate: P, message: impl Into<String>) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.steps.push(Step::Check(Box::new(predicate), message.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run this field's steps over a single raw string.
    pub fn apply(&self, raw: &str) -> Result<String, Rejection> {
        if let Some(message) = &self.required {
            if raw.is_empty() {
                return Err(Rejection::new(&self.name, message));
            }
        }

        let mut value = raw.to_string();
        for step in &self.steps {
            match step {
                Step::Transform(f) => value = f(&value),
                Step::Check(predicate, message) => {
                    if !predicate(&value) {
                        return Err(Rejection::new(&self.name, message));
                    }
                }
            }
        }
        Ok(value)
    }
}

/// Ordered set of fields.
#[derive(Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate a JSON object, returning normalized values or the first failure.
    ///
    /// Unknown keys are ignored. A non-object payload is treated as empty.
    pub fn validate(&self, raw: &Value) -> Result<Validated, Rejection> {
        let object = raw.as_object();
        let mut values = BTreeMap::new();

        for field in &self.fields {
            let raw_value = object.and_then(|o| o.get(field.name()));
            let text = match raw_value {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(_) => {
                    return Err(Rejection::new(
                        field.name(),
                        format!("{} must be a string", field.name()),
                    ))
                }
            };

            match text {
                Some(text) => {
                    let normalized = field.apply(&text)?;
                    values.insert(field.name().to_string(), normalized);
                }
                None => {
                    if let Some(message) = &field.required {
                        return Err(Rejection::new(field.name(), message));
                    }
                }
            }
        }

        Ok(Validated { values })
    }
}

/// Normalized field values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    values: BTreeMap<String, String>,
}

impl Validated {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a field the schema declared as required.
    pub fn require(&self, name: &str) -> Result<&str, Rejection> {
        self.get(name)
            .ok_or_else(|| Rejection::new(name, format!("{name} is required")))
    }

    /// Parse a present field into `T`.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, Rejection> {
        match self.get(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Rejection::new(name, format!("{name} is invalid"))),
            None => Ok(None),
        }
    }

    /// Parse a required field into `T`.
    pub fn value<T: FromStr>(&self, name: &str) -> Result<T, Rejection> {
        self.parse(name)?
            .ok_or_else(|| Rejection::new(name, format!("{name} is required")))
    }

    /// Move a present field out as an owned string.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }
}
