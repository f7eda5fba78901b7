//! Payload validation.
//!
//! A [`ValidationEngine`] checks a decoded JSON value against a [`Schema`]
//! and reports issues. [`SchemaValidator`] binds a schema and an engine to a
//! typed payload, so callers only ever see a typed value or a
//! [`ValidationError`], whichever engine is installed.
//!
//! Two engines ship with the crate:
//! - [`StructuralEngine`] reports every issue in document order (default).
//! - [`FailFastEngine`] stops at the first issue.

use crate::error::{MissingValue, PathSegment, ValidationError, ValidationIssue};
use crate::schema::{JsonKind, Schema};
use crate::slots::Slots;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Checks JSON values against schemas.
pub trait ValidationEngine: Send + Sync {
    /// Returns every issue this engine reports for `value`. Empty means valid.
    fn check(&self, schema: &Schema, value: &Value) -> Vec<ValidationIssue>;
}

/// Walks the whole value and reports all issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEngine;

impl ValidationEngine for StructuralEngine {
    fn check(&self, schema: &Schema, value: &Value) -> Vec<ValidationIssue> {
        let mut walker = Walker::new(false);
        let _ = walker.walk(schema, Some(value));
        walker.issues
    }
}

/// Reports only the first issue found.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFastEngine;

impl ValidationEngine for FailFastEngine {
    fn check(&self, schema: &Schema, value: &Value) -> Vec<ValidationIssue> {
        let mut walker = Walker::new(true);
        let _ = walker.walk(schema, Some(value));
        walker.issues
    }
}

struct Walker {
    fail_fast: bool,
    path: Vec<PathSegment>,
    issues: Vec<ValidationIssue>,
}

impl Walker {
    fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            path: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn report(&mut self, message: String) -> ControlFlow<()> {
        self.issues
            .push(ValidationIssue::new(self.path.clone(), message));
        if self.fail_fast {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn mismatch(&mut self, schema: &Schema, value: &Value) -> ControlFlow<()> {
        let expected = schema
            .expected_kind()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "value".into());
        self.report(format!(
            "Expected {expected}, received {}",
            JsonKind::of(value)
        ))
    }

    fn walk(&mut self, schema: &Schema, value: Option<&Value>) -> ControlFlow<()> {
        let Some(value) = value else {
            if schema.accepts_absent() {
                return ControlFlow::Continue(());
            }
            return self.report("Required".into());
        };

        match (schema, value) {
            (Schema::Any, _) => ControlFlow::Continue(()),
            (Schema::String, Value::String(_)) => ControlFlow::Continue(()),
            (Schema::NonEmptyString, Value::String(text)) => {
                if text.is_empty() {
                    self.report("String must contain at least 1 character(s)".into())
                } else {
                    ControlFlow::Continue(())
                }
            }
            (Schema::Array(item), Value::Array(items)) => {
                for (index, element) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    let flow = self.walk(item, Some(element));
                    self.path.pop();
                    flow?;
                }
                ControlFlow::Continue(())
            }
            (Schema::Object(fields), Value::Object(map)) => {
                for (name, field) in fields {
                    self.path.push(PathSegment::Key((*name).to_string()));
                    let flow = self.walk(field, map.get(*name));
                    self.path.pop();
                    flow?;
                }
                ControlFlow::Continue(())
            }
            _ => self.mismatch(schema, value),
        }
    }
}

/// Validates raw JSON into a typed payload.
///
/// `validate` is a pure function of the schema and the input. `stage` and
/// `get_value` let one pipeline stage validate and a later stage of the same
/// request read the result without re-parsing the body.
pub struct SchemaValidator<T> {
    schema: Schema,
    engine: Arc<dyn ValidationEngine>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> SchemaValidator<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a validator using the [`StructuralEngine`].
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            engine: Arc::new(StructuralEngine),
            _payload: PhantomData,
        }
    }

    /// Replaces the validation engine.
    pub fn with_engine(mut self, engine: Arc<dyn ValidationEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Validates `raw` and decodes it into `T`.
    pub fn validate(&self, raw: &Value) -> Result<T, ValidationError> {
        let issues = self.engine.check(&self.schema, raw);
        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        // The schema passed; a decode failure here means schema and type disagree.
        serde_json::from_value(raw.clone()).map_err(|e| ValidationError::root(e.to_string()))
    }

    /// Validates `raw` and stores the typed value in `slots`.
    pub fn stage(&self, slots: &mut Slots, raw: &Value) -> Result<(), ValidationError> {
        let value = self.validate(raw)?;
        slots.insert(value);
        Ok(())
    }

    /// Returns the value an earlier [`stage`](Self::stage) call stored.
    pub fn get_value<'a>(&self, slots: &'a Slots) -> Result<&'a T, MissingValue> {
        slots.get::<T>().ok_or(MissingValue(type_name::<T>()))
    }
}

impl<T> Clone for SchemaValidator<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            engine: Arc::clone(&self.engine),
            _payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for SchemaValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("payload", &type_name::<T>())
            .field("schema", &self.schema)
            .finish()
    }
}
