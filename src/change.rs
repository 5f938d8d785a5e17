//! Contains everything related to writing into records: the values assigned to
//! attributes and the errors a write can produce.

use std::{error::Error, fmt::Display, sync::Arc};

use crate::{query::QueryError, value::FieldValue, Record};

pub type Compute<Value> = Arc<dyn Fn(&Value) -> FieldValue + Send + Sync>;

/// The value given to an attribute: either a literal or a function computing
/// it from the record it is assigned to.
#[derive(Clone)]
pub enum AttrValue<Value> {
    Literal(FieldValue),
    Computed(Compute<Value>),
}

impl<Value> AttrValue<Value> {
    pub fn literal(value: impl Into<FieldValue>) -> Self {
        Self::Literal(value.into())
    }

    pub fn computed<T: Fn(&Value) -> FieldValue + Send + Sync + 'static>(func: T) -> Self {
        Self::Computed(Arc::new(func))
    }

    pub fn resolve(&self, record: &Value) -> FieldValue {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(func) => func(record),
        }
    }
}

impl<Value> From<FieldValue> for AttrValue<Value> {
    fn from(value: FieldValue) -> Self {
        Self::Literal(value)
    }
}

/// Writes every attribute in `attrs` into `record`, resolving computed values
/// against the record as it was before any of the writes.
pub(crate) fn apply_attrs<R: Record>(
    record: &mut R,
    attrs: &[(&str, AttrValue<R>)],
    only_if: impl Fn(&FieldValue) -> bool,
) -> Result<(), ChangeError> {
    let snapshot = record.clone();
    for (name, attr) in attrs {
        let current = snapshot
            .field(name)
            .ok_or_else(|| ChangeError::UnknownField(String::from(*name)))?;
        if only_if(&current) {
            record.set_field(name, attr.resolve(&snapshot))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeError {
    Unsupported(&'static str),
    UnknownField(String),
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    DuplicateKey(String),
    Query(QueryError),
}

impl Display for ChangeError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(operation) => write!(fmt, "[{operation}] is not supported"),
            Self::UnknownField(name) => write!(fmt, "unknown field [{name}]"),
            Self::TypeMismatch { field, expected } => {
                write!(fmt, "field [{field}] expects a value of type {expected}")
            }
            Self::DuplicateKey(key) => write!(fmt, "a record with key [{key}] already exists"),
            Self::Query(err) => write!(fmt, "{err}"),
        }
    }
}

impl Error for ChangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for ChangeError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}
