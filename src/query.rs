//! Contains the queryset capability set and everything needed to describe a
//! query: filters, lookups and their errors.

use std::{collections::HashMap, error::Error, fmt::Display, sync::Arc};

use itertools::Itertools;

use crate::{
    value::{FieldValue, Row},
    Record,
};

pub type Predicate<Value> = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// An ordered list of `field = value` pairs. A record matches when every
/// named field holds the given value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lookup(Vec<(String, FieldValue)>);

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.iter()
            .all(|(name, value)| record.field(name).is_some_and(|field| field.eq(value)))
    }

    /// Fails with the first name that is not part of the schema of `R`.
    pub fn check<R: Record>(&self) -> Result<(), QueryError> {
        self.iter().try_for_each(|(name, _)| check_field::<R>(name))
    }
}

impl<N: Into<String>, V: Into<FieldValue>> FromIterator<(N, V)> for Lookup {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect_vec(),
        )
    }
}

#[derive(Clone)]
pub enum Filter<Value> {
    All,
    Exact(Lookup),
    Predicate(Predicate<Value>),
}

impl<Value: Record> Filter<Value> {
    pub fn apply(&self, value: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Exact(lookup) => lookup.matches(value),
            Self::Predicate(predicate) => predicate(value),
        }
    }

    pub fn exact(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Exact(Lookup::new().field(name, value))
    }

    pub fn predicate<T: Fn(&Value) -> bool + Send + Sync + 'static>(pred: T) -> Self {
        Self::Predicate(Arc::new(pred))
    }
}

impl<Value> From<Lookup> for Filter<Value> {
    fn from(value: Lookup) -> Self {
        Self::Exact(value)
    }
}

impl<Value> Display for Filter<Value> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::All => String::from("All"),
                Self::Exact(lookup) => format!("Exact({})", lookup.len()),
                Self::Predicate(_) => String::from("Predicate"),
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    NotFound,
    MultipleFound(usize),
    UnknownField(String),
    UnknownKey(String),
    EmptyCollection,
}

impl Display for QueryError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(fmt, "no record matches the lookup"),
            Self::MultipleFound(count) => {
                write!(fmt, "lookup matched {count} records, expected exactly one")
            }
            Self::UnknownField(name) => write!(fmt, "unknown field [{name}]"),
            Self::UnknownKey(key) => write!(fmt, "key [{key}] is not part of this mapping"),
            Self::EmptyCollection => write!(fmt, "the collection is empty"),
        }
    }
}

impl Error for QueryError {}

pub fn check_field<R: Record>(name: &str) -> Result<(), QueryError> {
    if R::fields().contains(&name) {
        Ok(())
    } else {
        Err(QueryError::UnknownField(String::from(name)))
    }
}

/// A lazy, re-iterable and filterable ordered collection of records.
///
/// Only [`iter`](QuerySet::iter), [`filter`](QuerySet::filter) and
/// [`slice`](QuerySet::slice) have to be provided. Every other operation is
/// expressed through fresh passes over `iter`, which an implementation backed
/// by a real database may override with something cheaper.
pub trait QuerySet: Sized {
    type Item: Record;

    /// A fresh pass over the collection. Every call starts from the beginning.
    fn iter(&self) -> impl Iterator<Item = Self::Item> + '_;

    fn filter(&self, filter: Filter<Self::Item>) -> Self;

    /// Restricts the collection to the positions `start..end`, counted after
    /// filtering. `None` leaves the end open.
    fn slice(&self, start: usize, end: Option<usize>) -> Self;

    /// Whether the result cache has been populated.
    fn is_evaluated(&self) -> bool {
        false
    }

    fn get(&self, lookup: &Lookup) -> Result<Self::Item, QueryError> {
        lookup.check::<Self::Item>()?;
        let mut matches = self.iter().filter(|record| lookup.matches(record));
        let first = matches.next().ok_or(QueryError::NotFound)?;
        match matches.count() {
            0 => Ok(first),
            more => Err(QueryError::MultipleFound(more + 1)),
        }
    }

    /// The record with the greatest value in `field`. Ties go to the record
    /// that comes last.
    fn latest(&self, field: &str) -> Result<Self::Item, QueryError> {
        check_field::<Self::Item>(field)?;
        self.iter()
            .max_by_key(|record| record.field(field).unwrap_or(FieldValue::Null))
            .ok_or(QueryError::NotFound)
    }

    fn values_list(
        &self,
        field: &str,
    ) -> Result<impl Iterator<Item = FieldValue> + '_, QueryError> {
        check_field::<Self::Item>(field)?;
        let field = String::from(field);
        Ok(self
            .iter()
            .map(move |record| record.field(&field).unwrap_or(FieldValue::Null)))
    }

    fn values(&self) -> impl Iterator<Item = Row> + '_ {
        self.iter().map(|record| record.serialize())
    }

    /// Number of records per distinct non-null value of `field`, in order of
    /// first appearance.
    fn aggregate_count(&self, field: &str) -> Result<Vec<(FieldValue, usize)>, QueryError> {
        let values = self.values_list(field)?.filter(|value| !value.is_null()).collect_vec();
        let counts = values.iter().counts();
        Ok(values
            .iter()
            .unique()
            .map(|value| (value.clone(), counts[value]))
            .collect_vec())
    }

    /// For each record, the number of records sharing its value of `field`.
    /// Records holding null count as zero.
    fn annotate_count(
        &self,
        field: &str,
    ) -> Result<impl Iterator<Item = usize> + '_, QueryError> {
        let counts: HashMap<FieldValue, usize> =
            self.aggregate_count(field)?.into_iter().collect();
        Ok(self.values_list(field)?.map(move |value| {
            counts.get(&value).copied().unwrap_or_default()
        }))
    }
}
