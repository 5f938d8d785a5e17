//! The queryset helpers.
//!
//! Every helper takes the queryset by reference and either delegates to it or
//! makes one lazy pass over a fresh [`QuerySet::iter`]. Helpers returning an
//! iterator do nothing until it is consumed, and consuming it twice is not
//! possible: call the helper again for a new pass.

mod each;
mod juiced;
mod loop_iter;

use std::collections::HashSet;

use itertools::Itertools;
use tracing::debug;

use crate::{
    change::{apply_attrs, AttrValue, ChangeError},
    manager::Manager,
    query::{Filter, Lookup, QueryError, QuerySet},
    value::{FieldValue, Row},
    Record, DEFAULT_LATEST_FIELD,
};

pub use each::{each, each_async, each_spawned, EachTask, TaskError};
pub use juiced::JuicedDict;
pub use loop_iter::LoopIter;

pub fn aggregate_count<Q: QuerySet>(
    qs: &Q,
    field: &str,
) -> Result<Vec<(FieldValue, usize)>, QueryError> {
    qs.aggregate_count(field)
}

pub fn annotate_count<'a, Q: QuerySet>(
    qs: &'a Q,
    field: &'a str,
) -> Result<impl Iterator<Item = usize> + 'a, QueryError> {
    qs.annotate_count(field)
}

/// Tries to get the single record matching `lookup`. If more than one match,
/// the latest of them by `latest_field` (default [`DEFAULT_LATEST_FIELD`]) is
/// returned instead.
pub fn get<Q: QuerySet>(
    qs: &Q,
    latest_field: Option<&str>,
    lookup: &Lookup,
) -> Result<Q::Item, QueryError> {
    match qs.get(lookup) {
        Err(QueryError::MultipleFound(count)) => {
            let latest_field = latest_field.unwrap_or(DEFAULT_LATEST_FIELD);
            debug!(
                msg = format!(
                    "Lookup matched {count} records, falling back to the latest by [{latest_field}]."
                )
            );
            qs.filter(Filter::Exact(lookup.clone())).latest(latest_field)
        }
        result => result,
    }
}

pub fn is_evaluated<Q: QuerySet>(qs: &Q) -> bool {
    qs.is_evaluated()
}

/// Returns the result of `func` against every record.
pub fn map<'a, Q, T, F>(qs: &'a Q, func: F) -> impl Iterator<Item = T> + 'a
where
    Q: QuerySet,
    F: FnMut(Q::Item) -> T + 'a,
{
    qs.iter().map(func)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Plucked {
    Unique(HashSet<FieldValue>),
    All(Vec<FieldValue>),
}

impl Plucked {
    pub fn len(&self) -> usize {
        match self {
            Self::Unique(values) => values.len(),
            Self::All(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &FieldValue) -> bool {
        match self {
            Self::Unique(values) => values.contains(value),
            Self::All(values) => values.contains(value),
        }
    }

    /// Unique values come out sorted, the others in collection order.
    pub fn into_vec(self) -> Vec<FieldValue> {
        match self {
            Self::Unique(values) => values.into_iter().sorted().collect_vec(),
            Self::All(values) => values,
        }
    }
}

/// Returns `field` of every record, as a set when `unique` is given.
pub fn pluck<Q: QuerySet>(qs: &Q, field: &str, unique: bool) -> Result<Plucked, QueryError> {
    let values = qs.values_list(field)?;
    Ok(if unique {
        Plucked::Unique(values.collect())
    } else {
        Plucked::All(values.collect_vec())
    })
}

pub fn values<Q: QuerySet>(qs: &Q, field: &str, unique: bool) -> Result<Plucked, QueryError> {
    pluck(qs, field, unique)
}

/// Every ordered pair out of `one` and `two`. `two` is iterated again for
/// every record of `one`.
pub fn product<'a, A, B>(one: &'a A, two: &'a B) -> impl Iterator<Item = (A::Item, B::Item)> + 'a
where
    A: QuerySet,
    B: QuerySet,
{
    one.iter()
        .flat_map(move |a| two.iter().map(move |b| (a.clone(), b)))
}

/// Folds the records using the first one as the seed. `None` for an empty
/// queryset.
pub fn reduce<Q, F>(qs: &Q, func: F) -> Option<Q::Item>
where
    Q: QuerySet,
    F: FnMut(Q::Item, Q::Item) -> Q::Item,
{
    qs.iter().reduce(func)
}

pub fn fold<Q, T, F>(qs: &Q, init: T, func: F) -> T
where
    Q: QuerySet,
    F: FnMut(T, Q::Item) -> T,
{
    qs.iter().fold(init, func)
}

/// Pairs every distinct value of `field`, in order of first appearance, with
/// the queryset of records holding it.
pub fn groupby<'a, Q: QuerySet>(
    qs: &'a Q,
    field: &'a str,
) -> Result<impl Iterator<Item = (FieldValue, Q)> + 'a, QueryError> {
    Ok(qs.values_list(field)?.unique().map(move |value| {
        let group = qs.filter(Filter::exact(field, value.clone()));
        (value, group)
    }))
}

fn prefix_len<Q, P>(qs: &Q, predicate: P) -> usize
where
    Q: QuerySet,
    P: FnMut(&Q::Item) -> bool,
{
    qs.iter().take_while(predicate).count()
}

/// The records before the first one failing `predicate`.
pub fn takewhile<Q, P>(predicate: P, qs: &Q) -> Q
where
    Q: QuerySet,
    P: FnMut(&Q::Item) -> bool,
{
    qs.slice(0, Some(prefix_len(qs, predicate)))
}

/// The records from the first one failing `predicate` onwards.
pub fn dropwhile<Q, P>(predicate: P, qs: &Q) -> Q
where
    Q: QuerySet,
    P: FnMut(&Q::Item) -> bool,
{
    qs.slice(prefix_len(qs, predicate), None)
}

/// Loops over the queryset forever. Fails on an empty queryset.
pub fn cycle<Q: QuerySet>(qs: &Q) -> Result<LoopIter<'_, Q>, QueryError> {
    LoopIter::new(qs)
}

pub fn juice<'a, Q: QuerySet>(qs: &'a Q, fields: &[&str]) -> Result<JuicedDict<'a, Q>, QueryError> {
    JuicedDict::new(qs, fields)
}

pub fn serialize<Q: QuerySet>(qs: &Q) -> impl Iterator<Item = Row> + '_ {
    qs.values()
}

pub fn serialize_record<R: Record>(record: &R) -> Row {
    record.serialize()
}

/// Assigns every attribute of `attrs` on each record. Computed values get the
/// record as it was before the assignment.
pub fn season<'a, Q: QuerySet>(
    qs: &'a Q,
    attrs: &'a [(&'a str, AttrValue<Q::Item>)],
) -> impl Iterator<Item = Result<Q::Item, ChangeError>> + 'a {
    qs.iter()
        .map(move |mut record| -> Result<Q::Item, ChangeError> {
            apply_attrs(&mut record, attrs, |_| true)?;
            Ok(record)
        })
}

/// Like [`season`], but only fills attributes currently equal to `unset`.
pub fn supplement<'a, Q: QuerySet>(
    qs: &'a Q,
    unset: FieldValue,
    attrs: &'a [(&'a str, AttrValue<Q::Item>)],
) -> impl Iterator<Item = Result<Q::Item, ChangeError>> + 'a {
    qs.iter()
        .map(move |mut record| -> Result<Q::Item, ChangeError> {
            apply_attrs(&mut record, attrs, |current| current.eq(&unset))?;
            Ok(record)
        })
}

/// Stores `func(record)` into the `target` attribute of each record.
pub fn garnish<'a, Q, F>(
    qs: &'a Q,
    target: &'a str,
    func: F,
) -> impl Iterator<Item = Result<Q::Item, ChangeError>> + 'a
where
    Q: QuerySet,
    F: Fn(&Q::Item) -> FieldValue + 'a,
{
    qs.iter()
        .map(move |mut record| -> Result<Q::Item, ChangeError> {
            let value = func(&record);
            record.set_field(target, value)?;
            Ok(record)
        })
}

/// Gets or creates the record matching `lookup`. An existing record gets the
/// `defaults` written into it and saved.
pub fn update_or_create<M: Manager>(
    manager: &mut M,
    defaults: Option<&Lookup>,
    lookup: &Lookup,
) -> Result<(M::Item, bool), ChangeError> {
    let no_defaults = Lookup::new();
    let defaults = defaults.unwrap_or(&no_defaults);
    let (mut record, created) = manager.get_or_create(lookup, defaults)?;

    if !created && !defaults.is_empty() {
        for (name, value) in defaults.iter() {
            record.set_field(name, value.clone())?;
        }
        manager.save(&record)?;
        debug!(msg = format!("Updated existing record with {} defaults.", defaults.len()));
    }

    Ok((record, created))
}
