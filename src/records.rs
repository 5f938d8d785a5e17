//! The in-memory [`QuerySet`].

use std::{
    fmt::Debug,
    sync::{Arc, OnceLock},
};

use itertools::Itertools;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    query::{Filter, QuerySet},
    Record,
};

enum Stage<R> {
    Filter(Filter<R>),
    Slice(usize, Option<usize>),
}

impl<R: Clone> Clone for Stage<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Filter(filter) => Self::Filter(filter.clone()),
            Self::Slice(start, end) => Self::Slice(*start, *end),
        }
    }
}

/// A queryset over rows held in memory.
///
/// Filtering and slicing are recorded as stages and replayed on every pass,
/// so derived querysets share the source rows and never copy them. The result
/// cache stays empty until [`evaluate`](Records::evaluate) is called; after
/// that every pass reads from the cache.
pub struct Records<R: Record> {
    uuid: Uuid,
    source: Arc<Vec<R>>,
    stages: Vec<Stage<R>>,
    cache: OnceLock<Vec<R>>,
}

impl<R: Record> Records<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self::from_parts(Arc::new(rows), vec![])
    }

    fn from_parts(source: Arc<Vec<R>>, stages: Vec<Stage<R>>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source,
            stages,
            cache: OnceLock::new(),
        }
    }

    fn derive(&self, stage: Stage<R>) -> Self {
        let mut stages = self.stages.clone();
        stages.push(stage);
        Self::from_parts(self.source.clone(), stages)
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Populates the result cache, returning the cached rows.
    pub fn evaluate(&self) -> &[R] {
        self.cache.get_or_init(|| {
            let rows = self.run_stages().cloned().collect_vec();
            debug!(
                msg = format!("Evaluated queryset into {} rows.", rows.len()),
                qs = self.uuid.to_string()
            );
            rows
        })
    }

    pub fn len(&self) -> usize {
        match self.cache.get() {
            Some(rows) => rows.len(),
            None => self.run_stages().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn run_stages(&self) -> Box<dyn Iterator<Item = &R> + '_> {
        let rows: Box<dyn Iterator<Item = &R> + '_> = Box::new(self.source.iter());
        self.stages
            .iter()
            .fold(rows, |rows, stage| match stage {
                Stage::Filter(filter) => Box::new(rows.filter(move |row| filter.apply(row))),
                Stage::Slice(start, Some(end)) => {
                    Box::new(rows.skip(*start).take(end.saturating_sub(*start)))
                }
                Stage::Slice(start, None) => Box::new(rows.skip(*start)),
            })
    }
}

impl<R: Record> QuerySet for Records<R> {
    type Item = R;

    fn iter(&self) -> impl Iterator<Item = R> + '_ {
        let rows: Box<dyn Iterator<Item = &R> + '_> = match self.cache.get() {
            Some(rows) => Box::new(rows.iter()),
            None => self.run_stages(),
        };
        rows.cloned()
    }

    fn filter(&self, filter: Filter<R>) -> Self {
        trace!(
            msg = format!("Deriving queryset with filter [{filter}]."),
            qs = self.uuid.to_string()
        );
        self.derive(Stage::Filter(filter))
    }

    fn slice(&self, start: usize, end: Option<usize>) -> Self {
        trace!(
            msg = format!("Deriving queryset with slice [{start}..{end:?}]."),
            qs = self.uuid.to_string()
        );
        self.derive(Stage::Slice(start, end))
    }

    fn is_evaluated(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<R: Record> Clone for Records<R> {
    fn clone(&self) -> Self {
        Self::from_parts(self.source.clone(), self.stages.clone())
    }
}

impl<R: Record> Debug for Records<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("uuid", &self.uuid)
            .field("source", &self.source.len())
            .field("stages", &self.stages.len())
            .field("evaluated", &self.is_evaluated())
            .finish()
    }
}

impl<R: Record> FromIterator<R> for Records<R> {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect_vec())
    }
}

impl<R: Record> From<Vec<R>> for Records<R> {
    fn from(value: Vec<R>) -> Self {
        Self::new(value)
    }
}
