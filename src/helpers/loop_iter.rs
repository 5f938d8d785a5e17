use tracing::warn;

use crate::query::{QueryError, QuerySet};

type Cursor<'a, Item> = Box<dyn Iterator<Item = Item> + 'a>;

/// Repeats a queryset forever by starting a fresh pass whenever the current
/// one runs out.
///
/// Construction fails on an empty queryset. Should the queryset become empty
/// later on, the iterator ends instead of looking for a record forever.
pub struct LoopIter<'a, Q: QuerySet> {
    qs: &'a Q,
    cursor: Cursor<'a, Q::Item>,
}

impl<'a, Q: QuerySet> LoopIter<'a, Q> {
    pub fn new(qs: &'a Q) -> Result<Self, QueryError> {
        if qs.iter().next().is_none() {
            return Err(QueryError::EmptyCollection);
        }
        Ok(Self {
            qs,
            cursor: Box::new(qs.iter()),
        })
    }
}

impl<Q: QuerySet> Iterator for LoopIter<'_, Q> {
    type Item = Q::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.cursor.next() {
            return Some(record);
        }
        self.cursor = Box::new(self.qs.iter());
        let record = self.cursor.next();
        if record.is_none() {
            warn!(msg = format!("The looped queryset became empty, stopping."));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use itertools::Itertools;

    use crate::{
        query::Filter,
        records::Records,
        tests::lib_impls::{people, TestStruct},
    };

    use super::*;

    /// Hands out its rows for the first `full_passes` passes only.
    struct Draining {
        rows: Vec<TestStruct>,
        full_passes: usize,
        passes: Cell<usize>,
    }

    impl Draining {
        fn new(rows: Vec<TestStruct>, full_passes: usize) -> Self {
            Self {
                rows,
                full_passes,
                passes: Cell::new(0),
            }
        }
    }

    impl QuerySet for Draining {
        type Item = TestStruct;

        fn iter(&self) -> impl Iterator<Item = TestStruct> + '_ {
            let pass = self.passes.get();
            self.passes.set(pass + 1);
            let take = if pass < self.full_passes { self.rows.len() } else { 0 };
            self.rows.iter().take(take).cloned()
        }

        fn filter(&self, filter: Filter<TestStruct>) -> Self {
            let rows = self.rows.iter().filter(|row| filter.apply(row)).cloned().collect_vec();
            Self::new(rows, self.full_passes)
        }

        fn slice(&self, start: usize, end: Option<usize>) -> Self {
            let end = end.unwrap_or(self.rows.len()).min(self.rows.len());
            Self::new(self.rows[start.min(end)..end].to_vec(), self.full_passes)
        }
    }

    #[test]
    fn loops_in_collection_order() {
        let qs = people();
        let keys = LoopIter::new(&qs).unwrap().take(12).map(|p| p.key).collect_vec();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 1, 2, 3, 4, 5, 1, 2]);
    }

    #[test]
    fn single_record_repeats() {
        let qs = people().filter(Filter::exact("name", "dora"));
        assert!(LoopIter::new(&qs).unwrap().take(4).all(|p| p.key == 4));
    }

    #[test]
    fn empty_collection_is_an_error() {
        let qs = Records::<TestStruct>::new(vec![]);
        assert_eq!(LoopIter::new(&qs).err(), Some(QueryError::EmptyCollection));
    }

    #[test]
    fn stops_when_the_collection_empties() {
        // one pass for the emptiness check, one for the first cursor
        let qs = Draining::new(people().iter().collect_vec(), 2);
        let keys = LoopIter::new(&qs).unwrap().take(12).map(|p| p.key).collect_vec();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    }
}
