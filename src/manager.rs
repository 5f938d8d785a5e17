//! Model level access: the entry point that hands out querysets and persists
//! records.

use std::marker::PhantomData;

use itertools::Itertools;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    change::ChangeError,
    query::{Lookup, QueryError, QuerySet},
    records::Records,
    GetKey, KeyBounds, Record,
};

pub trait Manager {
    type Key: KeyBounds;
    type Item: Record + GetKey<Self::Key>;
    type QuerySet: QuerySet<Item = Self::Item>;

    fn all(&self) -> Self::QuerySet;

    /// Builds a record out of `fields`, persists it and returns it. Fails when
    /// a record with the same key is already stored.
    fn create(&mut self, fields: &Lookup) -> Result<Self::Item, ChangeError>;

    fn save(&mut self, record: &Self::Item) -> Result<(), ChangeError>;

    /// Returns the single record matching `lookup`, creating it from `lookup`
    /// and `defaults` when there is none. The flag is `true` when a record was
    /// created.
    fn get_or_create(
        &mut self,
        lookup: &Lookup,
        defaults: &Lookup,
    ) -> Result<(Self::Item, bool), ChangeError> {
        match self.all().get(lookup) {
            Ok(record) => Ok((record, false)),
            Err(QueryError::NotFound) => {
                defaults.check::<Self::Item>()?;
                let fields = lookup
                    .iter()
                    .chain(defaults.iter())
                    .map(|(name, value)| (name, value.clone()))
                    .collect::<Lookup>();
                Ok((self.create(&fields)?, true))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps records in insertion order. Saving a record whose key is already
/// present replaces it in place.
pub struct MemoryManager<Key, R> {
    uuid: Uuid,
    rows: Vec<R>,
    _key: PhantomData<Key>,
}

impl<Key, R> MemoryManager<Key, R>
where
    Key: KeyBounds,
    R: Record + GetKey<Key>,
{
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            rows,
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> Vec<&Key> {
        self.rows.iter().map(GetKey::key).collect_vec()
    }
}

impl<Key, R> Default for MemoryManager<Key, R>
where
    Key: KeyBounds,
    R: Record + GetKey<Key>,
{
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<Key, R> Manager for MemoryManager<Key, R>
where
    Key: KeyBounds,
    R: Record + GetKey<Key> + Default,
{
    type Key = Key;
    type Item = R;
    type QuerySet = Records<R>;

    fn all(&self) -> Records<R> {
        Records::new(self.rows.clone())
    }

    fn create(&mut self, fields: &Lookup) -> Result<R, ChangeError> {
        let mut record = R::default();
        for (name, value) in fields.iter() {
            record.set_field(name, value.clone())?;
        }
        if self.rows.iter().any(|row| row.key() == record.key()) {
            warn!(
                msg = format!("Refusing to create a second record with key [{:?}].", record.key()),
                manager = self.uuid.to_string()
            );
            return Err(ChangeError::DuplicateKey(format!("{:?}", record.key())));
        }
        self.save(&record)?;
        Ok(record)
    }

    fn save(&mut self, record: &R) -> Result<(), ChangeError> {
        match self.rows.iter().position(|row| row.key() == record.key()) {
            Some(index) => {
                debug!(
                    msg = format!("Replacing record with key [{:?}].", record.key()),
                    manager = self.uuid.to_string()
                );
                self.rows[index] = record.clone();
            }
            None => {
                debug!(
                    msg = format!("Inserting record with key [{:?}].", record.key()),
                    manager = self.uuid.to_string()
                );
                self.rows.push(record.clone());
            }
        }
        Ok(())
    }
}
