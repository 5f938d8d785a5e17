//! Convenience helpers layered on top of a queryset: a lazy, re-iterable and
//! filterable collection of records.
//!
//! ### Key Information
//! - A record type describes itself through the [`Record`] trait, listing its
//!     field names and exposing typed getters and setters. Nothing is found
//!     through reflection.
//! - The collection is anything implementing [`QuerySet`][crate::query::QuerySet].
//!     [`Records`][crate::records::Records] is the in-memory implementation
//!     shipped with this crate.
//! - The helpers in [`helpers`] are free functions that either delegate to the
//!     queryset or make a single lazy pass over it. Helpers returning an
//!     iterator do no work until it is consumed.
//! - [`html`] renders a queryset into a table or a definition list, escaping
//!     every value.
//!
//! ### Example
//!
//! ```
//! use queryset_juice::{helpers, FieldValue, Record, ChangeError, Records};
//!
//! #[derive(Clone)]
//! struct Point { x: i64 }
//!
//! impl Record for Point {
//!     fn fields() -> &'static [&'static str] { &["x"] }
//!     fn field(&self, name: &str) -> Option<FieldValue> {
//!         (name == "x").then(|| self.x.into())
//!     }
//!     fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ChangeError> {
//!         match (name, value) {
//!             ("x", FieldValue::Int(x)) => { self.x = x; Ok(()) }
//!             ("x", _) => Err(ChangeError::TypeMismatch { field: "x", expected: "int" }),
//!             (other, _) => Err(ChangeError::UnknownField(other.to_string())),
//!         }
//!     }
//! }
//!
//! let qs = Records::new(vec![Point { x: 1 }, Point { x: 2 }, Point { x: 2 }]);
//! let xs = helpers::pluck(&qs, "x", false).unwrap();
//! assert_eq!(xs.len(), 3);
//! ```

use std::{fmt::Debug, hash::Hash};

pub mod change;
pub mod helpers;
pub mod html;
pub mod manager;
pub mod query;
pub mod records;
mod utils;
pub mod value;

pub use change::{AttrValue, ChangeError};
pub use query::{Filter, Lookup, QueryError, QuerySet};
pub use records::Records;
pub use value::{FieldValue, Row};

/// Tie-break field used by [`helpers::get`] when none is given.
pub const DEFAULT_LATEST_FIELD: &str = "id";

/// The explicit schema of a record type.
pub trait Record: Clone {
    /// Field names in declaration order.
    fn fields() -> &'static [&'static str];

    /// `None` when `name` is not one of [`fields`](Record::fields).
    fn field(&self, name: &str) -> Option<FieldValue>;

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ChangeError>;

    fn serialize(&self) -> Row {
        Self::fields()
            .iter()
            .map(|name| (*name, self.field(name).unwrap_or(FieldValue::Null)))
            .collect()
    }
}

/// This trait defines how to get the `Key` out of a stored record.
pub trait GetKey<Key> {
    fn key(&self) -> &Key;
}

/// The `Trait`'s the `Key` type needs to implement
///
/// ```text
/// Self: Debug + Ord + Eq + Hash + Clone + Send + Sync + 'static,
/// ```
pub trait KeyBounds
where
    Self: Debug + Ord + Eq + Hash + Clone + Send + Sync + 'static,
{
}

impl<T> KeyBounds for T where T: Debug + Ord + Eq + Hash + Clone + Send + Sync + 'static {}
