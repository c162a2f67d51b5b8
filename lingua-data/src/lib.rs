//! # lingua-data
//!
//! The translation engine: translatable entities, per-locale translation
//! records with dirty tracking, locale resolution with fallback, the save and
//! delete lifecycle, and query scopes over translated fields.
//!
//! Storage is abstract ([`Storage`] / [`Session`]); `lingua-data-sqlx`
//! provides the SQLx implementation.

pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod query;
mod resolver;
pub mod scope;
pub mod set;
pub mod store;
pub mod translated;
pub mod translation;
pub mod value;

#[cfg(test)]
mod testing;

pub use entity::{Entity, Translatable};
pub use error::DataError;
pub use lifecycle::TranslationLifecycle;
pub use query::{Dialect, IdentifierPolicy, QueryBuilder, QueryError};
pub use scope::{SortDirection, TranslatedQuery};
pub use set::{LoadState, Slot, TranslationSet};
pub use store::{Session, Storage};
pub use translated::{Resolved, Translated};
pub use translation::{FieldMap, Translation};
pub use value::{Record, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        DataError, Entity, Record, Resolved, Session, SortDirection, Storage, Translatable,
        Translated, TranslatedQuery, Translation, TranslationLifecycle, Value,
    };
}
