//! # lingua-data-sqlx: SQLx backend for the Lingua translation engine
//!
//! Implements `lingua_data::Storage` and `lingua_data::Session` on top of
//! [SQLx](https://github.com/launchbadge/sqlx) pools, so translated entities
//! can be loaded, saved, deleted and queried against a real database.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxStorage`] | Storage wrapper holding an `sqlx::Pool<DB>` |
//! | [`SqlxSession`] | A transaction or pooled connection; rolls back on drop |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//!
//! # Quick start
//!
//! ```ignore
//! use lingua_data::prelude::*;
//! use lingua_data_sqlx::SqliteStorage;
//!
//! let storage = SqliteStorage::new(SqlitePool::connect("sqlite::memory:").await?);
//!
//! let mut post = Translated::new(Post::default(), &ctx);
//! let mut session = storage.begin().await?;
//! post.translate_or_new(&mut session, "en").await?.set("title", "Hello");
//! post.save_with(&mut session).await?;
//! session.commit().await?;
//! ```
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead.

pub mod error;
pub mod storage;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{SqlxErrorExt, SqlxResult};
pub use storage::{SqlxSession, SqlxStorage};

#[cfg(feature = "postgres")]
pub use postgres::{PgSession, PgStorage};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteSession, SqliteStorage};

/// Re-exports of the most commonly used types from both `lingua-data` and this crate.
pub mod prelude {
    pub use crate::{SqlxErrorExt, SqlxSession, SqlxStorage};
    pub use lingua_data::prelude::*;
}
