use sqlx::pool::PoolConnection;
use sqlx::{Database, Pool, Transaction};

/// [`Storage`](lingua_data::Storage) over an `sqlx::Pool<DB>`.
///
/// # Example
///
/// ```ignore
/// let storage = SqlxStorage::new(SqlitePool::connect("sqlite::memory:").await?);
/// post.save(&storage).await?;
/// ```
pub struct SqlxStorage<DB: Database> {
    pool: Pool<DB>,
}

impl<DB: Database> SqlxStorage<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }
}

impl<DB: Database> Clone for SqlxStorage<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

pub(crate) enum Inner<DB: Database> {
    Transaction(Transaction<'static, DB>),
    Connection(PoolConnection<DB>),
}

/// A [`Session`](lingua_data::Session) holding either a transaction or a
/// pooled connection.
///
/// Dropping a transactional session without committing rolls it back.
pub struct SqlxSession<DB: Database> {
    pub(crate) inner: Inner<DB>,
}

impl<DB: Database> SqlxSession<DB> {
    pub fn from_transaction(tx: Transaction<'static, DB>) -> Self {
        Self {
            inner: Inner::Transaction(tx),
        }
    }

    pub fn from_connection(conn: PoolConnection<DB>) -> Self {
        Self {
            inner: Inner::Connection(conn),
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self.inner, Inner::Transaction(_))
    }

    /// Returns a mutable reference to the underlying connection.
    pub fn as_mut(&mut self) -> &mut <DB as Database>::Connection {
        match &mut self.inner {
            Inner::Transaction(tx) => &mut **tx,
            Inner::Connection(conn) => &mut **conn,
        }
    }
}

/// Implements `Storage` and `Session` for one concrete SQLx database.
///
/// The backend module provides `bind(query, &Value)` and
/// `decode_row(&Row) -> Result<Record, DataError>`.
macro_rules! impl_backend {
    ($db:ty, $dialect:expr) => {
        impl lingua_data::Session for $crate::storage::SqlxSession<$db> {
            fn dialect(&self) -> lingua_data::Dialect {
                $dialect
            }

            async fn fetch_all(
                &mut self,
                sql: &str,
                params: &[lingua_data::Value],
            ) -> Result<Vec<lingua_data::Record>, lingua_data::DataError> {
                tracing::trace!(sql, params = params.len(), "fetch");
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind(query, value);
                }
                let rows = query
                    .fetch_all(self.as_mut())
                    .await
                    .map_err($crate::SqlxErrorExt::into_data_error)?;
                rows.iter().map(decode_row).collect()
            }

            async fn execute(
                &mut self,
                sql: &str,
                params: &[lingua_data::Value],
            ) -> Result<u64, lingua_data::DataError> {
                tracing::trace!(sql, params = params.len(), "execute");
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind(query, value);
                }
                let result = query
                    .execute(self.as_mut())
                    .await
                    .map_err($crate::SqlxErrorExt::into_data_error)?;
                Ok(result.rows_affected())
            }

            async fn insert(
                &mut self,
                sql: &str,
                params: &[lingua_data::Value],
            ) -> Result<i64, lingua_data::DataError> {
                use sqlx::Row;

                tracing::trace!(sql, params = params.len(), "insert");
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind(query, value);
                }
                let row = query
                    .fetch_one(self.as_mut())
                    .await
                    .map_err($crate::SqlxErrorExt::into_data_error)?;
                row.try_get::<i64, _>(0)
                    .map_err($crate::SqlxErrorExt::into_data_error)
            }

            async fn commit(self) -> Result<(), lingua_data::DataError> {
                match self.inner {
                    $crate::storage::Inner::Transaction(tx) => tx
                        .commit()
                        .await
                        .map_err($crate::SqlxErrorExt::into_data_error),
                    $crate::storage::Inner::Connection(_) => Ok(()),
                }
            }
        }

        impl lingua_data::Storage for $crate::storage::SqlxStorage<$db> {
            type Session = $crate::storage::SqlxSession<$db>;

            fn dialect(&self) -> lingua_data::Dialect {
                $dialect
            }

            async fn begin(&self) -> Result<Self::Session, lingua_data::DataError> {
                let tx = self
                    .pool()
                    .begin()
                    .await
                    .map_err($crate::SqlxErrorExt::into_data_error)?;
                Ok($crate::storage::SqlxSession::from_transaction(tx))
            }

            async fn session(&self) -> Result<Self::Session, lingua_data::DataError> {
                let conn = self
                    .pool()
                    .acquire()
                    .await
                    .map_err($crate::SqlxErrorExt::into_data_error)?;
                Ok($crate::storage::SqlxSession::from_connection(conn))
            }
        }
    };
}

pub(crate) use impl_backend;
