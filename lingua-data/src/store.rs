use std::future::Future;

use crate::error::DataError;
use crate::query::Dialect;
use crate::value::{Record, Value};

/// A unit of work against storage: a transaction or a plain connection.
///
/// Every translation operation runs its statements through one session, in
/// order. Dropping a transactional session without calling [`Session::commit`]
/// rolls it back.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait Session: Send {
    /// SQL dialect statements for this session must be built with.
    fn dialect(&self) -> Dialect;

    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    /// Execute a statement, returning the number of affected rows.
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Execute an INSERT ending in `RETURNING <key>` and return the generated key.
    fn insert(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<i64, DataError>> + Send;

    /// Make the session's writes durable. A no-op for non-transactional sessions.
    fn commit(self) -> impl Future<Output = Result<(), DataError>> + Send
    where
        Self: Sized;
}

/// A source of sessions, typically wrapping a connection pool.
pub trait Storage: Send + Sync {
    type Session: Session;

    fn dialect(&self) -> Dialect;

    /// Begin a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, DataError>> + Send;

    /// Acquire an autocommit session.
    fn session(&self) -> impl Future<Output = Result<Self::Session, DataError>> + Send;
}
