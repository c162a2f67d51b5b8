//! Fixtures shared by the unit tests: a `Post` entity and a scripted session.

use crate::entity::{require_bool, require_i64, Entity, Translatable};
use crate::error::DataError;
use crate::query::Dialect;
use crate::store::Session;
use crate::value::{Record, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub published: bool,
}

impl Post {
    pub const FIELDS: &'static [&'static str] = &["title", "content"];
}

pub fn post(id: Option<i64>) -> Post {
    Post {
        id,
        published: true,
    }
}

impl Entity for Post {
    fn type_name() -> &'static str {
        "Post"
    }

    fn table_name() -> &'static str {
        "posts"
    }

    fn columns() -> &'static [&'static str] {
        &["published"]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![self.published.into()]
    }

    fn from_record(record: &Record) -> Result<Self, DataError> {
        Ok(Post {
            id: Some(require_i64(record, "id")?),
            published: require_bool(record, "published")?,
        })
    }
}

impl Translatable for Post {
    fn translatable_fields() -> &'static [&'static str] {
        Post::FIELDS
    }
}

/// Answers every SELECT with the same rows and logs each statement.
#[derive(Debug, Default)]
pub struct MemorySession {
    rows: Vec<Record>,
    log: Vec<(String, Vec<Value>)>,
    fetches: usize,
    last_id: i64,
    fail: bool,
}

impl MemorySession {
    pub fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Keys handed out by `insert` continue after `id`.
    pub fn starting_at(mut self, id: i64) -> Self {
        self.last_id = id;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn statements(&self) -> Vec<&str> {
        self.log.iter().map(|(sql, _)| sql.as_str()).collect()
    }

    pub fn params(&self, idx: usize) -> &[Value] {
        &self.log[idx].1
    }

    fn record(&mut self, sql: &str, params: &[Value]) -> Result<(), DataError> {
        if self.fail {
            return Err(DataError::database(std::io::Error::other("connection lost")));
        }
        self.log.push((sql.to_string(), params.to_vec()));
        Ok(())
    }
}

impl Session for MemorySession {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DataError> {
        self.record(sql, params)?;
        self.fetches += 1;
        Ok(self.rows.clone())
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DataError> {
        self.record(sql, params)?;
        Ok(1)
    }

    async fn insert(&mut self, sql: &str, params: &[Value]) -> Result<i64, DataError> {
        self.record(sql, params)?;
        self.last_id += 1;
        Ok(self.last_id)
    }

    async fn commit(self) -> Result<(), DataError> {
        Ok(())
    }
}
