use crate::value::Value;

/// A fluent builder for the SELECT/INSERT/UPDATE/DELETE statements the
/// translation engine issues.
///
/// # Example
///
/// ```ignore
/// let (sql, params) = QueryBuilder::new("posts")
///     .join(JoinKind::Inner, "post_translations", "post_translations.post_id", "posts.id")
///     .join_filter("post_translations.locale", "en")
///     .where_like("post_translations.title", "%rust%")
///     .order_by("post_translations.title", true)
///     .limit(10)
///     .build_select()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Do not validate or quote identifiers.
    Raw,
    /// Validate identifiers against a conservative pattern.
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    Quote,
}

/// How a condition combines with the conditions before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    NotEq(String, Value),
    Like(String, String),
    Gt(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
    Group(Vec<(Connector, Condition)>),
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    left: String,
    right: String,
    filters: Vec<(String, Value)>,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    select: Vec<(String, Option<String>)>,
    joins: Vec<Join>,
    conditions: Vec<(Connector, Condition)>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

/// Accumulates SQL text and bind values with dialect-aware placeholders.
struct Statement {
    sql: String,
    params: Vec<Value>,
    dialect: Dialect,
}

impl Statement {
    fn new(sql: String, dialect: Dialect) -> Self {
        Self {
            sql,
            params: Vec::new(),
            dialect,
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Raw,
        }
    }

    /// Create a new builder with an explicit SQL dialect.
    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    /// Set the SQL dialect (affects placeholder style and quoting).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Configure identifier validation/quoting behavior.
    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a column to the select list. An empty list selects `*`.
    pub fn select(mut self, column: &str) -> Self {
        self.select.push((column.to_string(), None));
        self
    }

    pub fn select_as(mut self, column: &str, alias: &str) -> Self {
        self.select.push((column.to_string(), Some(alias.to_string())));
        self
    }

    /// Join `table` on `left = right`.
    pub fn join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            filters: Vec::new(),
        });
        self
    }

    /// Add an equality predicate to the ON clause of the most recent join.
    ///
    /// Does nothing when no join has been added.
    pub fn join_filter(mut self, column: &str, value: impl Into<Value>) -> Self {
        if let Some(join) = self.joins.last_mut() {
            join.filters.push((column.to_string(), value.into()));
        }
        self
    }

    pub fn has_join(&self, table: &str) -> bool {
        self.joins.iter().any(|j| j.table == table)
    }

    fn push(mut self, connector: Connector, condition: Condition) -> Self {
        self.conditions.push((connector, condition));
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(Connector::And, Condition::Eq(column.to_string(), value.into()))
    }

    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(Connector::Or, Condition::Eq(column.to_string(), value.into()))
    }

    pub fn where_not_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(Connector::And, Condition::NotEq(column.to_string(), value.into()))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push(
            Connector::And,
            Condition::Like(column.to_string(), pattern.to_string()),
        )
    }

    pub fn or_where_like(self, column: &str, pattern: &str) -> Self {
        self.push(
            Connector::Or,
            Condition::Like(column.to_string(), pattern.to_string()),
        )
    }

    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(Connector::And, Condition::Gt(column.to_string(), value.into()))
    }

    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push(Connector::And, Condition::Lt(column.to_string(), value.into()))
    }

    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.push(
            Connector::And,
            Condition::In(column.to_string(), values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push(Connector::And, Condition::IsNull(column.to_string()))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push(Connector::And, Condition::IsNotNull(column.to_string()))
    }

    /// AND the conditions of `group` with this builder's conditions.
    ///
    /// The group is parenthesized when both sides are non-empty and the group
    /// holds more than one condition, so an `OR` inside it stays inside it.
    pub fn where_group(mut self, group: QueryBuilder) -> Self {
        let mut conditions = group.conditions;
        if self.conditions.is_empty() {
            self.conditions = conditions;
        } else if conditions.len() == 1 {
            if let Some((_, cond)) = conditions.pop() {
                self.conditions.push((Connector::And, cond));
            }
        } else if !conditions.is_empty() {
            self.conditions
                .push((Connector::And, Condition::Group(conditions)));
        }
        self
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    pub fn build_select(&self) -> Result<(String, Vec<Value>), QueryError> {
        let columns = if self.select.is_empty() {
            "*".to_string()
        } else {
            let mut out = Vec::with_capacity(self.select.len());
            for (column, alias) in &self.select {
                let column = self.ident(column, true, "column")?;
                match alias {
                    Some(alias) => out.push(format!("{column} AS {}", self.alias(alias)?)),
                    None => out.push(column),
                }
            }
            out.join(", ")
        };
        let table = self.ident(&self.table, false, "table")?;
        let mut stmt = Statement::new(format!("SELECT {columns} FROM {table}"), self.dialect);
        self.append_joins(&mut stmt)?;
        self.append_where(&mut stmt)?;
        self.append_order(&mut stmt)?;
        self.append_limit_offset(&mut stmt);
        Ok(stmt.finish())
    }

    /// Build a COUNT query returning `(sql, bind_values)`.
    pub fn build_count(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut stmt = Statement::new(format!("SELECT COUNT(*) AS count FROM {table}"), self.dialect);
        self.append_joins(&mut stmt)?;
        self.append_where(&mut stmt)?;
        Ok(stmt.finish())
    }

    /// Build an INSERT of `columns`, optionally returning the generated key column.
    pub fn build_insert(
        &self,
        columns: &[(String, Value)],
        returning: Option<&str>,
    ) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut stmt = Statement::new(format!("INSERT INTO {table}"), self.dialect);
        if columns.is_empty() {
            stmt.sql.push_str(" DEFAULT VALUES");
        } else {
            let mut names = Vec::with_capacity(columns.len());
            let mut placeholders = Vec::with_capacity(columns.len());
            for (column, value) in columns {
                names.push(self.ident(column, false, "column")?);
                placeholders.push(stmt.bind(value.clone()));
            }
            stmt.sql.push_str(&format!(
                " ({}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            ));
        }
        if let Some(key) = returning {
            let key = self.ident(key, false, "column")?;
            stmt.sql.push_str(&format!(" RETURNING {key}"));
        }
        Ok(stmt.finish())
    }

    /// Build an UPDATE setting `columns` on the rows matching the conditions.
    pub fn build_update(&self, columns: &[(String, Value)]) -> Result<(String, Vec<Value>), QueryError> {
        if columns.is_empty() {
            return Err(QueryError::NoColumns);
        }
        let table = self.ident(&self.table, false, "table")?;
        let mut stmt = Statement::new(format!("UPDATE {table} SET "), self.dialect);
        let mut assignments = Vec::with_capacity(columns.len());
        for (column, value) in columns {
            let column = self.ident(column, false, "column")?;
            assignments.push(format!("{column} = {}", stmt.bind(value.clone())));
        }
        stmt.sql.push_str(&assignments.join(", "));
        self.append_where(&mut stmt)?;
        Ok(stmt.finish())
    }

    /// Build a DELETE of the rows matching the conditions.
    pub fn build_delete(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut stmt = Statement::new(format!("DELETE FROM {table}"), self.dialect);
        self.append_where(&mut stmt)?;
        Ok(stmt.finish())
    }

    fn append_joins(&self, stmt: &mut Statement) -> Result<(), QueryError> {
        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            let table = self.ident(&join.table, false, "table")?;
            let left = self.ident(&join.left, false, "column")?;
            let right = self.ident(&join.right, false, "column")?;
            stmt.sql
                .push_str(&format!(" {keyword} {table} ON {left} = {right}"));
            for (column, value) in &join.filters {
                let column = self.ident(column, false, "column")?;
                let placeholder = stmt.bind(value.clone());
                stmt.sql.push_str(&format!(" AND {column} = {placeholder}"));
            }
        }
        Ok(())
    }

    fn append_where(&self, stmt: &mut Statement) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        stmt.sql.push_str(" WHERE ");
        let clause = self.render_conditions(&self.conditions, stmt)?;
        stmt.sql.push_str(&clause);
        Ok(())
    }

    fn render_conditions(
        &self,
        conditions: &[(Connector, Condition)],
        stmt: &mut Statement,
    ) -> Result<String, QueryError> {
        let mut out = String::new();
        for (idx, (connector, cond)) in conditions.iter().enumerate() {
            if idx > 0 {
                out.push_str(match connector {
                    Connector::And => " AND ",
                    Connector::Or => " OR ",
                });
            }
            let clause = match cond {
                Condition::Eq(col, val) => {
                    let col = self.ident(col, false, "column")?;
                    format!("{col} = {}", stmt.bind(val.clone()))
                }
                Condition::NotEq(col, val) => {
                    let col = self.ident(col, false, "column")?;
                    format!("{col} != {}", stmt.bind(val.clone()))
                }
                Condition::Like(col, pat) => {
                    let col = self.ident(col, false, "column")?;
                    format!("{col} LIKE {}", stmt.bind(Value::Text(pat.clone())))
                }
                Condition::Gt(col, val) => {
                    let col = self.ident(col, false, "column")?;
                    format!("{col} > {}", stmt.bind(val.clone()))
                }
                Condition::Lt(col, val) => {
                    let col = self.ident(col, false, "column")?;
                    format!("{col} < {}", stmt.bind(val.clone()))
                }
                Condition::In(col, vals) => {
                    let col = self.ident(col, false, "column")?;
                    if vals.is_empty() {
                        // Nothing can be IN an empty list.
                        "1 = 0".to_string()
                    } else {
                        let placeholders: Vec<_> =
                            vals.iter().map(|v| stmt.bind(v.clone())).collect();
                        format!("{col} IN ({})", placeholders.join(", "))
                    }
                }
                Condition::IsNull(col) => {
                    format!("{} IS NULL", self.ident(col, false, "column")?)
                }
                Condition::IsNotNull(col) => {
                    format!("{} IS NOT NULL", self.ident(col, false, "column")?)
                }
                Condition::Group(inner) => {
                    format!("({})", self.render_conditions(inner, stmt)?)
                }
            };
            out.push_str(&clause);
        }
        Ok(out)
    }

    fn append_order(&self, stmt: &mut Statement) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.ident(col, false, "column")?;
            clauses.push(if *asc {
                format!("{col} ASC")
            } else {
                format!("{col} DESC")
            });
        }
        stmt.sql.push_str(" ORDER BY ");
        stmt.sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, stmt: &mut Statement) {
        match (self.limit_val, self.offset_val) {
            (Some(limit), _) => stmt.sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite and MySQL only accept OFFSET after a LIMIT.
            (None, Some(_)) => match self.dialect {
                Dialect::Postgres => {}
                Dialect::MySql => stmt.sql.push_str(&format!(" LIMIT {}", u64::MAX)),
                Dialect::Generic | Dialect::Sqlite => stmt.sql.push_str(" LIMIT -1"),
            },
            (None, None) => {}
        }
        if let Some(offset) = self.offset_val {
            stmt.sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn alias(&self, alias: &str) -> Result<String, QueryError> {
        if self.identifier_policy != IdentifierPolicy::Raw && !is_valid_segment(alias) {
            return Err(QueryError::InvalidIdentifier {
                kind: "alias",
                ident: alias.to_string(),
            });
        }
        Ok(match self.identifier_policy {
            IdentifierPolicy::Quote => quote_identifier(alias, self.dialect, false),
            IdentifierPolicy::Raw | IdentifierPolicy::Validate => alias.to_string(),
        })
    }

    fn ident(&self, ident: &str, allow_star: bool, kind: &'static str) -> Result<String, QueryError> {
        if self.identifier_policy == IdentifierPolicy::Raw {
            return Ok(ident.to_string());
        }
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        Ok(match self.identifier_policy {
            IdentifierPolicy::Quote => quote_identifier(ident, self.dialect, allow_star),
            IdentifierPolicy::Raw | IdentifierPolicy::Validate => ident.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// An UPDATE was built without any column to set.
    NoColumns,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::NoColumns => write!(f, "No columns to update"),
        }
    }
}

impl std::error::Error for QueryError {}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
