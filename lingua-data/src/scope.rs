use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use lingua_core::LocaleContext;
use tracing::debug;

use crate::entity::Translatable;
use crate::error::DataError;
use crate::naming::{LOCALE_COLUMN, TRANSLATION_KEY_COLUMN};
use crate::query::{Dialect, IdentifierPolicy, JoinKind, QueryBuilder};
use crate::set::LoadState;
use crate::store::Session;
use crate::translated::Translated;
use crate::translation::Translation;
use crate::value::Value;

/// Prefix of the aliased translation columns in a `translated` result row.
const TRANSLATION_PREFIX: &str = "translation__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        self == SortDirection::Asc
    }
}

impl FromStr for SortDirection {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(DataError::Other(format!("invalid sort direction '{s}'"))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A query over a translatable entity's primary table, filtered and sorted
/// by its translations.
///
/// # Example
///
/// ```ignore
/// let posts = TranslatedQuery::<Post>::new(&ctx)
///     .translated("en")
///     .where_translation_like("title", "%rust%")
///     .or_where_translation("title", "Intro")
///     .limit(20)
///     .get(&mut session)
///     .await?;
/// ```
///
/// Translation conditions are combined left to right and kept together in
/// parentheses, apart from the join's locale predicate which lives in the
/// `ON` clause.
pub struct TranslatedQuery<E: Translatable> {
    base: QueryBuilder,
    filters: QueryBuilder,
    anti_join: bool,
    attach: bool,
    ctx: LocaleContext,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Translatable> TranslatedQuery<E> {
    pub fn new(ctx: &LocaleContext) -> Self {
        Self {
            base: QueryBuilder::new(E::table_name()),
            filters: QueryBuilder::new(E::table_name()),
            anti_join: false,
            attach: false,
            ctx: ctx.clone(),
            _marker: PhantomData,
        }
    }

    /// Only entities having a translation for `locale`; each result carries
    /// that translation.
    pub fn translated(mut self, locale: &str) -> Self {
        if !self.join(JoinKind::Inner, locale) {
            return self;
        }
        let table = E::translation_table();
        let foreign_key = E::translation_foreign_key();
        let mut base = self.base.select(&format!("{}.*", E::table_name()));
        let columns = [TRANSLATION_KEY_COLUMN, foreign_key.as_str(), LOCALE_COLUMN]
            .into_iter()
            .chain(E::translatable_fields().iter().copied());
        for column in columns {
            base = base.select_as(
                &format!("{table}.{column}"),
                &format!("{TRANSLATION_PREFIX}{column}"),
            );
        }
        self.base = base;
        self.attach = true;
        self
    }

    /// Only entities without a translation for `locale`.
    pub fn not_translated(mut self, locale: &str) -> Self {
        if !self.join(JoinKind::Left, locale) {
            return self;
        }
        self.base = self.base.select(&format!("{}.*", E::table_name()));
        self.anti_join = true;
        self
    }

    /// [`translated`](Self::translated), ordered by the translation's `field`.
    pub fn translated_sorting(self, locale: &str, field: &str, direction: SortDirection) -> Self {
        let mut query = self.translated(locale);
        query.base = query
            .base
            .order_by(&translation_column::<E>(field), direction.is_ascending());
        query
    }

    pub fn where_translation(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters = self.filters.where_eq(&translation_column::<E>(field), value);
        self
    }

    pub fn or_where_translation(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters = self.filters.or_where_eq(&translation_column::<E>(field), value);
        self
    }

    /// `LIKE` on a translated field; `%` and `_` are wildcards.
    pub fn where_translation_like(mut self, field: &str, pattern: &str) -> Self {
        self.filters = self.filters.where_like(&translation_column::<E>(field), pattern);
        self
    }

    pub fn or_where_translation_like(mut self, field: &str, pattern: &str) -> Self {
        self.filters = self
            .filters
            .or_where_like(&translation_column::<E>(field), pattern);
        self
    }

    /// Equality on a column of the primary table.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters = self.filters.where_eq(&primary_column::<E>(column), value);
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.base = self
            .base
            .order_by(&primary_column::<E>(column), direction.is_ascending());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.base = self.base.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.base = self.base.offset(offset);
        self
    }

    /// Build the SELECT for `dialect`, returning `(sql, bind_values)`.
    pub fn build(&self, dialect: Dialect) -> Result<(String, Vec<Value>), DataError> {
        Ok(self.assemble(dialect).build_select()?)
    }

    pub fn build_count(&self, dialect: Dialect) -> Result<(String, Vec<Value>), DataError> {
        Ok(self.assemble(dialect).build_count()?)
    }

    /// Run the query and hydrate each row.
    pub async fn get<S: Session>(&self, session: &mut S) -> Result<Vec<Translated<E>>, DataError> {
        let (sql, params) = self.build(session.dialect())?;
        debug!(entity = E::type_name(), sql = %sql, "running translated query");
        let rows = session.fetch_all(&sql, &params).await?;

        let foreign_key = E::translation_foreign_key();
        let mut items = Vec::with_capacity(rows.len());
        for mut row in rows {
            let joined = row.split_prefixed(TRANSLATION_PREFIX);
            let mut item = Translated::new(E::from_record(&row)?, &self.ctx);
            if self.attach {
                let translation =
                    Translation::from_record(&joined, &foreign_key, E::translatable_fields())?;
                item.set_translations(vec![translation], LoadState::Partial);
            }
            items.push(item);
        }
        Ok(items)
    }

    pub async fn count<S: Session>(&self, session: &mut S) -> Result<u64, DataError> {
        let (sql, params) = self.build_count(session.dialect())?;
        debug!(entity = E::type_name(), sql = %sql, "running translated count");
        let rows = session.fetch_all(&sql, &params).await?;
        rows.first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_i64)
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| DataError::decode("count", "integer"))
    }

    /// Add the translation join unless one is already present.
    fn join(&mut self, kind: JoinKind, locale: &str) -> bool {
        let table = E::translation_table();
        if self.base.has_join(&table) {
            debug!(entity = E::type_name(), locale, "translation join already present, ignoring");
            return false;
        }
        let base = std::mem::replace(&mut self.base, QueryBuilder::new(E::table_name()));
        self.base = base
            .join(
                kind,
                &table,
                &format!("{table}.{}", E::translation_foreign_key()),
                &primary_column::<E>(E::id_column()),
            )
            .join_filter(&format!("{table}.{LOCALE_COLUMN}"), locale);
        true
    }

    fn assemble(&self, dialect: Dialect) -> QueryBuilder {
        let mut query = self
            .base
            .clone()
            .dialect(dialect)
            .identifier_policy(IdentifierPolicy::Validate);
        if self.anti_join {
            query = query.where_null(&translation_column::<E>(TRANSLATION_KEY_COLUMN));
        }
        query.where_group(self.filters.clone())
    }
}

impl<E: Translatable> Translated<E> {
    /// Start a [`TranslatedQuery`] over `E`.
    pub fn query(ctx: &LocaleContext) -> TranslatedQuery<E> {
        TranslatedQuery::new(ctx)
    }
}

fn translation_column<E: Translatable>(field: &str) -> String {
    format!("{}.{field}", E::translation_table())
}

fn primary_column<E: Translatable>(column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{}.{column}", E::table_name())
    }
}
