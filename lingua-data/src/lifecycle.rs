use std::collections::BTreeMap;
use std::future::Future;

use lingua_core::LocaleContext;
use tracing::{debug, warn};

use crate::entity::Translatable;
use crate::error::DataError;
use crate::naming::TRANSLATION_KEY_COLUMN;
use crate::query::{Dialect, IdentifierPolicy, QueryBuilder};
use crate::set::{LoadState, Slot, TranslationSet};
use crate::store::{Session, Storage};
use crate::translated::Translated;
use crate::translation::Translation;
use crate::value::Value;

/// Hooks run around the primary entity's persistence.
///
/// [`Translated::save`] and [`Translated::delete`] call them in order; they
/// are public so that callers driving their own statements can do the same.
pub trait TranslationLifecycle {
    /// Drop translated values from the mirrored attributes and return the
    /// primary columns to write.
    fn before_save(&mut self) -> Vec<(String, Value)>;

    /// Write the translation set after the primary row has been saved.
    ///
    /// `created` is true when the primary row was just inserted.
    fn after_save<S: Session>(
        &mut self,
        session: &mut S,
        created: bool,
    ) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Delete every stored translation of the entity and reset the set.
    fn before_delete<S: Session>(
        &mut self,
        session: &mut S,
    ) -> impl Future<Output = Result<(), DataError>> + Send;
}

fn builder(table: &str, dialect: Dialect) -> QueryBuilder {
    QueryBuilder::new_with_dialect(table, dialect).identifier_policy(IdentifierPolicy::Validate)
}

impl<E: Translatable> TranslationLifecycle for Translated<E> {
    fn before_save(&mut self) -> Vec<(String, Value)> {
        self.clear_attributes();
        let fields = E::translatable_fields();
        E::columns()
            .iter()
            .zip(self.entity.values())
            .filter_map(|(column, value)| {
                if fields.contains(column) {
                    warn!(
                        entity = E::type_name(),
                        column, "translatable field declared as a primary column, skipping"
                    );
                    None
                } else {
                    Some((column.to_string(), value))
                }
            })
            .collect()
    }

    async fn after_save<S: Session>(&mut self, session: &mut S, created: bool) -> Result<(), DataError> {
        let Some(key) = self.key() else {
            return Err(DataError::Other(format!(
                "cannot save translations of an unsaved {}",
                E::type_name()
            )));
        };
        // Staged locales may already be stored; their values go onto that row.
        if !created
            && self.translations.has_staged()
            && self.translations.state() != LoadState::Complete
        {
            self.load_translations(session).await?;
        }
        let fields = E::translatable_fields();
        let foreign_key = E::translation_foreign_key();
        let table = E::translation_table();

        for (locale, slot) in self.translations.iter_mut() {
            if let Slot::Staged(values) = &mut *slot {
                let mut record = Translation::new(locale, Some(key), fields);
                record.fill(std::mem::take(values));
                *slot = Slot::Record(record);
            }
            if let Slot::Record(translation) = slot {
                if translation.parent_key() != Some(key) {
                    translation.set_parent_key(key);
                }
            }
        }

        let dialect = session.dialect();
        let (mut inserted, mut updated) = (0usize, 0usize);
        for (_, slot) in self.translations.iter_mut() {
            let Slot::Record(translation) = slot else {
                continue;
            };
            if !translation.is_dirty() {
                continue;
            }
            match translation.id() {
                None => {
                    let (sql, params) = builder(&table, dialect).build_insert(
                        &translation.insert_columns(&foreign_key),
                        Some(TRANSLATION_KEY_COLUMN),
                    )?;
                    let id = session.insert(&sql, &params).await?;
                    translation.mark_persisted(Some(id));
                    inserted += 1;
                }
                Some(id) => {
                    let (sql, params) = builder(&table, dialect)
                        .where_eq(TRANSLATION_KEY_COLUMN, id)
                        .build_update(&translation.dirty_columns(&foreign_key))?;
                    session.execute(&sql, &params).await?;
                    translation.mark_persisted(None);
                    updated += 1;
                }
            }
        }
        debug!(entity = E::type_name(), key, created, inserted, updated, "flushed translations");

        self.refresh_attributes();
        Ok(())
    }

    async fn before_delete<S: Session>(&mut self, session: &mut S) -> Result<(), DataError> {
        if let Some(key) = self.key() {
            let (sql, params) = builder(&E::translation_table(), session.dialect())
                .where_eq(&E::translation_foreign_key(), key)
                .build_delete()?;
            let removed = session.execute(&sql, &params).await?;
            debug!(entity = E::type_name(), key, removed, "deleted translations");
        }
        self.translations.reset();
        self.clear_attributes();
        Ok(())
    }
}

/// In-memory persistence state captured before a save.
struct Rollback {
    key: Option<i64>,
    translations: TranslationSet,
    attributes: BTreeMap<String, Option<String>>,
}

impl<E: Translatable> Translated<E> {
    fn checkpoint(&self) -> Rollback {
        Rollback {
            key: self.key(),
            translations: self.translations.clone(),
            attributes: self.attributes.clone(),
        }
    }

    fn restore(&mut self, rollback: Rollback) {
        self.entity.set_id(rollback.key);
        self.translations = rollback.translations;
        self.attributes = rollback.attributes;
    }

    /// Save the entity and its translations in one transaction.
    ///
    /// When any statement or the commit fails, the transaction is rolled back
    /// and the entity's key and translation set are restored to what they
    /// were before the call, so the save can be retried.
    pub async fn save<T: Storage>(&mut self, storage: &T) -> Result<(), DataError> {
        let mut session = storage.begin().await?;
        let rollback = self.checkpoint();
        let result = match self.save_with(&mut session).await {
            Ok(()) => session.commit().await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(entity = E::type_name(), error = %err, "save failed, restoring in-memory state");
            self.restore(rollback);
            return Err(err);
        }
        Ok(())
    }

    /// Save within a session the caller owns: insert or update the primary
    /// row, then flush the translations.
    ///
    /// The in-memory state is not restored on failure; a caller rolling back
    /// its own transaction should reload the entity.
    pub async fn save_with<S: Session>(&mut self, session: &mut S) -> Result<(), DataError> {
        let columns = self.before_save();
        let query = builder(E::table_name(), session.dialect());
        let created = match self.key() {
            None => {
                let (sql, params) = query.build_insert(&columns, Some(E::id_column()))?;
                let id = session.insert(&sql, &params).await?;
                self.entity.set_id(Some(id));
                true
            }
            Some(key) => {
                if !columns.is_empty() {
                    let (sql, params) = query.where_eq(E::id_column(), key).build_update(&columns)?;
                    session.execute(&sql, &params).await?;
                }
                false
            }
        };
        self.after_save(session, created).await
    }

    /// Delete the entity and every stored translation in one transaction.
    pub async fn delete<T: Storage>(&mut self, storage: &T) -> Result<(), DataError> {
        let mut session = storage.begin().await?;
        self.delete_with(&mut session).await?;
        session.commit().await
    }

    pub async fn delete_with<S: Session>(&mut self, session: &mut S) -> Result<(), DataError> {
        self.before_delete(session).await?;
        if let Some(key) = self.key() {
            let (sql, params) = builder(E::table_name(), session.dialect())
                .where_eq(E::id_column(), key)
                .build_delete()?;
            session.execute(&sql, &params).await?;
        }
        Ok(())
    }

    /// Load the entity with `key`, or `None` when there is no such row.
    pub async fn find<T: Storage>(
        storage: &T,
        key: i64,
        ctx: &LocaleContext,
    ) -> Result<Option<Self>, DataError> {
        let mut session = storage.session().await?;
        Self::find_with(&mut session, key, ctx).await
    }

    pub async fn find_with<S: Session>(
        session: &mut S,
        key: i64,
        ctx: &LocaleContext,
    ) -> Result<Option<Self>, DataError> {
        let (sql, params) = builder(E::table_name(), session.dialect())
            .where_eq(E::id_column(), key)
            .limit(1)
            .build_select()?;
        let rows = session.fetch_all(&sql, &params).await?;
        rows.first()
            .map(|row| E::from_record(row).map(|entity| Self::new(entity, ctx)))
            .transpose()
    }

    pub async fn find_or_fail<T: Storage>(
        storage: &T,
        key: i64,
        ctx: &LocaleContext,
    ) -> Result<Self, DataError> {
        Self::find(storage, key, ctx)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("{} {key} not found", E::type_name())))
    }
}
