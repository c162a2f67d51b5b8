use tracing::{debug, trace};

use crate::entity::Translatable;
use crate::error::DataError;
use crate::naming::TRANSLATION_KEY_COLUMN;
use crate::query::{IdentifierPolicy, QueryBuilder};
use crate::set::{LoadState, Slot, TranslationSet};
use crate::store::Session;
use crate::translated::{Resolved, Translated};
use crate::translation::Translation;

impl<E: Translatable> Translated<E> {
    /// The translation for `locale`, or `None` when the entity has none.
    ///
    /// Loads the stored set on first access. Never creates a record.
    pub async fn translate<S: Session>(
        &mut self,
        session: &mut S,
        locale: &str,
    ) -> Result<Option<&mut Translation>, DataError> {
        self.ensure_locale(session, locale).await?;
        let key = self.key();
        Ok(self.translations.record_mut_with(locale, || {
            Translation::new(locale, key, E::translatable_fields())
        }))
    }

    /// The translation for `locale`, adding a new unsaved one when absent.
    ///
    /// Calling it again for the same locale returns the same record.
    pub async fn translate_or_new<S: Session>(
        &mut self,
        session: &mut S,
        locale: &str,
    ) -> Result<&mut Translation, DataError> {
        self.ensure_locale(session, locale).await?;
        let key = self.key();
        let make = || Translation::new(locale, key, E::translatable_fields());
        if !self.translations.contains(locale) {
            debug!(entity = E::type_name(), locale, "new translation");
            self.translations.insert(locale, Slot::Record(make()));
        }
        self.translations
            .record_mut_with(locale, make)
            .ok_or_else(|| DataError::Other(format!("translation '{locale}' was not attached")))
    }

    /// The translation for `locale`, or [`DataError::NotFound`].
    pub async fn translate_or_fail<S: Session>(
        &mut self,
        session: &mut S,
        locale: &str,
    ) -> Result<&mut Translation, DataError> {
        let key = self.key();
        match self.translate(session, locale).await? {
            Some(translation) => Ok(translation),
            None => Err(DataError::NotFound(format!(
                "{} {} has no '{locale}' translation",
                E::type_name(),
                key.map_or_else(|| "(unsaved)".to_string(), |k| k.to_string()),
            ))),
        }
    }

    /// Resolve `locale` (the active locale when `None`), falling back to the
    /// active locale, then the fallback locale, then the first translation.
    ///
    /// Only an entity without any translation yields [`Resolved::Empty`].
    pub async fn translate_or_default<S: Session>(
        &mut self,
        session: &mut S,
        locale: Option<&str>,
    ) -> Result<Resolved<'_>, DataError> {
        let requested = locale.map_or_else(|| self.locale.clone(), str::to_string);
        self.ensure_locale(session, &requested).await?;

        let Some(resolved) = self.default_locale_in_memory(&requested) else {
            trace!(entity = E::type_name(), locale = %requested, "no translation to fall back to");
            return Ok(Resolved::Empty(self.new_translation(&requested)));
        };
        if resolved != requested {
            trace!(
                entity = E::type_name(),
                requested = %requested,
                resolved = %resolved,
                "falling back"
            );
        }
        let key = self.key();
        self.translations
            .record_mut_with(&resolved, || {
                Translation::new(resolved.as_str(), key, E::translatable_fields())
            })
            .map(Resolved::Stored)
            .ok_or_else(|| DataError::Other(format!("translation '{resolved}' was not attached")))
    }

    pub async fn has_translation<S: Session>(
        &mut self,
        session: &mut S,
        locale: &str,
    ) -> Result<bool, DataError> {
        self.ensure_locale(session, locale).await?;
        Ok(self.translations.contains(locale))
    }

    /// Locale codes of every translation, in set order.
    pub async fn locales<S: Session>(&mut self, session: &mut S) -> Result<Vec<String>, DataError> {
        Ok(self.translations(session).await?.locales())
    }

    /// The complete translation set, loading it when needed.
    pub async fn translations<S: Session>(
        &mut self,
        session: &mut S,
    ) -> Result<&TranslationSet, DataError> {
        if self.translations.state() != LoadState::Complete {
            self.load_translations(session).await?;
        }
        Ok(&self.translations)
    }

    /// Load when nothing is loaded yet, or when a partial set has no record
    /// for `locale`. Staged values then land on the stored record, if any.
    async fn ensure_locale<S: Session>(
        &mut self,
        session: &mut S,
        locale: &str,
    ) -> Result<(), DataError> {
        match self.translations.state() {
            LoadState::Unloaded => self.load_translations(session).await,
            LoadState::Partial if self.translations.record(locale).is_none() => {
                self.load_translations(session).await
            }
            LoadState::Partial | LoadState::Complete => Ok(()),
        }
    }

    pub(crate) async fn load_translations<S: Session>(
        &mut self,
        session: &mut S,
    ) -> Result<(), DataError> {
        let Some(key) = self.key() else {
            self.translations.set_state(LoadState::Complete);
            return Ok(());
        };
        let foreign_key = E::translation_foreign_key();
        let (sql, params) = QueryBuilder::new_with_dialect(&E::translation_table(), session.dialect())
            .identifier_policy(IdentifierPolicy::Validate)
            .where_eq(&foreign_key, key)
            .order_by(TRANSLATION_KEY_COLUMN, true)
            .build_select()?;
        let rows = session.fetch_all(&sql, &params).await?;
        let records = rows
            .iter()
            .map(|row| Translation::from_record(row, &foreign_key, E::translatable_fields()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entity = E::type_name(), key, loaded = records.len(), "loaded translations");

        if self.translations.is_empty() {
            self.translations = TranslationSet::from_records(records, LoadState::Complete);
        } else {
            self.translations.merge_loaded(records);
        }
        self.refresh_attributes();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{post, MemorySession, Post};
    use crate::value::{Record, Value};
    use lingua_core::LocaleContext;

    fn row(id: i64, locale: &str, title: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("post_id", 1i64)
            .with("locale", locale)
            .with("title", title)
            .with("content", Value::Null)
    }

    fn stored_post(ctx: &LocaleContext) -> Translated<Post> {
        Translated::new(post(Some(1)), ctx)
    }

    #[tokio::test]
    async fn loads_once_and_finds_locale() {
        let mut session = MemorySession::with_rows(vec![row(1, "en", "hello"), row(2, "zh_TW", "ni hao")]);
        let mut p = stored_post(&LocaleContext::new("en"));

        let t = p.translate(&mut session, "zh_TW").await.unwrap().unwrap();
        assert_eq!(t.get("title"), Some("ni hao"));
        assert!(p.translate(&mut session, "fr").await.unwrap().is_none());
        assert!(p.has_translation(&mut session, "en").await.unwrap());
        assert_eq!(session.fetches(), 1);
        assert!(session.statements()[0].starts_with("SELECT * FROM post_translations WHERE post_id = ?"));
    }

    #[tokio::test]
    async fn translate_or_new_is_idempotent() {
        let mut session = MemorySession::default();
        let mut p = stored_post(&LocaleContext::new("en"));

        p.translate_or_new(&mut session, "zh_TW").await.unwrap().set("title", "X");
        let again = p.translate_or_new(&mut session, "zh_TW").await.unwrap();
        assert_eq!(again.get("title"), Some("X"));
        assert_eq!(again.parent_key(), Some(1));
        assert!(!again.exists());
        assert_eq!(p.loaded_translations().len(), 1);
    }

    #[tokio::test]
    async fn translate_or_fail_reports_not_found() {
        let mut session = MemorySession::default();
        let mut p = stored_post(&LocaleContext::new("en"));

        let err = p.translate_or_fail(&mut session, "de").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!p.has_translation(&mut session, "de").await.unwrap());
    }

    #[tokio::test]
    async fn default_falls_back_in_order() {
        let mut session = MemorySession::with_rows(vec![row(1, "de", "hallo"), row(2, "fr", "salut")]);
        let mut p = stored_post(&LocaleContext::new("en").with_fallback("fr"));

        let t = p.translate_or_default(&mut session, Some("it")).await.unwrap();
        assert_eq!(t.locale(), "fr");

        p.set_locale("de");
        let t = p.translate_or_default(&mut session, None).await.unwrap();
        assert_eq!(t.locale(), "de");
        assert!(!t.is_empty());
    }

    #[tokio::test]
    async fn default_uses_first_translation_last() {
        let mut session = MemorySession::with_rows(vec![row(4, "ja", "konnichiwa"), row(5, "de", "hallo")]);
        let mut p = stored_post(&LocaleContext::new("en"));

        let t = p.translate_or_default(&mut session, None).await.unwrap();
        assert_eq!(t.locale(), "ja");
    }

    #[tokio::test]
    async fn default_on_empty_set_is_detached() {
        let mut session = MemorySession::default();
        let mut p = stored_post(&LocaleContext::new("en"));

        let mut t = p.translate_or_default(&mut session, Some("de")).await.unwrap();
        assert!(t.is_empty());
        t.set("title", "ignored");
        assert!(p.loaded_translations().is_empty());
    }

    #[tokio::test]
    async fn staged_values_are_materialised() {
        let mut session = MemorySession::default();
        let mut p = Translated::new(post(None), &LocaleContext::new("en"));
        p.stage_translation("en", [("title", "draft")]);

        let t = p.translate(&mut session, "en").await.unwrap().unwrap();
        assert_eq!(t.get("title"), Some("draft"));
        assert_eq!(t.get("content"), None);
        assert_eq!(session.fetches(), 0);
    }

    #[tokio::test]
    async fn partial_set_loads_on_miss_without_duplicates() {
        let mut session = MemorySession::with_rows(vec![row(1, "en", "stored"), row(2, "de", "hallo")]);
        let mut p = stored_post(&LocaleContext::new("en"));
        let record = Translation::from_record(&row(1, "en", "joined"), "post_id", Post::FIELDS).unwrap();
        p.set_translations(vec![record], LoadState::Partial);

        assert!(p.has_translation(&mut session, "en").await.unwrap());
        assert_eq!(session.fetches(), 0);

        assert_eq!(p.locales(&mut session).await.unwrap(), vec!["en", "de"]);
        assert_eq!(session.fetches(), 1);
        assert_eq!(p.translation_value("en", "title"), Some("joined"));
    }

    #[tokio::test]
    async fn staged_values_land_on_the_stored_record() {
        let mut session = MemorySession::with_rows(vec![row(1, "en", "stored")]);
        let mut p = stored_post(&LocaleContext::new("en"));
        p.stage_translation("en", [("title", "edited")]);

        let t = p.translate_or_new(&mut session, "en").await.unwrap();
        assert_eq!(t.id(), Some(1));
        assert_eq!(t.get("title"), Some("edited"));
        assert!(t.is_dirty());
        assert_eq!(p.locales(&mut session).await.unwrap(), vec!["en"]);
        assert_eq!(session.fetches(), 1);
    }

    #[tokio::test]
    async fn partial_set_loads_for_a_staged_locale() {
        let mut session = MemorySession::with_rows(vec![row(1, "en", "stored"), row(2, "de", "hallo")]);
        let mut p = stored_post(&LocaleContext::new("en"));
        let joined = Translation::from_record(&row(2, "de", "hallo"), "post_id", Post::FIELDS).unwrap();
        p.set_translations(vec![joined], LoadState::Partial);
        p.stage_translation("en", [("title", "edited")]);

        let t = p.translate(&mut session, "en").await.unwrap().unwrap();
        assert_eq!(t.id(), Some(1));
        assert_eq!(t.get("title"), Some("edited"));
        assert_eq!(session.fetches(), 1);
    }

    #[test]
    fn reassigning_the_set_re_mirrors_attributes() {
        let mut p = stored_post(&LocaleContext::new("en"));
        let first = Translation::from_record(&row(1, "en", "first"), "post_id", Post::FIELDS).unwrap();
        p.set_translations(vec![first], LoadState::Complete);
        assert_eq!(p.attribute("title"), Some(Value::Text("first".into())));

        let second = Translation::from_record(&row(2, "en", "second"), "post_id", Post::FIELDS).unwrap();
        let other = Translation::from_record(&row(3, "de", "zweite"), "post_id", Post::FIELDS).unwrap();
        p.set_translations(vec![other, second], LoadState::Complete);
        assert_eq!(p.attribute("title"), Some(Value::Text("second".into())));

        p.set_translations(Vec::new(), LoadState::Complete);
        assert_eq!(p.attribute("title"), Some(Value::Null));
    }

    #[tokio::test]
    async fn load_mirrors_active_translation() {
        let mut session = MemorySession::with_rows(vec![row(1, "en", "hello")]);
        let mut p = stored_post(&LocaleContext::new("en"));
        p.translations(&mut session).await.unwrap();

        assert_eq!(p.attribute("title"), Some(Value::Text("hello".into())));
        assert_eq!(p.attribute("content"), Some(Value::Null));
        assert_eq!(p.attribute("published"), Some(Value::Bool(true)));
    }

    #[tokio::test]
    async fn load_errors_propagate() {
        let mut session = MemorySession::failing();
        let mut p = stored_post(&LocaleContext::new("en"));

        let err = p.translate(&mut session, "en").await.unwrap_err();
        assert!(matches!(err, DataError::Database(_)));
    }
}
