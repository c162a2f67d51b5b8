use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use lingua_core::LocaleContext;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::entity::Translatable;
use crate::set::{LoadState, Slot, TranslationSet};
use crate::translation::{FieldMap, Translation};
use crate::value::Value;

/// A primary entity together with its translation state.
///
/// Owns the entity's in-memory [`TranslationSet`], the locale captured when
/// the entity was constructed or loaded, and a mirror of the active
/// translation's field values so that [`Translated::attribute`] reads
/// translated fields like ordinary columns.
#[derive(Debug, Clone)]
pub struct Translated<E: Translatable> {
    pub(crate) entity: E,
    pub(crate) translations: TranslationSet,
    pub(crate) locale: String,
    pub(crate) fallback_locale: String,
    pub(crate) attributes: BTreeMap<String, Option<String>>,
}

impl<E: Translatable> Translated<E> {
    /// Attach translation state to an entity, capturing the context's locale.
    ///
    /// An entity without a key has nothing stored yet, so its set starts
    /// complete and empty; otherwise the set is loaded on first access.
    pub fn new(entity: E, ctx: &LocaleContext) -> Self {
        let mut translations = TranslationSet::new();
        if entity.id().is_none() {
            translations.set_state(LoadState::Complete);
        }
        Self {
            entity,
            translations,
            locale: ctx.locale.clone(),
            fallback_locale: ctx.fallback_locale.clone(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    pub fn into_inner(self) -> E {
        self.entity
    }

    pub fn key(&self) -> Option<i64> {
        self.entity.id()
    }

    /// The active locale used when no locale is requested.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Switch the active locale and re-mirror the translated attributes.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
        self.refresh_attributes();
    }

    pub fn fallback_locale(&self) -> &str {
        &self.fallback_locale
    }

    /// The in-memory set as it currently stands, without loading.
    pub fn loaded_translations(&self) -> &TranslationSet {
        &self.translations
    }

    /// Replace the in-memory set with `records`, keyed by locale.
    ///
    /// The active translation's field values are mirrored onto the entity's
    /// attributes every time the set is reassigned.
    pub fn set_translations(&mut self, records: Vec<Translation>, state: LoadState) {
        self.translations = TranslationSet::from_records(records, state);
        self.refresh_attributes();
    }

    /// Attach raw field values for `locale` without constructing a record.
    ///
    /// The placeholder becomes a real translation the first time it is
    /// resolved, or when the entity is saved.
    pub fn stage_translation<I, K, V>(&mut self, locale: &str, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: FieldMap = values
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        self.translations.insert(locale, Slot::Staged(fields));
    }

    /// Value of `field` for `locale` in memory, without loading.
    pub fn translation_value(&self, locale: &str, field: &str) -> Option<&str> {
        self.translations.get(locale).and_then(|slot| slot.value(field))
    }

    /// Read an attribute of the entity.
    ///
    /// Translatable fields come from the mirrored active translation; other
    /// names are looked up among the key and [`Entity::columns`](crate::Entity::columns).
    pub fn attribute(&self, name: &str) -> Option<Value> {
        if E::translatable_fields().contains(&name) {
            return self.attributes.get(name).map(|v| Value::from(v.clone()));
        }
        if name == E::id_column() {
            return self.entity.id().map(Value::Integer);
        }
        let idx = E::columns().iter().position(|c| *c == name)?;
        self.entity.values().into_iter().nth(idx)
    }

    /// A fresh translation for `locale`, linked to the entity when it has a key.
    pub(crate) fn new_translation(&self, locale: &str) -> Translation {
        Translation::new(locale, self.entity.id(), E::translatable_fields())
    }

    /// Locale the default policy resolves to among the in-memory entries:
    /// the requested locale, then the active locale, then the fallback
    /// locale, then the first entry.
    pub(crate) fn default_locale_in_memory(&self, requested: &str) -> Option<String> {
        [requested, self.locale.as_str(), self.fallback_locale.as_str()]
            .into_iter()
            .find(|l| self.translations.contains(l))
            .or_else(|| self.translations.first_locale())
            .map(str::to_string)
    }

    pub(crate) fn refresh_attributes(&mut self) {
        let fields = E::translatable_fields();
        if fields.is_empty() {
            return;
        }
        let slot = self
            .default_locale_in_memory(&self.locale)
            .and_then(|locale| self.translations.get(&locale));
        for field in fields {
            let value = slot.and_then(|s| s.value(field)).map(str::to_string);
            self.attributes.insert(field.to_string(), value);
        }
    }

    pub(crate) fn clear_attributes(&mut self) {
        for field in E::translatable_fields() {
            self.attributes.remove(*field);
        }
    }
}

/// Result of [`Translated::translate_or_default`].
///
/// Derefs to the resolved [`Translation`].
#[derive(Debug)]
pub enum Resolved<'a> {
    /// A translation from the entity's set; edits are flushed on save.
    Stored(&'a mut Translation),
    /// The set is empty: a detached blank translation that is never saved.
    Empty(Translation),
}

impl Resolved<'_> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Resolved::Empty(_))
    }
}

impl Deref for Resolved<'_> {
    type Target = Translation;

    fn deref(&self) -> &Translation {
        match self {
            Resolved::Stored(t) => t,
            Resolved::Empty(t) => t,
        }
    }
}

impl DerefMut for Resolved<'_> {
    fn deref_mut(&mut self) -> &mut Translation {
        match self {
            Resolved::Stored(t) => t,
            Resolved::Empty(t) => t,
        }
    }
}

/// Serializes as the entity's key and columns plus a `translations` list.
impl<E: Translatable> Serialize for Translated<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = E::columns();
        let mut map = serializer.serialize_map(Some(columns.len() + 2))?;
        map.serialize_entry(E::id_column(), &self.entity.id())?;
        for (column, value) in columns.iter().zip(self.entity.values()) {
            map.serialize_entry(column, &value)?;
        }
        map.serialize_entry("translations", &self.translations)?;
        map.end()
    }
}
