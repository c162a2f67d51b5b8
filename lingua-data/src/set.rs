use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::naming::LOCALE_COLUMN;
use crate::translation::{FieldMap, Translation};

/// How much of the stored translation set has been brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet; the first access loads from storage.
    Unloaded,
    /// Only the locales matched by a query scope join are present.
    Partial,
    /// Every stored translation is present.
    Complete,
}

/// One entry of a translation set.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Raw field values attached before a translation record was constructed.
    Staged(FieldMap),
    Record(Translation),
}

impl Slot {
    pub fn value(&self, field: &str) -> Option<&str> {
        match self {
            Slot::Staged(fields) => fields.get(field).and_then(|v| v.as_deref()),
            Slot::Record(translation) => translation.get(field),
        }
    }

    pub fn as_record(&self) -> Option<&Translation> {
        match self {
            Slot::Record(translation) => Some(translation),
            Slot::Staged(_) => None,
        }
    }
}

/// Ordered mapping from locale code to translation, unique per locale.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSet {
    entries: Vec<(String, Slot)>,
    state: LoadState,
}

impl Default for TranslationSet {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            state: LoadState::Unloaded,
        }
    }
}

impl TranslationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key a loaded sequence by locale.
    ///
    /// Should the sequence contain a locale twice, the later record replaces
    /// the earlier one in the earlier one's position.
    pub fn from_records(records: impl IntoIterator<Item = Translation>, state: LoadState) -> Self {
        let mut set = TranslationSet {
            entries: Vec::new(),
            state,
        };
        for record in records {
            let locale = record.locale().to_string();
            set.insert(locale, Slot::Record(record));
        }
        set
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    pub fn is_loaded(&self) -> bool {
        self.state != LoadState::Unloaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.position(locale).is_some()
    }

    pub fn get(&self, locale: &str) -> Option<&Slot> {
        self.position(locale).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, locale: &str) -> Option<&mut Slot> {
        self.position(locale).map(move |idx| &mut self.entries[idx].1)
    }

    /// The record stored for `locale`, if it is a constructed translation.
    pub fn record(&self, locale: &str) -> Option<&Translation> {
        self.get(locale).and_then(Slot::as_record)
    }

    /// The record for `locale`; a staged entry is first turned into a record
    /// built by `make` and filled with the staged values.
    pub(crate) fn record_mut_with(
        &mut self,
        locale: &str,
        make: impl FnOnce() -> Translation,
    ) -> Option<&mut Translation> {
        let slot = self.get_mut(locale)?;
        if let Slot::Staged(fields) = &mut *slot {
            let values = std::mem::take(fields);
            let mut record = make();
            record.fill(values);
            *slot = Slot::Record(record);
        }
        match slot {
            Slot::Record(translation) => Some(translation),
            Slot::Staged(_) => None,
        }
    }

    /// Insert or replace the entry for `locale`, keeping its position when replacing.
    pub fn insert(&mut self, locale: impl Into<String>, slot: Slot) {
        let locale = locale.into();
        match self.position(&locale) {
            Some(idx) => self.entries[idx].1 = slot,
            None => self.entries.push((locale, slot)),
        }
    }

    /// Merge a freshly loaded sequence: records already in memory keep their
    /// (possibly edited) state, staged values are copied onto the stored
    /// record of their locale, new locales are appended. The set becomes complete.
    pub fn merge_loaded(&mut self, records: impl IntoIterator<Item = Translation>) {
        for mut record in records {
            match self.position(record.locale()) {
                None => self
                    .entries
                    .push((record.locale().to_string(), Slot::Record(record))),
                Some(idx) => {
                    let slot = &mut self.entries[idx].1;
                    if let Slot::Staged(fields) = slot {
                        record.fill(std::mem::take(fields));
                        *slot = Slot::Record(record);
                    }
                }
            }
        }
        self.state = LoadState::Complete;
    }

    pub fn has_staged(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, slot)| matches!(slot, Slot::Staged(_)))
    }

    /// Locale codes in set order.
    pub fn locales(&self) -> Vec<String> {
        self.entries.iter().map(|(locale, _)| locale.clone()).collect()
    }

    /// First locale in set order.
    pub fn first_locale(&self) -> Option<&str> {
        self.entries.first().map(|(locale, _)| locale.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(locale, slot)| (locale.as_str(), slot))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Slot)> {
        self.entries
            .iter_mut()
            .map(|(locale, slot)| (locale.as_str(), slot))
    }

    /// Drop every entry and return to the unloaded state.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.state = LoadState::Unloaded;
    }

    fn position(&self, locale: &str) -> Option<usize> {
        self.entries.iter().position(|(l, _)| l == locale)
    }
}

struct StagedEntry<'a> {
    locale: &'a str,
    fields: &'a FieldMap,
}

impl Serialize for StagedEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(LOCALE_COLUMN, self.locale)?;
        for (field, value) in self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl Serialize for TranslationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (locale, slot) in &self.entries {
            match slot {
                Slot::Record(translation) => seq.serialize_element(translation)?,
                Slot::Staged(fields) => seq.serialize_element(&StagedEntry { locale, fields })?,
            }
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Record, Value};

    fn record(locale: &str, title: &str) -> Translation {
        let mut t = Translation::new(locale, Some(1), &["title"]);
        t.set("title", title);
        t
    }

    #[test]
    fn from_records_keys_by_locale() {
        let set = TranslationSet::from_records(
            vec![record("en", "a"), record("zh_TW", "b")],
            LoadState::Complete,
        );
        assert_eq!(set.locales(), vec!["en", "zh_TW"]);
        assert_eq!(set.record("zh_TW").unwrap().get("title"), Some("b"));
        assert!(set.is_loaded());
    }

    #[test]
    fn duplicate_locale_later_entry_wins() {
        let set = TranslationSet::from_records(
            vec![record("en", "first"), record("de", "x"), record("en", "second")],
            LoadState::Complete,
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.locales(), vec!["en", "de"]);
        assert_eq!(set.record("en").unwrap().get("title"), Some("second"));
    }

    #[test]
    fn merge_keeps_in_memory_edits() {
        let mut set = TranslationSet::from_records(vec![record("en", "edited")], LoadState::Partial);
        set.merge_loaded(vec![record("en", "stored"), record("fr", "fr")]);

        assert_eq!(set.state(), LoadState::Complete);
        assert_eq!(set.locales(), vec!["en", "fr"]);
        assert_eq!(set.record("en").unwrap().get("title"), Some("edited"));
    }

    #[test]
    fn merge_overlays_staged_values_on_stored_record() {
        let mut set = TranslationSet::new();
        let mut fields = FieldMap::new();
        fields.insert("title".into(), Some("edited".into()));
        set.insert("en", Slot::Staged(fields));
        assert!(set.has_staged());

        let record = Record::new()
            .with("id", 7i64)
            .with("post_id", 1i64)
            .with("locale", "en")
            .with("title", "stored");
        let stored = Translation::from_record(&record, "post_id", &["title"]).unwrap();
        set.merge_loaded(vec![stored]);

        assert!(!set.has_staged());
        let en = set.record("en").unwrap();
        assert_eq!(en.id(), Some(7));
        assert_eq!(en.get("title"), Some("edited"));
        assert_eq!(
            en.dirty_columns("post_id"),
            vec![("title".to_string(), Value::from("edited"))]
        );
    }

    #[test]
    fn staged_slot_exposes_values() {
        let mut set = TranslationSet::new();
        let mut fields = FieldMap::new();
        fields.insert("title".into(), Some("draft".into()));
        set.insert("en", Slot::Staged(fields));

        assert_eq!(set.get("en").unwrap().value("title"), Some("draft"));
        assert!(set.record("en").is_none());
    }

    #[test]
    fn staged_entry_becomes_a_record_in_place() {
        let mut set = TranslationSet::from_records(vec![record("en", "a")], LoadState::Complete);
        let mut fields = FieldMap::new();
        fields.insert("title".into(), Some("draft".into()));
        set.insert("de", Slot::Staged(fields));

        let t = set
            .record_mut_with("de", || Translation::new("de", Some(1), &["title"]))
            .unwrap();
        assert_eq!(t.get("title"), Some("draft"));
        assert!(!t.exists());
        assert_eq!(set.locales(), vec!["en", "de"]);
        assert!(set.record("de").is_some());
        assert!(set.record_mut_with("fr", || unreachable!()).is_none());
    }

    #[test]
    fn reset_unloads() {
        let mut set = TranslationSet::from_records(vec![record("en", "a")], LoadState::Complete);
        set.reset();
        assert!(set.is_empty());
        assert_eq!(set.state(), LoadState::Unloaded);
    }
}
