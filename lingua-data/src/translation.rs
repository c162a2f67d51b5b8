use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::entity::{require_i64, require_text};
use crate::error::DataError;
use crate::naming::{LOCALE_COLUMN, TRANSLATION_KEY_COLUMN};
use crate::value::{Record, Value};

/// Field values keyed by field name. `None` is a SQL `NULL`.
pub type FieldMap = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    parent_key: Option<i64>,
    locale: String,
    fields: FieldMap,
}

/// One translation row: the translatable field values of one entity in one locale.
///
/// The record remembers its last persisted state, so [`Translation::is_dirty`]
/// tells whether a flush has anything to write.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    id: Option<i64>,
    parent_key: Option<i64>,
    locale: String,
    fields: FieldMap,
    persisted: Option<Snapshot>,
}

impl Translation {
    /// A new, unsaved translation with every declared field set to `NULL`.
    pub fn new(locale: impl Into<String>, parent_key: Option<i64>, fields: &[&str]) -> Self {
        Self {
            id: None,
            parent_key,
            locale: locale.into(),
            fields: fields.iter().map(|f| (f.to_string(), None)).collect(),
            persisted: None,
        }
    }

    /// Hydrate a stored translation row.
    pub fn from_record(
        record: &Record,
        foreign_key: &str,
        fields: &[&str],
    ) -> Result<Self, DataError> {
        let id = require_i64(record, TRANSLATION_KEY_COLUMN)?;
        let parent_key = record.get(foreign_key).and_then(Value::as_i64);
        let locale = require_text(record, LOCALE_COLUMN)?;
        let fields: FieldMap = fields
            .iter()
            .map(|f| {
                let value = record.get(f).cloned().and_then(Value::into_text);
                (f.to_string(), value)
            })
            .collect();

        Ok(Self {
            id: Some(id),
            persisted: Some(Snapshot {
                parent_key,
                locale: locale.clone(),
                fields: fields.clone(),
            }),
            parent_key,
            locale,
            fields,
        })
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn parent_key(&self) -> Option<i64> {
        self.parent_key
    }

    pub fn set_parent_key(&mut self, key: i64) {
        self.parent_key = Some(key);
    }

    /// Whether this translation has been written to storage.
    pub fn exists(&self) -> bool {
        self.persisted.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        self.fields.insert(field.to_string(), Some(value.into()));
        self
    }

    pub fn clear(&mut self, field: &str) -> &mut Self {
        self.fields.insert(field.to_string(), None);
        self
    }

    /// Copy every value of `values` into this translation.
    pub fn fill(&mut self, values: FieldMap) -> &mut Self {
        self.fields.extend(values);
        self
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// True for an unsaved translation, or when anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        match &self.persisted {
            None => true,
            Some(snapshot) => {
                snapshot.parent_key != self.parent_key
                    || snapshot.locale != self.locale
                    || snapshot.fields != self.fields
            }
        }
    }

    /// Columns whose value differs from the persisted state, ready for an UPDATE.
    pub fn dirty_columns(&self, foreign_key: &str) -> Vec<(String, Value)> {
        let Some(snapshot) = &self.persisted else {
            return self.insert_columns(foreign_key);
        };
        let mut columns = Vec::new();
        if snapshot.parent_key != self.parent_key {
            columns.push((foreign_key.to_string(), Value::from(self.parent_key)));
        }
        if snapshot.locale != self.locale {
            columns.push((LOCALE_COLUMN.to_string(), Value::from(self.locale.as_str())));
        }
        for (field, value) in &self.fields {
            if snapshot.fields.get(field) != Some(value) {
                columns.push((field.clone(), Value::from(value.clone())));
            }
        }
        columns
    }

    /// Every column of the row, ready for an INSERT.
    pub fn insert_columns(&self, foreign_key: &str) -> Vec<(String, Value)> {
        let mut columns = vec![
            (foreign_key.to_string(), Value::from(self.parent_key)),
            (LOCALE_COLUMN.to_string(), Value::from(self.locale.as_str())),
        ];
        columns.extend(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), Value::from(value.clone()))),
        );
        columns
    }

    /// Record a successful write; `id` is the key assigned by an insert.
    pub fn mark_persisted(&mut self, id: Option<i64>) {
        if id.is_some() {
            self.id = id;
        }
        self.persisted = Some(Snapshot {
            parent_key: self.parent_key,
            locale: self.locale.clone(),
            fields: self.fields.clone(),
        });
    }
}

impl Serialize for Translation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry(TRANSLATION_KEY_COLUMN, &self.id)?;
        map.serialize_entry(LOCALE_COLUMN, &self.locale)?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["title", "content"];

    fn stored() -> Translation {
        let record = Record::new()
            .with("id", 3i64)
            .with("post_id", 1i64)
            .with("locale", "en")
            .with("title", "post_test_title")
            .with("content", Value::Null);
        Translation::from_record(&record, "post_id", FIELDS).unwrap()
    }

    #[test]
    fn new_translation_is_dirty() {
        let t = Translation::new("en", None, FIELDS);
        assert!(t.is_dirty());
        assert!(!t.exists());
        assert_eq!(t.get("title"), None);
    }

    #[test]
    fn hydrated_translation_is_clean() {
        let t = stored();
        assert!(t.exists());
        assert!(!t.is_dirty());
        assert_eq!(t.id(), Some(3));
        assert_eq!(t.parent_key(), Some(1));
        assert_eq!(t.get("title"), Some("post_test_title"));
        assert_eq!(t.get("content"), None);
    }

    #[test]
    fn hydrate_requires_locale() {
        let record = Record::new().with("id", 1i64).with("post_id", 1i64);
        let err = Translation::from_record(&record, "post_id", FIELDS).unwrap_err();
        assert!(matches!(err, DataError::Decode { .. }));
    }

    #[test]
    fn dirty_columns_only_lists_changes() {
        let mut t = stored();
        t.set("content", "body");
        assert!(t.is_dirty());
        assert_eq!(
            t.dirty_columns("post_id"),
            vec![("content".to_string(), Value::Text("body".into()))]
        );
    }

    #[test]
    fn setting_the_same_value_is_not_dirty() {
        let mut t = stored();
        t.set("title", "post_test_title");
        assert!(!t.is_dirty());
    }

    #[test]
    fn linking_a_parent_dirties_the_key() {
        let mut t = Translation::new("en", None, FIELDS);
        t.mark_persisted(Some(9));
        t.set_parent_key(4);
        assert_eq!(
            t.dirty_columns("post_id"),
            vec![("post_id".to_string(), Value::Integer(4))]
        );
    }

    #[test]
    fn mark_persisted_resets_dirty_state() {
        let mut t = Translation::new("zh_TW", Some(1), FIELDS);
        t.set("title", "X");
        t.mark_persisted(Some(5));
        assert!(!t.is_dirty());
        assert_eq!(t.id(), Some(5));
    }

    #[test]
    fn serializes_id_locale_and_fields() {
        let json = serde_json::to_value(stored()).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["locale"], "en");
        assert_eq!(json["title"], "post_test_title");
        assert!(json["content"].is_null());
    }
}
