use lingua::lingua_data::entity::require_i64;
use lingua::lingua_data::Dialect;
use lingua::prelude::*;

struct Article {
    id: Option<i64>,
}

impl Entity for Article {
    fn type_name() -> &'static str {
        "Article"
    }

    fn table_name() -> &'static str {
        "articles"
    }

    fn columns() -> &'static [&'static str] {
        &[]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn from_record(record: &Record) -> Result<Self, DataError> {
        Ok(Article {
            id: Some(require_i64(record, "id")?),
        })
    }
}

impl Translatable for Article {
    fn translatable_fields() -> &'static [&'static str] {
        &["headline"]
    }
}

#[test]
fn naming_follows_the_type_name() {
    assert_eq!(Article::translation_table(), "article_translations");
    assert_eq!(Article::translation_foreign_key(), "article_id");
}

#[test]
fn config_drives_the_query_locale() {
    let config = LinguaConfig::from_yaml_str("lingua:\n  locale: fr\n", "test").unwrap();
    let ctx = LocaleContext::from_config(&config).unwrap();

    let (sql, params) = Translated::<Article>::query(&ctx)
        .translated(&ctx.locale)
        .build(Dialect::Postgres)
        .unwrap();
    assert!(sql.contains("INNER JOIN article_translations ON article_translations.article_id = articles.id"));
    assert_eq!(params, vec![Value::Text("fr".into())]);
}
