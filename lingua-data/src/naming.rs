//! Naming conventions linking an entity type to its translation table.
//!
//! `Post` with key column `id` maps to the table `post_translations` and the
//! linking column `post_id`.

/// Column holding the locale code in every translation table.
pub const LOCALE_COLUMN: &str = "locale";

/// Surrogate key column of every translation table.
pub const TRANSLATION_KEY_COLUMN: &str = "id";

/// Convert a `StudlyCase` name to `snake_case`.
///
/// Every uppercase letter that follows another character starts a new word,
/// so `HTTPRequest` becomes `h_t_t_p_request`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, c) in name.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if c.is_uppercase() && idx > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// English plural of a single word.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('y')
        && !matches!(
            lower.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u') | None
        )
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Plural of the last word of a `StudlyCase` name (`PostTranslation` → `PostTranslations`).
pub fn pluralize_studly(name: &str) -> String {
    let split = name
        .char_indices()
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, last) = name.split_at(split);
    format!("{head}{}", pluralize(last))
}

/// Translation table for an entity type name (`Post` → `post_translations`).
pub fn translation_table(type_name: &str) -> String {
    snake_case(&pluralize_studly(&format!("{type_name}Translation")))
}

/// Linking column for an entity type name and key column (`Post`, `id` → `post_id`).
pub fn translation_foreign_key(type_name: &str, key_column: &str) -> String {
    format!("{}_{key_column}", snake_case(type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_words() {
        assert_eq!(snake_case("Post"), "post");
        assert_eq!(snake_case("BlogPost"), "blog_post");
        assert_eq!(snake_case("PostTranslation"), "post_translation");
    }

    #[test]
    fn pluralize_rules() {
        assert_eq!(pluralize("Translation"), "Translations");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Day"), "Days");
        assert_eq!(pluralize("Box"), "Boxes");
        assert_eq!(pluralize("Match"), "Matches");
    }

    #[test]
    fn pluralize_studly_only_touches_last_word() {
        assert_eq!(pluralize_studly("PostTranslation"), "PostTranslations");
        assert_eq!(pluralize_studly("category"), "categories");
    }

    #[test]
    fn conventions_for_post() {
        assert_eq!(translation_table("Post"), "post_translations");
        assert_eq!(translation_foreign_key("Post", "id"), "post_id");
        assert_eq!(translation_table("BlogPost"), "blog_post_translations");
        assert_eq!(translation_foreign_key("BlogPost", "uuid"), "blog_post_uuid");
    }
}
