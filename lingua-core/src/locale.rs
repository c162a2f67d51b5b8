//! The locale a unit of work runs under.

use crate::config::{ConfigError, LinguaConfig};

/// Locale used when nothing is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Locale settings threaded explicitly into translated entities.
///
/// `locale` is the active locale captured by an entity when it is constructed
/// or loaded. `fallback_locale` is tried when neither the requested nor the
/// active locale has a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleContext {
    pub locale: String,
    pub fallback_locale: String,
}

impl LocaleContext {
    /// A context whose fallback is the locale itself.
    pub fn new(locale: impl Into<String>) -> Self {
        let locale = locale.into();
        Self {
            fallback_locale: locale.clone(),
            locale,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_locale = fallback.into();
        self
    }

    /// Build a context from `lingua.locale` and `lingua.fallback_locale`.
    ///
    /// A missing `lingua.locale` defaults to [`DEFAULT_LOCALE`]; a missing
    /// fallback defaults to the locale.
    pub fn from_config(config: &LinguaConfig) -> Result<Self, ConfigError> {
        let locale = config
            .get::<Option<String>>("lingua.locale")
            .or_else(|e| match e {
                ConfigError::NotFound(_) => Ok(None),
                other => Err(other),
            })?
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let fallback = config
            .get::<Option<String>>("lingua.fallback_locale")
            .or_else(|e| match e {
                ConfigError::NotFound(_) => Ok(None),
                other => Err(other),
            })?;

        let ctx = LocaleContext::new(locale);
        Ok(match fallback {
            Some(fallback) => ctx.with_fallback(fallback),
            None => ctx,
        })
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        LocaleContext::new(DEFAULT_LOCALE)
    }
}
