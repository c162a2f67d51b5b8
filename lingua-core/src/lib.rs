//! # lingua-core
//!
//! Shared building blocks for the Lingua crates: configuration loading,
//! the explicit [`LocaleContext`] entities capture their active locale from,
//! and the [`HttpError`] boundary type data errors map onto.

pub mod config;
pub mod error;
pub mod locale;

pub use config::{ConfigError, ConfigValue, FromConfigValue, LinguaConfig};
pub use error::HttpError;
pub use locale::{LocaleContext, DEFAULT_LOCALE};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{HttpError, LinguaConfig, LocaleContext};
}
