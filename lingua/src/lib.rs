//! Lingua: multi-locale translations for database entities.
//!
//! Translatable fields live in a per-locale translation table next to the
//! primary table. This facade crate re-exports the Lingua sub-crates through
//! a single dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use lingua::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate                        |
//! |-------------|---------|------------------------------|
//! | `data`      | **yes** | `lingua-data` (engine)       |
//! | `data-sqlx` | no      | `lingua-data-sqlx`           |
//! | `sqlite`    | no      | `lingua-data-sqlx/sqlite`    |
//! | `postgres`  | no      | `lingua-data-sqlx/postgres`  |
//! | `full`      | no      | All of the above             |

// Re-export everything from lingua-core at the top level for convenience.
pub use lingua_core::*;

#[cfg(feature = "data")]
pub use lingua_data;

#[cfg(feature = "data-sqlx")]
pub use lingua_data_sqlx;

/// Unified prelude. Import everything with `use lingua::prelude::*`.
///
/// Includes the core prelude plus types from all enabled feature crates.
pub mod prelude {
    pub use lingua_core::prelude::*;

    #[cfg(feature = "data")]
    pub use lingua_data::prelude::*;

    #[cfg(feature = "data-sqlx")]
    pub use lingua_data_sqlx::prelude::*;
}
