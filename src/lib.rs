//! Bind nested configuration structs to flat environment-style key-value
//! namespaces, and render commented env-file templates documenting every
//! bindable field.
//!
//! ```no_run
//! use envbind::EnvRecord;
//!
//! #[derive(EnvRecord, Default, Debug)]
//! struct Config {
//!     name: String,
//!     #[env(",required")]
//!     port: u16,
//!     inner: Inner,
//! }
//!
//! #[derive(EnvRecord, Default, Debug)]
//! struct Inner {
//!     color: String,
//!     size: i64,
//! }
//!
//! let mut cfg = Config::default();
//! envbind::load_env("APP_", &mut cfg).expect("configuration");
//! // APP_NAME, APP_PORT, APP_INNER_COLOR, APP_INNER_SIZE
//! ```

pub mod coerce;
pub mod docgen;
pub mod docs;
pub mod error;
pub mod loader;
pub mod name;
pub mod record;
pub mod source;
pub mod tag;

// Re-export main types
pub use coerce::{Coerce, CoerceError};
pub use docgen::{render_entries, write_env_template, EnvTemplateOptions, TemplateError};
pub use docs::{EnumValueDoc, FieldDocEntry, FieldDocSpec};
pub use error::{LoadError, UnsatisfiedField};
pub use loader::{
    Loader, IGNORED_FIELD_NAME_DEFAULT, NAMESPACE_SEPARATOR_DEFAULT, NO_PREFIX_SENTINEL_DEFAULT,
    SQUASH_FIELD_NAME_DEFAULT,
};
pub use name::derive_field_key;
pub use record::{
    Bind, DescribeFields, EnvRecord, FieldDescriptions, FieldSlot, FieldVisitor, OpaqueScalar,
    RecordCell, RecordMap,
};
pub use source::{ProcessEnv, Source};
pub use tag::FieldOptions;

// Re-export derive macro
pub use envbind_macros::EnvRecord;

/// Loads `.env` (if present) and binds the process environment into `target`
/// with the default [`Loader`].
pub fn load_env<T: Bind>(prefix: &str, target: &mut T) -> Result<(), LoadError> {
    let _ = dotenvy::dotenv();
    Loader::default().load(prefix, target)
}

/// Collects documentation entries for every bindable leaf of `skeleton` with
/// the default [`Loader`].
pub fn collect_docs<T: Bind>(
    prefix: &str,
    skeleton: &mut T,
) -> Result<Vec<FieldDocEntry>, LoadError> {
    Loader::default().collect_docs(prefix, skeleton)
}
