//! The loader configuration and the recursive binding/traversal engine.
//!
//! One engine serves two modes. Load mode walks a record tree against a
//! key-value source, coercing present values into fields and enforcing
//! required-ness. Documentation mode walks the same tree and collects a
//! [`FieldDocEntry`] per leaf instead of touching the source.
//!
//! Required-ness is resolved in two passes. At the root (and under a required
//! ancestor) a missing required leaf fails immediately. Inside an optional
//! sub-record the failure is deferred to the end of that level: if nothing at
//! all was loaded into the sub-record it is left unset without error, but a
//! partially-populated sub-record missing a required leaf is an error.

use crate::coerce::{Coerce, CoerceError};
use crate::docs::{FieldDocEntry, FieldDocSpec};
use crate::error::{LoadError, UnsatisfiedField};
use crate::record::{Bind, EnvRecord, FieldSlot, FieldVisitor, RecordCell, RecordMap};
use crate::source::{ProcessEnv, Source};
use crate::tag::FieldOptions;

/// Default namespace separator between key segments.
pub const NAMESPACE_SEPARATOR_DEFAULT: &str = "_";

/// Default key-override sentinel marking a field as ignored.
pub const IGNORED_FIELD_NAME_DEFAULT: &str = "-";

/// Default key-override sentinel marking a field as squashed.
pub const SQUASH_FIELD_NAME_DEFAULT: &str = "&";

/// Default prefix character marking a field's key as prefix-free.
pub const NO_PREFIX_SENTINEL_DEFAULT: char = '!';

/// Binds record trees to a flat key-value namespace.
///
/// Configuration is immutable after construction; a `Loader` can be shared
/// freely across concurrent independent calls.
#[derive(Debug, Clone)]
pub struct Loader {
    /// Separator appended between prefix segments.
    pub namespace_separator: String,
    /// Key-override text that skips a field wholly.
    pub ignored_field_name: String,
    /// Key-override text that squashes a field into its parent.
    pub squash_field_name: String,
    /// Leading character that detaches a key from the inherited prefix.
    pub no_prefix_sentinel: char,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            namespace_separator: NAMESPACE_SEPARATOR_DEFAULT.to_string(),
            ignored_field_name: IGNORED_FIELD_NAME_DEFAULT.to_string(),
            squash_field_name: SQUASH_FIELD_NAME_DEFAULT.to_string(),
            no_prefix_sentinel: NO_PREFIX_SENTINEL_DEFAULT,
        }
    }
}

impl Loader {
    /// Loads values from the process environment into `target`.
    pub fn load<T: Bind>(&self, prefix: &str, target: &mut T) -> Result<(), LoadError> {
        self.load_from(&ProcessEnv, prefix, target)
    }

    /// Loads values from an injected source into `target`.
    pub fn load_from<T: Bind>(
        &self,
        source: &dyn Source,
        prefix: &str,
        target: &mut T,
    ) -> Result<(), LoadError> {
        let mut mode = Mode::Load { source };
        self.bind_target(&mut mode, prefix, target).map(|_| ())
    }

    /// Collects one documentation entry per bindable leaf field of the
    /// skeleton, in declaration order. The value source is never consulted
    /// and required-field absence never fails in this mode.
    pub fn collect_docs<T: Bind>(
        &self,
        prefix: &str,
        skeleton: &mut T,
    ) -> Result<Vec<FieldDocEntry>, LoadError> {
        let mut entries = Vec::new();
        let mut mode = Mode::Docs {
            entries: &mut entries,
        };
        self.bind_target(&mut mode, prefix, skeleton)?;
        Ok(entries)
    }

    fn bind_target<T: Bind>(
        &self,
        mode: &mut Mode<'_>,
        prefix: &str,
        target: &mut T,
    ) -> Result<bool, LoadError> {
        let root = Requirement {
            parent_required: false,
            deferral_allowed: false,
        };
        match target.as_slot() {
            FieldSlot::Record(rec) => self.bind_record(mode, rec, prefix, root, ""),
            FieldSlot::OptRecord(cell) => {
                let fresh = cell.is_unset();
                let result = {
                    let rec = cell.get_or_init();
                    self.bind_record(mode, rec, prefix, root, "")
                };
                match result {
                    Ok(true) => Ok(true),
                    Ok(false) => {
                        if fresh {
                            cell.clear();
                        }
                        Ok(false)
                    }
                    Err(err) => {
                        if fresh {
                            cell.clear();
                        }
                        Err(err)
                    }
                }
            }
            FieldSlot::Scalar(_) => Err(LoadError::InvalidTarget {
                reason: "top-level target must be a record, not a scalar",
            }),
            FieldSlot::Map(_) => Err(LoadError::InvalidTarget {
                reason: "top-level target must be a record, not a map",
            }),
        }
    }

    /// One recursion level: visits every field of `rec`, then settles the
    /// level's deferred required fields and doc descriptions.
    fn bind_record(
        &self,
        mode: &mut Mode<'_>,
        rec: &mut dyn EnvRecord,
        prefix: &str,
        req: Requirement,
        path: &str,
    ) -> Result<bool, LoadError> {
        let mut binder = Binder {
            loader: self,
            mode: &mut *mode,
            prefix,
            req,
            path,
            loaded_any: false,
            unsatisfied: Vec::new(),
            own_entries: Vec::new(),
        };
        rec.visit_fields(&mut binder)?;
        let loaded_any = binder.loaded_any;
        let unsatisfied = binder.unsatisfied;
        let own_entries = binder.own_entries;

        if let Mode::Docs { entries } = mode {
            let rich = rec.describe_fields();
            let legacy = rec
                .legacy_field_descriptions()
                .map(|cap| cap.field_descriptions());
            for (ix, identifier) in own_entries {
                let entry = &mut entries[ix];
                let mut spec = FieldDocSpec::default();
                if let Some(cap) = rich {
                    if let Some(by_ident) = cap.field_doc(identifier) {
                        spec = by_ident;
                    }
                    if spec.description.is_empty() && spec.values.is_empty() {
                        if let Some(by_key) = cap.field_doc(&entry.lookup_key) {
                            spec = by_key;
                        }
                    }
                }
                if spec.description.is_empty() {
                    if let Some(map) = &legacy {
                        if let Some(text) = map.get(identifier).or_else(|| map.get(&entry.lookup_key))
                        {
                            spec.description = text.clone();
                        }
                    }
                }
                entry.description = spec.description;
                entry.values = spec.values;
            }
        }

        if matches!(mode, Mode::Load { .. }) && loaded_any && !unsatisfied.is_empty() {
            return Err(LoadError::RequiredFields(unsatisfied));
        }
        Ok(loaded_any)
    }
}

/// Ambient required-ness context, fresh per recursion level.
#[derive(Debug, Clone, Copy)]
struct Requirement {
    /// An ancestor field was marked required: missing required leaves fail
    /// immediately instead of being deferred.
    parent_required: bool,
    /// At least one level of recursion has happened; absence of a required
    /// leaf may be deferred to the end of the level.
    deferral_allowed: bool,
}

enum Mode<'m> {
    Load { source: &'m dyn Source },
    Docs { entries: &'m mut Vec<FieldDocEntry> },
}

enum Nested<'a> {
    Plain(&'a mut dyn EnvRecord),
    Cell(&'a mut dyn RecordCell),
}

/// Per-level field visitor: the state machine the derive-generated walks
/// call back into.
struct Binder<'a, 'm> {
    loader: &'a Loader,
    mode: &'a mut Mode<'m>,
    prefix: &'a str,
    req: Requirement,
    path: &'a str,
    loaded_any: bool,
    unsatisfied: Vec<UnsatisfiedField>,
    /// Indices into the shared doc-entry sink for leaves emitted at this
    /// level, paired with their identifiers for description resolution.
    own_entries: Vec<(usize, &'static str)>,
}

impl FieldVisitor for Binder<'_, '_> {
    fn field(
        &mut self,
        identifier: &'static str,
        tag: &'static str,
        slot: FieldSlot<'_>,
    ) -> Result<(), LoadError> {
        let opts = FieldOptions::parse(identifier, tag, self.loader);
        if opts.ignored {
            return Ok(());
        }
        if opts.squash && opts.no_prefix {
            return Err(LoadError::InvalidTag {
                field: identifier,
                reason: "squash and no-prefix are mutually exclusive",
            });
        }
        if opts.docs_hidden && matches!(self.mode, Mode::Docs { .. }) {
            return Ok(());
        }

        match slot {
            FieldSlot::Scalar(scalar) => self.scalar_field(identifier, &opts, scalar),
            FieldSlot::Record(rec) => self.nested_field(identifier, &opts, Nested::Plain(rec)),
            FieldSlot::OptRecord(cell) => self.nested_field(identifier, &opts, Nested::Cell(cell)),
            FieldSlot::Map(map) => self.map_field(identifier, &opts, map),
        }
    }
}

impl Binder<'_, '_> {
    fn compose_key(&self, opts: &FieldOptions) -> String {
        if opts.no_prefix {
            opts.key.clone()
        } else {
            format!("{}{}", self.prefix, opts.key)
        }
    }

    fn child_prefix(&self, opts: &FieldOptions) -> String {
        let sep = &self.loader.namespace_separator;
        if opts.squash {
            self.prefix.to_string()
        } else if opts.no_prefix {
            format!("{}{}", opts.key, sep)
        } else {
            format!("{}{}{}", self.prefix, opts.key, sep)
        }
    }

    fn scalar_field(
        &mut self,
        identifier: &'static str,
        opts: &FieldOptions,
        scalar: &mut dyn Coerce,
    ) -> Result<(), LoadError> {
        if opts.squash {
            return Err(LoadError::InvalidTag {
                field: identifier,
                reason: "squash is only valid on record or map fields",
            });
        }
        let key = self.compose_key(opts);
        match &mut *self.mode {
            Mode::Docs { entries } => {
                let ix = entries.len();
                entries.push(FieldDocEntry {
                    lookup_key: key,
                    data_type: scalar.type_name().to_string(),
                    required: opts.required,
                    description: String::new(),
                    value: scalar.display_value().unwrap_or_default(),
                    path: join_path(self.path, identifier),
                    values: Vec::new(),
                });
                self.own_entries.push((ix, identifier));
                Ok(())
            }
            Mode::Load { source } => match source.lookup(&key) {
                Some(raw) => match scalar.coerce(&raw) {
                    Ok(applied) => {
                        self.loaded_any |= applied;
                        Ok(())
                    }
                    Err(err) => Err(coerce_to_load(identifier, key, err)),
                },
                None => {
                    if opts.required {
                        if self.req.parent_required || !self.req.deferral_allowed {
                            return Err(LoadError::RequiredField {
                                field: identifier,
                                key,
                            });
                        }
                        self.unsatisfied.push(UnsatisfiedField {
                            field: identifier,
                            key,
                        });
                    }
                    Ok(())
                }
            },
        }
    }

    fn nested_field(
        &mut self,
        identifier: &'static str,
        opts: &FieldOptions,
        target: Nested<'_>,
    ) -> Result<(), LoadError> {
        // An exact hit on the composite key treats the whole sub-record as
        // one opaque scalar instead of recursing into it.
        if !opts.squash {
            if let Mode::Load { source } = &*self.mode {
                let key = self.compose_key(opts);
                if let Some(raw) = source.lookup(&key) {
                    return self.opaque_field(identifier, key, &raw, target);
                }
            }
        }

        let child_prefix = self.child_prefix(opts);
        let child_req = Requirement {
            parent_required: self.req.parent_required || opts.required,
            deferral_allowed: true,
        };
        let child_path = join_path(self.path, identifier);

        let loaded = match target {
            Nested::Plain(rec) => {
                self.recurse(identifier, rec, &child_prefix, child_req, &child_path)?
            }
            Nested::Cell(cell) => {
                let fresh = cell.is_unset();
                let result = {
                    let rec = cell.get_or_init();
                    self.recurse(identifier, rec, &child_prefix, child_req, &child_path)
                };
                match result {
                    Ok(true) => true,
                    Ok(false) => {
                        if fresh {
                            cell.clear();
                        }
                        false
                    }
                    Err(err) => {
                        if fresh {
                            cell.clear();
                        }
                        return Err(err);
                    }
                }
            }
        };

        if !loaded && opts.required && matches!(self.mode, Mode::Load { .. }) {
            return Err(LoadError::RequiredField {
                field: identifier,
                key: child_prefix,
            });
        }
        self.loaded_any |= loaded;
        Ok(())
    }

    fn map_field(
        &mut self,
        identifier: &'static str,
        opts: &FieldOptions,
        map: &mut dyn RecordMap,
    ) -> Result<(), LoadError> {
        if !opts.is_map {
            return Err(LoadError::UnsupportedType {
                field: identifier,
                key: self.compose_key(opts),
                type_name: map.map_type_name(),
            });
        }
        let base = self.child_prefix(opts);
        let child_req = Requirement {
            parent_required: self.req.parent_required || opts.required,
            deferral_allowed: true,
        };
        let separator = self.loader.namespace_separator.clone();
        let parent_path = join_path(self.path, identifier);
        let required = opts.required;

        map.visit_entries(&mut |entry_key, rec| {
            let entry_prefix = format!("{}{}{}", base, entry_key.to_uppercase(), separator);
            let entry_path = format!("{}[{}]", parent_path, entry_key);
            let loaded = self.recurse(identifier, rec, &entry_prefix, child_req, &entry_path)?;
            if !loaded && required && matches!(self.mode, Mode::Load { .. }) {
                return Err(LoadError::RequiredField {
                    field: identifier,
                    key: entry_prefix,
                });
            }
            self.loaded_any |= loaded;
            Ok(())
        })
    }

    fn opaque_field(
        &mut self,
        identifier: &'static str,
        key: String,
        raw: &str,
        target: Nested<'_>,
    ) -> Result<(), LoadError> {
        let applied = match target {
            Nested::Plain(rec) => apply_opaque(identifier, &key, raw, rec)?,
            Nested::Cell(cell) => {
                let fresh = cell.is_unset();
                let result = {
                    let rec = cell.get_or_init();
                    apply_opaque(identifier, &key, raw, rec)
                };
                match result {
                    Ok(true) => true,
                    Ok(false) => {
                        if fresh {
                            cell.clear();
                        }
                        false
                    }
                    Err(err) => {
                        if fresh {
                            cell.clear();
                        }
                        return Err(err);
                    }
                }
            }
        };
        self.loaded_any |= applied;
        Ok(())
    }

    fn recurse(
        &mut self,
        identifier: &'static str,
        rec: &mut dyn EnvRecord,
        prefix: &str,
        req: Requirement,
        path: &str,
    ) -> Result<bool, LoadError> {
        self.loader
            .bind_record(self.mode, rec, prefix, req, path)
            .map_err(|err| LoadError::Field {
                field: identifier,
                prefix: prefix.to_string(),
                source: Box::new(err),
            })
    }
}

fn apply_opaque(
    field: &'static str,
    key: &str,
    raw: &str,
    rec: &mut dyn EnvRecord,
) -> Result<bool, LoadError> {
    let type_name = rec.record_name();
    match rec.opaque_scalar() {
        Some(op) => op
            .assign_opaque(raw)
            .map_err(|err| coerce_to_load(field, key.to_string(), err)),
        None => Err(LoadError::UnsupportedType {
            field,
            key: key.to_string(),
            type_name,
        }),
    }
}

fn coerce_to_load(field: &'static str, key: String, err: CoerceError) -> LoadError {
    match err {
        CoerceError::Parse {
            value,
            type_name,
            detail,
        } => LoadError::Parse {
            field,
            key,
            value,
            type_name,
            detail,
        },
        CoerceError::Unsupported { type_name } => LoadError::UnsupportedType {
            field,
            key,
            type_name,
        },
    }
}

fn join_path(path: &str, identifier: &str) -> String {
    if path.is_empty() {
        identifier.to_string()
    } else {
        format!("{}.{}", path, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Hand-written record impl, exercising the trait contract the derive
    /// macro normally fulfills.
    #[derive(Debug, Default, PartialEq)]
    struct Plain {
        name: String,
        count: i64,
    }

    impl EnvRecord for Plain {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), LoadError> {
            visitor.field("name", "", Bind::as_slot(&mut self.name))?;
            visitor.field("count", "", Bind::as_slot(&mut self.count))?;
            Ok(())
        }

        fn record_name(&self) -> &'static str {
            "Plain"
        }
    }

    impl Bind for Plain {
        fn as_slot(&mut self) -> FieldSlot<'_> {
            FieldSlot::Record(self)
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_manual_record_loads() {
        let source = vars(&[("PFX_NAME", "Go"), ("PFX_COUNT", "10")]);
        let mut cfg = Plain::default();
        Loader::default()
            .load_from(&source, "PFX_", &mut cfg)
            .unwrap();
        assert_eq!(
            cfg,
            Plain {
                name: "Go".to_string(),
                count: 10
            }
        );
    }

    #[test]
    fn test_empty_source_leaves_defaults() {
        let source = vars(&[]);
        let mut cfg = Plain::default();
        Loader::default().load_from(&source, "", &mut cfg).unwrap();
        assert_eq!(cfg, Plain::default());
    }

    #[test]
    fn test_top_level_scalar_is_invalid_target() {
        let source = vars(&[]);
        let mut not_a_record = 7i64;
        let err = Loader::default()
            .load_from(&source, "", &mut not_a_record)
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidTarget { .. }));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "inner"), "inner");
        assert_eq!(join_path("outer", "inner"), "outer.inner");
    }
}
