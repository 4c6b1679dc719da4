//! Record traversal traits.
//!
//! `#[derive(EnvRecord)]` generates a `visit_fields` walk per record type:
//! the compile-time equivalent of reflecting over struct fields. The derive
//! also wires the type (and its `Option`/`Box` wrappers) into [`Bind`], which
//! classifies every field into one of four slot shapes the engine knows how
//! to handle.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::coerce::{Coerce, CoerceError};
use crate::docs::FieldDocSpec;
use crate::error::LoadError;

/// A record type whose fields can be walked in declaration order.
///
/// Implemented via `#[derive(EnvRecord)]`; the derive requires the type to
/// also implement `Default` (the zero-value used for tentative allocation of
/// optional sub-records).
pub trait EnvRecord {
    /// Visits every named field in declaration order, handing the visitor the
    /// declared identifier, the raw `#[env("...")]` tag text and a typed slot.
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), LoadError>;

    /// The record type's name, used in error and documentation context.
    fn record_name(&self) -> &'static str;

    /// Opaque-parse capability: lets a whole record be coerced from a single
    /// string when its exact composite key is present in the source.
    /// Registered with the `#[env(opaque)]` container attribute.
    fn opaque_scalar(&mut self) -> Option<&mut dyn OpaqueScalar> {
        None
    }

    /// Rich self-description capability, registered with `#[env(describe)]`.
    fn describe_fields(&self) -> Option<&dyn DescribeFields> {
        None
    }

    /// Legacy plain-text description capability, registered with
    /// `#[env(descriptions)]`.
    fn legacy_field_descriptions(&self) -> Option<&dyn FieldDescriptions> {
        None
    }
}

/// Receives one callback per visited field. Implemented by the traversal
/// engine; record types never implement this themselves.
pub trait FieldVisitor {
    fn field(
        &mut self,
        identifier: &'static str,
        tag: &'static str,
        slot: FieldSlot<'_>,
    ) -> Result<(), LoadError>;
}

/// Typed view of a single field, as handed to the engine.
pub enum FieldSlot<'a> {
    /// A coercible leaf, including `Option<scalar>` wrappers.
    Scalar(&'a mut dyn Coerce),
    /// A nested record that is always present (`T` or `Box<T>`).
    Record(&'a mut dyn EnvRecord),
    /// A nilable record pointer (`Option<T>` or `Option<Box<T>>`).
    OptRecord(&'a mut dyn RecordCell),
    /// A string-keyed map of records.
    Map(&'a mut dyn RecordMap),
}

/// Classifies a value into a [`FieldSlot`]. Scalars are wired up here and by
/// [`impl_scalar_from_str!`](crate::impl_scalar_from_str); record types get
/// their impls from `#[derive(EnvRecord)]`.
pub trait Bind {
    fn as_slot(&mut self) -> FieldSlot<'_>;
}

/// Dispatches the single blanket [`Bind`] impl for `Option<T>` to the right
/// [`FieldSlot`] variant. Scalar and record types each implement this for
/// themselves (built in here, or generated by `#[derive(EnvRecord)]` and
/// [`impl_scalar_from_str!`](crate::impl_scalar_from_str)), which keeps the
/// `Option<T>` impl itself singular and free of overlap.
pub trait OptionalSlot: Default + Sized {
    fn option_slot(opt: &mut Option<Self>) -> FieldSlot<'_>;
}

impl<T: OptionalSlot> Bind for Option<T> {
    fn as_slot(&mut self) -> FieldSlot<'_> {
        T::option_slot(self)
    }
}

/// A nilable slot holding a record, with explicit two-phase semantics: the
/// engine allocates tentatively, traverses, and clears the allocation again
/// when nothing was loaded into it.
pub trait RecordCell {
    fn is_unset(&self) -> bool;
    fn get_or_init(&mut self) -> &mut dyn EnvRecord;
    fn clear(&mut self);
}

impl<T: EnvRecord + Default> RecordCell for Option<T> {
    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn get_or_init(&mut self) -> &mut dyn EnvRecord {
        self.get_or_insert_with(T::default)
    }

    fn clear(&mut self) {
        *self = None;
    }
}

/// A string-keyed collection of records, each entry traversed independently
/// under its own key-derived prefix.
pub trait RecordMap {
    /// Visits entries with a deterministic key order.
    fn visit_entries(
        &mut self,
        f: &mut dyn FnMut(&str, &mut dyn EnvRecord) -> Result<(), LoadError>,
    ) -> Result<(), LoadError>;

    /// Type name for error context.
    fn map_type_name(&self) -> &'static str;
}

impl<T: EnvRecord> RecordMap for HashMap<String, T> {
    fn visit_entries(
        &mut self,
        f: &mut dyn FnMut(&str, &mut dyn EnvRecord) -> Result<(), LoadError>,
    ) -> Result<(), LoadError> {
        let mut keys: Vec<String> = self.keys().cloned().collect();
        keys.sort();
        for key in keys {
            if let Some(entry) = self.get_mut(&key) {
                f(&key, entry)?;
            }
        }
        Ok(())
    }

    fn map_type_name(&self) -> &'static str {
        "HashMap"
    }
}

impl<T: EnvRecord> RecordMap for BTreeMap<String, T> {
    fn visit_entries(
        &mut self,
        f: &mut dyn FnMut(&str, &mut dyn EnvRecord) -> Result<(), LoadError>,
    ) -> Result<(), LoadError> {
        for (key, entry) in self.iter_mut() {
            f(key, entry)?;
        }
        Ok(())
    }

    fn map_type_name(&self) -> &'static str {
        "BTreeMap"
    }
}

impl<T: EnvRecord> Bind for HashMap<String, T> {
    fn as_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Map(self)
    }
}

impl<T: EnvRecord> Bind for BTreeMap<String, T> {
    fn as_slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Map(self)
    }
}


/// A record that can be parsed whole from one opaque string. The blanket
/// impl covers every `FromStr` type with a displayable error, so registering
/// the capability is just `#[env(opaque)]` on a `FromStr` record.
pub trait OpaqueScalar {
    fn assign_opaque(&mut self, raw: &str) -> Result<bool, CoerceError>;
}

impl<T> OpaqueScalar for T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn assign_opaque(&mut self, raw: &str) -> Result<bool, CoerceError> {
        match raw.parse::<T>() {
            Ok(v) => {
                *self = v;
                Ok(true)
            }
            Err(err) => Err(CoerceError::parse(raw, std::any::type_name::<T>(), err)),
        }
    }
}

/// Rich self-description: per-field description text plus optional
/// enumerated-value documentation, queried by declared identifier first,
/// then by computed lookup key.
pub trait DescribeFields {
    fn field_doc(&self, name: &str) -> Option<FieldDocSpec>;
}

/// Legacy self-description: a plain identifier-or-key to description map.
pub trait FieldDescriptions {
    fn field_descriptions(&self) -> HashMap<String, String>;
}

macro_rules! scalar_bind {
    ($($t:ty),* $(,)?) => {$(
        impl Bind for $t {
            fn as_slot(&mut self) -> FieldSlot<'_> {
                FieldSlot::Scalar(self)
            }
        }

        impl OptionalSlot for $t {
            fn option_slot(opt: &mut Option<$t>) -> FieldSlot<'_> {
                FieldSlot::Scalar(opt)
            }
        }
    )*};
}

scalar_bind! {
    bool,
    i8, i16, i32, i64, isize,
    u8, u16, u32, u64, usize,
    f32, f64,
    String,
    std::time::Duration,
}
