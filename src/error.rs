use colored::Colorize;
use std::fmt;

/// A required field whose resolution was deferred and never satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatisfiedField {
    /// Declared field identifier.
    pub field: &'static str,
    /// The composite lookup key that was probed.
    pub key: String,
}

/// Errors that can occur while binding a record tree or collecting its docs
#[derive(Debug, Clone)]
pub enum LoadError {
    /// The top-level target cannot be traversed (e.g. a bare scalar or a map)
    InvalidTarget { reason: &'static str },
    /// Illegal flag combination on a field tag
    InvalidTag {
        field: &'static str,
        reason: &'static str,
    },
    /// A value was present but could not be coerced into the field's type
    Parse {
        field: &'static str,
        key: String,
        value: String,
        type_name: &'static str,
        detail: String,
    },
    /// The field's type has no coercion rule for the attempted operation
    UnsupportedType {
        field: &'static str,
        key: String,
        type_name: &'static str,
    },
    /// A required field (or sub-record) had no value in the source
    RequiredField { field: &'static str, key: String },
    /// Required fields whose resolution was deferred inside a sub-record that
    /// turned out to be partially populated
    RequiredFields(Vec<UnsatisfiedField>),
    /// Context wrapper attached at each recursion level on the way up
    Field {
        field: &'static str,
        prefix: String,
        source: Box<LoadError>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::InvalidTarget { reason } => {
                write!(f, "envbind: invalid target: {}", reason)
            }
            LoadError::InvalidTag { field, reason } => {
                write!(
                    f,
                    "envbind: invalid tag on field {}: {}",
                    field.magenta().bold(),
                    reason
                )
            }
            LoadError::Parse {
                field,
                key,
                value,
                type_name,
                detail,
            } => {
                write!(
                    f,
                    "envbind: {}: invalid value {} for field {} ({}): {}",
                    key.magenta().bold(),
                    format!("'{}'", value).red(),
                    field.magenta().bold(),
                    type_name,
                    detail
                )
            }
            LoadError::UnsupportedType {
                field,
                key,
                type_name,
            } => {
                write!(
                    f,
                    "envbind: {}: field {} has unsupported type {}",
                    key.magenta().bold(),
                    field.magenta().bold(),
                    type_name
                )
            }
            LoadError::RequiredField { field, key } => {
                write!(
                    f,
                    "envbind: {}: field {} is required",
                    key.magenta().bold(),
                    field.magenta().bold()
                )
            }
            LoadError::RequiredFields(fields) => {
                write!(f, "envbind: required fields are missing:")?;
                for uf in fields {
                    write!(
                        f,
                        "\n\t{} (field {})",
                        uf.key.magenta().bold(),
                        uf.field.magenta().bold()
                    )?;
                }
                Ok(())
            }
            LoadError::Field {
                field,
                prefix,
                source,
            } => {
                write!(
                    f,
                    "envbind: unable to load field {} (prefix {:?}): {}",
                    field.magenta().bold(),
                    prefix,
                    source
                )
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Field { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl LoadError {
    /// The innermost error, unwrapping per-level field context.
    pub fn root_cause(&self) -> &LoadError {
        match self {
            LoadError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
