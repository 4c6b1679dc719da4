//! Env-file template rendering from collected field docs.
//!
//! External to the binding core: takes the ordered [`FieldDocEntry`] sequence
//! and renders a commented `KEY=value` template suitable for checking in as
//! a sample configuration file.

use std::fmt;
use std::io::{self, Write};

use crate::docs::FieldDocEntry;
use crate::error::LoadError;
use crate::loader::Loader;
use crate::record::Bind;

const DESCRIPTION_WRAP_COLUMNS: usize = 72;

/// Rendering options for [`write_env_template`].
#[derive(Debug, Clone)]
pub struct EnvTemplateOptions {
    /// Prefix prepended to every derived key.
    pub field_prefix: String,
    /// Keep fields in declaration order instead of sorting by key.
    pub original_ordering: bool,
    /// Emit the skeleton's current values after `=` instead of leaving the
    /// assignments blank (blank assignments still show non-zero values as a
    /// `#  def:` comment).
    pub include_skeleton_values: bool,
    /// Emit a `# path:` comment with the field's structural path.
    pub show_paths: bool,
}

impl Default for EnvTemplateOptions {
    fn default() -> Self {
        Self {
            field_prefix: String::new(),
            original_ordering: false,
            include_skeleton_values: false,
            show_paths: true,
        }
    }
}

/// Errors from template rendering.
#[derive(Debug)]
pub enum TemplateError {
    /// Doc collection over the skeleton failed.
    Collect(LoadError),
    /// The writer failed.
    Io(io::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Collect(err) => write!(f, "collecting field docs: {}", err),
            TemplateError::Io(err) => write!(f, "writing template: {}", err),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Collect(err) => Some(err),
            TemplateError::Io(err) => Some(err),
        }
    }
}

impl From<LoadError> for TemplateError {
    fn from(err: LoadError) -> Self {
        TemplateError::Collect(err)
    }
}

impl From<io::Error> for TemplateError {
    fn from(err: io::Error) -> Self {
        TemplateError::Io(err)
    }
}

/// Collects docs for `skeleton` with the default [`Loader`] and renders the
/// commented template into `writer`.
pub fn write_env_template<T: Bind>(
    writer: &mut dyn Write,
    skeleton: &mut T,
    opts: &EnvTemplateOptions,
) -> Result<(), TemplateError> {
    let docs = Loader::default().collect_docs(&opts.field_prefix, skeleton)?;
    render_entries(writer, docs, opts)
}

/// Renders already-collected entries; use this to combine a custom [`Loader`]
/// with the template format.
pub fn render_entries(
    writer: &mut dyn Write,
    mut docs: Vec<FieldDocEntry>,
    opts: &EnvTemplateOptions,
) -> Result<(), TemplateError> {
    if !opts.original_ordering {
        docs.sort_by(|a, b| a.lookup_key.cmp(&b.lookup_key));
    }

    for fd in &docs {
        writeln!(writer)?;
        if !fd.description.is_empty() {
            for line in textwrap::wrap(&fd.description, DESCRIPTION_WRAP_COLUMNS) {
                writeln!(writer, "# {}", line)?;
            }
            writeln!(writer, "#")?;
        }
        if !fd.values.is_empty() {
            writeln!(writer, "# values:")?;
            for v in &fd.values {
                writeln!(writer, "#   {} - {}", v.value, v.description)?;
            }
            writeln!(writer, "#")?;
        }
        if fd.required {
            writeln!(writer, "# required")?;
        }
        writeln!(writer, "# type: {}", fd.data_type)?;
        if !opts.include_skeleton_values && !fd.value.is_empty() {
            writeln!(writer, "#  def: {}", fd.value)?;
        }
        if opts.show_paths {
            writeln!(writer, "# path: {}", fd.path)?;
        }
        if opts.include_skeleton_values {
            writeln!(writer, "{}={}", fd.lookup_key, fd.value)?;
        } else {
            writeln!(writer, "{}=", fd.lookup_key)?;
        }
    }

    Ok(())
}
