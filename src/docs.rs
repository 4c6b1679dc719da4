//! Field documentation records produced by documentation-mode traversal.

/// Documentation for one named value of an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumValueDoc {
    pub value: String,
    pub description: String,
}

/// What a record's rich self-description capability returns for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDocSpec {
    pub description: String,
    pub values: Vec<EnumValueDoc>,
}

/// One documented leaf field, collected in traversal (declaration) order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDocEntry {
    /// The composite lookup key the loader would probe.
    pub lookup_key: String,
    /// Declared type name of the leaf.
    pub data_type: String,
    /// Whether the field is marked required.
    pub required: bool,
    /// Description text, resolved through the record's self-description
    /// capabilities; empty when none applies.
    pub description: String,
    /// String form of the skeleton's current value, empty when zero.
    pub value: String,
    /// Dotted structural path from the root record, e.g. `inner.color`.
    pub path: String,
    /// Enumerated-value documentation, when the rich capability provides it.
    pub values: Vec<EnumValueDoc>,
}
