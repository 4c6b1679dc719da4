//! Per-field tag parsing.
//!
//! A tag is the raw string of a field's `#[env("...")]` attribute: an optional
//! key override, then a comma-separated flag list. `#[env("SERVER_URL,required")]`
//! overrides the key and marks the field required; `#[env(",required")]` keeps
//! the derived key. Unknown flag tokens are ignored so old binaries keep
//! working when new flags appear.

use crate::loader::Loader;
use crate::name::derive_field_key;

/// Parsed options of a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldOptions {
    /// Resolved lookup-key fragment. Empty only for squashed fields, which
    /// contribute no key segment of their own.
    pub key: String,
    /// Field is skipped wholly: never looked up, never documented.
    pub ignored: bool,
    /// Children share the parent's prefix; the field itself has no key.
    pub squash: bool,
    /// The field's key (and its children's keys) ignore any inherited prefix.
    pub no_prefix: bool,
    /// A value must be present in the source, subject to deferral rules.
    pub required: bool,
    /// The field is a string-keyed map of records, each entry traversed
    /// under its own uppercased-key prefix.
    pub is_map: bool,
    /// Excluded from documentation mode; loading is unaffected.
    pub docs_hidden: bool,
}

impl FieldOptions {
    /// Parses raw tag text against the loader's sentinel configuration.
    ///
    /// Total: never fails. Illegal flag combinations are left for the
    /// traversal engine to reject with field context attached.
    pub fn parse(identifier: &str, tag: &str, loader: &Loader) -> FieldOptions {
        let mut opts = FieldOptions::default();

        let (mut name, flags) = match tag.split_once(',') {
            Some((n, f)) => (n.to_string(), f),
            None => (tag.to_string(), ""),
        };

        for token in flags.split(',') {
            match token {
                "required" => opts.required = true,
                // "anonymous" is the historical spelling of squash
                "squash" | "anonymous" => opts.squash = true,
                "map" => opts.is_map = true,
                "docs_hidden" => opts.docs_hidden = true,
                _ => {}
            }
        }

        if !name.is_empty() {
            if name == loader.ignored_field_name {
                opts.ignored = true;
                return opts;
            }
            if name == loader.squash_field_name {
                name.clear();
                opts.squash = true;
            } else if let Some(rest) = name.strip_prefix(loader.no_prefix_sentinel) {
                opts.no_prefix = true;
                name = rest.to_string();
            }
        }

        if name.is_empty() && !opts.squash {
            name = derive_field_key(identifier);
        }
        opts.key = name;
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(identifier: &str, tag: &str) -> FieldOptions {
        FieldOptions::parse(identifier, tag, &Loader::default())
    }

    #[test]
    fn test_empty_tag_derives_key() {
        let opts = parse("server_url", "");
        assert_eq!(opts.key, "SERVER_URL");
        assert!(!opts.required);
        assert!(!opts.squash);
    }

    #[test]
    fn test_explicit_key() {
        let opts = parse("name", "DISPLAY_NAME");
        assert_eq!(opts.key, "DISPLAY_NAME");
    }

    #[test]
    fn test_flags_with_derived_key() {
        let opts = parse("client_id", ",required");
        assert_eq!(opts.key, "CLIENT_ID");
        assert!(opts.required);
    }

    #[test]
    fn test_explicit_key_with_flags() {
        let opts = parse("name", "NAME,required,docs_hidden");
        assert_eq!(opts.key, "NAME");
        assert!(opts.required);
        assert!(opts.docs_hidden);
    }

    #[test]
    fn test_ignore_sentinel() {
        let opts = parse("name", "-");
        assert!(opts.ignored);
    }

    #[test]
    fn test_squash_sentinel_clears_key() {
        let opts = parse("inner", "&");
        assert!(opts.squash);
        assert_eq!(opts.key, "");
    }

    #[test]
    fn test_squash_flag() {
        let opts = parse("inner", ",squash");
        assert!(opts.squash);
        assert_eq!(opts.key, "");
    }

    #[test]
    fn test_legacy_anonymous_alias() {
        let opts = parse("inner", ",anonymous");
        assert!(opts.squash);
        assert_eq!(opts.key, "");
    }

    #[test]
    fn test_no_prefix_sentinel() {
        let opts = parse("size", "!ABSOLUTE_SIZE");
        assert!(opts.no_prefix);
        assert_eq!(opts.key, "ABSOLUTE_SIZE");
    }

    #[test]
    fn test_no_prefix_sentinel_alone_falls_back_to_derived() {
        let opts = parse("description", "!");
        assert!(opts.no_prefix);
        assert_eq!(opts.key, "DESCRIPTION");
    }

    #[test]
    fn test_map_flag() {
        let opts = parse("map_of_struct", ",map");
        assert!(opts.is_map);
        assert_eq!(opts.key, "MAP_OF_STRUCT");
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let opts = parse("name", "NAME,frobnicate,required,omitempty");
        assert_eq!(opts.key, "NAME");
        assert!(opts.required);
        assert!(!opts.squash);
    }

    #[test]
    fn test_custom_sentinels() {
        let loader = Loader {
            namespace_separator: "__".to_string(),
            ignored_field_name: "skip".to_string(),
            squash_field_name: "flat".to_string(),
            no_prefix_sentinel: '^',
        };
        assert!(FieldOptions::parse("name", "skip", &loader).ignored);
        assert!(FieldOptions::parse("inner", "flat", &loader).squash);
        let opts = FieldOptions::parse("size", "^SIZE", &loader);
        assert!(opts.no_prefix);
        assert_eq!(opts.key, "SIZE");
    }
}
