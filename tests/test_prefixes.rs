use std::collections::HashMap;

use envbind::{EnvRecord, LoadError, Loader};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(EnvRecord, Default, Debug, PartialEq)]
struct InnerPrefix {
    color: String,
    #[env("!ABSOLUTE_SIZE")]
    size: i64,
}

#[derive(EnvRecord, Default, Debug)]
struct Outer {
    name: String,
    #[env("!ABSOLUTE_DESC")]
    description: String,
    #[env("WITH")]
    with_prefix: InnerPrefix,
    #[env("!WITHOUT")]
    without_prefix: InnerPrefix,
    #[env("PTR")]
    with_ptr: Option<InnerPrefix>,
}

#[test]
fn test_prefix_rules() {
    let source = vars(&[
        ("NAME", "Go (no prefix)"),
        ("PFX_NAME", "Go"),
        ("ABSOLUTE_DESC", "Description"),
        ("PFX_ABSOLUTE_DESC", "Description (prefixed)"),
        ("COLOR", "BLACK"),
        ("PFX_COLOR", "WHITE"),
        ("PFX_WITH_COLOR", "RED"),
        ("WITHOUT_COLOR", "BLUE"),
        ("PFX_WITHOUT_COLOR", "GREEN"),
        ("ABSOLUTE_SIZE", "9001"),
        ("PFX_WITH_ABSOLUTE_SIZE", "9002"),
        ("PFX_PTR_COLOR", "ORANGE"),
    ]);

    let mut cfg = Outer::default();
    Loader::default()
        .load_from(&source, "PFX_", &mut cfg)
        .unwrap();

    assert_eq!(cfg.name, "Go");
    // no-prefix leaf resolves from the namespace root
    assert_eq!(cfg.description, "Description");
    assert_eq!(cfg.with_prefix.color, "RED");
    // the no-prefix leaf inside a prefixed record is still absolute
    assert_eq!(cfg.with_prefix.size, 9001);
    // no-prefix record: children resolve under the bare key
    assert_eq!(cfg.without_prefix.color, "BLUE");
    assert_eq!(cfg.without_prefix.size, 9001);
    assert_eq!(
        cfg.with_ptr,
        Some(InnerPrefix {
            color: "ORANGE".to_string(),
            size: 9001
        })
    );
}

#[derive(EnvRecord, Default, Debug)]
struct NestedDeep {
    inner: Middle,
}

#[derive(EnvRecord, Default, Debug)]
struct Middle {
    color: String,
}

#[test]
fn test_prefix_propagates_through_nesting() {
    let source = vars(&[("PFX_INNER_COLOR", "RED")]);
    let mut cfg = NestedDeep::default();
    Loader::default()
        .load_from(&source, "PFX_", &mut cfg)
        .unwrap();
    assert_eq!(cfg.inner.color, "RED");
}

#[derive(EnvRecord, Default, Debug)]
struct SquashNoPrefix {
    #[env("!,squash")]
    inner: Middle,
}

#[test]
fn test_squash_with_no_prefix_is_invalid() {
    let mut cfg = SquashNoPrefix::default();
    let err = Loader::default()
        .load_from(&vars(&[]), "PFX_", &mut cfg)
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        LoadError::InvalidTag { field: "inner", .. }
    ));
}

#[test]
fn test_custom_separator() {
    let loader = Loader {
        namespace_separator: "__".to_string(),
        ..Default::default()
    };
    let source = vars(&[("APP__INNER__COLOR", "RED")]);
    let mut cfg = NestedDeep::default();
    loader.load_from(&source, "APP__", &mut cfg).unwrap();
    assert_eq!(cfg.inner.color, "RED");
}
