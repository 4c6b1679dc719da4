//! Key-value sources a record tree can be bound from.

use std::collections::{BTreeMap, HashMap};

/// A flat string-keyed lookup the loader reads values from.
///
/// The loader never enumerates a source; it only probes exact keys. An empty
/// string value is a present value, distinct from an absent key.
pub trait Source {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The process environment. This is the default source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Source for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Source for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Source for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_lookup() {
        let mut vars = HashMap::new();
        vars.insert("NAME".to_string(), "Go".to_string());
        vars.insert("EMPTY".to_string(), String::new());

        assert_eq!(vars.lookup("NAME"), Some("Go".to_string()));
        assert_eq!(vars.lookup("EMPTY"), Some(String::new()));
        assert_eq!(vars.lookup("MISSING"), None);
    }

    #[test]
    fn test_process_env_lookup() {
        std::env::set_var("ENVBIND_SOURCE_TEST", "present");
        assert_eq!(
            ProcessEnv.lookup("ENVBIND_SOURCE_TEST"),
            Some("present".to_string())
        );
        assert_eq!(ProcessEnv.lookup("ENVBIND_SOURCE_TEST_MISSING"), None);
        std::env::remove_var("ENVBIND_SOURCE_TEST");
    }
}
