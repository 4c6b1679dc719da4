//! Default lookup-key derivation from field identifiers.

/// Derives the default lookup-key fragment for a field identifier.
///
/// Snake_case identifiers (the Rust convention) are upper-cased verbatim, so
/// `server_url` becomes `SERVER_URL` and `ipv4_address` becomes
/// `IPV4_ADDRESS`. Identifiers in capitalized-word style go through an
/// acronym-aware scan instead: runs of uppercase letters and digits stay
/// joined, a separator is inserted before such a run when it follows a
/// lowercase character, and between an acronym run of length >= 2 and a
/// following lowercase run. `APIVersion` -> `API_VERSION`,
/// `IPV4Address` -> `IPV4_ADDRESS`, `Area51` -> `AREA_51`.
pub fn derive_field_key(identifier: &str) -> String {
    if identifier.is_empty() {
        return String::new();
    }
    if identifier.contains('_') {
        return identifier.to_uppercase();
    }

    let mut out: Vec<char> = Vec::with_capacity(identifier.len() + 4);
    let mut prev_is_upper = true;
    for c in identifier.chars() {
        if c.is_uppercase() || c.is_numeric() {
            if prev_is_upper {
                out.push(c);
                continue;
            }
            out.push('_');
            out.push(c);
            prev_is_upper = true;
        } else {
            // end of an acronym run of length >= 2
            if prev_is_upper && out.len() >= 2 {
                let before_last = out[out.len() - 2];
                if before_last.is_uppercase() || before_last.is_numeric() {
                    let last = out[out.len() - 1];
                    let ix = out.len() - 1;
                    out[ix] = '_';
                    out.push(last);
                }
            }
            out.push(c);
            prev_is_upper = false;
        }
    }

    out.into_iter().collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(derive_field_key(""), "");
    }

    #[test]
    fn test_single_word() {
        assert_eq!(derive_field_key("Name"), "NAME");
        assert_eq!(derive_field_key("name"), "NAME");
    }

    #[test]
    fn test_acronym_only() {
        assert_eq!(derive_field_key("REST"), "REST");
    }

    #[test]
    fn test_acronym_prefix() {
        assert_eq!(derive_field_key("APIVersion"), "API_VERSION");
    }

    #[test]
    fn test_acronym_suffix() {
        assert_eq!(derive_field_key("ServerURL"), "SERVER_URL");
    }

    #[test]
    fn test_acronym_with_digit() {
        assert_eq!(derive_field_key("IPV4Address"), "IPV4_ADDRESS");
    }

    #[test]
    fn test_trailing_digits() {
        assert_eq!(derive_field_key("Area51"), "AREA_51");
    }

    #[test]
    fn test_camel_words() {
        assert_eq!(derive_field_key("ModuleName"), "MODULE_NAME");
        assert_eq!(derive_field_key("MinAPIVersion"), "MIN_API_VERSION");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(derive_field_key("server_url"), "SERVER_URL");
        assert_eq!(derive_field_key("ipv4_address"), "IPV4_ADDRESS");
        assert_eq!(derive_field_key("area_51"), "AREA_51");
        assert_eq!(derive_field_key("pool_size"), "POOL_SIZE");
    }
}
