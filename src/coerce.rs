//! String-to-value coercion for leaf fields.
//!
//! This is the only place a raw source string becomes a typed value. Numeric
//! parsing follows the original base-0 convention: `0x`, `0o` and `0b`
//! prefixes select the radix, anything else is decimal. Overflow is an error,
//! never a silent truncation.

use std::fmt;
use std::time::Duration;

/// Error produced by a single coercion attempt, without field context.
/// The traversal engine attaches the field identifier and lookup key.
#[derive(Debug, Clone)]
pub enum CoerceError {
    /// The string could not be parsed as the target type.
    Parse {
        value: String,
        type_name: &'static str,
        detail: String,
    },
    /// The target type has no coercion rule.
    Unsupported { type_name: &'static str },
}

impl CoerceError {
    pub(crate) fn parse(value: &str, type_name: &'static str, detail: impl fmt::Display) -> Self {
        CoerceError::Parse {
            value: value.to_string(),
            type_name,
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::Parse {
                value,
                type_name,
                detail,
            } => write!(
                f,
                "invalid value '{}' for type {}: {}",
                value, type_name, detail
            ),
            CoerceError::Unsupported { type_name } => {
                write!(f, "unsupported type {}", type_name)
            }
        }
    }
}

impl std::error::Error for CoerceError {}

/// A leaf field slot a raw string can be coerced into.
///
/// `coerce` reports whether a value was applied; `display_value` is the
/// string form of the current value, `None` when it is the type's zero value
/// (documentation mode omits zero defaults from templates).
pub trait Coerce {
    fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError>;
    fn type_name(&self) -> &'static str;
    fn display_value(&self) -> Option<String>;
}

/// Tentative-commit wrapper: the pointee is allocated up front, but the
/// allocation is kept only if coercion actually applied a value.
impl<T: Coerce + Default> Coerce for Option<T> {
    fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
        let fresh = self.is_none();
        let inner = self.get_or_insert_with(T::default);
        match inner.coerce(raw) {
            Ok(true) => Ok(true),
            Ok(false) => {
                if fresh {
                    *self = None;
                }
                Ok(false)
            }
            Err(err) => {
                if fresh {
                    *self = None;
                }
                Err(err)
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Some(inner) => inner.type_name(),
            None => T::default().type_name(),
        }
    }

    fn display_value(&self) -> Option<String> {
        self.as_ref().and_then(|inner| inner.display_value())
    }
}


impl Coerce for bool {
    fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
        if raw.is_empty() {
            *self = true;
            return Ok(true);
        }
        match raw.parse::<bool>() {
            Ok(v) => {
                *self = v;
                Ok(true)
            }
            Err(err) => Err(CoerceError::parse(raw, "bool", err)),
        }
    }

    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn display_value(&self) -> Option<String> {
        if *self {
            Some("true".to_string())
        } else {
            None
        }
    }
}

impl Coerce for String {
    fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
        *self = raw.to_string();
        Ok(true)
    }

    fn type_name(&self) -> &'static str {
        "String"
    }

    fn display_value(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }
}

impl Coerce for Duration {
    fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
        match humantime::parse_duration(raw) {
            Ok(d) => {
                *self = d;
                Ok(true)
            }
            Err(err) => Err(CoerceError::parse(raw, "Duration", err)),
        }
    }

    fn type_name(&self) -> &'static str {
        "Duration"
    }

    fn display_value(&self) -> Option<String> {
        if self.is_zero() {
            None
        } else {
            Some(humantime::format_duration(*self).to_string())
        }
    }
}

/// Splits an optional sign and radix prefix off a numeric literal.
fn split_radix(raw: &str) -> (bool, u32, &str) {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (radix, digits) = if let Some(d) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"))
    {
        (16, d)
    } else if let Some(d) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        (8, d)
    } else if let Some(d) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, d)
    } else {
        (10, body)
    };
    (negative, radix, digits)
}

macro_rules! integer_coerce {
    ($($t:ty => $name:literal),* $(,)?) => {$(
        impl Coerce for $t {
            fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
                if raw.is_empty() {
                    *self = 0;
                    return Ok(true);
                }
                let (negative, radix, digits) = split_radix(raw);
                let parsed = if radix == 10 {
                    raw.parse::<$t>()
                } else if negative {
                    <$t>::from_str_radix(&format!("-{}", digits), radix)
                } else {
                    <$t>::from_str_radix(digits, radix)
                };
                match parsed {
                    Ok(v) => {
                        *self = v;
                        Ok(true)
                    }
                    Err(err) => Err(CoerceError::parse(raw, $name, err)),
                }
            }

            fn type_name(&self) -> &'static str {
                $name
            }

            fn display_value(&self) -> Option<String> {
                if *self == 0 {
                    None
                } else {
                    Some(self.to_string())
                }
            }
        }
    )*};
}

integer_coerce! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

macro_rules! float_coerce {
    ($($t:ty => $name:literal),* $(,)?) => {$(
        impl Coerce for $t {
            fn coerce(&mut self, raw: &str) -> Result<bool, CoerceError> {
                if raw.is_empty() {
                    *self = 0.0;
                    return Ok(true);
                }
                match raw.parse::<$t>() {
                    Ok(v) => {
                        *self = v;
                        Ok(true)
                    }
                    Err(err) => Err(CoerceError::parse(raw, $name, err)),
                }
            }

            fn type_name(&self) -> &'static str {
                $name
            }

            fn display_value(&self) -> Option<String> {
                if *self == 0.0 {
                    None
                } else {
                    Some(self.to_string())
                }
            }
        }
    )*};
}

float_coerce! {
    f32 => "f32",
    f64 => "f64",
}

/// Wires a `FromStr + Display + Default` type (typically a config enum) into
/// the coercion and binding machinery, so it can be used as a leaf field.
///
/// ```
/// use std::str::FromStr;
///
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// enum Mode {
///     #[default]
///     Dev,
///     Prod,
/// }
///
/// impl FromStr for Mode {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         match s {
///             "dev" => Ok(Mode::Dev),
///             "prod" => Ok(Mode::Prod),
///             other => Err(format!("expected 'dev' or 'prod', got '{}'", other)),
///         }
///     }
/// }
///
/// impl std::fmt::Display for Mode {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str(match self {
///             Mode::Dev => "dev",
///             Mode::Prod => "prod",
///         })
///     }
/// }
///
/// envbind::impl_scalar_from_str!(Mode);
/// ```
#[macro_export]
macro_rules! impl_scalar_from_str {
    ($t:ty) => {
        impl $crate::Coerce for $t {
            fn coerce(
                &mut self,
                raw: &str,
            ) -> ::core::result::Result<bool, $crate::CoerceError> {
                match raw.parse::<$t>() {
                    ::core::result::Result::Ok(v) => {
                        *self = v;
                        ::core::result::Result::Ok(true)
                    }
                    ::core::result::Result::Err(err) => {
                        ::core::result::Result::Err($crate::CoerceError::Parse {
                            value: ::std::string::ToString::to_string(raw),
                            type_name: ::core::any::type_name::<$t>(),
                            detail: ::std::string::ToString::to_string(&err),
                        })
                    }
                }
            }

            fn type_name(&self) -> &'static str {
                ::core::any::type_name::<$t>()
            }

            fn display_value(&self) -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::ToString::to_string(self))
            }
        }

        impl $crate::Bind for $t {
            fn as_slot(&mut self) -> $crate::FieldSlot<'_> {
                $crate::FieldSlot::Scalar(self)
            }
        }

        impl $crate::OptionalSlot for $t {
            fn option_slot(
                opt: &mut ::core::option::Option<$t>,
            ) -> $crate::FieldSlot<'_> {
                $crate::FieldSlot::Scalar(opt)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_empty_string_means_true() {
        let mut v = false;
        assert!(v.coerce("").unwrap());
        assert!(v);
    }

    #[test]
    fn test_bool_parses_true_false() {
        let mut v = true;
        assert!(v.coerce("false").unwrap());
        assert!(!v);
        assert!(v.coerce("true").unwrap());
        assert!(v);
    }

    #[test]
    fn test_bool_invalid() {
        let mut v = false;
        let err = v.coerce("yes").unwrap_err();
        assert!(matches!(err, CoerceError::Parse { .. }));
    }

    #[test]
    fn test_string_verbatim() {
        let mut v = String::new();
        assert!(v.coerce("hello world").unwrap());
        assert_eq!(v, "hello world");
        assert!(v.coerce("").unwrap());
        assert_eq!(v, "");
    }

    #[test]
    fn test_int_empty_string_means_zero() {
        let mut v: i64 = 42;
        assert!(v.coerce("").unwrap());
        assert_eq!(v, 0);
    }

    #[test]
    fn test_int_decimal_and_negative() {
        let mut v: i32 = 0;
        assert!(v.coerce("-123").unwrap());
        assert_eq!(v, -123);
    }

    #[test]
    fn test_int_radix_prefixes() {
        let mut v: u32 = 0;
        assert!(v.coerce("0x1F").unwrap());
        assert_eq!(v, 31);
        assert!(v.coerce("0o17").unwrap());
        assert_eq!(v, 15);
        assert!(v.coerce("0b101").unwrap());
        assert_eq!(v, 5);
    }

    #[test]
    fn test_int_overflow_is_an_error() {
        let mut v: u8 = 0;
        let err = v.coerce("256").unwrap_err();
        assert!(matches!(err, CoerceError::Parse { .. }));
        assert_eq!(v, 0);
    }

    #[test]
    fn test_uint_rejects_negative() {
        let mut v: u16 = 7;
        assert!(v.coerce("-1").is_err());
        assert_eq!(v, 7);
    }

    #[test]
    fn test_float_parse() {
        let mut v: f32 = 0.0;
        assert!(v.coerce("1.3333").unwrap());
        assert_eq!(v, 1.3333);

        let mut d: f64 = 1.0;
        assert!(d.coerce("").unwrap());
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_duration_parse() {
        let mut v = Duration::default();
        assert!(v.coerce("60s").unwrap());
        assert_eq!(v, Duration::from_secs(60));
        assert!(v.coerce("1h 30m").unwrap());
        assert_eq!(v, Duration::from_secs(5400));
    }

    #[test]
    fn test_duration_empty_string_is_an_error() {
        let mut v = Duration::default();
        assert!(v.coerce("").is_err());
    }

    #[test]
    fn test_duration_malformed() {
        let mut v = Duration::default();
        assert!(v.coerce("sixty seconds").is_err());
    }

    #[test]
    fn test_option_commits_on_success() {
        let mut v: Option<i64> = None;
        assert!(v.coerce("10").unwrap());
        assert_eq!(v, Some(10));
    }

    #[test]
    fn test_option_discards_allocation_on_error() {
        let mut v: Option<i64> = None;
        assert!(v.coerce("nope").is_err());
        assert_eq!(v, None);
    }

    #[test]
    fn test_option_keeps_existing_value_on_error() {
        let mut v: Option<i64> = Some(5);
        assert!(v.coerce("nope").is_err());
        assert_eq!(v, Some(5));
    }

    #[test]
    fn test_display_value_zero_is_none() {
        assert_eq!(0i64.display_value(), None);
        assert_eq!(10i64.display_value(), Some("10".to_string()));
        assert_eq!(false.display_value(), None);
        assert_eq!(true.display_value(), Some("true".to_string()));
        assert_eq!(String::new().display_value(), None);
        assert_eq!(
            "RED".to_string().display_value(),
            Some("RED".to_string())
        );
        assert_eq!(Duration::default().display_value(), None);
        assert_eq!(
            Duration::from_secs(90).display_value(),
            Some("1m 30s".to_string())
        );
    }

    #[test]
    fn test_option_type_name_without_value() {
        let v: Option<u16> = None;
        assert_eq!(v.type_name(), "u16");
    }
}
