use std::env;

use log::warn;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        other => {
            warn!("🪛️ '{other}' is not a valid boolean flag. Using the default, {default}, instead.");
            default
        },
    }
}

/// Reads the environment variable `name` as a boolean flag. Unset or unparseable values fall back to `default`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truthy_and_falsy_values() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_boolean_flag(Some(v.to_string()), false), "{v}");
        }
        for v in ["0", "false", "No", "off"] {
            assert!(!parse_boolean_flag(Some(v.to_string()), true), "{v}");
        }
    }

    #[test]
    fn missing_or_garbage_uses_default() {
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(None, false));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(Some("".into()), false));
    }
}
