//! Reserved attribute names

/// Prefix of the wrapper's own special attributes (`aq_base`, `aq_parent`, ...)
pub const SPECIAL_PREFIX: &str = "aq_";

/// Alias of `aq_parent`, and the native parent pointer attribute of plain objects
pub const PARENT_ALIAS: &str = "__parent__";

/// State-capture hooks that a wrapper always refuses
pub const SERIALIZATION_PROBES: [&str; 3] = ["__reduce__", "__reduce_ex__", "__getstate__"];

/// Private names are not acquired implicitly
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

/// Whether `name` asks for persistable state
pub fn is_serialization_probe(name: &str) -> bool {
    SERIALIZATION_PROBES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_names() {
        assert!(is_private("_secret"));
        assert!(is_private("__parent__"));
        assert!(!is_private("color"));
        assert!(!is_private(""));
    }

    #[test]
    fn test_probes() {
        assert!(is_serialization_probe("__getstate__"));
        assert!(!is_serialization_probe("__setstate__"));
    }
}
