//! Lookup filters

use crate::error::Result;
use crate::value::Value;

/// Predicate deciding whether a found value is accepted.
///
/// Called once per candidate with the object the lookup started from
/// (`origin`), the object the value was found on (`instance`), the
/// requested name, the candidate and the caller's `extra` argument.
/// Returning `Ok(false)` keeps the search going; an error aborts it.
pub trait Filter {
    /// Accept or reject `value`
    fn accept(
        &self,
        origin: &Value,
        instance: &Value,
        name: &str,
        value: &Value,
        extra: &Value,
    ) -> Result<bool>;
}

impl<F> Filter for F
where
    F: Fn(&Value, &Value, &str, &Value, &Value) -> Result<bool>,
{
    fn accept(
        &self,
        origin: &Value,
        instance: &Value,
        name: &str,
        value: &Value,
        extra: &Value,
    ) -> Result<bool> {
        self(origin, instance, name, value, extra)
    }
}

/// Pin a closure's argument types so it can be used as a [`Filter`]
pub fn filter_fn<F>(f: F) -> F
where
    F: Fn(&Value, &Value, &str, &Value, &Value) -> Result<bool>,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AcqError;

    #[test]
    fn test_closure_filter() {
        let only_ints = filter_fn(|_, _, _, value, _| Ok(value.as_int().is_some()));
        let none = Value::None;
        assert!(only_ints.accept(&none, &none, "x", &Value::Int(1), &none).unwrap());
        assert!(!only_ints.accept(&none, &none, "x", &Value::str("a"), &none).unwrap());
    }

    #[test]
    fn test_filter_errors_surface() {
        let failing = filter_fn(|_, _, name, _, _| Err(AcqError::Custom(format!("refused {}", name))));
        let none = Value::None;
        let err = failing.accept(&none, &none, "x", &none, &none).unwrap_err();
        assert_eq!(err.to_string(), "refused x");
    }
}
