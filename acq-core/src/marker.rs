//! The force-acquisition marker

use std::fmt;

/// Marker an attribute can hold to say "acquire the real value from the container".
///
/// There is exactly one instance, [`ACQUIRED`]; it cannot be constructed
/// outside this module and is compared by address.
pub struct Acquired {
    _private: (),
}

/// The only `Acquired` value.
pub static ACQUIRED: Acquired = Acquired { _private: () };

impl Acquired {
    /// True when `other` is the process-wide marker.
    pub fn is_marker(other: &Acquired) -> bool {
        std::ptr::eq(other, &ACQUIRED)
    }
}

impl fmt::Debug for Acquired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Special Object Used to Force Acquisition>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_identity() {
        assert!(Acquired::is_marker(&ACQUIRED));
    }
}
