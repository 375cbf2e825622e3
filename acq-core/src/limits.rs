//! Resolution limits and configuration

use crate::error::{AcqError, Result};

/// Limits guarding recursive resolution and chain walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum container hops plus nested wrapper levels for one lookup
    /// (default: 256, hard: 4,096); exceeding it reports `RecursionDetected`
    pub max_depth: usize,
    /// Maximum number of contexts visited by `chain`/`in_context_of` (default: 4,096, hard: 65,536)
    pub max_chain_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_chain_length: 4_096,
        }
    }
}

impl Limits {
    /// Hard maximum limits that cannot be exceeded
    pub fn hard_maximums() -> Self {
        Self {
            max_depth: 4_096,
            max_chain_length: 65_536,
        }
    }

    /// Validate limits against hard maximums
    pub fn validate(&self) -> Result<()> {
        let hard = Self::hard_maximums();

        if self.max_depth == 0 {
            return Err(AcqError::LimitExceeded(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_depth > hard.max_depth {
            return Err(AcqError::LimitExceeded(format!(
                "max_depth {} exceeds hard limit {}",
                self.max_depth, hard.max_depth
            )));
        }
        if self.max_chain_length == 0 {
            return Err(AcqError::LimitExceeded(
                "max_chain_length must be at least 1".to_string(),
            ));
        }
        if self.max_chain_length > hard.max_chain_length {
            return Err(AcqError::LimitExceeded(format!(
                "max_chain_length {} exceeds hard limit {}",
                self.max_chain_length, hard.max_chain_length
            )));
        }

        Ok(())
    }
}
