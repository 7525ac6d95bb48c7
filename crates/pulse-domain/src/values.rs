//! Validated value types shared across the domain.
//!
//! Each type validates on construction and exposes a `from_trusted`
//! constructor for database-origin values that were validated when first
//! stored.

use std::fmt;

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use serde::{Deserialize, Serialize};

/// Minimum allowed event weight.
pub const MIN_WEIGHT: f64 = 0.1;
/// Maximum allowed event weight.
pub const MAX_WEIGHT: f64 = 10.0;
/// Weight assigned when neither the caller nor the event kind supplies one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

const SLUG_MIN_LEN: usize = 3;
const SLUG_MAX_LEN: usize = 100;
const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 50;

/// A url-friendly community identifier.
///
/// Lowercase alphanumeric with hyphens, 3 to 100 characters. Slugs are
/// never stored in any other case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Create a new slug, validating the format.
    pub fn new(s: impl Into<String>) -> AppResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(AppError::invalid_input("slug cannot be empty"));
        }
        if s.len() < SLUG_MIN_LEN {
            return Err(AppError::invalid_input("slug must be at least 3 characters"));
        }
        if s.len() > SLUG_MAX_LEN {
            return Err(AppError::invalid_input("slug must be at most 100 characters"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AppError::invalid_input(
                "slug must contain only lowercase letters, numbers, and hyphens",
            ));
        }
        Ok(Self(s))
    }

    /// Create a slug without validation.
    ///
    /// Only for loading from the database where data was validated on write.
    pub fn from_trusted(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Return the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated username: 3 to 50 characters, alphanumeric with underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Create a new username, validating the format.
    pub fn new(s: impl Into<String>) -> AppResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(AppError::invalid_input("username cannot be empty"));
        }
        if s.len() < USERNAME_MIN_LEN {
            return Err(AppError::invalid_input(
                "username must be at least 3 characters",
            ));
        }
        if s.len() > USERNAME_MAX_LEN {
            return Err(AppError::invalid_input(
                "username must be at most 50 characters",
            ));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::invalid_input(
                "username must contain only letters, numbers, and underscores",
            ));
        }
        Ok(Self(s))
    }

    /// Create a username without validation.
    ///
    /// Only for loading from the database where data was validated on write.
    pub fn from_trusted(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Return the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The importance weight of an event, between 0.1 and 10.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    /// Create a new weight, validating the range.
    pub fn new(v: f64) -> AppResult<Self> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&v) {
            return Err(AppError::invalid_input(format!(
                "weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {v}"
            )));
        }
        Ok(Self(v))
    }

    /// Return the numeric weight value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self(DEFAULT_WEIGHT)
    }
}

/// A momentum score: always non-negative, reflecting the rate of recent
/// weighted activity. Arithmetic that would go below zero clamps to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Momentum(f64);

impl Momentum {
    /// Create a new momentum value, clamping negatives to zero.
    pub fn new(v: f64) -> Self {
        Self(v.max(0.0))
    }

    /// Return the numeric momentum value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Return a new momentum with the given delta added (clamped at zero).
    pub fn add(&self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }

    /// Whether the momentum is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self(0.0)
    }
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_valid() {
        let slug = Slug::new("rust-gamedev-42").expect("valid slug");
        assert_eq!(slug.as_str(), "rust-gamedev-42");
    }

    #[test]
    fn test_slug_rejects_bad_input() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("ab").is_err());
        assert!(Slug::new("a".repeat(101)).is_err());
        assert!(Slug::new("Uppercase").is_err());
        assert!(Slug::new("under_score").is_err());
        assert!(Slug::new("spa ce").is_err());
    }

    #[test]
    fn test_slug_boundary_lengths() {
        assert!(Slug::new("abc").is_ok());
        assert!(Slug::new("a".repeat(100)).is_ok());
    }

    #[test]
    fn test_username_valid() {
        let name = Username::new("some_user42").expect("valid username");
        assert_eq!(name.as_str(), "some_user42");
    }

    #[test]
    fn test_username_rejects_bad_input() {
        assert!(Username::new("").is_err());
        assert!(Username::new("ab").is_err());
        assert!(Username::new("a".repeat(51)).is_err());
        assert!(Username::new("bad-dash").is_err());
        assert!(Username::new("bad space").is_err());
    }

    #[test]
    fn test_username_allows_mixed_case() {
        assert!(Username::new("MixedCase_9").is_ok());
    }

    #[test]
    fn test_weight_range() {
        assert!(Weight::new(0.1).is_ok());
        assert!(Weight::new(10.0).is_ok());
        assert!(Weight::new(5.5).is_ok());
        assert!(Weight::new(0.09).is_err());
        assert!(Weight::new(10.01).is_err());
        assert!(Weight::new(-1.0).is_err());
        assert!(Weight::new(0.0).is_err());
    }

    #[test]
    fn test_weight_default() {
        assert_eq!(Weight::default().value(), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_momentum_clamps_negative() {
        assert_eq!(Momentum::new(-5.0).value(), 0.0);
        assert_eq!(Momentum::new(0.0).value(), 0.0);
        assert_eq!(Momentum::new(3.5).value(), 3.5);
    }

    #[test]
    fn test_momentum_add_is_immutable() {
        let m = Momentum::new(2.0);
        let m2 = m.add(-5.0);
        assert_eq!(m.value(), 2.0);
        assert_eq!(m2.value(), 0.0);
        assert_eq!(m.add(1.5).value(), 3.5);
    }

    #[test]
    fn test_momentum_is_zero() {
        assert!(Momentum::default().is_zero());
        assert!(!Momentum::new(0.1).is_zero());
    }
}
