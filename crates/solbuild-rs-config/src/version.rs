//! `MAJOR.MINOR.PATCH` compiler version strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A compiler release identified by three non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Reason a version string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidVersion(String);

impl CompilerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for CompilerVersion {
    type Err = InvalidVersion;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(InvalidVersion(format!(
                "expected MAJOR.MINOR.PATCH, got {raw:?}"
            )));
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // `u32::from_str` also takes a leading '+', which is not a version.
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InvalidVersion(format!(
                    "version component {part:?} in {raw:?} is not a non-negative integer"
                )));
            }
            *slot = part.parse().map_err(|_| {
                InvalidVersion(format!("version component {part:?} in {raw:?} is too large"))
            })?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for CompilerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompilerVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_three_components() {
        let version: CompilerVersion = "0.5.17".parse().expect("version");
        assert_eq!(version, CompilerVersion::new(0, 5, 17));
        assert_eq!(version.to_string(), "0.5.17");
    }

    #[test]
    fn rejects_non_numeric_and_wrong_arity() {
        for raw in ["abc", "0.5", "0.5.15.1", "0.5.x", "0..1", "+0.5.1", "-1.0.0", ""] {
            assert!(raw.parse::<CompilerVersion>().is_err(), "{raw} should fail");
        }
    }

    #[test]
    fn rejects_component_overflow() {
        let err = "0.5.99999999999".parse::<CompilerVersion>().unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn orders_numerically() {
        let older: CompilerVersion = "0.5.9".parse().expect("older");
        let newer: CompilerVersion = "0.5.15".parse().expect("newer");
        assert!(older < newer);
    }
}
