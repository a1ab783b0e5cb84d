//! Strongly-typed ID types for domain entities.
//!
//! Both IDs are 64-bit signed integers. `IdentityId` is generated by the
//! identity store on first provisioning; `ProviderSubjectId` is the numeric
//! account identifier issued by the external identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around an `i64`.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an ID from its raw value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let raw = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                raw.parse::<i64>().map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a local identity record.
    IdentityId,
    "idn"
);

define_id!(
    /// Account identifier issued by the identity provider.
    ProviderSubjectId,
    "sub"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_id_display_format() {
        let id = IdentityId::new(1);
        assert_eq!(id.to_string(), "idn_1");
    }

    #[test]
    fn parse_with_prefix() {
        let id = IdentityId::new(42);
        let parsed: IdentityId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let id: ProviderSubjectId = "101".parse().expect("should parse");
        assert_eq!(id.get(), 101);
    }

    #[test]
    fn parse_invalid() {
        let result: Result<IdentityId, _> = "idn_abc".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "IdentityId");
    }

    #[test]
    fn id_serializes_as_bare_number() {
        let json = serde_json::to_string(&IdentityId::new(5)).expect("serialize");
        assert_eq!(json, "5");
        let parsed: IdentityId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, IdentityId::new(5));
    }
}
