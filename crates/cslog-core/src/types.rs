//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Generates a string-backed enum with `as_str`, `Display` and `FromStr`.
macro_rules! define_str_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Returns the wire representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

define_str_enum!(
    /// Whether an interaction came from a person or from the tool itself.
    UserType, "user type" {
        External => "external",
        Internal => "internal",
    }
);

define_str_enum!(
    /// Record-level message type (`type` on the wire).
    MessageType, "message type" {
        User => "user",
        Assistant => "assistant",
    }
);

define_str_enum!(
    /// Role of the sender inside the embedded message.
    Role, "role" {
        User => "user",
        Assistant => "assistant",
    }
);

define_str_enum!(
    /// Why the assistant stopped generating.
    StopReason, "stop reason" {
        /// Natural end of turn.
        EndTurn => "end_turn",
        MaxTokens => "max_tokens",
        StopSequence => "stop_sequence",
    }
);

/// A strictly positive USD cost.
///
/// Zero, negative, infinite and NaN values are rejected, both through
/// [`CostUsd::new`] and during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CostUsd(f64);

impl CostUsd {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "costUSD",
                value,
            });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for CostUsd {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CostUsd> for f64 {
    fn from(cost: CostUsd) -> Self {
        cost.0
    }
}

impl fmt::Display for CostUsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}

/// A strictly positive duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct DurationMs(u64);

impl DurationMs {
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::NonPositive {
                field: "durationMs",
                value: 0.0,
            });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Converts to a `chrono` duration, saturating at `i64::MAX` milliseconds.
    #[must_use]
    pub fn to_duration(self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.0).unwrap_or(i64::MAX))
    }
}

impl TryFrom<u64> for DurationMs {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DurationMs> for u64 {
    fn from(duration: DurationMs) -> Self {
        duration.0
    }
}
