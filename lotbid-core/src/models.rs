/// The error returned when a stored or transmitted enum label is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} `{value}`")]
pub struct ParseError {
    /// The enum being parsed (e.g. "round status")
    pub kind: &'static str,
    /// The offending input
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum with
/// fixed snake_case labels, matching the serde representation.
macro_rules! labelled_enum {
    ($enum:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $enum {
            /// The canonical label of this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum {
            type Err = $crate::models::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err($crate::models::ParseError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

mod allocation;
pub use allocation::*;

mod buyer;
pub use buyer::*;

mod invite;
pub use invite::*;

mod lot;
pub use lot::*;

mod map;
pub use map::{Map, Set};

mod offer;
pub use offer::*;

mod round;
pub use round::*;
