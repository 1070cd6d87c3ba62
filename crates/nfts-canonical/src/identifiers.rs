use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a value already known to be well formed, such as a
            /// name taken from a static schema descriptor.
            pub fn new(value: String) -> Self {
                Self(value)
            }

            /// Parses and validates an identifier.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                static PATTERN: OnceLock<Regex> = OnceLock::new();
                let value = value.into();
                let pattern = PATTERN.get_or_init(|| Regex::new($pattern).expect("invalid regex"));
                if pattern.is_match(&value) {
                    Ok(Self(value))
                } else {
                    Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value,
                    })
                }
            }

            /// Identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    ProfileId,
    "Identifier of a schema profile (pattern: `[a-z0-9-]{8,64}`), e.g. `nfts-tpnfts-serie-padded`.",
    r"^[a-z0-9-]{8,64}$"
);
newtype!(
    FieldPath,
    "Dotted path of a schema field inside a record unit, e.g. `Prestador.Endereco.CEP`.",
    r"^[A-Za-z_][A-Za-z0-9_-]*(\.[A-Za-z_][A-Za-z0-9_-]*)*$"
);

impl FieldPath {
    /// Joins schema element names into a dotted path.
    pub fn from_segments(segments: &[&str]) -> Self {
        Self(segments.join("."))
    }
}
