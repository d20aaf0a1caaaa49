//! wk_core — Core types, parameter domains, and integer-first rounding.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! workspace (`wk_io`, `wk_algo`, `wk_pipeline`, `wk_report`, `wk_cli`).
//!
//! - Rank tokens: `RankId`
//! - Participant counts / weight tables (`entities`)
//! - Parameter set: roster, weight presets, rounding unit, input bounds (`variables`)
//! - Exact ceiling-to-multiple and percent helpers (`rounding`)

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidToken,
        InvalidRoundingUnit(u64),
        DomainOutOfRange(&'static str),
        UnknownPreset(String),
        DuplicateRank(String),
        EmptyRoster,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::InvalidRoundingUnit(u) => write!(f, "invalid rounding unit: {u}"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
                CoreError::UnknownPreset(p) => write!(f, "unknown weight preset: {p}"),
                CoreError::DuplicateRank(r) => write!(f, "duplicate rank in roster: {r}"),
                CoreError::EmptyRoster => write!(f, "roster must list at least one rank"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod tokens {
    //! Registry token types (`RankId`) with strict charset.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;

    use serde::de::{Error as DeError, Unexpected};
    use serde::{Deserialize, Deserializer, Serialize};

    fn is_token(s: &str) -> bool {
        let len = s.len();
        if !(1..=64).contains(&len) { return false; }
        s.bytes().all(|b| matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        ))
    }

    macro_rules! def_token {
        ($name:ident) => {
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn as_str(&self) -> &str { &self.0 }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
            }

            impl FromStr for $name {
                type Err = CoreError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    if is_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken) }
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                    let s = String::deserialize(d)?;
                    if is_token(&s) { Ok(Self(s)) }
                    else { Err(D::Error::invalid_value(Unexpected::Str(&s), &"token [A-Za-z0-9_.:-], len 1..=64")) }
                }
            }
        }
    }

    def_token!(RankId);

}

pub mod entities;
pub mod rounding;
pub mod variables;

pub use entities::{ParticipantCounts, WeightTable};
pub use tokens::RankId;
pub use variables::{Params, RoundingUnit};
